//! Append-only cell writer.

use std::sync::Arc;

use crate::{Cell, CellError, CellResult, MAX_CELL_BITS, MAX_CELL_REFS, MsgAddress};

/// Writer that packs fields into a cell.
///
/// Every store is all-or-nothing: a value wider than its declared width, or
/// one that would push the cell past 1023 bits or 4 references, is rejected
/// and the builder keeps its previous contents.
///
/// ```
/// use ton_cell::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x4d494e54).unwrap();
/// builder.store_uint128(1000, 128).unwrap();
/// assert!(builder.store_uint(4, 2).is_err());
///
/// let cell = builder.build().unwrap();
/// assert_eq!(cell.bit_len(), 160);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&self, bits: usize) -> CellResult<()> {
        let total = self.bit_len + bits;
        if total > MAX_CELL_BITS {
            return Err(CellError::DataTooLong(total));
        }
        Ok(())
    }

    /// Write the low `bits` bits of `value`, most significant first.
    /// Callers have already checked width and capacity.
    fn put(&mut self, value: u128, bits: usize) {
        for shift in (0..bits).rev() {
            let offset = self.bit_len % 8;
            if offset == 0 {
                self.data.push(0);
            }
            if (value >> shift) & 1 == 1
                && let Some(last) = self.data.last_mut()
            {
                *last |= 0x80 >> offset;
            }
            self.bit_len += 1;
        }
    }

    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.reserve(1)?;
        self.put(bit as u128, 1);
        Ok(self)
    }

    pub fn store_bits(&mut self, bits: &[bool]) -> CellResult<&mut Self> {
        self.reserve(bits.len())?;
        for &bit in bits {
            self.put(bit as u128, 1);
        }
        Ok(self)
    }

    pub fn store_u16(&mut self, value: u16) -> CellResult<&mut Self> {
        self.store_uint128(value as u128, 16)
    }

    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_uint128(value as u128, 32)
    }

    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_uint128(value as u128, 64)
    }

    /// Unsigned integer of `bits` width, at most 64.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        self.store_uint128(value as u128, bits)
    }

    /// Unsigned integer of `bits` width, at most 128.
    ///
    /// `IntegerOverflow` when `value >= 2^bits`.
    pub fn store_uint128(&mut self, value: u128, bits: usize) -> CellResult<&mut Self> {
        if bits > 128 {
            return Err(CellError::InvalidBitLength(bits));
        }
        if bits < 128 && value >> bits != 0 {
            return Err(CellError::IntegerOverflow {
                value: value.to_string(),
                bits,
            });
        }
        self.reserve(bits)?;
        self.put(value, bits);
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        if self.references.len() == MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(MAX_CELL_REFS + 1));
        }
        self.references.push(cell);
        Ok(self)
    }

    /// VarUInteger 16 amount in nanotons.
    pub fn store_coins(&mut self, nanotons: u128) -> CellResult<&mut Self> {
        let bytes = (u128::BITS - nanotons.leading_zeros()).div_ceil(8) as usize;
        if bytes > 15 {
            return Err(CellError::IntegerOverflow {
                value: nanotons.to_string(),
                bits: 120,
            });
        }
        self.reserve(4 + bytes * 8)?;
        self.put(bytes as u128, 4);
        self.put(nanotons, bytes * 8);
        Ok(self)
    }

    /// Write `addr` as addr_none, addr_extern or addr_std (no anycast).
    pub fn store_address(&mut self, addr: &MsgAddress) -> CellResult<&mut Self> {
        match addr {
            MsgAddress::Null => {
                self.reserve(2)?;
                self.put(0b00, 2);
            }
            MsgAddress::External { len, data } => {
                let len = *len as usize;
                if len >= 1 << 9 || len > data.len() * 8 {
                    return Err(CellError::InvalidAddress(format!(
                        "external address of {} bits backed by {} bytes",
                        len,
                        data.len()
                    )));
                }
                self.reserve(2 + 9 + len)?;
                self.put(0b01, 2);
                self.put(len as u128, 9);
                for i in 0..len {
                    self.put(((data[i / 8] >> (7 - i % 8)) & 1) as u128, 1);
                }
            }
            MsgAddress::Internal { workchain, address } => {
                let workchain = i8::try_from(*workchain).map_err(|_| CellError::IntegerOverflow {
                    value: workchain.to_string(),
                    bits: 8,
                })?;
                self.reserve(MsgAddress::STD_BITS)?;
                self.put(0b100, 3);
                self.put(workchain as u8 as u128, 8);
                for &byte in address {
                    self.put(byte as u128, 8);
                }
            }
        }
        Ok(self)
    }

    /// Bits that can still be stored.
    pub fn bits_left(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    /// References that can still be added.
    pub fn refs_left(&self) -> usize {
        MAX_CELL_REFS - self.references.len()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    pub fn build(self) -> CellResult<Cell> {
        Ok(Cell::new(self.data, self.bit_len, self.references))
    }
}
