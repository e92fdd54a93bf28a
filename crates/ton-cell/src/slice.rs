//! Sequential reader over a cell.

use crate::{Cell, CellError, CellResult, MsgAddress};

/// Read cursor over one cell's bits and references.
///
/// Fields come back in the order they were stored. A read that runs past
/// the end fails and leaves the cursor where it was.
///
/// ```
/// use ton_cell::{CellBuilder, CellSlice};
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x5452414e).unwrap();
/// builder.store_coins(5).unwrap();
/// let cell = builder.build().unwrap();
///
/// let mut slice = CellSlice::new(&cell);
/// assert_eq!(slice.load_u32().unwrap(), 0x5452414e);
/// assert_eq!(slice.load_coins().unwrap(), 5);
/// assert!(slice.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    pos: usize,
    next_ref: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        CellSlice {
            cell,
            pos: 0,
            next_ref: 0,
        }
    }

    /// Read `count` bits (at most 128) as a big-endian integer.
    fn take(&mut self, count: usize) -> CellResult<u128> {
        if count > 128 {
            return Err(CellError::InvalidBitLength(count));
        }
        let have = self.bits_left();
        if count > have {
            return Err(CellError::NotEnoughBits { need: count, have });
        }
        let data = self.cell.data();
        let value = (self.pos..self.pos + count).fold(0u128, |acc, i| {
            (acc << 1) | ((data[i / 8] >> (7 - i % 8)) & 1) as u128
        });
        self.pos += count;
        Ok(value)
    }

    pub fn load_bit(&mut self) -> CellResult<bool> {
        Ok(self.take(1)? == 1)
    }

    pub fn load_u32(&mut self) -> CellResult<u32> {
        Ok(self.take(32)? as u32)
    }

    pub fn load_u64(&mut self) -> CellResult<u64> {
        Ok(self.take(64)? as u64)
    }

    /// Unsigned integer of `bits` width, at most 64.
    pub fn load_uint(&mut self, bits: usize) -> CellResult<u64> {
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        Ok(self.take(bits)? as u64)
    }

    /// Unsigned integer of `bits` width, at most 128.
    pub fn load_uint128(&mut self, bits: usize) -> CellResult<u128> {
        self.take(bits)
    }

    pub fn load_ref(&mut self) -> CellResult<&'a Cell> {
        let child = self
            .cell
            .reference(self.next_ref)
            .ok_or(CellError::NotEnoughRefs { need: 1, have: 0 })?;
        self.next_ref += 1;
        Ok(child.as_ref())
    }

    /// VarUInteger 16: a 4-bit byte count followed by that many bytes.
    pub fn load_coins(&mut self) -> CellResult<u128> {
        let start = self.pos;
        let bytes = self.take(4)? as usize;
        self.take(bytes * 8).inspect_err(|_| self.pos = start)
    }

    /// addr_none, addr_extern or addr_std. Anycast prefixes are skipped.
    pub fn load_address(&mut self) -> CellResult<MsgAddress> {
        let start = self.pos;
        let parsed = self.read_address();
        if parsed.is_err() {
            self.pos = start;
        }
        parsed
    }

    fn read_address(&mut self) -> CellResult<MsgAddress> {
        match self.take(2)? {
            0b00 => Ok(MsgAddress::Null),
            0b01 => {
                let len = self.take(9)? as u16;
                let mut data = vec![0u8; (len as usize).div_ceil(8)];
                for i in 0..len as usize {
                    if self.take(1)? == 1 {
                        data[i / 8] |= 0x80 >> (i % 8);
                    }
                }
                Ok(MsgAddress::External { len, data })
            }
            0b10 => {
                if self.take(1)? == 1 {
                    let depth = self.take(5)? as usize;
                    self.take(depth)?;
                }
                let workchain = self.take(8)? as u8 as i8 as i32;
                let mut address = [0u8; 32];
                for byte in address.iter_mut() {
                    *byte = self.take(8)? as u8;
                }
                Ok(MsgAddress::Internal { workchain, address })
            }
            tag => Err(CellError::InvalidAddress(format!(
                "addr_var (tag {:02b}) is not supported",
                tag
            ))),
        }
    }

    pub fn bits_left(&self) -> usize {
        self.cell.bit_len() - self.pos
    }

    pub fn refs_left(&self) -> usize {
        self.cell.reference_count() - self.next_ref
    }

    /// Nothing left to read, neither bits nor references.
    pub fn is_empty(&self) -> bool {
        self.bits_left() == 0 && self.refs_left() == 0
    }
}
