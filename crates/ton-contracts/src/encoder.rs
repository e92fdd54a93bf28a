//! Fixed-width field encoder for contract data and message bodies.
//!
//! Every append consumes the encoder and hands it back on success. On
//! failure the encoder is dropped, so a partially written buffer can never
//! be finalized into a cell.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS, MsgAddress};

use crate::error::{ContractError, ContractResult};

/// Width of every opcode prefix.
pub const OPCODE_BITS: usize = 32;

/// Width of token amounts and total supply.
pub const AMOUNT_BITS: usize = 128;

/// Append-only encoder producing a single cell.
///
/// # Example
///
/// ```
/// use ton_contracts::BodyEncoder;
/// use ton_cell::MsgAddress;
///
/// let to = MsgAddress::Internal { workchain: 0, address: [0x12; 32] };
/// let body = BodyEncoder::new()
///     .append_opcode(0x4d494e54).unwrap()
///     .append_address(&to).unwrap()
///     .append_uint("amount", 1000, 128).unwrap()
///     .finalize()
///     .unwrap();
/// assert_eq!(body.bit_len(), 32 + 267 + 128);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BodyEncoder {
    builder: CellBuilder,
}

impl BodyEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self {
            builder: CellBuilder::new(),
        }
    }

    /// Append `value` as a big-endian unsigned integer of `bits` width.
    ///
    /// `field` names the value in the `Range` error.
    pub fn append_uint(
        mut self,
        field: &'static str,
        value: u128,
        bits: usize,
    ) -> ContractResult<Self> {
        if !fits_unsigned(value, bits) {
            return Err(ContractError::Range {
                field,
                value: value.to_string(),
                bits,
            });
        }
        self.builder.store_uint128(value, bits)?;
        Ok(self)
    }

    /// Append a 32-bit opcode.
    pub fn append_opcode(self, opcode: u32) -> ContractResult<Self> {
        self.append_uint("opcode", opcode as u128, OPCODE_BITS)
    }

    /// Append an address in the addr_std / addr_none layout.
    pub fn append_address(mut self, address: &MsgAddress) -> ContractResult<Self> {
        if let Some(workchain) = address.workchain()
            && i8::try_from(workchain).is_err()
        {
            return Err(ContractError::Range {
                field: "workchain",
                value: workchain.to_string(),
                bits: 8,
            });
        }
        self.builder.store_address(address)?;
        Ok(self)
    }

    /// Append a reference to a child cell.
    pub fn append_ref(mut self, child: Arc<Cell>) -> ContractResult<Self> {
        if self.builder.ref_count() >= MAX_CELL_REFS {
            return Err(ContractError::Capacity(format!(
                "cannot add reference {} (max {})",
                self.builder.ref_count() + 1,
                MAX_CELL_REFS
            )));
        }
        self.builder.store_ref(child)?;
        Ok(self)
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.builder.bit_len()
    }

    /// Number of references written so far.
    pub fn ref_count(&self) -> usize {
        self.builder.ref_count()
    }

    /// Finish encoding and produce the immutable cell.
    pub fn finalize(self) -> ContractResult<Cell> {
        if self.builder.bit_len() > MAX_CELL_BITS {
            return Err(ContractError::Capacity(format!(
                "{} bits (max {})",
                self.builder.bit_len(),
                MAX_CELL_BITS
            )));
        }
        Ok(self.builder.build()?)
    }
}

/// True when `value < 2^bits`. Widths above 128 are never satisfiable
/// because no u128 field is declared that wide.
pub fn fits_unsigned(value: u128, bits: usize) -> bool {
    match bits {
        0 => value == 0,
        1..=127 => value >> bits == 0,
        128 => true,
        _ => false,
    }
}

/// Parse a decimal token amount.
///
/// Negative values, values of `2^128` or more and non-integers are all
/// `Range` errors on the `amount` field.
///
/// ```
/// use ton_contracts::parse_amount;
///
/// assert_eq!(parse_amount("1000").unwrap(), 1000);
/// assert!(parse_amount("-1").is_err());
/// assert!(parse_amount("340282366920938463463374607431768211456").is_err());
/// ```
pub fn parse_amount(input: &str) -> ContractResult<u128> {
    let trimmed = input.trim();
    let range_error = || ContractError::Range {
        field: "amount",
        value: trimmed.to_string(),
        bits: AMOUNT_BITS,
    };

    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(range_error());
    }
    digits.parse::<u128>().map_err(|_| range_error())
}
