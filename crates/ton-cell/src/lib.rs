//! Cells, the bit-packed tree nodes every TON contract stores its code,
//! data and messages in.
//!
//! [`CellBuilder`] writes fields into a [`Cell`], [`CellSlice`] reads them
//! back, [`MsgAddress`] is the address field type and [`BagOfCells`] moves
//! whole trees in and out of bytes. Only ordinary cells exist here; a bag
//! holding an exotic cell fails to parse.
//!
//! ```
//! use ton_cell::{BagOfCells, CellBuilder};
//!
//! let mut builder = CellBuilder::new();
//! builder.store_u32(0x4d494e54).unwrap();
//! builder.store_uint128(1000, 128).unwrap();
//! let cell = builder.build().unwrap();
//!
//! let bytes = BagOfCells::from_root(cell.clone()).serialize().unwrap();
//! let parsed = BagOfCells::deserialize(&bytes).unwrap();
//! assert_eq!(parsed.single_root().unwrap().hash(), cell.hash());
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

mod address;
mod boc;
mod builder;
mod cell;
mod slice;

pub use address::MsgAddress;
pub use boc::BagOfCells;
pub use builder::CellBuilder;
pub use cell::{Cell, DEPTH_BYTES, HASH_BYTES};
pub use slice::CellSlice;

/// Failures of the cell layer.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("cell would hold {0} bits, limit is 1023")]
    DataTooLong(usize),

    #[error("cell would hold {0} references, limit is 4")]
    TooManyRefs(usize),

    #[error("{value} needs more than {bits} bits")]
    IntegerOverflow { value: String, bits: usize },

    #[error("malformed bag of cells: {0}")]
    InvalidBoc(String),

    #[error("bag of cells has no cell at index {0}")]
    CellNotFound(usize),

    #[error("bag of cells checksum is 0x{actual:08x}, trailer says 0x{expected:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("input ended early")]
    UnexpectedEof,

    #[error("read of {need} bits with {have} left")]
    NotEnoughBits { need: usize, have: usize },

    #[error("read of {need} references with {have} left")]
    NotEnoughRefs { need: usize, have: usize },

    #[error("bad address: {0}")]
    InvalidAddress(String),

    #[error("bad base64: {0}")]
    InvalidBase64(String),

    #[error("bad hex: {0}")]
    InvalidHex(String),

    /// The bag holds zero or several roots where exactly one was expected.
    #[error("expected one root, bag of cells has {0}")]
    NotSingleRoot(usize),

    /// Pruned branches, library cells and Merkle cells are not handled.
    #[error("exotic cell of type {0}")]
    ExoticCell(u8),

    #[error("integer width {0} is not supported here")]
    InvalidBitLength(usize),

    #[error("cell tree depth {0} is over 1024")]
    DepthExceeded(u16),
}

/// Result type for Cell/BoC operations.
pub type CellResult<T> = Result<T, CellError>;

pub const MAX_CELL_BITS: usize = 1023;

pub const MAX_CELL_REFS: usize = 4;

/// Deepest tree the ledger accepts.
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Leading tag of a serialized bag of cells.
pub const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Older layout that always carries an offset index.
pub const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;

/// Indexed layout with a CRC32-C trailer.
pub const BOC_INDEXED_CRC32_MAGIC: u32 = 0xacc3a728;

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// CRC-32/ISCSI, the bag of cells trailer checksum.
fn crc32c(data: &[u8]) -> u32 {
    const ISCSI: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);
    ISCSI.checksum(data)
}

/// CRC-16/XMODEM, the user-friendly address checksum.
fn crc16_xmodem(data: &[u8]) -> u16 {
    const XMODEM: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);
    XMODEM.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_checksums_match_catalogue() {
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
        assert_eq!(crc32c(b"123456789"), 0xE3069283);
    }

    #[test]
    fn test_fields_read_back_in_store_order() {
        let mut builder = CellBuilder::new();
        builder.store_bit(false).unwrap();
        builder.store_u32(0x5fcc3d14).unwrap();
        builder.store_u64(u64::MAX).unwrap();
        builder.store_uint(3, 2).unwrap();
        builder.store_uint128(1 << 127, 128).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 1 + 32 + 64 + 2 + 128);

        let mut slice = CellSlice::new(&cell);
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.load_u32().unwrap(), 0x5fcc3d14);
        assert_eq!(slice.load_u64().unwrap(), u64::MAX);
        assert_eq!(slice.load_uint(2).unwrap(), 3);
        assert_eq!(slice.load_uint128(128).unwrap(), 1 << 127);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_hash_covers_children() {
        let child = |tag: u32| {
            let mut builder = CellBuilder::new();
            builder.store_u32(tag).unwrap();
            Arc::new(builder.build().unwrap())
        };
        let parent = |tag: u32| {
            let mut builder = CellBuilder::new();
            builder.store_ref(child(tag)).unwrap();
            builder.build().unwrap()
        };

        assert_eq!(parent(1).hash(), parent(1).hash());
        assert_ne!(parent(1).hash(), parent(2).hash());
        assert_ne!(parent(1).hash(), Cell::empty().hash());
        assert_eq!(parent(1).depth(), 1);
    }
}
