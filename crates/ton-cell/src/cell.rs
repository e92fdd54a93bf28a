//! The immutable cell type.
//!
//! Hash and depth are fixed when the cell is created; nothing about a cell
//! can change afterwards.

use std::sync::Arc;

use crate::{MAX_CELL_BITS, MAX_CELL_REFS, sha256};

pub const HASH_BYTES: usize = 32;

/// Width of a child depth inside the hashed representation.
pub const DEPTH_BYTES: usize = 2;

/// Up to 1023 bits of data plus up to 4 child cells.
///
/// Equality and hashing go through the representation hash, which commits
/// to the whole subtree.
#[derive(Debug, Clone)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
    hash: [u8; HASH_BYTES],
    depth: u16,
}

impl Cell {
    /// Limits are checked by `CellBuilder` and the BoC reader.
    pub(crate) fn new(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Self {
        debug_assert!(bit_len <= MAX_CELL_BITS);
        debug_assert!(references.len() <= MAX_CELL_REFS);

        let depth = references
            .iter()
            .map(|child| child.depth.saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut cell = Cell {
            data,
            bit_len,
            references,
            hash: [0u8; HASH_BYTES],
            depth,
        };
        cell.hash = sha256(&cell.representation());
        cell
    }

    /// No bits, no references.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, Vec::new())
    }

    /// Hashed form: descriptors, padded data, child depths, child hashes.
    fn representation(&self) -> Vec<u8> {
        let mut repr = Vec::with_capacity(
            2 + self.data.len() + self.references.len() * (DEPTH_BYTES + HASH_BYTES),
        );

        let (d1, d2) = self.descriptors();
        repr.push(d1);
        repr.push(d2);
        repr.extend_from_slice(&self.data_with_completion_tag());

        repr.extend(self.references.iter().flat_map(|c| c.depth.to_be_bytes()));
        repr.extend(self.references.iter().flat_map(|c| c.hash));

        repr
    }

    /// SHA-256 of the representation.
    pub fn hash(&self) -> [u8; HASH_BYTES] {
        self.hash
    }

    /// Longest path to a leaf; 0 for a cell without children.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// `(refs, ceil(bits/8) + floor(bits/8))` for a level-0 ordinary cell.
    pub(crate) fn descriptors(&self) -> (u8, u8) {
        let d1 = self.references.len() as u8;
        let d2 = (self.bit_len.div_ceil(8) + self.bit_len / 8) as u8;
        (d1, d2)
    }

    /// Data bytes with a 1 bit appended after the last bit when the length
    /// is not a whole number of bytes.
    pub(crate) fn data_with_completion_tag(&self) -> Vec<u8> {
        let mut result = self.data[..self.byte_len()].to_vec();
        let remainder = self.bit_len % 8;
        if remainder != 0
            && let Some(last) = result.last_mut()
        {
            *last |= 1 << (7 - remainder);
        }
        result
    }

    /// Data bytes, zero padded after the last bit.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    fn byte_len(&self) -> usize {
        self.bit_len.div_ceil(8)
    }

    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// True when the cell holds neither bits nor references.
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0 && self.references.is_empty()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}
