//! Bag of cells, the byte encoding of cell trees.
//!
//! Compiled contract code ships in this form. Writing always produces the
//! generic layout with a CRC32-C trailer and no offset index. Reading also
//! takes the two indexed layouts, whose flag byte holds only the reference
//! width, and cells that carry their hashes inline.
//!
//! ```text
//! serialized_boc#b5ee9c72 has_idx:(## 1) has_crc32c:(## 1)
//!   has_cache_bits:(## 1) flags:(## 2) size:(## 3)
//!   off_bytes:(## 8) cells:(##(size * 8)) roots:(##(size * 8))
//!   absent:(##(size * 8)) tot_cells_size:(##(off_bytes * 8))
//!   root_list:(roots * ##(size * 8))
//!   index:has_idx?(cells * ##(off_bytes * 8))
//!   cell_data:(tot_cells_size * [ uint8 ])
//!   crc32c:has_crc32c?uint32
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{
    BOC_GENERIC_MAGIC, BOC_INDEXED_CRC32_MAGIC, BOC_INDEXED_MAGIC, Cell, CellError, CellResult,
    DEPTH_BYTES, HASH_BYTES, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS, crc32c,
};

/// Roots of one or more cell trees, ready to be written as bytes.
#[derive(Debug, Clone)]
pub struct BagOfCells {
    roots: Vec<Arc<Cell>>,
}

/// One cell as read from the wire, before its children are resolved.
struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
    stored_hash: Option<[u8; 32]>,
}

impl BagOfCells {
    pub fn from_root(root: impl Into<Arc<Cell>>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// The only root, or `NotSingleRoot`.
    pub fn single_root(&self) -> CellResult<&Arc<Cell>> {
        match self.roots.as_slice() {
            [root] => Ok(root),
            roots => Err(CellError::NotSingleRoot(roots.len())),
        }
    }

    pub fn serialize(&self) -> CellResult<Vec<u8>> {
        if self.roots.is_empty() {
            return Err(CellError::InvalidBoc("nothing to serialize".to_string()));
        }

        let order = self.topological_order();
        let position: HashMap<[u8; 32], usize> = order
            .iter()
            .enumerate()
            .map(|(pos, cell)| (cell.hash(), pos))
            .collect();
        let lookup = |cell: &Cell| {
            position
                .get(&cell.hash())
                .copied()
                .ok_or_else(|| CellError::InvalidBoc("cell missing from ordering".to_string()))
        };
        let ref_width = bytes_needed(order.len());

        let mut body = Vec::new();
        for cell in &order {
            let (refs_descriptor, bits_descriptor) = cell.descriptors();
            body.extend([refs_descriptor, bits_descriptor]);
            body.extend(cell.data_with_completion_tag());
            for child in cell.references() {
                push_be(&mut body, lookup(child)?, ref_width);
            }
        }
        let offset_width = bytes_needed(body.len());

        let mut out = Vec::with_capacity(body.len() + 32);
        out.extend(BOC_GENERIC_MAGIC.to_be_bytes());
        // crc32c trailer present, no index, no cache bits
        out.push(0x40 | ref_width as u8);
        out.push(offset_width as u8);
        push_be(&mut out, order.len(), ref_width);
        push_be(&mut out, self.roots.len(), ref_width);
        push_be(&mut out, 0, ref_width);
        push_be(&mut out, body.len(), offset_width);
        for root in &self.roots {
            push_be(&mut out, lookup(root)?, ref_width);
        }
        out.extend(body);

        let checksum = crc32c(&out);
        out.extend(checksum.to_le_bytes());
        Ok(out)
    }

    pub fn serialize_to_base64(&self) -> CellResult<String> {
        Ok(STANDARD.encode(self.serialize()?))
    }

    /// Parse the generic `b5ee9c72` layout or either indexed one
    /// (`68ff65f3`, `acc3a728`).
    pub fn deserialize(data: &[u8]) -> CellResult<Self> {
        let mut reader = Reader { data, offset: 0 };

        let magic = reader.uint(4)? as u32;
        let flags = reader.uint(1)? as u8;
        let (has_idx, has_crc, size_bytes) = match magic {
            BOC_GENERIC_MAGIC => (flags & 0x80 != 0, flags & 0x40 != 0, (flags & 0x07) as usize),
            BOC_INDEXED_MAGIC => (true, false, flags as usize),
            BOC_INDEXED_CRC32_MAGIC => (true, true, flags as usize),
            _ => {
                return Err(CellError::InvalidBoc(format!(
                    "magic {:08x}, want one of {:08x} {:08x} {:08x}",
                    magic, BOC_GENERIC_MAGIC, BOC_INDEXED_MAGIC, BOC_INDEXED_CRC32_MAGIC
                )));
            }
        };
        if size_bytes == 0 || size_bytes > 4 {
            return Err(CellError::InvalidBoc(format!("reference width {}", size_bytes)));
        }
        let off_bytes = reader.uint(1)? as usize;
        if off_bytes == 0 || off_bytes > 8 {
            return Err(CellError::InvalidBoc(format!("offset width {}", off_bytes)));
        }

        if has_crc {
            let (signed, trailer) = data
                .split_last_chunk::<4>()
                .ok_or(CellError::UnexpectedEof)?;
            let expected = u32::from_le_bytes(*trailer);
            let actual = crc32c(signed);
            if expected != actual {
                return Err(CellError::CrcMismatch { expected, actual });
            }
            reader.data = signed;
        }

        let cell_count = reader.uint(size_bytes)? as usize;
        let root_count = reader.uint(size_bytes)? as usize;
        let _absent = reader.uint(size_bytes)?;
        let total_size = reader.uint(off_bytes)? as usize;

        let root_indices = (0..root_count)
            .map(|_| reader.uint(size_bytes).map(|v| v as usize))
            .collect::<CellResult<Vec<_>>>()?;

        if has_idx {
            reader.skip(cell_count * off_bytes)?;
        }

        let cells_start = reader.offset;
        let raw_cells = (0..cell_count)
            .map(|_| read_raw_cell(&mut reader, size_bytes))
            .collect::<CellResult<Vec<_>>>()?;
        if reader.offset - cells_start != total_size {
            return Err(CellError::InvalidBoc(format!(
                "cell section is {} bytes, header declared {}",
                reader.offset - cells_start,
                total_size
            )));
        }

        let cells = resolve_cells(raw_cells)?;
        let roots = root_indices
            .into_iter()
            .map(|idx| cells.get(idx).cloned().ok_or(CellError::CellNotFound(idx)))
            .collect::<CellResult<Vec<_>>>()?;

        Ok(BagOfCells { roots })
    }

    pub fn deserialize_from_base64(text: &str) -> CellResult<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CellError::InvalidBase64(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    pub fn deserialize_from_hex(text: &str) -> CellResult<Self> {
        let bytes = hex::decode(text.trim()).map_err(|e| CellError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Distinct cells, parents before children.
    fn topological_order(&self) -> Vec<Arc<Cell>> {
        fn walk(cell: &Arc<Cell>, seen: &mut HashSet<[u8; 32]>, out: &mut Vec<Arc<Cell>>) {
            if !seen.insert(cell.hash()) {
                return;
            }
            for child in cell.references().iter().rev() {
                walk(child, seen, out);
            }
            out.push(cell.clone());
        }

        let mut seen = HashSet::new();
        let mut children_first = Vec::new();
        for root in self.roots.iter().rev() {
            walk(root, &mut seen, &mut children_first);
        }
        children_first.reverse();
        children_first
    }
}

fn read_raw_cell(reader: &mut Reader<'_>, size_bytes: usize) -> CellResult<RawCell> {
    let d1 = reader.uint(1)? as u8;
    let d2 = reader.uint(1)? as u8;

    let refs_count = (d1 & 0x07) as usize;
    let has_hashes = d1 & 0x10 != 0;
    let hash_count = (d1 >> 5).count_ones() as usize + 1;
    if refs_count > MAX_CELL_REFS {
        return Err(CellError::TooManyRefs(refs_count));
    }

    // hashes and depths, one per significant level, precede the data
    let mut stored_hash = None;
    if has_hashes {
        let hashes = reader.bytes(hash_count * HASH_BYTES)?;
        reader.skip(hash_count * DEPTH_BYTES)?;
        if hash_count == 1 {
            stored_hash = hashes.try_into().ok();
        }
    }
    if d1 & 0x08 != 0 {
        let type_byte = reader.peek().unwrap_or(0);
        return Err(CellError::ExoticCell(type_byte));
    }

    let data_len = (d2 as usize).div_ceil(2);
    let mut data = reader.bytes(data_len)?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        strip_completion_tag(&mut data)?
    };
    if bit_len > MAX_CELL_BITS {
        return Err(CellError::DataTooLong(bit_len));
    }

    let refs = (0..refs_count)
        .map(|_| reader.uint(size_bytes).map(|v| v as usize))
        .collect::<CellResult<Vec<_>>>()?;

    Ok(RawCell {
        data,
        bit_len,
        refs,
        stored_hash,
    })
}

/// Clear the padding marker and return the real bit count.
fn strip_completion_tag(data: &mut [u8]) -> CellResult<usize> {
    let last = data
        .last_mut()
        .ok_or_else(|| CellError::InvalidBoc("padded cell without data".to_string()))?;
    if *last == 0 {
        return Err(CellError::InvalidBoc("padding marker missing".to_string()));
    }
    let trailing = last.trailing_zeros() as usize;
    *last &= !(1u8 << trailing);
    Ok(data.len() * 8 - trailing - 1)
}

/// Children always sit at higher indices, so building back to front sees
/// every child before its parent.
fn resolve_cells(raw_cells: Vec<RawCell>) -> CellResult<Vec<Arc<Cell>>> {
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; raw_cells.len()];

    for (i, raw) in raw_cells.into_iter().enumerate().rev() {
        let references = raw
            .refs
            .iter()
            .map(|&idx| {
                if idx <= i {
                    return Err(CellError::InvalidBoc(format!(
                        "cell {} points back to cell {}",
                        i, idx
                    )));
                }
                built
                    .get(idx)
                    .cloned()
                    .flatten()
                    .ok_or(CellError::CellNotFound(idx))
            })
            .collect::<CellResult<Vec<_>>>()?;

        let cell = Cell::new(raw.data, raw.bit_len, references);
        if cell.depth() > MAX_CELL_DEPTH {
            return Err(CellError::DepthExceeded(cell.depth()));
        }
        if let Some(stored) = raw.stored_hash
            && stored != cell.hash()
        {
            return Err(CellError::InvalidBoc(format!(
                "cell {} stores hash {}, contents hash to {}",
                i,
                hex::encode(stored),
                hex::encode(cell.hash())
            )));
        }
        built[i] = Some(Arc::new(cell));
    }

    built
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.ok_or(CellError::CellNotFound(i)))
        .collect()
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, count: usize) -> CellResult<&'a [u8]> {
        let end = self.offset.checked_add(count).ok_or(CellError::UnexpectedEof)?;
        let slice = self.data.get(self.offset..end).ok_or(CellError::UnexpectedEof)?;
        self.offset = end;
        Ok(slice)
    }

    fn uint(&mut self, count: usize) -> CellResult<u64> {
        Ok(self
            .bytes(count)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    fn skip(&mut self, count: usize) -> CellResult<()> {
        self.bytes(count).map(|_| ())
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }
}

/// Smallest byte width holding `n`, at least one.
fn bytes_needed(n: usize) -> usize {
    ((usize::BITS - n.leading_zeros()) as usize).div_ceil(8).max(1)
}

fn push_be(buf: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u64).to_be_bytes();
    buf.extend_from_slice(&bytes[8 - width..]);
}
