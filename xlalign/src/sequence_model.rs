use std::sync::OnceLock;

use context_error::{BasicKind, BoxedError};

use crate::{
    AlignMode, AlignmentResult, AlignmentStatistics, Block, ScoringConfig, align,
    merge_contiguous_ranges,
};

/// One comparison sequence aligned onto the search sequence of its protein.
///
/// All indices in the public functions are 1-based. Mapped values follow the encoding of
/// [`AlignmentResult`] shifted to 1-based: a positive value is the aligned residue in the other
/// sequence, a negative value `-n` means there is no aligned residue and `n` is the next residue
/// in the other sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceModel {
    /// The identifier, eg a PDB chain or UniProt accession
    pub id: String,
    /// The comparison sequence
    sequence: String,
    /// The mode to align in
    mode: AlignMode,
    /// If this is the canonical sequence of the protein itself
    pub canonical: bool,
    alignment: AlignmentResult,
    /// Filled on first read after every alignment
    blocks: OnceLock<Vec<Block>>,
}

impl SequenceModel {
    /// Create a new sequence model, not yet aligned to anything
    pub fn new(id: impl Into<String>, sequence: impl Into<String>, mode: AlignMode) -> Self {
        let sequence = sequence.into();
        Self {
            id: id.into(),
            alignment: AlignmentResult {
                query_to_ref: vec![-1; sequence.len()],
                ..AlignmentResult::default()
            },
            sequence,
            mode,
            canonical: false,
            blocks: OnceLock::new(),
        }
    }

    /// The comparison sequence
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// The alignment mode
    pub const fn mode(&self) -> AlignMode {
        self.mode
    }

    /// The current alignment
    pub const fn alignment(&self) -> &AlignmentResult {
        &self.alignment
    }

    /// Align this sequence onto the given search sequence and compute its statistics. This
    /// invalidates the blocks.
    /// # Errors
    /// If the scoring configuration is unusable.
    pub fn align(
        &mut self,
        search: &str,
        scoring: &ScoringConfig,
    ) -> Result<(), BoxedError<'static, BasicKind>> {
        let mut alignment = align(&self.sequence, search, scoring, self.mode)?;
        alignment.statistics = AlignmentStatistics::new(
            alignment.raw_score,
            self.sequence.len(),
            scoring,
        );
        self.alignment = alignment;
        self.blocks = OnceLock::new();
        Ok(())
    }

    /// Check if the blocks have to be recalculated on the next read
    pub fn is_dirty(&self) -> bool {
        self.blocks.get().is_none()
    }

    /// Map a residue of the comparison sequence onto the search sequence. Returns `None` if the
    /// index lies outside the comparison sequence.
    pub fn map_to_search(&self, index: usize) -> Option<isize> {
        Self::map(&self.alignment.query_to_ref, index)
    }

    /// Map a residue of the search sequence onto the comparison sequence. Returns `None` if the
    /// index lies outside the search sequence.
    pub fn map_from_search(&self, index: usize) -> Option<isize> {
        Self::map(&self.alignment.ref_to_query, index)
    }

    /// Map many residues onto the search sequence
    pub fn map_to_search_bulk(&self, indices: &[usize]) -> Vec<Option<isize>> {
        indices.iter().map(|i| self.map_to_search(*i)).collect()
    }

    /// Map many residues from the search sequence
    pub fn map_from_search_bulk(&self, indices: &[usize]) -> Vec<Option<isize>> {
        indices.iter().map(|i| self.map_from_search(*i)).collect()
    }

    fn map(map: &[isize], index: usize) -> Option<isize> {
        let value = *map.get(index.checked_sub(1)?)?;
        // Negative values are already 1-based: `-(k + 1)` for 0-based next residue `k`
        Some(if value >= 0 { value + 1 } else { value })
    }

    /// Map an index and normalise it. When there is no exact counterpart the nearest following
    /// residue is given, as a positive number unless `keep_negative` is set. If even that lies
    /// past the end of the other sequence `None` is returned.
    pub fn get_aligned_index(
        &self,
        index: usize,
        to_search: bool,
        keep_negative: bool,
    ) -> Option<isize> {
        let (raw, other_len) = if to_search {
            (self.map_to_search(index)?, self.alignment.reference_len())
        } else {
            (self.map_from_search(index)?, self.alignment.query_len())
        };
        if raw > 0 {
            Some(raw)
        } else if raw.unsigned_abs() > other_len {
            None
        } else if keep_negative {
            Some(raw)
        } else {
            Some(-raw)
        }
    }

    /// The runs of consecutively aligned residues, in search sequence coordinates. Calculated
    /// lazily and cached until the next alignment.
    pub fn blockify(&self) -> &[Block] {
        self.blocks.get_or_init(|| {
            let mut blocks = Vec::new();
            let mut current: Option<Block> = None;
            for &mapped in &self.alignment.query_to_ref {
                if mapped < 0 {
                    blocks.extend(current.take());
                    continue;
                }
                let residue = mapped as usize + 1;
                if let Some(block) = current.as_mut()
                    && block.end + 1 == residue
                {
                    block.end = residue;
                } else {
                    blocks.extend(current.replace(Block::new(residue, residue)));
                }
            }
            blocks.extend(current);
            merge_contiguous_ranges(blocks)
        })
    }

    /// Map a range of the comparison sequence onto the search sequence. Ends without an exact
    /// counterpart are moved inwards to the nearest aligned residue. Returns `None` if the range
    /// does not overlap with the aligned region of the search sequence.
    pub fn range_to_search(&self, begin: usize, end: usize) -> Option<Block> {
        let start = self.map_to_search(begin)?;
        let stop = self.map_to_search(end)?;
        let start = start.unsigned_abs();
        let stop = if stop > 0 {
            stop.unsigned_abs()
        } else {
            stop.unsigned_abs().checked_sub(1)?
        };
        if start > self.alignment.reference_len() || stop < 1 || start > stop {
            None
        } else {
            Some(Block::new(start, stop))
        }
    }

    /// The full comparison sequence as a range of the search sequence
    pub fn range_as_search(&self) -> Option<Block> {
        self.range_to_search(1, self.sequence.len())
    }
}
