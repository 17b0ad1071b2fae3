use serde::{Deserialize, Serialize};

/// An inclusive range of residues, 1-based
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Block {
    /// First residue in the range
    pub begin: usize,
    /// Last residue in the range
    pub end: usize,
}

impl Block {
    /// Create a new block, the bounds are swapped if given in reverse
    pub const fn new(begin: usize, end: usize) -> Self {
        if begin <= end {
            Self { begin, end }
        } else {
            Self {
                begin: end,
                end: begin,
            }
        }
    }

    /// The number of residues covered
    pub const fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.begin)
    }

    /// A block built with [`Self::new`] always covers at least one residue
    pub const fn is_empty(&self) -> bool {
        self.end < self.begin
    }

    /// Check if the residue is within this block
    pub const fn contains(&self, residue: usize) -> bool {
        self.begin <= residue && residue <= self.end
    }
}

/// Merge overlapping or directly adjacent ranges. The result is sorted and no two ranges in it
/// touch.
pub fn merge_contiguous_ranges(mut ranges: Vec<Block>) -> Vec<Block> {
    ranges.sort_unstable();
    let mut merged: Vec<Block> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(last) = merged.last_mut()
            && range.begin <= last.end + 1
        {
            last.end = last.end.max(range.end);
        } else {
            merged.push(range);
        }
    }
    merged
}
