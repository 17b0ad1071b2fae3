use serde::{Deserialize, Serialize};

use crate::Block;

/// A generic annotated region on a protein, as drawn by the feature views
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// First residue, 1-based in search sequence coordinates
    pub begin: usize,
    /// Last residue, inclusive
    pub end: usize,
    /// Display name
    pub name: String,
    /// Broad category, eg `Alignment` or `Domain`
    pub category: String,
    /// Specific type within the category
    #[serde(rename = "type")]
    pub kind: String,
    /// The protein this feature lies on
    #[serde(rename = "protID")]
    pub prot_id: String,
    /// Unique identifier
    pub id: String,
}

impl Feature {
    /// The category for aligned regions of comparison sequences
    pub const ALIGNMENT_CATEGORY: &'static str = "Alignment";
    /// The type for aligned regions of comparison sequences
    pub const ALIGNED_REGION: &'static str = "PDB aligned region";

    /// A feature for one aligned block of a comparison sequence
    pub(crate) fn aligned_block(protein: &str, sequence: &str, block: Block) -> Self {
        Self {
            begin: block.begin,
            end: block.end,
            name: sequence.to_string(),
            category: Self::ALIGNMENT_CATEGORY.to_string(),
            kind: Self::ALIGNED_REGION.to_string(),
            prot_id: protein.to_string(),
            id: format!("{protein} {sequence} {}-{}", block.begin, block.end),
        }
    }

    /// The number of residues covered
    pub const fn len(&self) -> usize {
        self.end + 1 - self.begin
    }

    /// A feature always covers at least one residue
    pub const fn is_empty(&self) -> bool {
        self.end < self.begin
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn json_names() {
        let feature = Feature::aligned_block("P1", "1ABC_A", Block::new(3, 9));
        assert_eq!(feature.len(), 7);
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "PDB aligned region");
        assert_eq!(json["protID"], "P1");
        assert_eq!(json["begin"], 3);
    }
}
