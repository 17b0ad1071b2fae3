use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A single step in an alignment path
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub enum Step {
    /// Identical residues
    #[default]
    Match,
    /// Different residues
    Mismatch,
    /// A residue of the comparison sequence against a gap in the reference
    Insertion,
    /// A residue of the reference against a gap in the comparison sequence
    Deletion,
}

impl Step {
    /// The number of residues of the comparison sequence consumed by this step
    pub const fn step_query(self) -> usize {
        match self {
            Self::Match | Self::Mismatch | Self::Insertion => 1,
            Self::Deletion => 0,
        }
    }

    /// The number of residues of the reference sequence consumed by this step
    pub const fn step_reference(self) -> usize {
        match self {
            Self::Match | Self::Mismatch | Self::Deletion => 1,
            Self::Insertion => 0,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Match => "=",
                Self::Mismatch => "X",
                Self::Insertion => "I",
                Self::Deletion => "D",
            }
        )
    }
}

/// A run of identical steps, one element of a CIGAR like description of an alignment
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct CigarOp {
    /// The type of step
    pub step: Step,
    /// The number of times this step is repeated
    pub count: usize,
}

impl CigarOp {
    /// Run length encode a path
    pub(crate) fn encode(path: &[Step]) -> Vec<Self> {
        path.iter()
            .chunk_by(|s| **s)
            .into_iter()
            .map(|(step, run)| Self {
                step,
                count: run.count(),
            })
            .collect()
    }

    /// Create a CIGAR like string from a list of runs, eg `4=1D2=`
    pub(crate) fn short(cigar: &[Self]) -> String {
        cigar.iter().map(|op| format!("{}{}", op.count, op.step)).collect()
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn encode() {
        let path = [
            Step::Match,
            Step::Match,
            Step::Deletion,
            Step::Mismatch,
            Step::Match,
            Step::Insertion,
            Step::Insertion,
        ];
        let cigar = CigarOp::encode(&path);
        assert_eq!(cigar.len(), 5);
        assert_eq!(CigarOp::short(&cigar), "2=1D1X1=2I");
        assert_eq!(CigarOp::short(&CigarOp::encode(&[])), "");
    }
}
