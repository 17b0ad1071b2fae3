use serde::{Deserialize, Serialize};

/// The alignment behaviour, which flanks are allowed to stay unaligned.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub enum AlignMode {
    /// Both sequences are aligned end to end, gaps at the edges are penalised like any other gap
    #[default]
    Global,
    /// Only the best scoring part of both sequences is aligned, unaligned flanks are free
    Local,
    /// The comparison sequence is aligned end to end but the reference flanks are free apart from
    /// a fixed `gap_at_start` penalty
    SemiGlobal,
}

impl AlignMode {
    /// Build the mode from the local and semi local flags, local takes precedence
    pub const fn from_flags(local: bool, semi_local: bool) -> Self {
        if local {
            Self::Local
        } else if semi_local {
            Self::SemiGlobal
        } else {
            Self::Global
        }
    }
}

impl std::fmt::Display for AlignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Global => "Global",
                Self::Local => "Local",
                Self::SemiGlobal => "Semi-global",
            }
        )
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(AlignMode::from_flags(false, false), AlignMode::Global);
        assert_eq!(AlignMode::from_flags(true, true), AlignMode::Local);
        assert_eq!(AlignMode::from_flags(false, true), AlignMode::SemiGlobal);
        assert_eq!(AlignMode::SemiGlobal.to_string(), "Semi-global");
    }
}
