#![doc = include_str!("../README.md")]

mod align_matrix;
mod align_type;
mod alignment;
mod features;
/// JSON parsing of the settings structures
pub mod parse_json;
mod piece;
mod protein;
mod ranges;
mod scoring;
mod sequence_model;
mod statistics;

pub use align_type::AlignMode;
pub use alignment::{AlignmentResult, align};
pub use features::Feature;
pub use piece::{CigarOp, Step};
pub use protein::{AddSequenceOptions, AlignmentSummary, ProteinAlignment, ProteinAlignments};
pub use ranges::{Block, merge_contiguous_ranges};
pub use scoring::{
    DEFAULT_K, DEFAULT_LAMBDA, MAX_SCORE, ScoringConfig, ScoringParameter, SubstitutionMatrix,
};
pub use sequence_model::SequenceModel;
pub use statistics::{AlignmentStatistics, DEFAULT_DB_LENGTH};

/// The types and functions that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::parse_json::ParseJson;
    pub use crate::{
        AddSequenceOptions, AlignMode, AlignmentResult, Block, ProteinAlignment,
        ProteinAlignments, ScoringConfig, ScoringParameter, SequenceModel, SubstitutionMatrix,
        align,
    };
}

#[cfg(test)]
use proptest as _;
