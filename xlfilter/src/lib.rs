#![doc = include_str!("../README.md")]

mod config;
mod crosslink;
mod distance;
mod fdr;
mod filter;
mod meta;
pub mod predicates;

pub use config::{FilterConfig, Range};
pub use crosslink::{Crosslink, Dataset, LinkEnd, LinkType, Match, MatchRef, Protein};
pub use distance::{AlignedStructure, DistanceProvider, NoDistances};
pub use fdr::{DecoyTotals, FDR_EPSILON, FdrClass, FdrResult, compute_fdr, rms_link_score};
pub use filter::{FilterSession, FilteredSets, filter_dataset};
pub use meta::{FDR, LINK_SCORE, MetaData, MetaValue};

/// The types and functions that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::{
        Crosslink, Dataset, DistanceProvider, FilterConfig, FilterSession, FilteredSets,
        LinkEnd, LinkType, Match, Protein, Range, compute_fdr, filter_dataset,
    };
    pub use xlalign::parse_json::ParseJson;
}

#[cfg(test)]
use proptest as _;
