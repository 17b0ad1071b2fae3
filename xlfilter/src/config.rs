use context_error::{BasicKind, BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};
use xlalign::parse_json::{ParseJson, use_serde};

/// An inclusive numeric range, a missing bound is unbounded on that side
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    /// Lower bound
    pub min: Option<f64>,
    /// Upper bound
    pub max: Option<f64>,
}

impl Range {
    /// A range with both bounds
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Check if the value falls within this range
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Check if neither side is bounded
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// All settings deciding which crosslinks and matches are shown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Show matches of crosslinked peptides.
    ///
    /// Default: true.
    pub crosslinks: bool,
    /// Show matches of linear peptides.
    ///
    /// Default: true.
    pub linears: bool,
    /// Show matches of mono linked peptides.
    ///
    /// Default: true.
    pub monolinks: bool,
    /// Show crosslinks within one protein.
    ///
    /// Default: true.
    pub self_links: bool,
    /// Show crosslinks between different proteins.
    ///
    /// Default: true.
    pub between_links: bool,
    /// Show matches that can be assigned to more than one crosslink.
    ///
    /// Default: true.
    pub ambig: bool,
    /// Show matches that can only be explained by two copies of the same protein.
    ///
    /// Default: true.
    pub homomultimeric_links: bool,
    /// The minimal separation of the residues of a self link, homomultimeric links are exempt.
    ///
    /// Default: 0.
    pub aa_apart: usize,
    /// The minimal length of every peptide of a match.
    ///
    /// Default: 1.
    pub pep_length: usize,
    /// The allowed match scores.
    ///
    /// Default: unbounded.
    pub match_score_cutoff: Range,
    /// The allowed crosslink distances, crosslinks without known distance always pass.
    ///
    /// Default: unbounded.
    pub distance_cutoff: Range,
    /// Filter crosslinks on their estimated FDR instead of on their matches.
    ///
    /// Default: false.
    pub fdr_mode: bool,
    /// The FDR threshold in FDR mode.
    ///
    /// Default: 0.05.
    pub fdr_threshold: Option<f64>,
    /// Show decoy matches.
    ///
    /// Default: true.
    pub decoys: bool,
    /// Show target matches.
    ///
    /// Default: true.
    pub targets: bool,
    /// Show matches validated as correct, unvalidated matches always show.
    ///
    /// Default: true.
    pub pass: bool,
    /// Show matches validated as incorrect.
    ///
    /// Default: true.
    pub fail: bool,
    /// Only show crosslinks with all residues covered by the loaded structure.
    ///
    /// Default: false.
    pub pdb: bool,
    /// Case insensitive text to find in the name, description, or identifier of any protein of a
    /// crosslink, empty to skip.
    ///
    /// Default: empty.
    pub protein_names: String,
    /// Case insensitive text to find in the peptides of a match, `-` separates the texts for
    /// both peptides, empty to skip.
    ///
    /// Default: empty.
    pub pep_seq: String,
    /// Case insensitive text to find in the run name, empty to skip.
    ///
    /// Default: empty.
    pub run_name: String,
    /// The scan number.
    ///
    /// Default: None.
    pub scan_number: Option<u64>,
    /// The search groups to show, empty for all.
    ///
    /// Default: empty.
    pub groups: Vec<String>,
    /// Show crosslinks supported by matches from more than one search group.
    ///
    /// Default: true.
    pub multiple_group: bool,
    /// The minimal number of unique residue pairs per protein pair, 1 or lower to skip.
    ///
    /// Default: 1.
    pub urp_ppi: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            crosslinks: true,
            linears: true,
            monolinks: true,
            self_links: true,
            between_links: true,
            ambig: true,
            homomultimeric_links: true,
            aa_apart: 0,
            pep_length: 1,
            match_score_cutoff: Range::default(),
            distance_cutoff: Range::default(),
            fdr_mode: false,
            fdr_threshold: Some(0.05),
            decoys: true,
            targets: true,
            pass: true,
            fail: true,
            pdb: false,
            protein_names: String::new(),
            pep_seq: String::new(),
            run_name: String::new(),
            scan_number: None,
            groups: Vec::new(),
            multiple_group: true,
            urp_ppi: 1,
        }
    }
}

impl FilterConfig {
    /// Check the ranges and threshold.
    /// # Errors
    /// If a range has its minimum above its maximum or the FDR threshold lies outside of 0..=1.
    pub fn validate(&self) -> Result<(), BoxedError<'static, BasicKind>> {
        for (name, range) in [
            ("match_score_cutoff", self.match_score_cutoff),
            ("distance_cutoff", self.distance_cutoff),
        ] {
            if let (Some(min), Some(max)) = (range.min, range.max)
                && min > max
            {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Invalid filter range",
                    format!("The minimum of {name} is bigger than its maximum"),
                    Context::show(format!("{min} > {max}")),
                ));
            }
        }
        if let Some(threshold) = self.fdr_threshold
            && !(0.0..=1.0).contains(&threshold)
        {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid FDR threshold",
                "The FDR threshold has to be between 0 and 1",
                Context::show(threshold.to_string()),
            ));
        }
        Ok(())
    }
}

impl ParseJson for FilterConfig {
    fn from_json_value(value: serde_json::Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        let config: Self = use_serde(value)?;
        config.validate()?;
        Ok(config)
    }
}
