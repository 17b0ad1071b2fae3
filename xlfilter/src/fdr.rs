use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Crosslink, FDR, LINK_SCORE, Match};

/// The score cutoff used when there is nothing to base a cutoff on
pub const FDR_EPSILON: f64 = 0.001;

/// The classes the FDR is estimated for separately
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FdrClass {
    /// Crosslinks between different proteins
    Inter,
    /// Self links, linear peptides, and mono links
    Intra,
}

impl FdrClass {
    /// The class of a crosslink
    pub fn of(crosslink: &Crosslink) -> Self {
        if crosslink.is_between_link() {
            Self::Inter
        } else {
            Self::Intra
        }
    }

    /// The position of this class in the result of [`compute_fdr`]
    pub const fn index(self) -> usize {
        match self {
            Self::Inter => 0,
            Self::Intra => 1,
        }
    }
}

impl std::fmt::Display for FdrClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Inter => "Inter",
                Self::Intra => "Intra",
            }
        )
    }
}

/// The number of links per decoy composition
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct DecoyTotals {
    /// Target-target
    pub tt: usize,
    /// Target-decoy (or decoy-target)
    pub td: usize,
    /// Decoy-decoy
    pub dd: usize,
    /// Links without positive score, not counted
    pub ignored: usize,
}

impl DecoyTotals {
    fn add(&mut self, decoy_class: u8) {
        match decoy_class {
            0 => self.tt += 1,
            1 => self.td += 1,
            _ => self.dd += 1,
        }
    }

    fn subtract(&mut self, decoy_class: u8) {
        match decoy_class {
            0 => self.tt = self.tt.saturating_sub(1),
            1 => self.td = self.td.saturating_sub(1),
            _ => self.dd = self.dd.saturating_sub(1),
        }
    }

    /// `(td - dd) / max(tt, 1)`
    pub fn fdr(&self) -> f64 {
        (self.td as f64 - self.dd as f64) / self.tt.max(1) as f64
    }

    /// Check if no link was counted
    pub const fn is_empty(&self) -> bool {
        self.tt == 0 && self.td == 0 && self.dd == 0
    }
}

/// The FDR estimate for one class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FdrResult {
    /// The class
    pub class: FdrClass,
    /// The first position (in ascending score order) where the FDR is at most the threshold, the
    /// last position if it never is
    pub cutoff_index: usize,
    /// Links of this class with at least this score pass, the score of the link just before
    /// [`Self::cutoff_index`]
    pub fdr_score_cutoff: f64,
    /// The decoy composition of the whole class
    pub totals: DecoyTotals,
    /// If the FDR threshold could be reached
    pub threshold_met: bool,
    /// The monotone FDR for every link in ascending score order
    pub curve: Vec<f64>,
}

impl FdrResult {
    fn empty(class: FdrClass, totals: DecoyTotals) -> Self {
        Self {
            class,
            cutoff_index: 0,
            fdr_score_cutoff: FDR_EPSILON,
            totals,
            threshold_met: false,
            curve: Vec::new(),
        }
    }

    /// The label of the class
    pub fn label(&self) -> String {
        self.class.to_string()
    }

    /// Check if a link score passes the cutoff
    pub fn passes(&self, link_score: f64) -> bool {
        link_score > 0.0 && link_score >= self.fdr_score_cutoff
    }
}

/// The root mean square of the scores of the supporting matches accepted by `accept`, 0 if there
/// are none.
pub fn rms_link_score(
    crosslink: &Crosslink,
    matches: &[Match],
    accept: impl Fn(&Match) -> bool,
) -> f64 {
    let scores = crosslink
        .matches_pp
        .iter()
        .filter_map(|m| matches.get(m.match_index))
        .filter(|m| accept(m))
        .filter_map(|m| m.score)
        .collect_vec();
    if scores.is_empty() {
        0.0
    } else {
        (scores.iter().map(|s| s * s).sum::<f64>() / scores.len() as f64).sqrt()
    }
}

/// Estimate the target-decoy FDR for the inter and intra protein crosslinks. Every crosslink gets
/// its score stored as [`LINK_SCORE`] and its FDR as [`FDR`] in its metadata. When
/// `filter_linears` is set linear links are left out and lose both values.
///
/// The results are in the order of [`FdrClass::index`]. Without threshold, or for an empty class,
/// the cutoff index is 0 and the score cutoff [`FDR_EPSILON`].
pub fn compute_fdr(
    crosslinks: &mut [Crosslink],
    score: impl Fn(&Crosslink) -> f64,
    threshold: Option<f64>,
    filter_linears: bool,
) -> [FdrResult; 2] {
    let mut classes: [Vec<(usize, f64)>; 2] = [Vec::new(), Vec::new()];
    for (index, crosslink) in crosslinks.iter_mut().enumerate() {
        if filter_linears && crosslink.is_linear_link() {
            crosslink.meta.remove(LINK_SCORE);
            crosslink.meta.remove(FDR);
            continue;
        }
        let link_score = score(crosslink);
        crosslink.meta.set(LINK_SCORE, link_score);
        classes[FdrClass::of(crosslink).index()].push((index, link_score));
    }

    let [inter, intra] = classes;
    [
        estimate(FdrClass::Inter, inter, crosslinks, threshold),
        estimate(FdrClass::Intra, intra, crosslinks, threshold),
    ]
}

fn estimate(
    class: FdrClass,
    mut links: Vec<(usize, f64)>,
    crosslinks: &mut [Crosslink],
    threshold: Option<f64>,
) -> FdrResult {
    links.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut totals = DecoyTotals::default();
    for (index, link_score) in &links {
        if *link_score > 0.0 {
            totals.add(crosslinks[*index].decoy_class());
        } else {
            totals.ignored += 1;
        }
    }

    if links.is_empty() {
        return FdrResult::empty(class, totals);
    }

    // Walk from the lowest score up, each FDR is over the links with at least that score
    let mut remaining = totals;
    let mut curve = Vec::with_capacity(links.len());
    let mut lowest = f64::INFINITY;
    for (index, link_score) in &links {
        lowest = lowest.min(remaining.fdr());
        curve.push(lowest);
        if *link_score > 0.0 {
            remaining.subtract(crosslinks[*index].decoy_class());
        }
    }

    for ((index, _), fdr) in links.iter().zip(&curve) {
        crosslinks[*index].meta.set(FDR, *fdr);
    }

    let Some(threshold) = threshold else {
        return FdrResult {
            curve,
            ..FdrResult::empty(class, totals)
        };
    };

    let cutoff_index = curve
        .iter()
        .position(|fdr| *fdr <= threshold)
        .unwrap_or(links.len() - 1);
    let fdr_score_cutoff = if totals.is_empty() {
        FDR_EPSILON
    } else {
        links[cutoff_index.saturating_sub(1)].1
    };
    let threshold_met = curve.last().is_some_and(|fdr| *fdr <= threshold);

    debug!(
        %class,
        tt = totals.tt,
        td = totals.td,
        dd = totals.dd,
        ignored = totals.ignored,
        cutoff_index,
        fdr_score_cutoff,
        threshold_met,
        "estimated FDR"
    );

    FdrResult {
        class,
        cutoff_index,
        fdr_score_cutoff,
        totals,
        threshold_met,
        curve,
    }
}
