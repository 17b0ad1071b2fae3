use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use context_error::{BasicKind, BoxedError, Context, CreateError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Crosslink, Dataset, DistanceProvider, FdrClass, FdrResult, FilterConfig, LINK_SCORE, LinkType,
    MatchRef, NoDistances, compute_fdr, predicates::*, rms_link_score,
};

/// The crosslinks (by index) that pass the filter, split up the way the views count them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredSets {
    /// All passing crosslinks
    pub all: Vec<usize>,
    /// Passing target crosslinks and mono links
    pub targets: Vec<usize>,
    /// Passing linear peptides, target and decoy
    pub linears: Vec<usize>,
    /// Passing target linear peptides
    pub linear_targets: Vec<usize>,
    /// Passing crosslinks with one decoy end
    pub decoys_td: Vec<usize>,
    /// Passing crosslinks with two decoy ends
    pub decoys_dd: Vec<usize>,
    /// The FDR estimates, only in FDR mode
    pub fdr: Option<[FdrResult; 2]>,
}

impl FilteredSets {
    fn partition(crosslinks: &[Crosslink], fdr: Option<[FdrResult; 2]>) -> Self {
        let mut sets = Self {
            fdr,
            ..Self::default()
        };
        for (index, link) in crosslinks.iter().enumerate() {
            if link.filtered_matches_pp.is_empty() {
                continue;
            }
            sets.all.push(index);
            if link.is_linear_link() {
                sets.linears.push(index);
                if !link.is_decoy_link() {
                    sets.linear_targets.push(index);
                }
                continue;
            }
            match link.decoy_class() {
                0 => sets.targets.push(index),
                1 => sets.decoys_td.push(index),
                _ => sets.decoys_dd.push(index),
            }
        }
        sets
    }

    /// The FDR estimate for a class, if in FDR mode
    pub fn fdr_for(&self, class: FdrClass) -> Option<&FdrResult> {
        self.fdr.as_ref().map(|r| &r[class.index()])
    }
}

/// Run one full filter pass over the dataset. Sets [`Crosslink::filtered_matches_pp`],
/// [`Crosslink::ambiguous`], and [`Crosslink::confirmed_homomultimer`] on every crosslink, in FDR
/// mode also [`crate::Match::fdr_pass`] on every match and the link score and FDR metadata on
/// every crosslink.
///
/// Without configuration nothing is filtered, every crosslink passes with all of its matches.
/// Without distance provider no distances are known and no residue is covered by a structure.
pub fn filter_dataset(
    dataset: &mut Dataset,
    config: Option<&FilterConfig>,
    distances: Option<&dyn DistanceProvider>,
) -> FilteredSets {
    let Some(config) = config else {
        warn!(
            crosslinks = dataset.crosslinks.len(),
            "no filter configuration, all crosslinks pass unfiltered"
        );
        for link in &mut dataset.crosslinks {
            link.filtered_matches_pp.clone_from(&link.matches_pp);
            link.ambiguous = false;
        }
        return FilteredSets::partition(&dataset.crosslinks, None);
    };
    let distances = distances.unwrap_or(&NoDistances);

    for m in &mut dataset.matches {
        m.fdr_pass = false;
    }

    let fdr = config.fdr_mode.then(|| score_and_partition(dataset, config));
    filter_crosslinks(dataset, config, distances, fdr.as_ref());
    recalculate_homomultimers(dataset);
    if !config.multiple_group {
        multiple_group_filter(dataset);
    }
    if config.urp_ppi > 1 {
        unique_residue_pairs_filter(&mut dataset.crosslinks, config.urp_ppi);
    }

    let sets = FilteredSets::partition(&dataset.crosslinks, fdr);
    info!(
        fdr_mode = config.fdr_mode,
        all = sets.all.len(),
        targets = sets.targets.len(),
        linears = sets.linears.len(),
        decoys_td = sets.decoys_td.len(),
        decoys_dd = sets.decoys_dd.len(),
        "filtered crosslinks"
    );
    sets
}

/// Score every crosslink on its matches that pass the subset filter and estimate the FDR
fn score_and_partition(dataset: &mut Dataset, config: &FilterConfig) -> [FdrResult; 2] {
    let scores: HashMap<String, f64> = dataset
        .crosslinks
        .iter()
        .map(|link| {
            let score = rms_link_score(link, &dataset.matches, |m| {
                subset_filter(config, m, &dataset.crosslinks)
            });
            (link.id.clone(), score)
        })
        .collect();
    compute_fdr(
        &mut dataset.crosslinks,
        |link| scores.get(&link.id).copied().unwrap_or_default(),
        config.fdr_threshold,
        !config.linears,
    )
}

/// The per crosslink filter: first the match level checks that decide ambiguity, then the
/// navigation and group checks, then the crosslink level checks.
fn filter_crosslinks(
    dataset: &mut Dataset,
    config: &FilterConfig,
    distances: &dyn DistanceProvider,
    fdr: Option<&[FdrResult; 2]>,
) {
    for index in 0..dataset.crosslinks.len() {
        let link = &dataset.crosslinks[index];
        let passing: Vec<MatchRef> = if let Some(fdr) = fdr {
            let cutoff = &fdr[FdrClass::of(link).index()];
            if link
                .meta
                .get_number(LINK_SCORE)
                .is_some_and(|score| cutoff.passes(score))
            {
                link.matches_pp
                    .iter()
                    .filter(|r| {
                        dataset
                            .matches
                            .get(r.match_index)
                            .is_some_and(|m| subset_filter(config, m, &dataset.crosslinks))
                    })
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            }
        } else {
            link.matches_pp
                .iter()
                .filter(|r| {
                    dataset.matches.get(r.match_index).is_some_and(|m| {
                        subset_filter(config, m, &dataset.crosslinks)
                            && validation_filter(config, m)
                            && score_filter(config, m)
                            && decoy_filter(config, m)
                    })
                })
                .cloned()
                .collect()
        };

        let ambiguous = !passing
            .iter()
            .filter_map(|r| dataset.matches.get(r.match_index))
            .any(|m| m.crosslinks.len() == 1);
        let visible = !dataset.is_hidden(link)
            && distance_filter(config, link, distances)
            && pdb_filter(config, link, distances);
        let filtered: Vec<MatchRef> = if visible {
            passing
                .iter()
                .filter(|r| {
                    dataset.matches.get(r.match_index).is_some_and(|m| {
                        navigation_filter(config, m, link, &dataset.proteins)
                            && group_filter(config, m)
                    })
                })
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        if fdr.is_some() {
            for r in &passing {
                if let Some(m) = dataset.matches.get_mut(r.match_index) {
                    m.fdr_pass = true;
                }
            }
        }
        let link = &mut dataset.crosslinks[index];
        link.ambiguous = ambiguous;
        link.filtered_matches_pp = filtered;
    }
}

/// A self link is a confirmed homomultimer if any of its passing matches says so
fn recalculate_homomultimers(dataset: &mut Dataset) {
    let Dataset {
        matches,
        crosslinks,
        ..
    } = dataset;
    for link in crosslinks {
        link.confirmed_homomultimer = link.is_self_link()
            && link
                .filtered_matches_pp
                .iter()
                .filter_map(|r| matches.get(r.match_index))
                .any(|m| m.confirmed_homomultimer);
    }
}

/// Remove crosslinks supported by matches from more than one search group
fn multiple_group_filter(dataset: &mut Dataset) {
    let Dataset {
        matches,
        crosslinks,
        ..
    } = dataset;
    for link in crosslinks {
        let groups = link
            .filtered_matches_pp
            .iter()
            .filter_map(|r| matches.get(r.match_index))
            .map(|m| m.search_group.as_deref())
            .unique()
            .count();
        if groups > 1 {
            link.filtered_matches_pp.clear();
        }
    }
}

/// Remove all crosslinks of protein pairs with fewer than `threshold` distinct linked residue
/// pairs
fn unique_residue_pairs_filter(crosslinks: &mut [Crosslink], threshold: usize) {
    let mut unique: HashMap<(String, String), HashSet<((String, usize), (String, usize))>> =
        HashMap::new();
    for link in crosslinks.iter() {
        if link.link_type != LinkType::Crosslink || link.filtered_matches_pp.is_empty() {
            continue;
        }
        let (a, b) = link.protein_pair_key();
        let ((pa, ra), (pb, rb)) = link.residue_pair_key();
        unique
            .entry((a.to_string(), b.to_string()))
            .or_default()
            .insert(((pa.to_string(), ra), (pb.to_string(), rb)));
    }
    for link in crosslinks.iter_mut() {
        if link.link_type != LinkType::Crosslink {
            continue;
        }
        let (a, b) = link.protein_pair_key();
        let count = unique
            .get(&(a.to_string(), b.to_string()))
            .map_or(0, HashSet::len);
        if count < threshold {
            link.filtered_matches_pp.clear();
        }
    }
}

/// A dataset that can be refiltered from multiple threads, every filter pass is one critical
/// section so no pass observes the partial results of another
#[derive(Debug, Default)]
pub struct FilterSession {
    dataset: Mutex<Dataset>,
}

impl FilterSession {
    /// Wrap a dataset
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Mutex::new(dataset),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Dataset>, BoxedError<'static, BasicKind>> {
        self.dataset.lock().map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Dataset unavailable",
                "An earlier filter pass panicked while holding the dataset",
                Context::show(err.to_string()),
            )
        })
    }

    /// Run a filter pass, see [`filter_dataset`]
    /// # Errors
    /// If an earlier pass panicked while holding the dataset.
    pub fn refilter(
        &self,
        config: Option<&FilterConfig>,
        distances: Option<&dyn DistanceProvider>,
    ) -> Result<FilteredSets, BoxedError<'static, BasicKind>> {
        let mut dataset = self.lock()?;
        Ok(filter_dataset(&mut dataset, config, distances))
    }

    /// Read the dataset in between filter passes
    /// # Errors
    /// If an earlier pass panicked while holding the dataset.
    pub fn with_dataset<T>(
        &self,
        f: impl FnOnce(&Dataset) -> T,
    ) -> Result<T, BoxedError<'static, BasicKind>> {
        let dataset = self.lock()?;
        Ok(f(&dataset))
    }

    /// Change the dataset in between filter passes
    /// # Errors
    /// If an earlier pass panicked while holding the dataset.
    pub fn with_dataset_mut<T>(
        &self,
        f: impl FnOnce(&mut Dataset) -> T,
    ) -> Result<T, BoxedError<'static, BasicKind>> {
        let mut dataset = self.lock()?;
        Ok(f(&mut dataset))
    }

    /// Get the dataset back
    /// # Errors
    /// If an earlier pass panicked while holding the dataset.
    pub fn into_inner(self) -> Result<Dataset, BoxedError<'static, BasicKind>> {
        self.dataset.into_inner().map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Dataset unavailable",
                "An earlier filter pass panicked while holding the dataset",
                Context::show(err.to_string()),
            )
        })
    }
}
