//! The individual checks a match or crosslink has to pass. All are pure functions of the
//! configuration and the data so they can be combined freely by the filter pass.
use indexmap::IndexMap;

use crate::{Crosslink, DistanceProvider, FilterConfig, LinkType, Match, Protein};

/// The kind of link, ambiguity, homomultimer, residue separation, and peptide length checks. A
/// match supporting several crosslinks passes if any of its crosslinks is of an allowed kind.
pub fn subset_filter(config: &FilterConfig, m: &Match, crosslinks: &[Crosslink]) -> bool {
    if !config.ambig && m.is_ambiguous() {
        return false;
    }
    if m.peptides.iter().any(|p| p.len() < config.pep_length) {
        return false;
    }
    match m.link_type {
        LinkType::Linear => config.linears,
        LinkType::Mono => config.monolinks,
        LinkType::Crosslink => {
            if !config.crosslinks || (m.confirmed_homomultimer && !config.homomultimeric_links) {
                return false;
            }
            m.crosslinks
                .iter()
                .filter_map(|i| crosslinks.get(*i))
                .any(|link| {
                    if link.is_between_link() {
                        config.between_links
                    } else {
                        config.self_links
                            && (m.confirmed_homomultimer
                                || link
                                    .residue_separation()
                                    .is_none_or(|s| s >= config.aa_apart))
                    }
                })
        }
    }
}

/// Manual validation status, unvalidated matches always pass
pub fn validation_filter(config: &FilterConfig, m: &Match) -> bool {
    match m.validated {
        None => true,
        Some(true) => config.pass,
        Some(false) => config.fail,
    }
}

/// Match score range, unscored matches always pass
pub fn score_filter(config: &FilterConfig, m: &Match) -> bool {
    m.score
        .is_none_or(|score| config.match_score_cutoff.contains(score))
}

/// Target and decoy toggles
pub const fn decoy_filter(config: &FilterConfig, m: &Match) -> bool {
    if m.is_decoy {
        config.decoys
    } else {
        config.targets
    }
}

/// Free text searches on proteins, peptides, run name, and the scan number
pub fn navigation_filter(
    config: &FilterConfig,
    m: &Match,
    crosslink: &Crosslink,
    proteins: &IndexMap<String, Protein>,
) -> bool {
    if !config.protein_names.is_empty() {
        let needle = config.protein_names.to_lowercase();
        let found = crosslink.proteins().any(|id| {
            id.to_lowercase().contains(&needle)
                || proteins.get(id).is_some_and(|p| {
                    p.name.to_lowercase().contains(&needle)
                        || p.description.to_lowercase().contains(&needle)
                })
        });
        if !found {
            return false;
        }
    }
    if !config.pep_seq.is_empty() {
        let peptides = m.peptides.iter().map(|p| p.to_uppercase()).collect::<Vec<_>>();
        let found = config
            .pep_seq
            .to_uppercase()
            .split('-')
            .filter(|part| !part.is_empty())
            .all(|part| peptides.iter().any(|p| p.contains(part)));
        if !found {
            return false;
        }
    }
    if !config.run_name.is_empty()
        && !m
            .run_name
            .as_ref()
            .is_some_and(|r| r.to_lowercase().contains(&config.run_name.to_lowercase()))
    {
        return false;
    }
    config.scan_number.is_none_or(|scan| m.scan_number == Some(scan))
}

/// Selected search groups
pub fn group_filter(config: &FilterConfig, m: &Match) -> bool {
    config.groups.is_empty()
        || m
            .search_group
            .as_ref()
            .is_some_and(|g| config.groups.contains(g))
}

/// Distance range, crosslinks without known distance always pass
pub fn distance_filter(
    config: &FilterConfig,
    crosslink: &Crosslink,
    distances: &dyn DistanceProvider,
) -> bool {
    config.distance_cutoff.is_unbounded()
        || distances
            .distance(crosslink)
            .is_none_or(|d| config.distance_cutoff.contains(d))
}

/// Structure coverage, when turned on all linked residues have to be covered
pub fn pdb_filter(
    config: &FilterConfig,
    crosslink: &Crosslink,
    distances: &dyn DistanceProvider,
) -> bool {
    !config.pdb
        || crosslink
            .ends()
            .all(|end| distances.residue_covered(&end.protein, end.residue))
}
