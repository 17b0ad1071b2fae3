#![allow(clippy::missing_panics_doc)]
//! Integration tests for full filter passes
use xlalign::ProteinAlignments;
use xlfilter::prelude::*;
use xlfilter::{AlignedStructure, LINK_SCORE, MatchRef, Range};

fn between(dataset: &mut Dataset, id: &str, a: (&str, usize), b: (&str, usize)) -> usize {
    dataset.add_crosslink(Crosslink::crosslink(
        id,
        LinkEnd::new(a.0, a.1),
        LinkEnd::new(b.0, b.1),
    ))
}

fn scored(id: &str, score: f64) -> Match {
    Match::new(id, Some(score), &["PEPKTIDE", "LKAR"])
}

fn dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.add_protein(Protein::new("A", "Alpha"));
    dataset.add_protein(Protein::new("B", "Beta"));
    dataset
}

fn filtered(dataset: &Dataset) -> Vec<Vec<MatchRef>> {
    dataset
        .crosslinks
        .iter()
        .map(|l| l.filtered_matches_pp.clone())
        .collect()
}

#[test]
fn idempotent() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    let y = between(&mut dataset, "y", ("A", 5), ("A", 7));
    dataset.add_match(scored("m1", 5.0), &[x, y]);
    dataset.add_match(scored("m2", 1.0), &[x]);
    let config = FilterConfig {
        match_score_cutoff: Range {
            min: Some(2.0),
            max: None,
        },
        ..FilterConfig::default()
    };
    let first = filter_dataset(&mut dataset, Some(&config), None);
    let first_filtered = filtered(&dataset);
    let second = filter_dataset(&mut dataset, Some(&config), None);
    assert_eq!(first, second);
    assert_eq!(first_filtered, filtered(&dataset));
    assert_eq!(dataset.crosslinks[x].filtered_matches_pp.len(), 1);
}

/// Ambiguity is decided before the navigation filters
#[test]
fn ambiguity() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    let y = between(&mut dataset, "y", ("A", 5), ("B", 12));
    let mut m1 = scored("m1", 5.0);
    m1.scan_number = Some(1);
    let mut m2 = scored("m2", 5.0);
    m2.scan_number = Some(2);
    dataset.add_match(m1, &[x, y]);
    dataset.add_match(m2, &[x]);

    filter_dataset(&mut dataset, Some(&FilterConfig::default()), None);
    assert!(!dataset.crosslinks[x].ambiguous);
    assert!(dataset.crosslinks[y].ambiguous);

    let config = FilterConfig {
        scan_number: Some(1),
        ..FilterConfig::default()
    };
    filter_dataset(&mut dataset, Some(&config), None);
    assert_eq!(dataset.crosslinks[x].filtered_matches_pp.len(), 1);
    assert_eq!(dataset.crosslinks[x].filtered_matches_pp[0].match_index, 0);
    assert!(!dataset.crosslinks[x].ambiguous);

    let config = FilterConfig {
        ambig: false,
        ..FilterConfig::default()
    };
    let sets = filter_dataset(&mut dataset, Some(&config), None);
    assert_eq!(sets.all, vec![x]);
    assert!(dataset.crosslinks[y].ambiguous);
}

#[test]
fn unique_residue_pairs() {
    let mut dataset = dataset();
    for (i, residue) in [5, 6, 7].into_iter().enumerate() {
        let link = between(&mut dataset, &format!("l{i}"), ("A", residue), ("B", residue + 5));
        dataset.add_match(scored(&format!("m{i}"), 5.0), &[link]);
    }
    let config = FilterConfig {
        urp_ppi: 2,
        ..FilterConfig::default()
    };
    assert_eq!(filter_dataset(&mut dataset, Some(&config), None).all.len(), 3);

    // The same residue pair in the other direction does not count as a new pair
    let duplicate = between(&mut dataset, "dup", ("B", 10), ("A", 5));
    dataset.add_match(scored("m3", 5.0), &[duplicate]);
    assert_eq!(filter_dataset(&mut dataset, Some(&config), None).all.len(), 4);

    let mut single = self::dataset();
    let a = between(&mut single, "a", ("A", 5), ("B", 10));
    let b = between(&mut single, "b", ("B", 10), ("A", 5));
    single.add_match(scored("m0", 5.0), &[a]);
    single.add_match(scored("m1", 5.0), &[b]);
    assert!(filter_dataset(&mut single, Some(&config), None).all.is_empty());
    assert!(single.crosslinks.iter().all(|l| l.filtered_matches_pp.is_empty()));
    let unchecked = FilterConfig::default();
    assert_eq!(filter_dataset(&mut single, Some(&unchecked), None).all.len(), 2);
}

#[test]
fn multiple_groups() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    for group in ["g1", "g2"] {
        let mut m = scored(group, 5.0);
        m.search_group = Some(group.to_string());
        dataset.add_match(m, &[x]);
    }
    let config = FilterConfig {
        multiple_group: false,
        ..FilterConfig::default()
    };
    assert!(filter_dataset(&mut dataset, Some(&config), None).all.is_empty());
    let config = FilterConfig {
        multiple_group: false,
        groups: vec!["g1".to_string()],
        ..FilterConfig::default()
    };
    assert_eq!(filter_dataset(&mut dataset, Some(&config), None).all, vec![x]);
    assert_eq!(
        filter_dataset(&mut dataset, Some(&FilterConfig::default()), None).all,
        vec![x]
    );
}

#[test]
fn homomultimer() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("A", 5));
    let mut m = scored("m", 5.0);
    m.confirmed_homomultimer = true;
    dataset.add_match(m, &[x]);
    filter_dataset(&mut dataset, Some(&FilterConfig::default()), None);
    assert!(dataset.crosslinks[x].confirmed_homomultimer);
    let config = FilterConfig {
        homomultimeric_links: false,
        ..FilterConfig::default()
    };
    filter_dataset(&mut dataset, Some(&config), None);
    assert!(!dataset.crosslinks[x].confirmed_homomultimer);
}

#[test]
fn pass_through_without_config() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    let mut m = scored("m", 5.0);
    m.is_decoy = true;
    dataset.add_match(m, &[x]);
    between(&mut dataset, "empty", ("A", 1), ("B", 1));
    let sets = filter_dataset(&mut dataset, None, None);
    assert_eq!(sets.all, vec![x]);
    assert_eq!(dataset.crosslinks[x].filtered_matches_pp, dataset.crosslinks[x].matches_pp);
}

#[test]
fn hidden_and_distance() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    let y = between(&mut dataset, "y", ("A", 5), ("A", 50));
    dataset.add_match(scored("m0", 5.0), &[x]);
    dataset.add_match(scored("m1", 5.0), &[y]);

    let alignments = ProteinAlignments::new();
    let mut structure = AlignedStructure::new(&alignments);
    structure.set_distance("y", 42.0);
    let config = FilterConfig {
        distance_cutoff: Range::new(0.0, 30.0),
        ..FilterConfig::default()
    };
    let sets = filter_dataset(&mut dataset, Some(&config), Some(&structure));
    assert_eq!(sets.all, vec![x]);

    if let Some(b) = dataset.proteins.get_mut("B") {
        b.hidden = true;
    }
    let sets = filter_dataset(&mut dataset, Some(&FilterConfig::default()), None);
    assert_eq!(sets.all, vec![y]);
}

#[test]
fn fdr_mode() {
    let mut dataset = dataset();
    dataset.add_protein(Protein::decoy("REV_B", "Beta decoy"));
    for i in 0..10 {
        let (partner, score) = if i < 2 {
            ("REV_B", i as f64 + 1.0)
        } else {
            ("B", i as f64 + 1.0)
        };
        let link = between(&mut dataset, &format!("l{i}"), ("A", i + 1), (partner, i + 1));
        let mut m = scored(&format!("m{i}"), score);
        m.is_decoy = partner == "REV_B";
        dataset.add_match(m, &[link]);
    }
    let config = FilterConfig::from_json(r#"{"fdr_mode": true, "fdr_threshold": 0.05}"#).unwrap();
    let sets = filter_dataset(&mut dataset, Some(&config), None);

    let fdr = sets.fdr_for(xlfilter::FdrClass::Inter).unwrap();
    assert_eq!(fdr.cutoff_index, 2);
    assert_eq!(fdr.fdr_score_cutoff, 2.0);
    assert_eq!(sets.all.len(), 9);
    assert_eq!(sets.targets.len(), 8);
    assert_eq!(sets.decoys_td, vec![1]);
    assert!(!dataset.matches[0].fdr_pass);
    assert!(dataset.matches[1..].iter().all(|m| m.fdr_pass));
    assert_eq!(dataset.crosslinks[4].meta.get_number(LINK_SCORE), Some(5.0));

    // Match filtering again resets the FDR pass flags
    let sets = filter_dataset(&mut dataset, Some(&FilterConfig::default()), None);
    assert_eq!(sets.decoys_td.len(), 2);
    assert!(dataset.matches.iter().all(|m| !m.fdr_pass));
}

#[test]
fn session() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    dataset.add_match(scored("m", 5.0), &[x]);
    let session = FilterSession::new(dataset);
    let config = FilterConfig::default();
    let results = std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| scope.spawn(|| session.refilter(Some(&config), None).unwrap()))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert!(results.iter().all(|r| r.all == vec![x]));
    session
        .with_dataset_mut(|d| {
            let y = between(d, "y", ("A", 1), ("B", 1));
            d.add_match(scored("n", 2.0), &[y]);
        })
        .unwrap();
    assert_eq!(session.refilter(Some(&config), None).unwrap().all.len(), 2);
    assert_eq!(session.with_dataset(|d| d.matches.len()).unwrap(), 2);
    assert_eq!(session.into_inner().unwrap().crosslinks.len(), 2);
}

/// A supporting match reference without a match behind it never passes
#[test]
fn dangling_match_reference() {
    let mut dataset = dataset();
    let x = between(&mut dataset, "x", ("A", 5), ("B", 10));
    dataset.crosslinks[x].matches_pp.push(MatchRef {
        match_index: 5,
        pep_pos: Vec::new(),
    });
    let sets = filter_dataset(&mut dataset, Some(&FilterConfig::default()), None);
    assert!(sets.all.is_empty());
    assert!(dataset.crosslinks[x].ambiguous);

    dataset.add_match(scored("m", 5.0), &[x]);
    let sets = filter_dataset(&mut dataset, Some(&FilterConfig::default()), None);
    assert_eq!(sets.all, vec![x]);
    assert_eq!(dataset.crosslinks[x].filtered_matches_pp.len(), 1);

    let config = FilterConfig {
        fdr_mode: true,
        multiple_group: false,
        ..FilterConfig::default()
    };
    let sets = filter_dataset(&mut dataset, Some(&config), None);
    assert_eq!(sets.all, vec![x]);
    assert!(dataset.matches[0].fdr_pass);
}
