use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::MetaData;

/// A protein in the dataset
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Protein {
    /// The accession or other unique identifier
    pub id: String,
    /// The display name
    pub name: String,
    /// Free text description
    pub description: String,
    /// Decoy proteins are generated to estimate the FDR
    pub is_decoy: bool,
    /// Hidden proteins never show up in the filtered data
    pub hidden: bool,
}

impl Protein {
    /// A visible target protein
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// A visible decoy protein
    pub fn decoy(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_decoy: true,
            ..Self::new(id, name)
        }
    }
}

/// One end of a crosslink
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEnd {
    /// The protein identifier
    pub protein: String,
    /// The linked residue, 1-based
    pub residue: usize,
    /// If the protein is a decoy
    pub decoy: bool,
}

impl LinkEnd {
    /// A target end
    pub fn new(protein: impl Into<String>, residue: usize) -> Self {
        Self {
            protein: protein.into(),
            residue,
            decoy: false,
        }
    }
}

/// What kind of connection a crosslink or match represents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Two residues connected by a crosslinker
    #[default]
    Crosslink,
    /// A single peptide without crosslinker
    Linear,
    /// A crosslinker attached on one side only
    Mono,
}

/// A match supporting a crosslink together with the positions of its peptides in the proteins
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRef {
    /// The index of the match in [`Dataset::matches`]
    pub match_index: usize,
    /// The start of every peptide in its protein, 1-based
    pub pep_pos: Vec<usize>,
}

/// A residue to residue connection (or a linear/mono link) supported by one or more matches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crosslink {
    /// Unique identifier
    pub id: String,
    /// The first end, for linear peptides the protein and start residue
    pub from: LinkEnd,
    /// The second end, only present for crosslinks
    pub to: Option<LinkEnd>,
    /// The kind of link
    pub link_type: LinkType,
    /// All supporting matches
    pub matches_pp: Vec<MatchRef>,
    /// The supporting matches that pass the current filter
    pub filtered_matches_pp: Vec<MatchRef>,
    /// If none of the passing matches can be assigned to only this crosslink
    pub ambiguous: bool,
    /// If a passing match shows that this self link connects two copies of the same protein
    pub confirmed_homomultimer: bool,
    /// Extra values, amongst others the link score and FDR
    pub meta: MetaData,
}

impl Crosslink {
    fn new(id: impl Into<String>, from: LinkEnd, to: Option<LinkEnd>, link_type: LinkType) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            link_type,
            matches_pp: Vec::new(),
            filtered_matches_pp: Vec::new(),
            ambiguous: false,
            confirmed_homomultimer: false,
            meta: MetaData::default(),
        }
    }

    /// A crosslink between two residues
    pub fn crosslink(id: impl Into<String>, from: LinkEnd, to: LinkEnd) -> Self {
        Self::new(id, from, Some(to), LinkType::Crosslink)
    }

    /// A linear peptide
    pub fn linear(id: impl Into<String>, from: LinkEnd) -> Self {
        Self::new(id, from, None, LinkType::Linear)
    }

    /// A mono link
    pub fn mono(id: impl Into<String>, from: LinkEnd) -> Self {
        Self::new(id, from, None, LinkType::Mono)
    }

    /// A crosslink within one protein
    pub fn is_self_link(&self) -> bool {
        self.to.as_ref().is_some_and(|to| to.protein == self.from.protein)
    }

    /// A crosslink between different proteins
    pub fn is_between_link(&self) -> bool {
        self.to.as_ref().is_some_and(|to| to.protein != self.from.protein)
    }

    /// A linear peptide
    pub fn is_linear_link(&self) -> bool {
        self.link_type == LinkType::Linear
    }

    /// A mono link
    pub fn is_mono_link(&self) -> bool {
        self.link_type == LinkType::Mono
    }

    /// If any end lies on a decoy protein
    pub fn is_decoy_link(&self) -> bool {
        self.decoy_class() > 0
    }

    /// The number of decoy ends: 0 for target-target, 1 for target-decoy, 2 for decoy-decoy.
    /// Single sided links are 0 or 1.
    pub fn decoy_class(&self) -> u8 {
        u8::from(self.from.decoy) + u8::from(self.to.as_ref().is_some_and(|to| to.decoy))
    }

    /// The proteins involved
    pub fn proteins(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.from.protein.as_str())
            .chain(self.to.iter().map(|to| to.protein.as_str()))
    }

    /// The ends involved
    pub fn ends(&self) -> impl Iterator<Item = &LinkEnd> {
        std::iter::once(&self.from).chain(self.to.iter())
    }

    /// The unordered pair of proteins, the same for both directions of a link
    pub fn protein_pair_key(&self) -> (&str, &str) {
        let to = self.to.as_ref().map_or("", |to| to.protein.as_str());
        let from = self.from.protein.as_str();
        if from <= to { (from, to) } else { (to, from) }
    }

    /// The unordered pair of residues, the same for both directions of a link
    pub fn residue_pair_key(&self) -> ((&str, usize), (&str, usize)) {
        let from = (self.from.protein.as_str(), self.from.residue);
        let to = self
            .to
            .as_ref()
            .map_or(("", 0), |to| (to.protein.as_str(), to.residue));
        if from <= to { (from, to) } else { (to, from) }
    }

    /// The residue distance for self links
    pub fn residue_separation(&self) -> Option<usize> {
        self.to
            .as_ref()
            .filter(|_| self.is_self_link())
            .map(|to| to.residue.abs_diff(self.from.residue))
    }
}

/// A single spectrum match, supporting one or more crosslinks
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Match {
    /// Unique identifier
    pub id: String,
    /// The search engine score, if any
    pub score: Option<f64>,
    /// If any of the matched peptides is a decoy
    pub is_decoy: bool,
    /// The kind of match
    pub link_type: LinkType,
    /// The matched peptide sequences
    pub peptides: Vec<String>,
    /// The indices into [`Dataset::crosslinks`] of all crosslinks this match supports, more than
    /// one means the match is ambiguous
    pub crosslinks: Vec<usize>,
    /// The search (group) this match originates from
    pub search_group: Option<String>,
    /// The raw file
    pub run_name: Option<String>,
    /// The scan number
    pub scan_number: Option<u64>,
    /// Manual validation: `Some(true)` passed, `Some(false)` failed, `None` not validated
    pub validated: Option<bool>,
    /// If this match can only be explained by two copies of the same protein
    pub confirmed_homomultimer: bool,
    /// Set by the filter in FDR mode when this match passes the FDR cut
    pub fdr_pass: bool,
    /// Extra values
    pub meta: MetaData,
}

impl Match {
    /// A new match with a score and peptides
    pub fn new(id: impl Into<String>, score: Option<f64>, peptides: &[&str]) -> Self {
        Self {
            id: id.into(),
            score,
            peptides: peptides.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// If this match can be assigned to more than one crosslink
    pub fn is_ambiguous(&self) -> bool {
        self.crosslinks.len() > 1
    }
}

/// All proteins, crosslinks, and matches of a dataset
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    /// All proteins by identifier
    pub proteins: IndexMap<String, Protein>,
    /// All matches
    pub matches: Vec<Match>,
    /// All crosslinks
    pub crosslinks: Vec<Crosslink>,
    crosslink_ids: HashMap<String, usize>,
}

impl Dataset {
    /// An empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protein, replacing any protein with the same identifier
    pub fn add_protein(&mut self, protein: Protein) {
        self.proteins.insert(protein.id.clone(), protein);
    }

    /// Add a crosslink and returns its index. If a crosslink with the same identifier exists
    /// nothing is added and the existing index is returned. The decoy flags of the ends are taken
    /// from the proteins, if known.
    pub fn add_crosslink(&mut self, mut crosslink: Crosslink) -> usize {
        if let Some(index) = self.crosslink_ids.get(&crosslink.id) {
            return *index;
        }
        for end in std::iter::once(&mut crosslink.from).chain(crosslink.to.as_mut()) {
            if let Some(protein) = self.proteins.get(&end.protein) {
                end.decoy = protein.is_decoy;
            }
        }
        let index = self.crosslinks.len();
        self.crosslink_ids.insert(crosslink.id.clone(), index);
        self.crosslinks.push(crosslink);
        index
    }

    /// Get a crosslink by identifier
    pub fn crosslink(&self, id: &str) -> Option<&Crosslink> {
        self.crosslink_ids
            .get(id)
            .and_then(|i| self.crosslinks.get(*i))
    }

    /// Add a match supporting the given crosslinks (by index), returns the index of the match.
    /// Unknown crosslink indices are ignored.
    pub fn add_match(&mut self, m: Match, crosslinks: &[usize]) -> usize {
        self.add_match_at(m, crosslinks.iter().map(|i| (*i, Vec::new())))
    }

    /// Add a match supporting the given crosslinks (by index) with its peptide positions in each
    /// crosslink, returns the index of the match. Unknown crosslink indices are ignored.
    pub fn add_match_at(
        &mut self,
        mut m: Match,
        crosslinks: impl IntoIterator<Item = (usize, Vec<usize>)>,
    ) -> usize {
        let match_index = self.matches.len();
        m.crosslinks.clear();
        for (crosslink, pep_pos) in crosslinks {
            if let Some(link) = self.crosslinks.get_mut(crosslink) {
                link.matches_pp.push(MatchRef {
                    match_index,
                    pep_pos,
                });
                m.crosslinks.push(crosslink);
            }
        }
        self.matches.push(m);
        match_index
    }

    /// Check if any protein of this crosslink is hidden
    pub fn is_hidden(&self, crosslink: &Crosslink) -> bool {
        crosslink
            .proteins()
            .any(|p| self.proteins.get(p).is_some_and(|p| p.hidden))
    }
}
