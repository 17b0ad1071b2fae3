use context_error::{BasicKind, BoxedError};
use indexmap::IndexMap;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AlignMode, AlignmentResult, AlignmentStatistics, Block, Feature, ScoringConfig,
    ScoringParameter, SequenceModel, align,
};

/// The flags for a newly added comparison sequence
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddSequenceOptions {
    /// Align locally
    pub local: bool,
    /// Align semi globally, ignored if `local` is set
    pub semi_local: bool,
    /// This sequence is the canonical sequence of the protein itself
    pub canonical: bool,
}

/// The best statistics over all comparison sequences of a protein
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    /// The number of comparison sequences
    pub sequences: usize,
    /// The highest bit score
    pub best_bit_score: Option<f64>,
    /// The lowest E-score
    pub best_e_score: Option<f64>,
}

/// The alignments of all comparison sequences for one protein onto its search sequence
#[derive(Clone, Debug, PartialEq)]
pub struct ProteinAlignment {
    /// The protein identifier
    pub id: String,
    /// The identifier of the reference (eg UniProt accession), if known
    pub reference_id: Option<String>,
    /// The display label, changing it does not result in realignment
    pub label: String,
    search: String,
    scoring: ScoringConfig,
    sequences: IndexMap<String, SequenceModel>,
    summary: AlignmentSummary,
}

impl ProteinAlignment {
    /// Create a new protein alignment model without comparison sequences.
    /// # Errors
    /// If the scoring configuration is unusable.
    pub fn new(
        id: impl Into<String>,
        search: impl Into<String>,
        scoring: ScoringConfig,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        scoring.validate()?;
        let id = id.into();
        Ok(Self {
            label: id.clone(),
            id,
            reference_id: None,
            search: search.into(),
            scoring,
            sequences: IndexMap::new(),
            summary: AlignmentSummary::default(),
        })
    }

    /// The search sequence all comparison sequences are aligned onto
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The current scoring configuration
    pub const fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Change a single setting. Any change other than the label realigns all comparison
    /// sequences. Returns true if anything was realigned.
    /// # Errors
    /// If the resulting configuration is unusable, the configuration is then left unchanged.
    pub fn set_parameter(
        &mut self,
        parameter: ScoringParameter,
    ) -> Result<bool, BoxedError<'static, BasicKind>> {
        if let ScoringParameter::Label(label) = parameter {
            self.label = label;
            return Ok(false);
        }
        let mut scoring = self.scoring.clone();
        if !parameter.apply(&mut scoring) {
            return Ok(false);
        }
        scoring.validate()?;
        self.scoring = scoring;
        self.realign()?;
        Ok(true)
    }

    /// Change a single setting given by name and JSON value, see [`Self::set_parameter`].
    /// # Errors
    /// If the name is unknown, the value invalid, or the resulting configuration unusable.
    pub fn set_parameter_by_name(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> Result<bool, BoxedError<'static, BasicKind>> {
        self.set_parameter(ScoringParameter::from_name_value(name, value)?)
    }

    /// Replace the full scoring configuration, realigns if it differs from the current one.
    /// # Errors
    /// If the configuration is unusable.
    pub fn set_scoring(
        &mut self,
        scoring: ScoringConfig,
    ) -> Result<bool, BoxedError<'static, BasicKind>> {
        scoring.validate()?;
        if scoring == self.scoring {
            return Ok(false);
        }
        self.scoring = scoring;
        self.realign()?;
        Ok(true)
    }

    /// Realign every comparison sequence with the current settings
    /// # Errors
    /// If the scoring configuration is unusable.
    pub fn realign(&mut self) -> Result<(), BoxedError<'static, BasicKind>> {
        for model in self.sequences.values_mut() {
            model.align(&self.search, &self.scoring)?;
        }
        self.update_summary();
        debug!(
            protein = %self.id,
            sequences = self.sequences.len(),
            "realigned protein"
        );
        Ok(())
    }

    /// Align sequences with the current settings without storing anything
    /// # Errors
    /// If the scoring configuration is unusable.
    pub fn align_sequences(
        &self,
        sequences: &[&str],
        mode: AlignMode,
    ) -> Result<Vec<AlignmentResult>, BoxedError<'static, BasicKind>> {
        sequences
            .iter()
            .map(|sequence| {
                let mut result = align(sequence, &self.search, &self.scoring, mode)?;
                result.statistics =
                    AlignmentStatistics::new(result.raw_score, sequence.len(), &self.scoring);
                Ok(result)
            })
            .collect()
    }

    /// Add a comparison sequence and align it immediately. An existing sequence with the same
    /// identifier is replaced.
    /// # Errors
    /// If the scoring configuration is unusable.
    pub fn add_sequence(
        &mut self,
        id: impl Into<String>,
        sequence: impl Into<String>,
        options: AddSequenceOptions,
    ) -> Result<&SequenceModel, BoxedError<'static, BasicKind>> {
        let id = id.into();
        let mut model = SequenceModel::new(
            id.clone(),
            sequence,
            AlignMode::from_flags(options.local, options.semi_local),
        );
        model.canonical = options.canonical;
        model.align(&self.search, &self.scoring)?;
        let (index, _) = self.sequences.insert_full(id, model);
        self.update_summary();
        Ok(&self.sequences[index])
    }

    /// Remove a comparison sequence, returns it if it was present
    pub fn remove_sequence(&mut self, id: &str) -> Option<SequenceModel> {
        let removed = self.sequences.shift_remove(id);
        if removed.is_some() {
            self.update_summary();
        }
        removed
    }

    /// Get a comparison sequence
    pub fn get_sequence_model(&self, id: &str) -> Option<&SequenceModel> {
        self.sequences.get(id)
    }

    /// The identifiers of all comparison sequences, in the order they were added
    pub fn sequence_ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    /// Iterate over all comparison sequences
    pub fn sequences(&self) -> impl Iterator<Item = &SequenceModel> {
        self.sequences.values()
    }

    /// The best statistics over all comparison sequences
    pub const fn summary(&self) -> AlignmentSummary {
        self.summary
    }

    fn update_summary(&mut self) {
        let statistics = self.sequences.values().map(|m| m.alignment().statistics);
        self.summary = AlignmentSummary {
            sequences: self.sequences.len(),
            best_bit_score: statistics.clone().map(|s| s.bit_score).reduce(f64::max),
            best_e_score: statistics.map(|s| s.e_score).reduce(f64::min),
        };
    }

    /// See [`SequenceModel::map_to_search`]
    pub fn map_to_search(&self, id: &str, index: usize) -> Option<isize> {
        self.get_sequence_model(id)?.map_to_search(index)
    }

    /// See [`SequenceModel::map_from_search`]
    pub fn map_from_search(&self, id: &str, index: usize) -> Option<isize> {
        self.get_sequence_model(id)?.map_from_search(index)
    }

    /// See [`SequenceModel::map_to_search_bulk`]
    pub fn map_to_search_bulk(&self, id: &str, indices: &[usize]) -> Option<Vec<Option<isize>>> {
        Some(self.get_sequence_model(id)?.map_to_search_bulk(indices))
    }

    /// See [`SequenceModel::map_from_search_bulk`]
    pub fn map_from_search_bulk(
        &self,
        id: &str,
        indices: &[usize],
    ) -> Option<Vec<Option<isize>>> {
        Some(self.get_sequence_model(id)?.map_from_search_bulk(indices))
    }

    /// See [`SequenceModel::range_to_search`]
    pub fn range_to_search(&self, id: &str, begin: usize, end: usize) -> Option<Block> {
        self.get_sequence_model(id)?.range_to_search(begin, end)
    }

    /// The region of the search sequence covered by this comparison sequence, together with the
    /// search residues in that region
    pub fn get_range_as_search_seq(&self, id: &str) -> Option<(Block, &str)> {
        let range = self.get_sequence_model(id)?.range_as_search()?;
        Some((range, self.search.get(range.begin - 1..range.end)?))
    }

    /// See [`SequenceModel::blockify`]
    pub fn blockify(&self, id: &str) -> Option<&[Block]> {
        Some(self.get_sequence_model(id)?.blockify())
    }

    /// See [`SequenceModel::get_aligned_index`]
    pub fn get_aligned_index(
        &self,
        id: &str,
        index: usize,
        to_search: bool,
        keep_negative: bool,
    ) -> Option<isize> {
        self.get_sequence_model(id)?
            .get_aligned_index(index, to_search, keep_negative)
    }

    /// All aligned blocks of all comparison sequences as features, optionally skipping the
    /// canonical sequence
    pub fn alignment_features(&self, include_canonical: bool) -> Vec<Feature> {
        self.sequences
            .values()
            .filter(|model| include_canonical || !model.canonical)
            .flat_map(|model| {
                model
                    .blockify()
                    .iter()
                    .map(|block| Feature::aligned_block(&self.id, &model.id, *block))
            })
            .collect()
    }
}

/// All protein alignment models of a dataset, keyed by protein identifier
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProteinAlignments {
    proteins: IndexMap<String, ProteinAlignment>,
}

impl ProteinAlignments {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protein, replacing and returning any earlier protein with the same identifier
    pub fn add_protein(&mut self, protein: ProteinAlignment) -> Option<ProteinAlignment> {
        self.proteins.insert(protein.id.clone(), protein)
    }

    /// Remove a protein
    pub fn remove_protein(&mut self, id: &str) -> Option<ProteinAlignment> {
        self.proteins.shift_remove(id)
    }

    /// Get a protein
    pub fn get(&self, id: &str) -> Option<&ProteinAlignment> {
        self.proteins.get(id)
    }

    /// Get a protein mutably
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ProteinAlignment> {
        self.proteins.get_mut(id)
    }

    /// Iterate over all proteins in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ProteinAlignment> {
        self.proteins.values()
    }

    /// The number of proteins
    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    /// Check if there are no proteins
    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    /// Realign all comparison sequences of all proteins
    /// # Errors
    /// If the scoring configuration of any protein is unusable.
    pub fn realign_all(&mut self) -> Result<(), BoxedError<'static, BasicKind>> {
        self.proteins
            .values_mut()
            .try_for_each(ProteinAlignment::realign)
    }

    /// Realign all comparison sequences of all proteins, with the proteins processed in parallel.
    /// Only available if you enable the feature "rayon" (on by default).
    /// # Errors
    /// If the scoring configuration of any protein is unusable.
    #[cfg(feature = "rayon")]
    pub fn par_realign_all(&mut self) -> Result<(), BoxedError<'static, BasicKind>> {
        self.proteins
            .values_mut()
            .collect::<Vec<_>>()
            .into_par_iter()
            .try_for_each(ProteinAlignment::realign)
    }

    /// Apply a setting to all proteins, returns the number of proteins that were realigned
    /// # Errors
    /// If the resulting configuration is unusable, proteins changed before the failure keep their
    /// new setting.
    pub fn set_parameter_all(
        &mut self,
        parameter: &ScoringParameter,
    ) -> Result<usize, BoxedError<'static, BasicKind>> {
        let mut realigned = 0;
        for protein in self.proteins.values_mut() {
            if protein.set_parameter(parameter.clone())? {
                realigned += 1;
            }
        }
        Ok(realigned)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn protein() -> ProteinAlignment {
        ProteinAlignment::new("P1", "PPPPCHATTERPPPP", ScoringConfig::linear(1, -1, 10, 1)).unwrap()
    }

    #[test]
    fn add_and_remove() {
        let mut protein = protein();
        let model = protein
            .add_sequence(
                "A",
                "CHATTER",
                AddSequenceOptions {
                    semi_local: true,
                    ..AddSequenceOptions::default()
                },
            )
            .unwrap();
        assert_eq!(model.alignment().raw_score, 7);
        assert_eq!(protein.summary().sequences, 1);
        assert!(protein.summary().best_bit_score.is_some());
        assert_eq!(protein.map_to_search("A", 1), Some(5));
        assert_eq!(protein.map_to_search("B", 1), None);
        assert_eq!(
            protein.get_range_as_search_seq("A"),
            Some((Block::new(5, 11), "CHATTER"))
        );
        assert!(protein.remove_sequence("A").is_some());
        assert!(protein.remove_sequence("A").is_none());
        assert_eq!(protein.summary(), AlignmentSummary::default());
    }

    #[test]
    fn realign_on_change() {
        let mut protein = protein();
        protein
            .add_sequence("A", "CHAT", AddSequenceOptions::default())
            .unwrap();
        let before = protein.get_sequence_model("A").unwrap().alignment().clone();
        assert!(
            !protein
                .set_parameter(ScoringParameter::Label("Name".to_string()))
                .unwrap()
        );
        assert_eq!(protein.label, "Name");
        assert!(!protein.set_parameter(ScoringParameter::GapOpen(10)).unwrap());
        assert!(protein.set_parameter(ScoringParameter::GapOpen(2)).unwrap());
        let after = protein.get_sequence_model("A").unwrap().alignment();
        assert_ne!(&before, after);
        assert!(
            protein
                .set_parameter_by_name("gap_at_start", serde_json::json!(1))
                .unwrap()
        );
    }

    #[test]
    fn invalid_change_is_reverted() {
        let mut protein = protein();
        assert!(
            protein
                .set_parameter(ScoringParameter::MatchScore(None))
                .is_err()
        );
        assert_eq!(protein.scoring().match_score, Some(1));
        assert!(
            protein
                .set_parameter(ScoringParameter::GapOpen(1 << 30))
                .is_err()
        );
        assert_eq!(protein.scoring().gap_open, 10);
    }

    #[test]
    fn preview() {
        let protein = protein();
        let results = protein
            .align_sequences(&["CHAT", "TTER"], AlignMode::SemiGlobal)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].start_reference, 4);
        assert_eq!(results[1].start_reference, 7);
        assert_eq!(protein.sequence_ids().count(), 0);
    }

    #[test]
    fn features() {
        let mut protein = protein();
        protein
            .add_sequence(
                "self",
                "PPPPCHATTERPPPP",
                AddSequenceOptions {
                    canonical: true,
                    ..AddSequenceOptions::default()
                },
            )
            .unwrap();
        protein
            .add_sequence(
                "chain",
                "CHATTER",
                AddSequenceOptions {
                    local: true,
                    ..AddSequenceOptions::default()
                },
            )
            .unwrap();
        assert_eq!(protein.alignment_features(true).len(), 2);
        let features = protein.alignment_features(false);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].begin, 5);
        assert_eq!(features[0].end, 11);
        assert_eq!(features[0].prot_id, "P1");
    }

    #[test]
    fn collection() {
        let mut proteins = ProteinAlignments::new();
        let mut protein = protein();
        protein
            .add_sequence("A", "CHAT", AddSequenceOptions::default())
            .unwrap();
        assert!(proteins.add_protein(protein).is_none());
        proteins
            .add_protein(ProteinAlignment::new("P2", "CHAT", ScoringConfig::default()).unwrap());
        assert_eq!(proteins.len(), 2);
        assert_eq!(
            proteins
                .set_parameter_all(&ScoringParameter::GapExtend(2))
                .unwrap(),
            2
        );
        proteins.realign_all().unwrap();
        #[cfg(feature = "rayon")]
        proteins.par_realign_all().unwrap();
        assert!(proteins.remove_protein("P2").is_some());
        assert!(proteins.get("P2").is_none());
        assert_eq!(proteins.get("P1").unwrap().sequence_ids().count(), 1);
    }
}
