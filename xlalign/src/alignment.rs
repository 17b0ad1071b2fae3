use context_error::{BasicKind, BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AlignMode, AlignmentStatistics, CigarOp, ScoringConfig, Step, align_matrix::Matrix,
};

/// An alignment of a comparison ("query") sequence onto a reference ("search") sequence. Immutable
/// once computed, apart from the statistics which are filled in by the owning protein model.
///
/// # Index maps
/// [`Self::query_to_ref`] has one entry per residue of the comparison sequence and
/// [`Self::ref_to_query`] one entry per residue of the full reference (including any residues
/// outside of the alignment window). Entries are 0-based. A non negative entry is the index of the
/// aligned residue in the other sequence. A negative entry `-(k + 1)` means the residue is aligned
/// to nothing, `k` is then the index of the next residue in the other sequence. If `k` equals the
/// length of the other sequence the residue lies past the end of anything aligned.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AlignmentResult {
    /// The aligned part of the comparison sequence, with `-` for gaps
    pub query_str: String,
    /// The aligned part of the reference, with `-` for gaps, same length as `query_str`
    pub reference_str: String,
    /// Maps every comparison residue onto the reference, see the type level documentation
    pub query_to_ref: Vec<isize>,
    /// Maps every reference residue onto the comparison sequence, see the type level documentation
    pub ref_to_query: Vec<isize>,
    /// The raw alignment score
    pub raw_score: i32,
    /// Run length encoded steps of the aligned part
    pub cigar: Vec<CigarOp>,
    /// The index in the comparison sequence where the aligned part starts
    pub start_query: usize,
    /// The index in the reference where the aligned part starts
    pub start_reference: usize,
    /// The mode this alignment was made with
    pub mode: AlignMode,
    /// Bit score, E-score, and average bit score per residue
    pub statistics: AlignmentStatistics,
}

impl AlignmentResult {
    /// The CIGAR like string for the aligned part, eg `4=1D2=`
    pub fn short(&self) -> String {
        CigarOp::short(&self.cigar)
    }

    /// The number of comparison residues covered by the aligned part
    pub fn len_query(&self) -> usize {
        self.cigar
            .iter()
            .map(|op| op.step.step_query() * op.count)
            .sum()
    }

    /// The number of reference residues covered by the aligned part
    pub fn len_reference(&self) -> usize {
        self.cigar
            .iter()
            .map(|op| op.step.step_reference() * op.count)
            .sum()
    }

    /// The fraction of aligned columns that are identical, 0.0 for an empty alignment
    pub fn identity(&self) -> f64 {
        let columns: usize = self.cigar.iter().map(|op| op.count).sum();
        if columns == 0 {
            return 0.0;
        }
        let identical: usize = self
            .cigar
            .iter()
            .filter(|op| op.step == Step::Match)
            .map(|op| op.count)
            .sum();
        identical as f64 / columns as f64
    }

    /// Check if any residues were aligned at all
    pub fn is_empty(&self) -> bool {
        self.cigar.is_empty()
    }

    /// The number of gaps (runs of insertions or deletions)
    pub fn gaps(&self) -> usize {
        self.cigar
            .iter()
            .filter(|op| matches!(op.step, Step::Insertion | Step::Deletion))
            .count()
    }

    /// The length of the comparison sequence this alignment was made for
    pub fn query_len(&self) -> usize {
        self.query_to_ref.len()
    }

    /// The length of the reference this alignment was made for
    pub fn reference_len(&self) -> usize {
        self.ref_to_query.len()
    }
}

/// Align a comparison sequence onto a reference with affine gaps (Gotoh).
///
/// If the reference is longer than [`ScoringConfig::max_align_window`] only the leading residues
/// within the window take part, all later reference residues are treated as unaligned. This is an
/// approximation for long references, the best alignment could lie outside of the window.
///
/// Both sequences are handled as one residue per byte. Empty sequences result in an empty
/// alignment.
/// # Errors
/// If the scoring configuration cannot score every residue pair, see [`ScoringConfig::validate`],
/// or if either sequence contains non ASCII characters.
pub fn align(
    query: &str,
    reference: &str,
    scoring: &ScoringConfig,
    mode: AlignMode,
) -> Result<AlignmentResult, BoxedError<'static, BasicKind>> {
    scoring.validate()?;
    for (name, sequence) in [("comparison", query), ("reference", reference)] {
        if let Some((index, residue)) = sequence.char_indices().find(|(_, c)| !c.is_ascii()) {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid sequence",
                format!("The {name} sequence contains a non ASCII residue '{residue}'"),
                Context::line(None, sequence.to_string(), index, residue.len_utf8()),
            ));
        }
    }
    let query_bytes = query.as_bytes();
    let reference_bytes = reference.as_bytes();
    let window = scoring
        .max_align_window
        .map_or(reference_bytes.len(), |w| w.min(reference_bytes.len()));

    if query_bytes.is_empty() || window == 0 {
        return Ok(AlignmentResult {
            query_to_ref: vec![-1; query_bytes.len()],
            ref_to_query: vec![-1; reference_bytes.len()],
            mode,
            ..AlignmentResult::default()
        });
    }

    let query_indices = scoring.indices(query_bytes);
    let reference_indices = scoring.indices(&reference_bytes[..window]);
    let mut matrix = Matrix::new(query_indices.len(), reference_indices.len());
    matrix.fill(&query_indices, &reference_indices, scoring, mode);
    let (raw_score, start_query, start_reference, path) =
        matrix.trace_path(&query_indices, &reference_indices, scoring, mode);

    let result = build_result(
        query_bytes,
        reference_bytes,
        raw_score,
        start_query,
        start_reference,
        &path,
        mode,
    );
    debug!(
        query_len = query_bytes.len(),
        reference_len = reference_bytes.len(),
        window,
        %mode,
        raw_score,
        cigar = %result.short(),
        "aligned sequence"
    );
    Ok(result)
}

/// Build the strings and index maps for a traced path
fn build_result(
    query: &[u8],
    reference: &[u8],
    raw_score: i32,
    start_query: usize,
    start_reference: usize,
    path: &[Step],
    mode: AlignMode,
) -> AlignmentResult {
    #[expect(clippy::cast_possible_wrap)]
    let unaligned = |next: usize| -(next as isize + 1);
    #[expect(clippy::cast_possible_wrap)]
    let aligned = |index: usize| index as isize;

    let mut query_str = String::with_capacity(path.len());
    let mut reference_str = String::with_capacity(path.len());
    let mut query_to_ref = vec![unaligned(start_reference); query.len()];
    let mut ref_to_query = vec![unaligned(start_query); reference.len()];
    let (mut q, mut r) = (start_query, start_reference);

    for step in path {
        match step {
            Step::Match | Step::Mismatch => {
                query_str.push(char::from(query[q]));
                reference_str.push(char::from(reference[r]));
                query_to_ref[q] = aligned(r);
                ref_to_query[r] = aligned(q);
                q += 1;
                r += 1;
            }
            Step::Insertion => {
                query_str.push(char::from(query[q]));
                reference_str.push('-');
                query_to_ref[q] = unaligned(r);
                q += 1;
            }
            Step::Deletion => {
                query_str.push('-');
                reference_str.push(char::from(reference[r]));
                ref_to_query[r] = unaligned(q);
                r += 1;
            }
        }
    }
    // Anything after the aligned part, including reference residues past the window
    for entry in &mut query_to_ref[q..] {
        *entry = unaligned(r);
    }
    for entry in &mut ref_to_query[r..] {
        *entry = unaligned(q);
    }

    AlignmentResult {
        query_str,
        reference_str,
        query_to_ref,
        ref_to_query,
        raw_score,
        cigar: CigarOp::encode(path),
        start_query,
        start_reference,
        mode,
        statistics: AlignmentStatistics::default(),
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn linear() -> ScoringConfig {
        ScoringConfig::linear(1, -1, 10, 1)
    }

    #[test]
    fn identical() {
        let result = align("CHATTER", "CHATTER", &linear(), AlignMode::Global).unwrap();
        assert_eq!(result.raw_score, 7);
        assert_eq!(result.short(), "7=");
        assert_eq!(result.query_to_ref, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(result.ref_to_query, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(result.identity(), 1.0);
    }

    #[test]
    fn identical_matrix() {
        let scoring = ScoringConfig::default();
        let result = align("WCW", "WCW", &scoring, AlignMode::Global).unwrap();
        assert_eq!(result.raw_score, 11 + 9 + 11);
    }

    #[test]
    fn deletion() {
        let result = align("CHATER", "CHATTER", &linear(), AlignMode::Global).unwrap();
        assert_eq!(result.raw_score, 6 - 11);
        assert_eq!(result.cigar.len(), 3);
        assert_eq!(result.gaps(), 1);
        assert_eq!(result.len_query(), 6);
        assert_eq!(result.len_reference(), 7);
        assert_eq!(result.query_str.len(), result.reference_str.len());
        assert_eq!(result.query_str.replace('-', ""), "CHATER");
        assert_eq!(result.reference_str, "CHATTER");
        // The deleted T has no counterpart, but points to the next comparison residue
        let gap = result.ref_to_query.iter().position(|i| *i < 0).unwrap();
        assert!(gap == 3 || gap == 4);
        assert_eq!(result.ref_to_query[gap], -(gap as isize + 1));
    }

    #[test]
    fn insertion() {
        let result = align("CHATTER", "CHATER", &linear(), AlignMode::Global).unwrap();
        assert_eq!(result.gaps(), 1);
        assert!(result.cigar.iter().any(|op| op.step == Step::Insertion));
        assert_eq!(result.query_to_ref.iter().filter(|i| **i < 0).count(), 1);
    }

    #[test]
    fn empty() {
        let result = align("", "CHATTER", &linear(), AlignMode::Global).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.raw_score, 0);
        assert_eq!(result.ref_to_query.len(), 7);
        let result = align("CHAT", "", &linear(), AlignMode::Local).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.query_to_ref, vec![-1; 4]);
    }

    #[test]
    fn non_ascii() {
        assert!(align("CHÄT", "CHAT", &linear(), AlignMode::Global).is_err());
        assert!(align("CHAT", "CHAT\u{3b1}", &linear(), AlignMode::Local).is_err());
        assert!(align("chat", "CHAT", &linear(), AlignMode::Global).is_ok());
    }

    #[test]
    fn unusable_scoring() {
        let scoring = ScoringConfig {
            matrix: None,
            mismatch_score: None,
            ..ScoringConfig::default()
        };
        assert!(align("A", "A", &scoring, AlignMode::Global).is_err());
    }

    #[test]
    fn local() {
        let result = align("WWWCHATWWW", "PPPPCHATPPPP", &linear(), AlignMode::Local).unwrap();
        assert_eq!(result.raw_score, 4);
        assert_eq!(result.short(), "4=");
        assert_eq!(result.start_query, 3);
        assert_eq!(result.start_reference, 4);
        assert_eq!(result.query_to_ref[3], 4);
        // Leading flank points to the start of the aligned part
        assert_eq!(result.query_to_ref[0], -5);
        // Trailing flank points to the residue after the aligned part
        assert_eq!(result.query_to_ref[9], -9);
        assert_eq!(result.ref_to_query[0], -4);
    }

    #[test]
    fn local_nothing_in_common() {
        let result = align("AAAA", "CCCC", &linear(), AlignMode::Local).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.raw_score, 0);
    }

    #[test]
    fn semi_global() {
        let result = align("CHAT", "PPPPCHATPPPP", &linear(), AlignMode::SemiGlobal).unwrap();
        assert_eq!(result.raw_score, 4);
        assert_eq!(result.short(), "4=");
        assert_eq!(result.start_reference, 4);
        assert_eq!(result.query_to_ref, vec![4, 5, 6, 7]);
        assert_eq!(result.ref_to_query[0], -1);
        assert_eq!(result.ref_to_query[11], -5);

        let global = align("CHAT", "PPPPCHATPPPP", &linear(), AlignMode::Global).unwrap();
        assert!(global.raw_score < result.raw_score);
    }

    #[test]
    fn semi_global_flank_penalty() {
        let scoring = ScoringConfig {
            gap_at_start: 3,
            ..linear()
        };
        let result = align("CHAT", "PPCHAT", &scoring, AlignMode::SemiGlobal).unwrap();
        assert_eq!(result.raw_score, 4 - 3);
        assert_eq!(result.start_reference, 2);
        let result = align("CHAT", "PPCHATPP", &scoring, AlignMode::SemiGlobal).unwrap();
        assert_eq!(result.raw_score, 4 - 6);
    }

    #[test]
    fn window() {
        let scoring = ScoringConfig {
            max_align_window: Some(4),
            ..linear()
        };
        let result = align("CHAT", "CHATTER", &scoring, AlignMode::Global).unwrap();
        assert_eq!(result.raw_score, 4);
        assert_eq!(result.ref_to_query.len(), 7);
        assert_eq!(&result.ref_to_query[4..], &[-5, -5, -5]);
    }
}
