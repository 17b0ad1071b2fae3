use context_error::{BasicKind, BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use crate::parse_json::{ParseJson, use_serde};

/// The default Karlin-Altschul lambda, used when a matrix does not define its own
pub const DEFAULT_LAMBDA: f64 = 0.254;
/// The default Karlin-Altschul K, used when a matrix does not define its own
pub const DEFAULT_K: f64 = 0.225042;
/// The largest absolute value for any score or gap penalty, this keeps the alignment matrices far
/// from overflowing
pub const MAX_SCORE: i32 = 1000;

/// A substitution matrix, scoring any pair of residues from its alphabet. Residues outside the
/// alphabet fall back to the linear match/mismatch scores of the [`ScoringConfig`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubstitutionMatrix {
    /// The name, eg `BLOSUM62`
    pub name: String,
    /// The residues in the order of the rows and columns of `scores`
    pub alphabet: String,
    /// Square score table indexed by the position of both residues in the alphabet
    pub scores: Vec<Vec<i32>>,
    /// The Karlin-Altschul lambda for this matrix
    pub lambda: Option<f64>,
    /// The Karlin-Altschul K for this matrix
    pub k: Option<f64>,
}

impl SubstitutionMatrix {
    /// The BLOSUM62 matrix, using the default statistical parameters
    pub fn blosum62() -> Self {
        Self::from_table("BLOSUM62", matrices::ALPHABET, matrices::BLOSUM62, None, None)
    }

    /// Identity matrix (9 for equal, -5 for not equal), without statistical parameters
    pub fn identity() -> Self {
        let len = matrices::ALPHABET.len();
        let scores = (0..len)
            .map(|a| (0..len).map(|b| if a == b { 9 } else { -5 }).collect())
            .collect();
        Self {
            name: "Identity".to_string(),
            alphabet: matrices::ALPHABET.to_string(),
            scores,
            lambda: None,
            k: None,
        }
    }

    fn from_table<const N: usize>(
        name: &str,
        alphabet: &str,
        table: &[[i8; N]; N],
        lambda: Option<f64>,
        k: Option<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            alphabet: alphabet.to_string(),
            scores: table
                .iter()
                .map(|row| row.iter().map(|s| i32::from(*s)).collect())
                .collect(),
            lambda,
            k,
        }
    }

    /// Get the row/column of this residue, case insensitive
    pub fn index(&self, residue: u8) -> Option<usize> {
        let residue = residue.to_ascii_uppercase();
        self.alphabet.bytes().position(|a| a == residue)
    }

    /// Get the score for two residues, if both are part of the alphabet
    pub fn score(&self, a: u8, b: u8) -> Option<i32> {
        Some(self.scores[self.index(a)?][self.index(b)?])
    }

    /// The lambda of this matrix or [`DEFAULT_LAMBDA`]
    pub fn lambda(&self) -> f64 {
        self.lambda.unwrap_or(DEFAULT_LAMBDA)
    }

    /// The K of this matrix or [`DEFAULT_K`]
    pub fn k(&self) -> f64 {
        self.k.unwrap_or(DEFAULT_K)
    }

    fn validate(&self) -> Result<(), BoxedError<'static, BasicKind>> {
        let len = self.alphabet.len();
        if self.scores.len() != len || self.scores.iter().any(|row| row.len() != len) {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid substitution matrix",
                format!(
                    "The matrix '{}' has an alphabet of {len} residues but its score table is not {len} by {len}",
                    self.name
                ),
                Context::none(),
            ));
        }
        if let Some(score) = self.scores.iter().flatten().find(|s| s.abs() > MAX_SCORE) {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid substitution matrix",
                format!(
                    "The matrix '{}' has a score outside of -{MAX_SCORE} to {MAX_SCORE}",
                    self.name
                ),
                Context::show(score.to_string()),
            ));
        }
        Ok(())
    }
}

impl ParseJson for SubstitutionMatrix {
    fn from_json_value(value: serde_json::Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        let matrix: Self = use_serde(value)?;
        matrix.validate()?;
        Ok(matrix)
    }
}

/// The scoring parameters for aligning a comparison sequence onto a reference sequence.
///
/// Gap penalties are given as positive numbers, a gap of length `n` costs
/// `gap_open + n * gap_extend`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// The substitution matrix, if any.
    ///
    /// Default: BLOSUM62.
    pub matrix: Option<SubstitutionMatrix>,
    /// The score for two identical residues when no matrix entry exists.
    ///
    /// Default: 1.
    pub match_score: Option<i32>,
    /// The score for two different residues when no matrix entry exists.
    ///
    /// Default: -1.
    pub mismatch_score: Option<i32>,
    /// The penalty for opening any gap.
    ///
    /// Default: 10.
    pub gap_open: i32,
    /// The penalty for every residue in a gap.
    ///
    /// Default: 1.
    pub gap_extend: i32,
    /// The fixed penalty for leaving the flanks of the reference unaligned in semi-global mode,
    /// independent of the length of the flank.
    ///
    /// Default: 0.
    pub gap_at_start: i32,
    /// The maximal number of leading reference residues that take part in the alignment. Any
    /// residue past this window is treated as unaligned.
    ///
    /// Default: 1000.
    pub max_align_window: Option<usize>,
    /// The database length for E-score calculation, 100 if not given.
    ///
    /// Default: None.
    pub db_length: Option<usize>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            matrix: Some(SubstitutionMatrix::blosum62()),
            match_score: Some(1),
            mismatch_score: Some(-1),
            gap_open: 10,
            gap_extend: 1,
            gap_at_start: 0,
            max_align_window: Some(1000),
            db_length: None,
        }
    }
}

impl ScoringConfig {
    /// A configuration with only linear match/mismatch scores
    pub fn linear(match_score: i32, mismatch_score: i32, gap_open: i32, gap_extend: i32) -> Self {
        Self {
            matrix: None,
            match_score: Some(match_score),
            mismatch_score: Some(mismatch_score),
            gap_open,
            gap_extend,
            ..Self::default()
        }
    }

    /// Check that this configuration can score every residue pair and that all scores and
    /// penalties are within [`MAX_SCORE`].
    /// # Errors
    /// If there is no matrix and the linear match and mismatch scores are not both given, if the
    /// matrix is not square with its alphabet, or if a score or penalty is out of bounds.
    pub fn validate(&self) -> Result<(), BoxedError<'static, BasicKind>> {
        if let Some(matrix) = &self.matrix {
            matrix.validate()?;
        } else if self.match_score.is_none() || self.mismatch_score.is_none() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Unusable scoring configuration",
                "Without a substitution matrix both the match and mismatch score have to be set",
                Context::none(),
            ));
        }
        for (name, penalty) in [
            ("gap_open", self.gap_open),
            ("gap_extend", self.gap_extend),
            ("gap_at_start", self.gap_at_start),
        ] {
            if !(0..=MAX_SCORE).contains(&penalty) {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Invalid gap penalty",
                    format!("The {name} penalty has to be between 0 and {MAX_SCORE}"),
                    Context::show(penalty.to_string()),
                ));
            }
        }
        for (name, score) in [
            ("match_score", self.match_score),
            ("mismatch_score", self.mismatch_score),
        ] {
            if let Some(score) = score
                && score.abs() > MAX_SCORE
            {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Invalid score",
                    format!("The {name} has to be between -{MAX_SCORE} and {MAX_SCORE}"),
                    Context::show(score.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// The lambda and K to use for bit scores
    pub fn statistical_parameters(&self) -> (f64, f64) {
        self.matrix
            .as_ref()
            .map_or((DEFAULT_LAMBDA, DEFAULT_K), |m| (m.lambda(), m.k()))
    }

    /// Score two residues, the residue indices are the positions in the matrix alphabet (if any).
    pub(crate) fn pair(&self, a: (u8, Option<usize>), b: (u8, Option<usize>)) -> i32 {
        if let Some(matrix) = &self.matrix
            && let (Some(ia), Some(ib)) = (a.1, b.1)
        {
            return matrix.scores[ia][ib];
        }
        if a.0.eq_ignore_ascii_case(&b.0) {
            self.match_score.unwrap_or_default()
        } else {
            self.mismatch_score.unwrap_or_default()
        }
    }

    /// Look up the matrix positions for all residues in a sequence
    pub(crate) fn indices(&self, sequence: &[u8]) -> Vec<(u8, Option<usize>)> {
        sequence
            .iter()
            .map(|r| (*r, self.matrix.as_ref().and_then(|m| m.index(*r))))
            .collect()
    }
}

impl ParseJson for ScoringConfig {
    fn from_json_value(value: serde_json::Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        let config: Self = use_serde(value)?;
        config.validate()?;
        Ok(config)
    }
}

/// A single change to the settings of a protein alignment
#[derive(Clone, Debug, PartialEq)]
pub enum ScoringParameter {
    /// The display label, the only setting that does not trigger realignment
    Label(String),
    /// See [`ScoringConfig::matrix`]
    Matrix(Option<SubstitutionMatrix>),
    /// See [`ScoringConfig::match_score`]
    MatchScore(Option<i32>),
    /// See [`ScoringConfig::mismatch_score`]
    MismatchScore(Option<i32>),
    /// See [`ScoringConfig::gap_open`]
    GapOpen(i32),
    /// See [`ScoringConfig::gap_extend`]
    GapExtend(i32),
    /// See [`ScoringConfig::gap_at_start`]
    GapAtStart(i32),
    /// See [`ScoringConfig::max_align_window`]
    MaxAlignWindow(Option<usize>),
    /// See [`ScoringConfig::db_length`]
    DbLength(Option<usize>),
}

impl ScoringParameter {
    /// Build a parameter from its field name and a JSON value, as sent by a settings panel.
    /// # Errors
    /// If the name is unknown or the value has the wrong type.
    pub fn from_name_value(
        name: &str,
        value: serde_json::Value,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        Ok(match name {
            "label" => Self::Label(use_serde(value)?),
            "matrix" => Self::Matrix(if value.is_null() {
                None
            } else {
                Some(SubstitutionMatrix::from_json_value(value)?)
            }),
            "match_score" => Self::MatchScore(use_serde(value)?),
            "mismatch_score" => Self::MismatchScore(use_serde(value)?),
            "gap_open" => Self::GapOpen(use_serde(value)?),
            "gap_extend" => Self::GapExtend(use_serde(value)?),
            "gap_at_start" => Self::GapAtStart(use_serde(value)?),
            "max_align_window" => Self::MaxAlignWindow(use_serde(value)?),
            "db_length" => Self::DbLength(use_serde(value)?),
            _ => {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Unknown scoring parameter",
                    format!("There is no scoring parameter named '{name}'"),
                    Context::show(name.to_string()),
                ));
            }
        })
    }

    /// Apply this parameter to the configuration, returns true if anything changed
    pub(crate) fn apply(self, config: &mut ScoringConfig) -> bool {
        fn set<T: PartialEq>(field: &mut T, value: T) -> bool {
            let changed = *field != value;
            *field = value;
            changed
        }
        match self {
            Self::Label(_) => false,
            Self::Matrix(v) => set(&mut config.matrix, v),
            Self::MatchScore(v) => set(&mut config.match_score, v),
            Self::MismatchScore(v) => set(&mut config.mismatch_score, v),
            Self::GapOpen(v) => set(&mut config.gap_open, v),
            Self::GapExtend(v) => set(&mut config.gap_extend, v),
            Self::GapAtStart(v) => set(&mut config.gap_at_start, v),
            Self::MaxAlignWindow(v) => set(&mut config.max_align_window, v),
            Self::DbLength(v) => set(&mut config.db_length, v),
        }
    }
}

/// Matrices from: <https://www.ncbi.nlm.nih.gov/IEB/ToolBox/C_DOC/lxr/source/data/>.
pub(crate) mod matrices {
    /// The residue order of the built-in matrices
    pub(crate) const ALPHABET: &str = "ARNDCQEGHILKMFPSTWYVBZX*";

    /// BLOSUM62 matrix
    #[rustfmt::skip]
    pub(crate) const BLOSUM62: &[[i8; 24]; 24] = &[
        [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1,  0, -4],
        [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1,  0, -1, -4],
        [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  3,  0, -1, -4],
        [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4,  1, -1, -4],
        [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2, -4],
        [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0,  3, -1, -4],
        [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4],
        [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -2, -1, -4],
        [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0,  0, -1, -4],
        [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3, -3, -1, -4],
        [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4, -3, -1, -4],
        [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0,  1, -1, -4],
        [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3, -1, -1, -4],
        [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3, -3, -1, -4],
        [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -1, -2, -4],
        [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0,  0,  0, -4],
        [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1,  0, -4],
        [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -3, -2, -4],
        [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -2, -1, -4],
        [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3, -2, -1, -4],
        [-2, -1,  3,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4,  1, -1, -4],
        [-1,  0,  0,  1, -3,  3,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4],
        [ 0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2,  0,  0, -2, -1, -1, -1, -1, -1, -4],
        [-4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1],
    ];
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn blosum62_symmetric() {
        let m = SubstitutionMatrix::blosum62();
        for a in 0..m.alphabet.len() {
            for b in 0..m.alphabet.len() {
                assert_eq!(m.scores[a][b], m.scores[b][a], "{a} {b}");
            }
        }
        assert_eq!(m.score(b'W', b'w'), Some(11));
        assert_eq!(m.score(b'C', b'C'), Some(9));
        assert_eq!(m.score(b'U', b'C'), None);
    }

    #[test]
    fn unusable_config() {
        let config = ScoringConfig {
            matrix: None,
            match_score: None,
            ..ScoringConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(ScoringConfig::linear(1, -1, 10, 1).validate().is_ok());
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn bounded_penalties() {
        for config in [
            ScoringConfig::linear(1, -1, 1 << 30, 1),
            ScoringConfig::linear(1, -1, 10, 1 << 30),
            ScoringConfig::linear(1, -1, -1, 1),
            ScoringConfig::linear(1 << 20, -1, 10, 1),
            ScoringConfig {
                gap_at_start: MAX_SCORE + 1,
                ..ScoringConfig::default()
            },
        ] {
            assert!(config.validate().is_err(), "{config:?}");
        }
        assert!(ScoringConfig::linear(MAX_SCORE, -MAX_SCORE, MAX_SCORE, 0).validate().is_ok());
        let mut matrix = SubstitutionMatrix::identity();
        matrix.scores[0][0] = MAX_SCORE + 1;
        let config = ScoringConfig {
            matrix: Some(matrix),
            ..ScoringConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn matrix_from_json() {
        let json = serde_json::json!({
            "name": "Tiny",
            "alphabet": "AC",
            "scores": [[2, -1], [-1, 3]],
            "lambda": 0.3,
            "k": null
        });
        let ScoringParameter::Matrix(Some(matrix)) =
            ScoringParameter::from_name_value("matrix", json).unwrap()
        else {
            panic!("expected a matrix");
        };
        assert_eq!(matrix.score(b'c', b'C'), Some(3));
        assert_eq!(matrix.lambda(), 0.3);
        assert_eq!(matrix.k(), DEFAULT_K);
        assert_eq!(
            ScoringParameter::from_name_value("matrix", serde_json::Value::Null).unwrap(),
            ScoringParameter::Matrix(None)
        );
        let ragged = serde_json::json!({
            "name": "Ragged",
            "alphabet": "AC",
            "scores": [[2, -1], [-1]],
            "lambda": null,
            "k": null
        });
        assert!(ScoringParameter::from_name_value("matrix", ragged).is_err());
    }

    #[test]
    fn fallback_to_linear() {
        let config = ScoringConfig::default();
        let seq = config.indices(b"AU");
        assert_eq!(config.pair(seq[0], seq[0]), 4);
        assert_eq!(config.pair(seq[1], seq[1]), 1);
        assert_eq!(config.pair(seq[0], seq[1]), -1);
    }

    #[test]
    fn parameter_from_json() {
        let mut config = ScoringConfig::default();
        let parameter =
            ScoringParameter::from_name_value("gap_open", serde_json::json!(12)).unwrap();
        assert!(parameter.apply(&mut config));
        assert_eq!(config.gap_open, 12);
        assert!(!ScoringParameter::GapOpen(12).apply(&mut config));
        assert!(!ScoringParameter::Label("A".to_string()).apply(&mut config));
        assert!(ScoringParameter::from_name_value("gap", serde_json::json!(1)).is_err());
        assert!(ScoringParameter::from_name_value("gap_open", serde_json::json!("a")).is_err());
    }

    #[test]
    fn config_from_json() {
        let config = ScoringConfig::from_json(
            r#"{"matrix": null, "match_score": 2, "mismatch_score": -2, "gap_open": 5}"#,
        )
        .unwrap();
        assert_eq!(config.match_score, Some(2));
        assert_eq!(config.gap_open, 5);
        assert_eq!(config.gap_extend, 1);
        assert!(ScoringConfig::from_json(r#"{"matrix": null, "match_score": null}"#).is_err());
    }
}
