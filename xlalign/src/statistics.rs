use serde::{Deserialize, Serialize};

use crate::ScoringConfig;

/// The database size used for E-scores when none is configured
pub const DEFAULT_DB_LENGTH: usize = 100;

/// Significance of an alignment derived from its raw score
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AlignmentStatistics {
    /// `(lambda * raw - ln(K)) / ln(2)`
    pub bit_score: f64,
    /// `db_length * query_length * 2^-bit_score`
    pub e_score: f64,
    /// The bit score divided by the comparison sequence length
    pub avg_bit_score_per_residue: f64,
}

impl AlignmentStatistics {
    /// Calculate the statistics for a raw score of a comparison sequence of the given length. For
    /// an empty comparison sequence the average bit score is 0.
    pub fn new(raw_score: i32, query_length: usize, scoring: &ScoringConfig) -> Self {
        let (lambda, k) = scoring.statistical_parameters();
        let bit_score = lambda.mul_add(f64::from(raw_score), -k.ln()) / std::f64::consts::LN_2;
        let db_length = scoring
            .db_length
            .filter(|l| *l != 0)
            .unwrap_or(DEFAULT_DB_LENGTH);
        Self {
            bit_score,
            e_score: db_length as f64 * query_length as f64 * (-bit_score).exp2(),
            avg_bit_score_per_residue: if query_length == 0 {
                0.0
            } else {
                bit_score / query_length as f64
            },
        }
    }
}
