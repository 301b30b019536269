//! Three-way confidence distribution from raw polarity evidence.

use serde::{Deserialize, Serialize};

use super::polarity::PolarityTally;

/// Smoothing mass: keeps the denominator positive and pushes weak evidence toward neutral.
pub const SMOOTHING: f64 = 0.1;

/// Pseudo-probabilities over the three labels. Each in [0, 1], summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

pub fn confidence_scores(tally: PolarityTally) -> ConfidenceScores {
    let total = tally.positive + tally.negative + SMOOTHING;

    let positive = tally.positive / total;
    let negative = tally.negative / total;
    let neutral = (1.0 - positive - negative).max(0.0);

    let sum = positive + negative + neutral;
    ConfidenceScores {
        positive: positive / sum,
        negative: negative / sum,
        neutral: neutral / sum,
    }
}
