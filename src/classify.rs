use crate::scoring::Strategy;
use serde::{Deserialize, Serialize};

/// Ordered similarity verdict (`Match` is the strongest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Mismatch,
    Partial,
    Match,
}

impl Verdict {
    /// Label reported for this verdict under the given strategy
    pub fn label(&self, strategy: Strategy) -> &'static str {
        match (strategy, self) {
            (Strategy::Ssim, Verdict::Match) => "Match",
            (Strategy::Ssim, Verdict::Partial) => "Partial Match",
            (Strategy::Ssim, Verdict::Mismatch) => "Mismatch",
            (Strategy::Orb, Verdict::Match) => "Very Similar",
            (Strategy::Orb, Verdict::Partial) => "Somewhat Different",
            (Strategy::Orb, Verdict::Mismatch) => "Clearly Different",
            (Strategy::Embedding, Verdict::Match) => "match",
            (Strategy::Embedding, Verdict::Partial) => "similar",
            (Strategy::Embedding, Verdict::Mismatch) => "no_match",
        }
    }
}

/// Two score boundaries; `inclusive` selects `>=` instead of `>`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub strong: f64,
    pub weak: f64,
    #[serde(default)]
    pub inclusive: bool,
}

impl Thresholds {
    pub const fn ssim() -> Self {
        Self {
            strong: 0.75,
            weak: 0.5,
            inclusive: false,
        }
    }

    pub const fn orb() -> Self {
        Self {
            strong: 0.4,
            weak: 0.2,
            inclusive: false,
        }
    }

    pub const fn embedding() -> Self {
        Self {
            strong: 0.9,
            weak: 0.7,
            inclusive: true,
        }
    }

    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Ssim => Self::ssim(),
            Strategy::Orb => Self::orb(),
            Strategy::Embedding => Self::embedding(),
        }
    }

    fn passes(&self, score: f64, boundary: f64) -> bool {
        if self.inclusive {
            score >= boundary
        } else {
            score > boundary
        }
    }

    pub fn classify(&self, score: f64) -> Verdict {
        if self.passes(score, self.strong) {
            Verdict::Match
        } else if self.passes(score, self.weak) {
            Verdict::Partial
        } else {
            Verdict::Mismatch
        }
    }
}

/// Classify a score with the default table of `strategy`
pub fn classify(score: f64, strategy: Strategy) -> Verdict {
    Thresholds::for_strategy(strategy).classify(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_scores_never_match() {
        assert_eq!(classify(f64::NAN, Strategy::Ssim), Verdict::Mismatch);
        assert_eq!(classify(f64::NAN, Strategy::Embedding), Verdict::Mismatch);
    }

    #[test]
    fn verdicts_are_ordered() {
        assert!(Verdict::Match > Verdict::Partial);
        assert!(Verdict::Partial > Verdict::Mismatch);
    }
}
