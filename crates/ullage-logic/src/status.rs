//! Discrete propellant-feed status derived from stability.

use serde::{Deserialize, Serialize};

/// Operator-facing classification of an engine's ullage stability.
///
/// Ordered from best to worst, so `a < b` means `a` is more stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UllageStatus {
    VeryStable,
    Stable,
    Risky,
    VeryRisky,
    Unstable,
    VeryUnstable,
}

/// Inclusive lower stability bound for each status, best first.
const THRESHOLDS: [(f64, UllageStatus); 5] = [
    (0.996, UllageStatus::VeryStable),
    (0.95, UllageStatus::Stable),
    (0.75, UllageStatus::Risky),
    (0.50, UllageStatus::VeryRisky),
    (0.30, UllageStatus::Unstable),
];

impl UllageStatus {
    /// Classify a stability probability.
    pub fn from_stability(stability: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(min, _)| stability >= *min)
            .map(|(_, status)| *status)
            .unwrap_or(UllageStatus::VeryUnstable)
    }

    pub fn label(self) -> &'static str {
        match self {
            UllageStatus::VeryStable => "Very Stable",
            UllageStatus::Stable => "Stable",
            UllageStatus::Risky => "Risky",
            UllageStatus::VeryRisky => "Very Risky",
            UllageStatus::Unstable => "Unstable",
            UllageStatus::VeryUnstable => "Very Unstable",
        }
    }
}

impl std::fmt::Display for UllageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
