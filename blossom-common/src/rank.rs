//! Volunteer rank tiers
//!
//! A volunteer's rank is a static threshold table over their gamma (the number of
//! submissions they have completed).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rank tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Initiate,
    Green,
    Teal,
    Purple,
    Gold,
    Diamond,
    Ruby,
    Topaz,
    Jade,
}

/// Gamma thresholds, highest first. A volunteer holds the first rank whose
/// threshold their gamma meets.
const THRESHOLDS: [(i64, Rank); 8] = [
    (10_000, Rank::Jade),
    (5_000, Rank::Topaz),
    (2_500, Rank::Ruby),
    (1_000, Rank::Diamond),
    (500, Rank::Gold),
    (250, Rank::Purple),
    (100, Rank::Teal),
    (50, Rank::Green),
];

/// Rank for a given gamma
pub fn rank_for_gamma(gamma: i64) -> Rank {
    THRESHOLDS
        .iter()
        .find(|(threshold, _)| gamma >= *threshold)
        .map(|(_, rank)| *rank)
        .unwrap_or(Rank::Initiate)
}

/// Rank with an optional override of the computed gamma.
///
/// An override of zero is treated the same as no override.
pub fn rank_with_override(gamma: i64, override_gamma: Option<i64>) -> Rank {
    match override_gamma {
        Some(value) if value != 0 => rank_for_gamma(value),
        _ => rank_for_gamma(gamma),
    }
}

impl Rank {
    /// Display name of the rank
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Initiate => "Initiate",
            Rank::Green => "Green",
            Rank::Teal => "Teal",
            Rank::Purple => "Purple",
            Rank::Gold => "Gold",
            Rank::Diamond => "Diamond",
            Rank::Ruby => "Ruby",
            Rank::Topaz => "Topaz",
            Rank::Jade => "Jade",
        }
    }

    /// Gamma at which this rank starts
    pub fn threshold(&self) -> i64 {
        THRESHOLDS
            .iter()
            .find(|(_, rank)| rank == self)
            .map(|(threshold, _)| *threshold)
            .unwrap_or(0)
    }

    /// Gamma needed to reach the next rank, `None` at the top tier
    pub fn next_threshold(&self) -> Option<i64> {
        THRESHOLDS
            .iter()
            .rev()
            .map(|(threshold, _)| *threshold)
            .find(|threshold| *threshold > self.threshold())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_boundaries() {
        let cases = [
            (0, Rank::Initiate),
            (49, Rank::Initiate),
            (50, Rank::Green),
            (99, Rank::Green),
            (100, Rank::Teal),
            (250, Rank::Purple),
            (500, Rank::Gold),
            (999, Rank::Gold),
            (1_000, Rank::Diamond),
            (2_500, Rank::Ruby),
            (5_000, Rank::Topaz),
            (9_999, Rank::Topaz),
            (10_000, Rank::Jade),
            (250_000, Rank::Jade),
        ];
        for (gamma, expected) in cases {
            assert_eq!(rank_for_gamma(gamma), expected, "gamma {}", gamma);
        }
    }

    #[test]
    fn test_negative_gamma_is_initiate() {
        assert_eq!(rank_for_gamma(-5), Rank::Initiate);
    }

    #[test]
    fn test_override_replaces_gamma() {
        assert_eq!(rank_with_override(3, Some(600)), Rank::Gold);
        assert_eq!(rank_with_override(600, None), Rank::Gold);
    }

    #[test]
    fn test_zero_override_falls_back_to_gamma() {
        assert_eq!(rank_with_override(120, Some(0)), Rank::Teal);
    }

    #[test]
    fn test_next_threshold() {
        assert_eq!(Rank::Initiate.next_threshold(), Some(50));
        assert_eq!(Rank::Green.next_threshold(), Some(100));
        assert_eq!(Rank::Topaz.next_threshold(), Some(10_000));
        assert_eq!(Rank::Jade.next_threshold(), None);
    }

    #[test]
    fn test_display_and_serde_use_name() {
        assert_eq!(Rank::Diamond.to_string(), "Diamond");
        assert_eq!(serde_json::to_string(&Rank::Ruby).unwrap(), "\"Ruby\"");
    }
}
