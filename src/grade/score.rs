#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use super::results::ScoreEntry;

/// Final point totals for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Points possible, forced to the cap when one is set
    pub possible:   u32,
    /// Points earned, never above the cap
    pub earned:     u32,
    /// Earned points before capping, kept only when capping lowered them
    pub raw_earned: Option<u32>,
}

impl Totals {
    /// Sums the possible and earned points of `entries`.
    pub fn sum(entries: &[ScoreEntry]) -> Self {
        entries.iter().fold(Totals::default(), |acc, e| Totals {
            possible:   acc.possible + e.points_possible,
            earned:     acc.earned + e.points_earned,
            raw_earned: None,
        })
    }
}

impl Display for Totals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.earned, self.possible)
    }
}

/// Applies the optional points cap.
///
/// * `possible`: summed points possible
/// * `earned`: summed points earned
/// * `cap`: configured maximum
pub fn finalize(possible: u32, earned: u32, cap: Option<u32>) -> Totals {
    match cap {
        None => Totals {
            possible,
            earned,
            raw_earned: None,
        },
        Some(cap) if earned > cap => Totals {
            possible:   cap,
            earned:     cap,
            raw_earned: Some(earned),
        },
        Some(cap) => Totals {
            possible: cap,
            earned,
            raw_earned: None,
        },
    }
}
