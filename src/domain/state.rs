use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Direction;

/// Persisted sizing record.
///
/// Field names on disk are kept stable so state files survive upgrades:
/// `last_transaction_type`, `consecutive_count`, `last_reset_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingState {
    /// Direction of the most recent processed signal
    #[serde(rename = "last_transaction_type")]
    pub last_direction: Option<Direction>,
    /// Consecutive signals sharing `last_direction`
    #[serde(rename = "consecutive_count")]
    pub streak_count: u32,
    /// Date the streak was last zeroed by the daily reset
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

impl SizingState {
    /// Fresh record: no direction, empty streak, reset stamped `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            last_direction: None,
            streak_count: 0,
            last_reset_date: Some(today),
        }
    }

    /// `streak_count == 0` iff there is no last direction
    pub fn is_consistent(&self) -> bool {
        self.last_direction.is_none() == (self.streak_count == 0)
    }

    /// Zero the streak without touching the reset date
    pub fn clear_streak(&mut self) {
        self.last_direction = None;
        self.streak_count = 0;
    }
}

impl fmt::Display for SizingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = self.last_direction.map(|d| d.as_str()).unwrap_or("none");
        match self.last_reset_date {
            Some(date) => write!(f, "{} x{} (reset {})", direction, self.streak_count, date),
            None => write!(f, "{} x{}", direction, self.streak_count),
        }
    }
}
