//! Daily streak reset.
//!
//! The streak is zeroed by the first signal processed at or after the
//! boundary time on a calendar day other than `last_reset_date`. Signals
//! that arrive on a new date but before the boundary (overnight sessions)
//! keep the streak.

use chrono::{NaiveDateTime, NaiveTime};
use tracing::info;

use crate::domain::SizingState;
use crate::error::{PyramidError, Result};

/// Default boundary: 06:00 local
pub const DEFAULT_RESET_HOUR: u32 = 6;
pub const DEFAULT_RESET_MINUTE: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    boundary: NaiveTime,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            boundary: NaiveTime::from_hms_opt(DEFAULT_RESET_HOUR, DEFAULT_RESET_MINUTE, 0)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ResetPolicy {
    pub fn new(boundary: NaiveTime) -> Self {
        Self { boundary }
    }

    pub fn from_hour_minute(hour: u32, minute: u32) -> Result<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self::new)
            .ok_or_else(|| {
                PyramidError::Validation(format!("invalid reset boundary {:02}:{:02}", hour, minute))
            })
    }

    pub fn boundary(&self) -> NaiveTime {
        self.boundary
    }

    /// Zero the streak if `now` is past the boundary on a new day.
    ///
    /// Returns true when a reset happened; the caller must persist. A record
    /// without a reset date is backfilled with today's date and keeps its
    /// streak.
    pub fn maybe_reset(&self, state: &mut SizingState, now: NaiveDateTime) -> bool {
        let today = now.date();

        if state.last_reset_date != Some(today) && now.time() >= self.boundary {
            info!(
                previous = %state,
                boundary = %self.boundary,
                "daily reset: clearing streak"
            );
            state.clear_streak();
            state.last_reset_date = Some(today);
            return true;
        }

        if state.last_reset_date.is_none() {
            state.last_reset_date = Some(today);
        }

        false
    }
}
