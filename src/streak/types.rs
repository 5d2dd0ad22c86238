use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDay;

/// Streak statistics derived from a set of active days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    /// Length of the run ending at `last_active_date`.
    pub current: u32,
    /// Longest run anywhere in the data.
    pub longest: u32,
    pub last_active_date: Option<CalendarDay>,
}

impl StreakRecord {
    /// Days elapsed between the last active day and `today`.
    pub fn days_since_active(&self, today: CalendarDay) -> Option<i64> {
        self.last_active_date.map(|last| last.days_until(today))
    }

    /// Whether the current run can still be extended on `today`, i.e. the
    /// last active day is today or yesterday.
    pub fn is_active_on(&self, today: CalendarDay) -> bool {
        matches!(self.days_since_active(today), Some(0 | 1))
    }
}
