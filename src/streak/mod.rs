pub mod types;

pub use types::*;

use crate::calendar::ActiveDateSet;

/// Compute current and longest runs of consecutive active days.
///
/// `current` is anchored to the most recent active day in `days`, not to
/// today's date. Callers that care about recency should look at
/// `last_active_date`.
pub fn compute_streaks(days: &ActiveDateSet) -> StreakRecord {
    // ActiveDateSet iterates in ascending order
    let sorted: Vec<_> = days.iter().collect();
    let Some(&last) = sorted.last() else {
        return StreakRecord::default();
    };

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in sorted.windows(2) {
        if pair[0].days_until(pair[1]) == 1 {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    let mut current = 1u32;
    let mut cursor = last;
    while let Some(prev) = cursor.pred().filter(|p| days.contains(*p)) {
        current += 1;
        cursor = prev;
    }

    StreakRecord {
        current,
        longest,
        last_active_date: Some(last),
    }
}
