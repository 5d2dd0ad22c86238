pub mod shape;

pub use shape::PayloadShape;

use serde_json::Value;

use crate::calendar::{ActiveDateSet, CalendarDay};
use crate::date_util::canonicalize_date;
use shape::{coerce_count, first_field, week_days, year_days, COUNT_FIELDS, DATE_FIELDS};

/// How many `data` wrappers are unwrapped before the rest is ignored.
pub const MAX_WRAP_DEPTH: usize = 3;

/// Reduce a contribution payload of unknown layout to its active days.
///
/// Never fails. Fragments that are missing fields, carry an unreadable date,
/// or have a count that is not strictly positive are skipped.
pub fn normalize(payload: &Value) -> ActiveDateSet {
    let mut days = Vec::new();
    collect(payload, 0, &mut days);
    let set: ActiveDateSet = days.into_iter().collect();
    log::debug!("Normalized payload to {} active days", set.len());
    set
}

fn collect(payload: &Value, depth: usize, out: &mut Vec<CalendarDay>) {
    for shape in PayloadShape::detect(payload) {
        log::trace!("Matched payload shape {} at depth {depth}", shape.name());
        match shape {
            PayloadShape::DayList(items) => out.extend(extract_day_list(items)),
            PayloadShape::YearGroups(groups) => out.extend(extract_year_groups(groups)),
            PayloadShape::WeekCalendar(weeks) => out.extend(extract_week_calendar(weeks)),
            PayloadShape::Wrapped(inner) => {
                if depth < MAX_WRAP_DEPTH {
                    collect(inner, depth + 1, out);
                } else {
                    log::debug!("Ignoring payload wrapped deeper than {MAX_WRAP_DEPTH} levels");
                }
            }
        }
    }
}

/// Active days from a flat list of day records.
pub fn extract_day_list(items: &[Value]) -> Vec<CalendarDay> {
    items.iter().filter_map(parse_day_record).collect()
}

/// Active days from a list of year groups, each holding a day list.
pub fn extract_year_groups(groups: &[Value]) -> Vec<CalendarDay> {
    groups
        .iter()
        .filter_map(year_days)
        .flat_map(extract_day_list)
        .collect()
}

/// Active days from a list of weeks, each holding (or being) a day list.
pub fn extract_week_calendar(weeks: &[Value]) -> Vec<CalendarDay> {
    weeks
        .iter()
        .filter_map(week_days)
        .flat_map(extract_day_list)
        .collect()
}

/// The day of a single record, if it counts as active.
pub fn parse_day_record(record: &Value) -> Option<CalendarDay> {
    let Some(obj) = record.as_object() else {
        log::trace!("Skipping non-object day record");
        return None;
    };

    let count = first_field(obj, COUNT_FIELDS).map_or(f64::NAN, coerce_count);
    if !(count.is_finite() && count > 0.0) {
        return None;
    }

    let day = first_field(obj, DATE_FIELDS).and_then(canonicalize_date);
    if day.is_none() {
        log::trace!("Skipping day record with unreadable date: {record}");
    }
    day
}
