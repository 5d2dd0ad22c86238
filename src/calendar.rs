use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::date_util::is_canonical_day;
use crate::error::{Error, Result};

/// A calendar day with no time-of-day or offset attached.
///
/// Always renders as a zero-padded `YYYY-MM-DD` string. Years are limited to
/// 0000-9999 so the rendering is exactly ten characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Option<Self> {
        (0..=9999).contains(&date.year()).then_some(Self(date))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::new)
    }

    /// The current UTC calendar day.
    pub fn today_utc() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The day before, if it is still representable.
    pub fn pred(self) -> Option<Self> {
        self.0.pred_opt().and_then(Self::new)
    }

    pub fn succ(self) -> Option<Self> {
        self.0.succ_opt().and_then(Self::new)
    }

    /// Signed number of days from `self` to `other`.
    pub fn days_until(self, other: CalendarDay) -> i64 {
        (other.0 - self.0).num_days()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if !is_canonical_day(s) {
            return Err(Error::InvalidDate(format!("expected YYYY-MM-DD, got '{s}'")));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| Error::InvalidDate(format!("not a calendar date: '{s}'")))
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The distinct days on which an identity was active.
///
/// Built once from a payload and read-only afterwards. Iteration is in
/// ascending calendar order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActiveDateSet {
    days: BTreeSet<CalendarDay>,
}

impl ActiveDateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.days.contains(&day)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = CalendarDay> + '_ {
        self.days.iter().copied()
    }

    pub fn first(&self) -> Option<CalendarDay> {
        self.days.first().copied()
    }

    pub fn last(&self) -> Option<CalendarDay> {
        self.days.last().copied()
    }

    /// Consume both sets and return their union.
    pub fn union(mut self, other: ActiveDateSet) -> ActiveDateSet {
        self.days.extend(other.days);
        self
    }
}

impl FromIterator<CalendarDay> for ActiveDateSet {
    fn from_iter<I: IntoIterator<Item = CalendarDay>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(d(2024, 1, 5).to_string(), "2024-01-05");
        assert_eq!(d(987, 12, 31).to_string(), "0987-12-31");
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!("2024-1-05".parse::<CalendarDay>().is_err());
        assert!("2024-02-30".parse::<CalendarDay>().is_err());
        assert!("2024-01-05T00:00:00Z".parse::<CalendarDay>().is_err());
        assert_eq!("2024-02-29".parse::<CalendarDay>().unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn test_out_of_range_year_rejected() {
        assert!(CalendarDay::from_ymd(10000, 1, 1).is_none());
        assert!(CalendarDay::from_ymd(-1, 1, 1).is_none());
        assert!(d(0, 1, 1).pred().is_none());
    }

    #[test]
    fn test_days_until_crosses_year_boundary() {
        assert_eq!(d(2023, 12, 31).days_until(d(2024, 1, 1)), 1);
        assert_eq!(d(2024, 3, 1).days_until(d(2024, 2, 28)), -2);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&d(2024, 7, 4)).unwrap();
        assert_eq!(json, "\"2024-07-04\"");
        let back: CalendarDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d(2024, 7, 4));
        assert!(serde_json::from_str::<CalendarDay>("\"July 4\"").is_err());
    }

    #[test]
    fn test_set_dedups_and_orders() {
        let set: ActiveDateSet = [d(2024, 1, 3), d(2024, 1, 1), d(2024, 1, 3)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), Some(d(2024, 1, 1)));
        assert_eq!(set.last(), Some(d(2024, 1, 3)));
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            serde_json::json!(["2024-01-01", "2024-01-03"])
        );
    }

    #[test]
    fn test_union() {
        let a: ActiveDateSet = [d(2024, 1, 1), d(2024, 1, 2)].into_iter().collect();
        let b: ActiveDateSet = [d(2024, 1, 2), d(2024, 1, 9)].into_iter().collect();
        let u = a.union(b);
        assert_eq!(u.len(), 3);
        assert!(u.contains(d(2024, 1, 9)));
    }
}
