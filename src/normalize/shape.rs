use serde_json::{Map, Value};

/// Field names carrying the day of a record, in lookup order.
pub const DATE_FIELDS: &[&str] = &["date", "day"];

/// Field names carrying the contribution count of a record, in lookup order.
pub const COUNT_FIELDS: &[&str] = &["count", "contributionCount", "contributions", "value", "total"];

/// Fields that hold a year-group's or week's nested day list.
const YEAR_DAY_FIELDS: &[&str] = &["contributions", "days"];
const WEEK_DAY_FIELDS: &[&str] = &["contributionDays", "days"];

/// Containers that may hold a `weeks` array.
const CALENDAR_FIELDS: &[&str] = &["contributionCalendar", "calendar"];

/// One recognized layout of a contribution payload.
///
/// A single payload may match several shapes; every match contributes days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// `[{date, count}, ...]` or `{"contributions": [{date, count}, ...]}`
    DayList(&'a [Value]),
    /// `{"years": [{"contributions": [...]}, ...]}`, or a list of year groups
    /// in any place a day list may appear
    YearGroups(&'a [Value]),
    /// `{"weeks": [{"contributionDays": [...]}, ...]}`, also under
    /// `contributionCalendar` or `calendar`, or a list of weeks in any place
    /// a day list may appear (`{"contributions": [[{date, ...}, ...], ...]}`)
    WeekCalendar(&'a [Value]),
    /// `{"data": <payload>}`
    Wrapped(&'a Value),
}

impl<'a> PayloadShape<'a> {
    /// Every shape `payload` matches at its outer level.
    pub fn detect(payload: &'a Value) -> Vec<PayloadShape<'a>> {
        let mut shapes = Vec::new();
        let obj = match payload {
            Value::Array(items) => {
                push_list_shapes(items, &mut shapes);
                return shapes;
            }
            Value::Object(obj) => obj,
            _ => return shapes,
        };

        if let Some(items) = array_field(obj, "contributions") {
            push_list_shapes(items, &mut shapes);
        }
        if let Some(groups) = array_field(obj, "years") {
            shapes.push(PayloadShape::YearGroups(groups));
        }
        if let Some(weeks) = find_weeks(obj) {
            shapes.push(PayloadShape::WeekCalendar(weeks));
        }
        match obj.get("data") {
            Some(Value::Null) | None => {}
            Some(inner) => shapes.push(PayloadShape::Wrapped(inner)),
        }
        shapes
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayloadShape::DayList(_) => "day_list",
            PayloadShape::YearGroups(_) => "year_groups",
            PayloadShape::WeekCalendar(_) => "week_calendar",
            PayloadShape::Wrapped(_) => "wrapped",
        }
    }
}

/// A list found where day records are expected may instead hold year groups
/// or weeks. Every reading that fits is kept; records of the wrong kind are
/// skipped by the extractor for that shape.
fn push_list_shapes<'a>(items: &'a [Value], shapes: &mut Vec<PayloadShape<'a>>) {
    shapes.push(PayloadShape::DayList(items));
    if items.iter().any(|item| year_days(item).is_some()) {
        shapes.push(PayloadShape::YearGroups(items));
    }
    if items.iter().any(|item| week_days(item).is_some()) {
        shapes.push(PayloadShape::WeekCalendar(items));
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    obj.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn find_weeks(obj: &Map<String, Value>) -> Option<&[Value]> {
    array_field(obj, "weeks").or_else(|| {
        CALENDAR_FIELDS
            .iter()
            .filter_map(|f| obj.get(*f).and_then(Value::as_object))
            .find_map(|cal| array_field(cal, "weeks"))
    })
}

/// The nested day list of a year group, if it has one.
pub fn year_days(group: &Value) -> Option<&[Value]> {
    let obj = group.as_object()?;
    YEAR_DAY_FIELDS.iter().find_map(|f| array_field(obj, f))
}

/// The day list of a week. A week that is itself an array is its own day list.
pub fn week_days(week: &Value) -> Option<&[Value]> {
    match week {
        Value::Array(days) => Some(days),
        Value::Object(obj) => WEEK_DAY_FIELDS.iter().find_map(|f| array_field(obj, f)),
        _ => None,
    }
}

/// First non-null value among `fields`.
pub fn first_field<'a>(obj: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|f| obj.get(*f))
        .find(|v| !v.is_null())
}

/// Loose numeric coercion of a count value.
///
/// Strings are parsed after trimming (an empty string is zero), booleans are
/// 1/0, `null` is zero. Arrays, objects and unparseable strings are NaN.
pub fn coerce_count(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_bare_array() {
        let payload = json!([{"date": "2024-01-01", "count": 1}]);
        let shapes = PayloadShape::detect(&payload);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name(), "day_list");
    }

    #[test]
    fn test_detect_multiple_shapes() {
        let payload = json!({
            "contributions": [],
            "years": [],
            "contributionCalendar": {"weeks": []},
            "data": {"contributions": []}
        });
        let names: Vec<&str> = PayloadShape::detect(&payload).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["day_list", "year_groups", "week_calendar", "wrapped"]);
    }

    #[test]
    fn test_detect_nested_lists_in_day_list_position() {
        let weeks = json!({"contributions": [[{"date": "2024-01-01", "contributionCount": 1}]]});
        let names: Vec<&str> = PayloadShape::detect(&weeks).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["day_list", "week_calendar"]);

        let years = json!([{"year": "2024", "contributions": [{"date": "2024-01-01", "count": 1}]}]);
        let names: Vec<&str> = PayloadShape::detect(&years).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["day_list", "year_groups"]);

        let both = json!([{"days": [{"date": "2024-01-01", "count": 1}]}]);
        let names: Vec<&str> = PayloadShape::detect(&both).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["day_list", "year_groups", "week_calendar"]);
    }

    #[test]
    fn test_detect_ignores_scalars_and_null_data() {
        assert!(PayloadShape::detect(&json!(null)).is_empty());
        assert!(PayloadShape::detect(&json!("2024-01-01")).is_empty());
        assert!(PayloadShape::detect(&json!({"data": null})).is_empty());
        assert!(PayloadShape::detect(&json!({"contributions": 42})).is_empty());
    }

    #[test]
    fn test_week_days_variants() {
        let as_array = json!([{"date": "2024-01-01"}]);
        let nested = json!({"contributionDays": [{"date": "2024-01-01"}]});
        let alt = json!({"days": [{"date": "2024-01-01"}, {"date": "2024-01-02"}]});
        assert_eq!(week_days(&as_array).map(<[Value]>::len), Some(1));
        assert_eq!(week_days(&nested).map(<[Value]>::len), Some(1));
        assert_eq!(week_days(&alt).map(<[Value]>::len), Some(2));
        assert!(week_days(&json!({"firstDay": "2024-01-01"})).is_none());
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(&json!(3)), 3.0);
        assert_eq!(coerce_count(&json!(" 7 ")), 7.0);
        assert_eq!(coerce_count(&json!("")), 0.0);
        assert_eq!(coerce_count(&json!(true)), 1.0);
        assert_eq!(coerce_count(&json!(null)), 0.0);
        assert!(coerce_count(&json!("lots")).is_nan());
        assert!(coerce_count(&json!([1])).is_nan());
    }

    #[test]
    fn test_first_field_skips_null() {
        let obj = json!({"count": null, "contributionCount": 4});
        let obj = obj.as_object().unwrap();
        assert_eq!(first_field(obj, COUNT_FIELDS), Some(&json!(4)));
    }
}
