use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

use super::{Document, Fields};
use crate::error::AppError;

/// Value on the right-hand side of a constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Integer(i64),
    Bool(bool),
}

impl FieldValue {
    /// Orders a stored value relative to this one. `None` when the stored
    /// value is missing or of another type.
    fn compare_stored(&self, stored: &Value) -> Option<Ordering> {
        match (self, stored) {
            (FieldValue::Text(expected), Value::String(actual)) => {
                Some(actual.as_str().cmp(expected.as_str()))
            }
            (FieldValue::Timestamp(expected), Value::String(actual)) => {
                parse_timestamp(actual).map(|actual| actual.cmp(expected))
            }
            (FieldValue::Integer(expected), Value::Number(actual)) => {
                actual.as_i64().map(|actual| actual.cmp(expected))
            }
            (FieldValue::Bool(expected), Value::Bool(actual)) => Some(actual.cmp(expected)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Eq(String, FieldValue),
    AtLeast(String, FieldValue),
    AtMost(String, FieldValue),
}

impl Constraint {
    fn admits(&self, fields: &Fields) -> bool {
        let (field, bound) = match self {
            Constraint::Eq(field, bound)
            | Constraint::AtLeast(field, bound)
            | Constraint::AtMost(field, bound) => (field, bound),
        };

        let Some(ordering) = fields.get(field).and_then(|stored| bound.compare_stored(stored))
        else {
            return false;
        };

        match self {
            Constraint::Eq(..) => ordering == Ordering::Equal,
            Constraint::AtLeast(..) => ordering != Ordering::Less,
            Constraint::AtMost(..) => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality and range filters plus at most one sort field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    constraints: Vec<Constraint>,
    order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.constraints
            .push(Constraint::Eq(field.to_string(), value.into()));
        self
    }

    pub fn where_at_least(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.constraints
            .push(Constraint::AtLeast(field.to_string(), value.into()));
        self
    }

    pub fn where_at_most(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.constraints
            .push(Constraint::AtMost(field.to_string(), value.into()));
        self
    }

    /// Restricts `field` to the UTC day window of `date`.
    pub fn within_day(self, field: &str, date: NaiveDate) -> Self {
        let (start, end) = utc_day_bounds(date);
        self.where_at_least(field, start).where_at_most(field, end)
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.constraints.iter().all(|c| c.admits(fields))
    }

    /// Filters and sorts documents. Documents without the sort field are left
    /// out, the way an indexed query would.
    pub fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        let mut matching: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.matches(&doc.fields))
            .collect();

        if let Some(order) = &self.order_by {
            matching.retain(|doc| doc.fields.contains_key(&order.field));
            matching.sort_by(|a, b| {
                let ordering = compare_values(&a.fields[&order.field], &b.fields[&order.field]);
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        matching
    }
}

/// First and last millisecond of `date` in UTC.
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|end| end.and_utc())
        .unwrap_or(start);
    (start, end)
}

/// Parses a calendar date as typed into a date input (`YYYY-MM-DD`).
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| AppError::BadRequest(format!("invalid date {raw:?}: {err}")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        },
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn doc(id: &str, value: Value) -> Document {
        Document::new(id, value.as_object().unwrap().clone())
    }

    #[test]
    fn day_bounds_cover_the_whole_utc_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let (start, end) = utc_day_bounds(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap());
        assert_eq!(end.to_rfc3339(), "2025-03-09T23:59:59.999+00:00");
    }

    #[test]
    fn within_day_is_inclusive_on_both_ends() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let query = Query::new().within_day("timestamp", date);
        let docs = vec![
            doc("before", json!({ "timestamp": "2025-03-08T23:59:59.999Z" })),
            doc("start", json!({ "timestamp": "2025-03-09T00:00:00Z" })),
            doc("end", json!({ "timestamp": "2025-03-09T23:59:59.999Z" })),
            doc("after", json!({ "timestamp": "2025-03-10T00:00:00Z" })),
        ];

        let ids: Vec<String> = query.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["start", "end"]);
    }

    #[test]
    fn timestamps_with_offsets_compare_as_instants() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let query = Query::new().within_day("timestamp", date);
        let late_evening_santiago = doc("x", json!({ "timestamp": "2025-03-08T22:30:00-03:00" }));
        assert!(query.matches(&late_evening_santiago.fields));
    }

    #[test]
    fn eq_requires_matching_type() {
        let query = Query::new().where_eq("shift", "Night");
        assert!(query.matches(json!({ "shift": "Night" }).as_object().unwrap()));
        assert!(!query.matches(json!({ "shift": "Day" }).as_object().unwrap()));
        assert!(!query.matches(json!({ "shift": 1 }).as_object().unwrap()));
        assert!(!query.matches(json!({}).as_object().unwrap()));
    }

    #[test]
    fn order_by_descending_drops_documents_without_the_field() {
        let query = Query::new().order_by("timestamp", Direction::Descending);
        let docs = vec![
            doc("old", json!({ "timestamp": "2025-01-01T00:00:00Z" })),
            doc("missing", json!({ "driver": "Ana" })),
            doc("new", json!({ "timestamp": "2025-02-01T00:00:00Z" })),
        ];

        let ids: Vec<String> = query.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn calendar_date_rejects_garbage() {
        assert!(parse_calendar_date("2025-02-30").is_err());
        assert!(parse_calendar_date("yesterday").is_err());
        assert_eq!(
            parse_calendar_date(" 2025-02-28 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }
}
