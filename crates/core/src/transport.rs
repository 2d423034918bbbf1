//! Transport-safe value conversion.
//!
//! Outbound payloads (event payloads, notification metadata) are built as a
//! [`TransportValue`] tree and converted to JSON in one recursive pass:
//! identifiers become strings, dates and instants become ISO-8601 strings,
//! enums become their wire names, and map keys are rewritten from
//! `snake_case` to `camelCase`.

use chrono::{NaiveDate, SecondsFormat};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::types::Timestamp;

/// A value that can cross the process boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(Timestamp),
    /// An enum variant already reduced to its wire name.
    Enum(&'static str),
    List(Vec<TransportValue>),
    /// Ordered `snake_case` keyed fields.
    Map(Vec<(String, TransportValue)>),
}

impl TransportValue {
    /// Start an empty map; chain [`field`](Self::field) to fill it.
    pub fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Append a field to a map. Has no effect on other variants.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<TransportValue>) -> Self {
        if let Self::Map(fields) = &mut self {
            fields.push((key.into(), value.into()));
        }
        self
    }

    /// Convert to JSON, recursing through lists and maps.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            // NaN and infinities have no JSON form.
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::Uuid(id) => Value::String(id.to_string()),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Enum(name) => Value::String((*name).to_string()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (key, value) in fields {
                    map.insert(camel_case(key), value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

/// `grace_period_days` -> `gracePeriodDays`. Keys without underscores pass through.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for TransportValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for TransportValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for TransportValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for TransportValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for TransportValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TransportValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for TransportValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<NaiveDate> for TransportValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Timestamp> for TransportValue {
    fn from(value: Timestamp) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<TransportValue>> From<Option<T>> for TransportValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<TransportValue>> From<Vec<T>> for TransportValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn camel_case_keys() {
        assert_eq!(camel_case("grace_period_days"), "gracePeriodDays");
        assert_eq!(camel_case("id"), "id");
        assert_eq!(camel_case("_private_field"), "privateField");
        assert_eq!(camel_case("trailing_"), "trailing");
    }

    #[test]
    fn nested_payload_converts_recursively() {
        let id = Uuid::nil();
        let deadline = Utc.with_ymd_and_hms(2025, 3, 15, 16, 59, 59).unwrap();
        let value = TransportValue::map()
            .field("schedule_id", id)
            .field("submission_deadline", deadline)
            .field("is_mandatory", true)
            .field("recurrence_type", TransportValue::Enum("annual"))
            .field("effective_until_year", None::<i32>)
            .field(
                "academic_year",
                TransportValue::map()
                    .field("year_code", 2024)
                    .field("start_date", NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()),
            )
            .field("recipient_ids", vec![id]);

        assert_eq!(
            value.to_json(),
            json!({
                "scheduleId": "00000000-0000-0000-0000-000000000000",
                "submissionDeadline": "2025-03-15T16:59:59Z",
                "isMandatory": true,
                "recurrenceType": "annual",
                "effectiveUntilYear": null,
                "academicYear": { "yearCode": 2024, "startDate": "2024-08-01" },
                "recipientIds": ["00000000-0000-0000-0000-000000000000"],
            })
        );
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(TransportValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(TransportValue::Float(1.5).to_json(), json!(1.5));
    }

    #[test]
    fn field_on_non_map_is_ignored() {
        let value = TransportValue::Int(3).field("x", 1);
        assert_eq!(value, TransportValue::Int(3));
    }
}
