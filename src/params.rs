use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use derive_more::From;
use serde_json::Value;

use crate::Properties;

/// Placeholder sent instead of parameter and user property values when redaction is enabled.
pub const REDACTED_VALUE: &str = "<private>";

/// Event parameters, keyed by parameter name.
pub type Parameters = HashMap<String, ParameterValue>;

/// A scalar value that can be attached to an event.
#[derive(Debug, Clone, PartialEq, From)]
pub enum ParameterValue {
    /// A string value.
    String(String),
    /// An integer value.
    Int(i64),
    /// A floating point value.
    Double(f64),
    /// A boolean value.
    Bool(bool),
    /// A point in time. Sent as an RFC 3339 string.
    Date(DateTime<Utc>),
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl ParameterValue {
    /// JSON representation sent to Segment. Non-finite doubles become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::String(s) => Value::String(s.clone()),
            ParameterValue::Int(i) => Value::from(*i),
            ParameterValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParameterValue::Bool(b) => Value::Bool(*b),
            ParameterValue::Date(date) => {
                Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }

    fn to_debug_string(&self) -> String {
        match self {
            ParameterValue::String(s) => s.clone(),
            ParameterValue::Int(i) => i.to_string(),
            ParameterValue::Double(d) => d.to_string(),
            ParameterValue::Bool(b) => b.to_string(),
            ParameterValue::Date(date) => date.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Convert parameters into Segment properties. When `redacted` is set, every value is replaced
/// with [`REDACTED_VALUE`] while keys are kept.
pub fn to_properties(params: &Parameters, redacted: bool) -> Properties {
    params
        .iter()
        .map(|(key, value)| {
            let value = if redacted {
                Value::String(REDACTED_VALUE.to_owned())
            } else {
                value.to_json()
            };
            (key.clone(), value)
        })
        .collect()
}

/// Human-readable summary of an event, used for log records.
///
/// Parameters are sorted by key so the output is stable.
pub fn debug_string_for_event(event: &str, params: Option<&Parameters>, redacted: bool) -> String {
    let Some(params) = params.filter(|params| !params.is_empty()) else {
        return event.to_owned();
    };

    let mut entries: Vec<_> = params.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    let rendered = entries
        .into_iter()
        .map(|(key, value)| {
            let value = if redacted {
                REDACTED_VALUE.to_owned()
            } else {
                value.to_debug_string()
            };
            format!("{key}:{value}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("{event} params:[{rendered}]")
}

/// Human-readable summary of a user property update, used for log records.
pub fn debug_string_for_set(key: &str, value: Option<&str>, redacted: bool) -> String {
    match value {
        None => format!("set user property {key} to nil"),
        Some(_) if redacted => format!("set user property {key} to {REDACTED_VALUE}"),
        Some(value) => format!("set user property {key} to {value}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn params() -> Parameters {
        [
            ("source".to_owned(), ParameterValue::from("push")),
            ("count".to_owned(), ParameterValue::Int(3)),
            ("premium".to_owned(), ParameterValue::Bool(true)),
        ]
        .into()
    }

    #[test]
    fn passes_values_through_when_not_redacted() {
        let properties = to_properties(&params(), false);

        assert_eq!(properties["source"], json!("push"));
        assert_eq!(properties["count"], json!(3));
        assert_eq!(properties["premium"], json!(true));
    }

    #[test]
    fn replaces_values_but_keeps_keys_when_redacted() {
        let properties = to_properties(&params(), true);

        assert_eq!(properties.len(), 3);
        assert!(properties.values().all(|v| v == &json!(REDACTED_VALUE)));
        assert!(properties.contains_key("source"));
    }

    #[test]
    fn dates_are_sent_as_rfc3339() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            ParameterValue::Date(date).to_json(),
            json!("2025-03-01T12:30:00.000Z")
        );
    }

    #[test]
    fn non_finite_doubles_become_null() {
        assert_eq!(ParameterValue::Double(f64::NAN).to_json(), json!(null));
        assert_eq!(ParameterValue::Double(1.5).to_json(), json!(1.5));
    }

    #[test]
    fn event_debug_string_is_sorted() {
        assert_eq!(
            debug_string_for_event("app_open", Some(&params()), false),
            "app_open params:[count:3, premium:true, source:push]"
        );
        assert_eq!(
            debug_string_for_event("app_open", Some(&params()), true),
            "app_open params:[count:<private>, premium:<private>, source:<private>]"
        );
    }

    #[test]
    fn event_debug_string_without_params_is_the_event_name() {
        assert_eq!(debug_string_for_event("app_open", None, true), "app_open");
        assert_eq!(
            debug_string_for_event("app_open", Some(&Parameters::new()), true),
            "app_open"
        );
    }

    #[test]
    fn set_debug_string() {
        assert_eq!(
            debug_string_for_set("plan", Some("pro"), false),
            "set user property plan to pro"
        );
        assert_eq!(
            debug_string_for_set("plan", Some("pro"), true),
            "set user property plan to <private>"
        );
        assert_eq!(
            debug_string_for_set("plan", None, true),
            "set user property plan to nil"
        );
    }
}
