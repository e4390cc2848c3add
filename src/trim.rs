//! Event and user property identifiers, before and after trimming.
//!
//! Analytics backends cap the length of event names and user property keys. The host produces raw
//! identifiers ([`AnalyticsEvent`], [`UserProperty`]), the consumer trims them to its limits and
//! hands back the trimmed wrappers, which are then passed to tracking calls as-is.

use std::fmt;

/// Raw event name, as produced by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyticsEvent(String);

impl AnalyticsEvent {
    /// Wrap an event name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The event name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw user property key, as produced by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserProperty(String);

impl UserProperty {
    /// Wrap a user property key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The user property key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An event name that has already been trimmed by a consumer.
///
/// The wrapped string is used verbatim; it is not re-validated downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrimmedEvent(String);

impl TrimmedEvent {
    /// Wrap an already-trimmed event name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The trimmed event name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrimmedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user property key that has already been trimmed by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrimmedUserProperty(String);

impl TrimmedUserProperty {
    /// Wrap an already-trimmed user property key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The trimmed user property key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrimmedUserProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cap `value` to at most `max_length` characters.
///
/// Length is counted in `char`s, so a multi-byte character is never split. A warning is logged
/// whenever the value had to be shortened; `debug_type` names the kind of identifier in that
/// record.
pub fn trim_to_length(value: &str, max_length: usize, debug_type: &str) -> String {
    let Some((cut, _)) = value.char_indices().nth(max_length) else {
        return value.to_owned();
    };

    let trimmed = &value[..cut];
    log::warn!(target: "segment",
               debug_type,
               max_length,
               original = value,
               trimmed;
               "trimmed {} to {} characters", debug_type, max_length);
    trimmed.to_owned()
}

#[cfg(test)]
mod tests {
    use super::trim_to_length;

    #[test]
    fn keeps_short_values() {
        assert_eq!(trim_to_length("app_open", 40, "event"), "app_open");
    }

    #[test]
    fn keeps_values_at_the_limit() {
        let value = "a".repeat(24);
        assert_eq!(trim_to_length(&value, 24, "user property"), value);
    }

    #[test]
    fn cuts_long_values_to_exactly_the_limit() {
        let value = "x".repeat(57);
        assert_eq!(trim_to_length(&value, 40, "event").len(), 40);
    }

    #[test]
    fn does_not_split_multibyte_characters() {
        let trimmed = trim_to_length("ééééé", 3, "event");
        assert_eq!(trimmed, "ééé");
        assert_eq!(trimmed.chars().count(), 3);
    }

    #[test]
    fn zero_limit_yields_empty_string() {
        assert_eq!(trim_to_length("abc", 0, "event"), "");
    }
}
