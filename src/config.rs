use std::{collections::BTreeSet, fmt};

use crate::{Error, InstallType, Result, SegmentAnalyticsConsumer, SegmentClient};

/// Configuration for [`SegmentAnalyticsConsumer`].
#[derive(Clone)]
pub struct ConsumerConfig {
    pub(crate) write_key: String,
    pub(crate) enabled_install_types: BTreeSet<InstallType>,
    pub(crate) redacted: bool,
    pub(crate) user_property_max_length: usize,
    pub(crate) track_user_property_changes: bool,
}

impl ConsumerConfig {
    /// Maximum length of event names.
    pub const EVENT_MAX_LENGTH: usize = 40;

    /// Default maximum length of user property keys.
    pub const DEFAULT_USER_PROPERTY_MAX_LENGTH: usize = 24;

    /// Environment variable holding the write key.
    pub const WRITE_KEY_ENV: &'static str = "SEGMENT_WRITE_KEY";

    /// Environment variable holding a comma-separated list of enabled install types.
    pub const ENABLED_INSTALL_TYPES_ENV: &'static str = "SEGMENT_ENABLED_INSTALL_TYPES";

    /// Environment variable toggling redaction.
    pub const REDACTED_ENV: &'static str = "SEGMENT_REDACTED";

    /// Create a default configuration using the specified write key. The consumer is enabled for
    /// all install types and redacts values.
    ///
    /// ```
    /// # use segment_analytics_consumer::ConsumerConfig;
    /// ConsumerConfig::from_write_key("write-key");
    /// ```
    pub fn from_write_key(write_key: impl Into<String>) -> Self {
        ConsumerConfig {
            write_key: write_key.into(),
            enabled_install_types: InstallType::ALL.into_iter().collect(),
            redacted: true,
            user_property_max_length: Self::DEFAULT_USER_PROPERTY_MAX_LENGTH,
            track_user_property_changes: false,
        }
    }

    /// Build a configuration from `SEGMENT_WRITE_KEY`, `SEGMENT_ENABLED_INSTALL_TYPES` and
    /// `SEGMENT_REDACTED`. Only the write key is required. An empty install type list is treated
    /// as unset, enabling every install type.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let write_key = lookup(Self::WRITE_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingWriteKey)?;

        let mut config = ConsumerConfig::from_write_key(write_key.trim());

        if let Some(install_types) = lookup(Self::ENABLED_INSTALL_TYPES_ENV) {
            let install_types = install_types
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<InstallType>>>()?;
            if install_types.is_empty() {
                log::warn!(target: "segment",
                           "{} lists no install types, enabling all of them",
                           Self::ENABLED_INSTALL_TYPES_ENV);
            } else {
                config.enabled_install_types(install_types);
            }
        }

        if let Some(redacted) = lookup(Self::REDACTED_ENV) {
            config.redacted(parse_flag(Self::REDACTED_ENV, &redacted)?);
        }

        Ok(config)
    }

    /// Restrict the consumer to the given install types.
    ///
    /// ```
    /// # use segment_analytics_consumer::{ConsumerConfig, InstallType};
    /// let mut config = ConsumerConfig::from_write_key("write-key");
    /// config.enabled_install_types([InstallType::Production]);
    /// ```
    pub fn enabled_install_types(
        &mut self,
        install_types: impl IntoIterator<Item = InstallType>,
    ) -> &mut Self {
        self.enabled_install_types = install_types.into_iter().collect();
        self
    }

    /// Whether parameter and user property values are replaced with a placeholder before they are
    /// sent. Enabled by default.
    pub fn redacted(&mut self, redacted: bool) -> &mut Self {
        self.redacted = redacted;
        self
    }

    /// Override the maximum length of user property keys.
    pub fn user_property_max_length(&mut self, max_length: usize) -> &mut Self {
        self.user_property_max_length = max_length;
        self
    }

    /// Additionally send a `set_user_property` event for every user property update. Disabled by
    /// default.
    pub fn track_user_property_changes(&mut self, enabled: bool) -> &mut Self {
        self.track_user_property_changes = enabled;
        self
    }

    /// Whether the consumer is enabled for `install_type`.
    pub fn is_enabled_for(&self, install_type: InstallType) -> bool {
        self.enabled_install_types.contains(&install_type)
    }

    /// Create a new [`SegmentAnalyticsConsumer`] forwarding to `client`.
    ///
    /// ```
    /// # use segment_analytics_consumer::{ConsumerConfig, HttpSegmentClient};
    /// let consumer = ConsumerConfig::from_write_key("write-key").to_consumer(HttpSegmentClient::new());
    /// ```
    pub fn to_consumer<C: SegmentClient>(self, client: C) -> SegmentAnalyticsConsumer<C> {
        SegmentAnalyticsConsumer::new(self, client)
    }
}

impl fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("write_key", &"<redacted>")
            .field("enabled_install_types", &self.enabled_install_types)
            .field("redacted", &self.redacted)
            .field("user_property_max_length", &self.user_property_max_length)
            .field("track_user_property_changes", &self.track_user_property_changes)
            .finish()
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(Error::InvalidFlag {
            name: name.to_owned(),
            value: value.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::ConsumerConfig;
    use crate::{Error, InstallType};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ConsumerConfig::from_write_key("key");

        assert!(config.redacted);
        assert!(!config.track_user_property_changes);
        assert_eq!(config.user_property_max_length, 24);
        assert!(InstallType::ALL
            .into_iter()
            .all(|install_type| config.is_enabled_for(install_type)));
    }

    #[test]
    fn debug_output_hides_write_key() {
        let config = ConsumerConfig::from_write_key("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn env_requires_write_key() {
        assert!(matches!(
            ConsumerConfig::from_lookup(lookup(&[])),
            Err(Error::MissingWriteKey)
        ));
        assert!(matches!(
            ConsumerConfig::from_lookup(lookup(&[("SEGMENT_WRITE_KEY", "  ")])),
            Err(Error::MissingWriteKey)
        ));
    }

    #[test]
    fn env_reads_all_settings() {
        let config = ConsumerConfig::from_lookup(lookup(&[
            ("SEGMENT_WRITE_KEY", "key"),
            ("SEGMENT_ENABLED_INSTALL_TYPES", "production, testFlight"),
            ("SEGMENT_REDACTED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.write_key, "key");
        assert!(!config.redacted);
        assert!(config.is_enabled_for(InstallType::Production));
        assert!(config.is_enabled_for(InstallType::TestFlight));
        assert!(!config.is_enabled_for(InstallType::Simulator));
    }

    #[test]
    fn env_empty_install_type_list_enables_all() {
        for value in ["", " , ,"] {
            let config = ConsumerConfig::from_lookup(lookup(&[
                ("SEGMENT_WRITE_KEY", "key"),
                ("SEGMENT_ENABLED_INSTALL_TYPES", value),
            ]))
            .unwrap();

            assert!(InstallType::ALL
                .into_iter()
                .all(|install_type| config.is_enabled_for(install_type)));
        }
    }

    #[test]
    fn env_rejects_unknown_install_types() {
        let result = ConsumerConfig::from_lookup(lookup(&[
            ("SEGMENT_WRITE_KEY", "key"),
            ("SEGMENT_ENABLED_INSTALL_TYPES", "production,beta"),
        ]));

        assert!(matches!(result, Err(Error::UnknownInstallType(name)) if name == "beta"));
    }

    #[test]
    fn env_rejects_invalid_flags() {
        let result = ConsumerConfig::from_lookup(lookup(&[
            ("SEGMENT_WRITE_KEY", "key"),
            ("SEGMENT_REDACTED", "maybe"),
        ]));

        assert!(matches!(result, Err(Error::InvalidFlag { .. })));
    }
}
