use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use uuid::Uuid;

use crate::{
    params::{debug_string_for_event, debug_string_for_set, to_properties, REDACTED_VALUE},
    trim::trim_to_length,
    AnalyticsConsumer, AnalyticsConsumerWithWriteOnlyUserId, AnalyticsEvent, AnalyticsHost,
    ConsumerConfig, Error, InstallType, Parameters, Properties, Result, SegmentClient,
    SettingsStore, SetupOptions, TrimmedEvent, TrimmedUserProperty, UserProperty,
};

/// Settings key under which the anonymous ID is persisted.
pub const ANONYMOUS_ID_KEY: &str = "segment.anonymous_id";

/// Event sent for user property updates when
/// [`ConsumerConfig::track_user_property_changes`] is enabled.
pub const SET_USER_PROPERTY_EVENT: &str = "set_user_property";

/// Sends analytics events and user properties to Segment.
///
/// In order to create a consumer instance, first create [`ConsumerConfig`].
///
/// # Examples
/// ```
/// # use segment_analytics_consumer::{
/// #     AnalyticsConsumer, ConsumerConfig, HttpSegmentClient, InMemorySettingsStore, InstallType,
/// # };
/// let mut config = ConsumerConfig::from_write_key("write-key");
/// config.enabled_install_types([InstallType::Production]);
/// let consumer = config.to_consumer(HttpSegmentClient::new());
///
/// let store = InMemorySettingsStore::new();
/// assert!(consumer.start(InstallType::Simulator, &store, &()).is_err());
/// ```
pub struct SegmentAnalyticsConsumer<C> {
    config: ConsumerConfig,
    client: C,
    started: AtomicBool,
}

impl<C: SegmentClient> SegmentAnalyticsConsumer<C> {
    /// Create a new consumer forwarding to `client`.
    pub fn new(config: ConsumerConfig, client: C) -> Self {
        SegmentAnalyticsConsumer {
            config,
            client,
            started: AtomicBool::new(false),
        }
    }

    /// The wrapped Segment client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The configuration the consumer was created with.
    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Whether [`start`](AnalyticsConsumer::start) has succeeded.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn anonymous_id(store: &dyn SettingsStore) -> String {
        if let Some(anonymous_id) = store.get(ANONYMOUS_ID_KEY).filter(|id| !id.is_empty()) {
            return anonymous_id;
        }

        let anonymous_id = Uuid::new_v4().to_string();
        store.set(ANONYMOUS_ID_KEY, &anonymous_id);
        log::debug!(target: "segment", anonymous_id = anonymous_id.as_str(); "generated anonymous id");
        anonymous_id
    }
}

impl<C: SegmentClient> AnalyticsConsumer for SegmentAnalyticsConsumer<C> {
    fn start(
        &self,
        install_type: InstallType,
        store: &dyn SettingsStore,
        host: &dyn AnalyticsHost,
    ) -> Result<()> {
        if !self.config.is_enabled_for(install_type) {
            log::debug!(target: "segment", install_type; "consumer is not enabled for install type");
            return Err(Error::InvalidInstallType(install_type));
        }

        if self.is_started() {
            log::warn!(target: "segment", install_type; "consumer started more than once");
        }

        self.client.setup(SetupOptions {
            write_key: self.config.write_key.clone(),
            anonymous_id: Self::anonymous_id(store),
            app: host.app_info(),
        })?;

        self.started.store(true, Ordering::Release);
        log::debug!(target: "segment", install_type; "consumer started");
        Ok(())
    }

    fn track(&self, event: &TrimmedEvent, params: Option<&Parameters>) {
        let redacted = self.config.redacted;
        log::debug!(target: "segment",
                    event = event.as_str();
                    "{}", debug_string_for_event(event.as_str(), params, redacted));

        let properties = params
            .map(|params| to_properties(params, redacted))
            .unwrap_or_default();
        self.client.track(event.as_str(), properties);
    }

    fn set_user_property(&self, property: &TrimmedUserProperty, value: Option<&str>) {
        let key = property.as_str();
        let debug_string = debug_string_for_set(key, value, self.config.redacted);
        log::debug!(target: "segment", property = key; "{}", debug_string);

        if self.config.track_user_property_changes {
            let properties = Properties::from_iter([("debug".to_owned(), Value::String(debug_string))]);
            self.client.track(SET_USER_PROPERTY_EVENT, properties);
        }

        // Clearing a property is not forwarded; Segment keeps the last value.
        let Some(value) = value else {
            return;
        };

        let value = if self.config.redacted {
            REDACTED_VALUE
        } else {
            value
        };
        let traits = Properties::from_iter([(key.to_owned(), Value::String(value.to_owned()))]);
        self.client.identify(None, traits);
    }

    fn trim_event(&self, event: &AnalyticsEvent) -> TrimmedEvent {
        TrimmedEvent::new(trim_to_length(
            event.as_str(),
            ConsumerConfig::EVENT_MAX_LENGTH,
            "event",
        ))
    }

    fn trim_user_property(&self, property: &UserProperty) -> TrimmedUserProperty {
        TrimmedUserProperty::new(trim_to_length(
            property.as_str(),
            self.config.user_property_max_length,
            "user property",
        ))
    }
}

impl<C: SegmentClient> AnalyticsConsumerWithWriteOnlyUserId for SegmentAnalyticsConsumer<C> {
    fn set_user_id(&self, user_id: Option<&str>) {
        let Some(user_id) = user_id else {
            return;
        };

        log::trace!(target: "segment", user_id; "identifying user");
        self.client.identify(Some(user_id), Properties::new());
    }
}
