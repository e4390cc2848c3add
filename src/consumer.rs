use std::{collections::HashMap, sync::RwLock};

use crate::{
    AnalyticsEvent, AppInfo, InstallType, Parameters, Result, TrimmedEvent, TrimmedUserProperty,
    UserProperty,
};

/// Persisted key-value settings owned by the host (e.g. user defaults or a preferences file).
///
/// Consumers use it to keep identifiers stable across launches.
pub trait SettingsStore {
    /// Read a stored value.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str);
}

/// `InMemorySettingsStore` is a [`SettingsStore`] that lives only as long as the process. Useful
/// for tests and for hosts that do not persist anything.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        // A poisoned lock is treated as an empty store rather than crashing the host.
        let values = self.values.read().ok()?;
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }
}

/// The analytics facade that owns the consumers and dispatches to them.
pub trait AnalyticsHost {
    /// Application metadata to attach to outgoing messages.
    fn app_info(&self) -> Option<AppInfo> {
        None
    }
}

/// Host without any metadata.
impl AnalyticsHost for () {}

/// A destination for analytics events and user properties.
///
/// The host dispatcher calls [`start`](AnalyticsConsumer::start) once per process and only uses
/// the consumer if it succeeded. All other calls are best-effort and never fail: analytics must
/// not affect the host application.
pub trait AnalyticsConsumer {
    /// Initialize the consumer for the given install type.
    ///
    /// Fails with [`Error::InvalidInstallType`](crate::Error::InvalidInstallType) if the consumer
    /// is not enabled for `install_type`; the host is expected to skip the consumer in that case.
    fn start(
        &self,
        install_type: InstallType,
        store: &dyn SettingsStore,
        host: &dyn AnalyticsHost,
    ) -> Result<()>;

    /// Send an event.
    fn track(&self, event: &TrimmedEvent, params: Option<&Parameters>);

    /// Set a user property. `None` is not forwarded.
    fn set_user_property(&self, property: &TrimmedUserProperty, value: Option<&str>);

    /// Trim an event name to the consumer's maximum length.
    fn trim_event(&self, event: &AnalyticsEvent) -> TrimmedEvent;

    /// Trim a user property key to the consumer's maximum length.
    fn trim_user_property(&self, property: &UserProperty) -> TrimmedUserProperty;
}

/// A consumer that can be told the user ID but never reports it back.
pub trait AnalyticsConsumerWithWriteOnlyUserId: AnalyticsConsumer {
    /// Set the user ID. `None` is not forwarded.
    fn set_user_id(&self, user_id: Option<&str>);
}
