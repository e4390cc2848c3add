use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Segment event properties and identify traits.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Application metadata attached to every Segment message as `context.app`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// User-facing version, e.g. `1.4.0`.
    pub version: String,
    /// Build number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

/// Options passed to [`SegmentClient::setup`].
#[derive(Clone, PartialEq, Eq)]
pub struct SetupOptions {
    /// Write key identifying the Segment source.
    pub write_key: String,
    /// Stable per-install identifier used until (and alongside) a user ID.
    pub anonymous_id: String,
    /// Application metadata, if the host provides it.
    pub app: Option<AppInfo>,
}

impl fmt::Debug for SetupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupOptions")
            .field("write_key", &"<redacted>")
            .field("anonymous_id", &self.anonymous_id)
            .field("app", &self.app)
            .finish()
    }
}

/// A handle to the Segment SDK.
///
/// The consumer receives the client at construction instead of reaching for a process-wide
/// singleton. [`HttpSegmentClient`](crate::HttpSegmentClient) talks to the Segment HTTP API;
/// hosts can substitute their own implementation, e.g. for testing.
///
/// Implementations own their synchronization. `track` and `identify` are fire-and-forget and must
/// not block on network I/O.
pub trait SegmentClient: Send + Sync {
    /// Initialize the client. Called once per successful consumer start.
    fn setup(&self, options: SetupOptions) -> Result<()>;

    /// Record an event.
    fn track(&self, event: &str, properties: Properties);

    /// Associate the current user with `user_id` (if given) and update their traits.
    fn identify(&self, user_id: Option<&str>, traits: Properties);
}

impl<T: SegmentClient + ?Sized> SegmentClient for Arc<T> {
    fn setup(&self, options: SetupOptions) -> Result<()> {
        (**self).setup(options)
    }

    fn track(&self, event: &str, properties: Properties) {
        (**self).track(event, properties)
    }

    fn identify(&self, user_id: Option<&str>, traits: Properties) {
        (**self).identify(user_id, traits)
    }
}
