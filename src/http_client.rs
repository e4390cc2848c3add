use std::{
    sync::{
        mpsc::{self, TrySendError},
        Mutex, MutexGuard, PoisonError,
    },
    thread::JoinHandle,
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppInfo, Error, Properties, Result, SegmentClient, SetupOptions};

const TRACK_ENDPOINT: &str = "/v1/track";
const IDENTIFY_ENDPOINT: &str = "/v1/identify";

/// Configuration for [`HttpSegmentClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    base_url: String,
    timeout: Duration,
    max_queue_size: usize,
}

impl HttpClientConfig {
    /// Default base URL for API calls.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.segment.io";

    /// Default timeout of a single request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default number of messages that may wait for delivery.
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1_000;

    /// Create a default configuration.
    pub fn new() -> Self {
        HttpClientConfig {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Self::DEFAULT_TIMEOUT,
            max_queue_size: Self::DEFAULT_MAX_QUEUE_SIZE,
        }
    }

    /// Override base URL for API calls, e.g. to route through a proxy. Clients should use the
    /// default setting in most cases.
    pub fn base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Override how many messages may wait for delivery. Once the queue is full, new messages are
    /// dropped until the delivery thread catches up.
    pub fn max_queue_size(&mut self, max_queue_size: usize) -> &mut Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Create a new [`HttpSegmentClient`] using this configuration.
    pub fn to_client(self) -> HttpSegmentClient {
        HttpSegmentClient::with_config(self)
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`SegmentClient`] sending messages to the Segment HTTP Tracking API.
///
/// Nothing is sent until [`setup`](SegmentClient::setup) is called; calls made before that are
/// dropped. Messages are posted one by one from a background `segment-delivery` thread, so
/// tracking calls never block on the network. Failed deliveries are logged and not retried. At
/// most [`max_queue_size`](HttpClientConfig::max_queue_size) messages wait for delivery; further
/// messages are dropped while the queue is full.
///
/// Dropping the client blocks until queued messages have been delivered, like
/// [`shutdown`](HttpSegmentClient::shutdown).
///
/// # Examples
/// ```
/// # use segment_analytics_consumer::{HttpClientConfig, HttpSegmentClient};
/// let client = HttpSegmentClient::new();
///
/// let mut config = HttpClientConfig::new();
/// config.base_url("https://events.eu1.segmentapis.com");
/// let client = config.to_client();
/// ```
pub struct HttpSegmentClient {
    config: HttpClientConfig,
    session: Mutex<Option<Session>>,
}

impl HttpSegmentClient {
    /// Create a client using the default configuration.
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::new())
    }

    /// Create a client using the specified configuration.
    pub fn with_config(config: HttpClientConfig) -> Self {
        HttpSegmentClient {
            config,
            session: Mutex::new(None),
        }
    }

    /// Whether [`setup`](SegmentClient::setup) has been called successfully.
    pub fn is_set_up(&self) -> bool {
        self.session().is_some()
    }

    /// Stop the delivery thread and block waiting for it to send queued messages and exit.
    ///
    /// Subsequent calls are dropped until the client is set up again.
    pub fn shutdown(&self) -> Result<()> {
        let session = self.session().take();
        match session {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        // The guarded state stays consistent even if a holder panicked, so poisoning is ignored.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue(&self) -> (mpsc::SyncSender<Message>, mpsc::Receiver<Message>) {
        mpsc::sync_channel(self.config.max_queue_size)
    }

    fn enqueue(&self, build: impl FnOnce(&mut Identity) -> Message) {
        let mut session = self.session();
        let Some(session) = session.as_mut() else {
            log::warn!(target: "segment", "dropping message sent before the client was set up");
            return;
        };

        let message = build(&mut session.identity);
        log::trace!(target: "segment", message:serde; "enqueueing message");
        match session.sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                log::warn!(target: "segment",
                           message_id = message.message_id.as_str(),
                           max_queue_size = self.config.max_queue_size;
                           "delivery queue is full, dropping message");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!(target: "segment", "delivery thread has exited, dropping message");
            }
        }
    }
}

impl Drop for HttpSegmentClient {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::warn!(target: "segment", "error while shutting down the client: {:?}", err);
        }
    }
}

impl Default for HttpSegmentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentClient for HttpSegmentClient {
    fn setup(&self, options: SetupOptions) -> Result<()> {
        let endpoints = Endpoints::new(&self.config.base_url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()?;

        // The previous delivery thread is stopped before a new one starts, so at most one session
        // is ever live.
        let previous = self.session().take();
        if let Some(previous) = previous {
            log::debug!(target: "segment", "replacing previous session");
            if let Err(err) = previous.close() {
                log::warn!(target: "segment", "previous delivery thread failed: {:?}", err);
            }
        }

        let (sender, receiver) = self.queue();
        let write_key = options.write_key;
        let join_handle = std::thread::Builder::new()
            .name("segment-delivery".to_owned())
            .spawn(move || {
                // The loop ends once every sender is dropped and the queue is drained.
                for message in receiver {
                    deliver(&client, &endpoints, &write_key, &message);
                }
                log::debug!(target: "segment", "delivery thread exiting");
            })?;

        let session = Session {
            identity: Identity {
                anonymous_id: options.anonymous_id,
                user_id: None,
                app: options.app,
            },
            sender,
            join_handle,
        };

        *self.session() = Some(session);

        log::debug!(target: "segment", base_url = self.config.base_url.as_str(); "client set up");
        Ok(())
    }

    fn track(&self, event: &str, properties: Properties) {
        self.enqueue(|identity| identity.message(MessageKind::Track, Some(event), properties));
    }

    fn identify(&self, user_id: Option<&str>, traits: Properties) {
        self.enqueue(|identity| {
            if let Some(user_id) = user_id {
                identity.user_id = Some(user_id.to_owned());
            }
            identity.message(MessageKind::Identify, None, traits)
        });
    }
}

struct Session {
    identity: Identity,
    sender: mpsc::SyncSender<Message>,
    join_handle: JoinHandle<()>,
}

impl Session {
    fn close(self) -> Result<()> {
        // Closing the channel lets the delivery thread drain the queue and exit.
        drop(self.sender);
        self.join_handle
            .join()
            .map_err(|_| Error::DeliveryThreadPanicked)
    }
}

/// Who messages are attributed to.
#[derive(Debug, Clone)]
struct Identity {
    anonymous_id: String,
    user_id: Option<String>,
    app: Option<AppInfo>,
}

impl Identity {
    fn message(&self, kind: MessageKind, event: Option<&str>, payload: Properties) -> Message {
        let (properties, traits) = match kind {
            MessageKind::Track => (Some(payload), None),
            MessageKind::Identify => (None, Some(payload)),
        };

        Message {
            kind,
            event: event.map(str::to_owned),
            user_id: self.user_id.clone(),
            anonymous_id: self.anonymous_id.clone(),
            properties,
            traits,
            message_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            context: Context {
                library: Library {
                    name: env!("CARGO_PKG_NAME"),
                    version: env!("CARGO_PKG_VERSION"),
                },
                app: self.app.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum MessageKind {
    Track,
    Identify,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    anonymous_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    traits: Option<Properties>,
    message_id: String,
    timestamp: DateTime<Utc>,
    context: Context,
}

#[derive(Debug, Serialize)]
struct Context {
    library: Library,
    #[serde(skip_serializing_if = "Option::is_none")]
    app: Option<AppInfo>,
}

#[derive(Debug, Serialize)]
struct Library {
    name: &'static str,
    version: &'static str,
}

struct Endpoints {
    track: Url,
    identify: Url,
}

impl Endpoints {
    fn new(base_url: &str) -> Result<Self> {
        let endpoint = |path: &str| {
            Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), path))
                .map_err(Error::InvalidBaseUrl)
        };

        Ok(Endpoints {
            track: endpoint(TRACK_ENDPOINT)?,
            identify: endpoint(IDENTIFY_ENDPOINT)?,
        })
    }

    fn for_kind(&self, kind: MessageKind) -> &Url {
        match kind {
            MessageKind::Track => &self.track,
            MessageKind::Identify => &self.identify,
        }
    }
}

fn deliver(
    client: &reqwest::blocking::Client,
    endpoints: &Endpoints,
    write_key: &str,
    message: &Message,
) {
    let url = endpoints.for_kind(message.kind).clone();
    let message_id = message.message_id.as_str();

    match client
        .post(url)
        .basic_auth(write_key, Some(""))
        .json(message)
        .send()
    {
        Ok(response) => match response.status() {
            status if status.is_success() => {
                log::debug!(target: "segment", message_id; "delivered message");
            }
            StatusCode::UNAUTHORIZED => {
                log::warn!(target: "segment", message_id; "message rejected as unauthorized. Check your write key");
            }
            status => {
                log::warn!(target: "segment",
                           message_id,
                           status = status.as_u16();
                           "received non-success response while delivering message");
            }
        },
        Err(err) => {
            log::warn!(target: "segment", message_id; "error while delivering message: {:?}", err);
        }
    }
}
