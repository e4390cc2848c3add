//! A [Segment](https://segment.com) consumer for analytics abstraction layers.
//!
//! # Overview
//!
//! An analytics facade dispatches events, user properties and user IDs to any number of
//! consumers. This crate provides [`SegmentAnalyticsConsumer`], a consumer that implements the
//! [`AnalyticsConsumer`] and [`AnalyticsConsumerWithWriteOnlyUserId`] contracts and forwards every
//! call to a [`SegmentClient`].
//!
//! The client is injected when the consumer is created. [`HttpSegmentClient`] sends messages to
//! the Segment HTTP Tracking API; tests and hosts with their own transport can provide any other
//! [`SegmentClient`] implementation.
//!
//! Parameter and user property values are redacted by default. Use
//! [`ConsumerConfig::redacted`] to send them as-is.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. The only error a running host normally sees is
//! [`Error::InvalidInstallType`], returned by [`AnalyticsConsumer::start`] when the consumer is not
//! enabled for the current install type; the host should skip the consumer in that case.
//!
//! Tracking calls never fail. Analytics should not be critical enough to affect the host
//! application, so delivery problems are only logged.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging messages, with
//! the `segment` target. Consider integrating a `log`-compatible logger implementation for better
//! visibility into consumer operations.
//!
//! # Examples
//!
//! Examples can be found in the `demos` directory of the crate repository.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod consumer;
mod error;
mod http_client;
mod install_type;
mod params;
mod segment;
mod trim;

pub use adapter::{SegmentAnalyticsConsumer, ANONYMOUS_ID_KEY, SET_USER_PROPERTY_EVENT};
pub use config::ConsumerConfig;
pub use consumer::{
    AnalyticsConsumer, AnalyticsConsumerWithWriteOnlyUserId, AnalyticsHost, InMemorySettingsStore,
    SettingsStore,
};
pub use error::{Error, Result};
pub use http_client::{HttpClientConfig, HttpSegmentClient};
pub use install_type::InstallType;
pub use params::{
    debug_string_for_event, debug_string_for_set, to_properties, ParameterValue, Parameters,
    REDACTED_VALUE,
};
pub use segment::{AppInfo, Properties, SegmentClient, SetupOptions};
pub use trim::{trim_to_length, AnalyticsEvent, TrimmedEvent, TrimmedUserProperty, UserProperty};
