//! Synchronous, reusable HTTP client with persistent options.
//!
//! # Overview
//! A [`Client`] keeps headers, cookies, credentials and transport options
//! across requests. Every verb call assembles a fresh request from those
//! options, hands it to a [`Transport`] and stores the classified outcome,
//! which stays readable until the next call.
//!
//! # Design
//! - Request assembly is sans-IO: [`builder::build`] produces a
//!   [`RequestDescriptor`] and never touches the network.
//! - Network I/O sits behind the [`Transport`] trait. The default
//!   implementation uses `ureq` and is gated on the `ureq` feature.
//! - Form data uses bracket names (`a[]`, `a[b]`) for nested fields and switches
//!   to `multipart/form-data` as soon as a file field is present.
//! - HTTP status codes are data unless [`StatusPolicy::Strict`] is set.

pub mod builder;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod options;
pub mod transport;
#[cfg(feature = "ureq")]
pub mod ureq_transport;

pub use builder::{Body, Upload, USER_AGENT};
pub use classify::{ErrorState, Response};
pub use client::Client;
pub use config::{OptionKey, OptionValue, StatusPolicy, TransportOption, TransportOptions};
pub use error::{ClientError, ConfigError, EncodingError};
pub use form::{FileField, Form, FormValue};
pub use http::{Credentials, HttpMethod, RawResponse, RequestBody, RequestDescriptor};
pub use options::OptionStore;
pub use transport::{Transport, TransportErrorCode, TransportFailure};
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;
