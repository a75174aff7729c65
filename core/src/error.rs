//! Error types for the courier client.
//!
//! # Design
//! Failures are split by the stage that produces them. `EncodingError` is
//! raised while a request is being assembled and never reaches the network.
//! `TransportFailure` (see [`crate::transport`]) is what the transport
//! reports when no HTTP response was obtained. `ConfigError` covers setter
//! calls with unknown keys or mistyped values. `ClientError` is what a verb
//! call returns and wraps the stages a dispatch can fail in.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportFailure;

/// The body or URL of a request could not be encoded.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A file field sits deeper than one level below a top-level field.
    #[error("file field `{field}` is nested too deeply; files are only allowed at the top level or directly inside a top-level list or map")]
    NestedFile { field: String },

    /// A form carrying a file field was bound for the query string.
    #[error("file field `{field}` cannot be sent in a query string")]
    FileInQuery { field: String },

    /// A file field or upload path could not be read.
    #[error("cannot read file for `{field}` ({}): {source}", .path.display())]
    UnreadableFile {
        field: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An open file handle given as a form field could not be read.
    #[error("cannot read file handle for `{field}`: {source}")]
    UnreadableHandle {
        field: String,
        #[source]
        source: io::Error,
    },

    /// The request URL failed to parse.
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A configuration value was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("option `{key}` expects {expected}")]
    InvalidValue { key: &'static str, expected: &'static str },

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    #[error("cannot parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by `Client` verb methods.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request was never sent.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The request was sent but no HTTP response came back.
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    /// The server answered with a non-2xx status under the strict policy.
    #[error("HTTP status {status}")]
    Status { status: u16 },
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
