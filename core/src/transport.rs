//! The seam between the client and whatever performs network I/O.
//!
//! # Design
//! A transport receives a fully assembled [`RequestDescriptor`] and either
//! returns the raw response or a [`TransportFailure`] when no HTTP response
//! was obtained. HTTP statuses are never failures at this level. Timeouts,
//! TLS verification and redirects are the transport's job, driven by the
//! descriptor's [`crate::TransportOptions`].

use std::fmt;

use thiserror::Error;

use crate::http::{RawResponse, RequestDescriptor};

/// Executes one request synchronously.
pub trait Transport {
    fn execute(&self, request: RequestDescriptor<'_>) -> Result<RawResponse, TransportFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: RequestDescriptor<'_>) -> Result<RawResponse, TransportFailure> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: RequestDescriptor<'_>) -> Result<RawResponse, TransportFailure> {
        (**self).execute(request)
    }
}

/// Why no HTTP response came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
    /// Connect or overall deadline elapsed.
    Timeout,
    ConnectionRefused,
    HostNotFound,
    Tls,
    TooManyRedirects,
    InvalidUrl,
    /// A header name or value could not be put on the wire.
    InvalidRequest,
    Io,
    /// The peer answered with something that is not valid HTTP.
    Protocol,
    Other,
}

impl TransportErrorCode {
    /// The equivalent libcurl error number, for callers that branch on those.
    pub fn code(self) -> u32 {
        match self {
            TransportErrorCode::InvalidUrl => 3,
            TransportErrorCode::InvalidRequest => 43,
            TransportErrorCode::HostNotFound => 6,
            TransportErrorCode::ConnectionRefused => 7,
            TransportErrorCode::Protocol => 8,
            TransportErrorCode::Timeout => 28,
            TransportErrorCode::Tls => 35,
            TransportErrorCode::TooManyRedirects => 47,
            TransportErrorCode::Io => 56,
            TransportErrorCode::Other => 2,
        }
    }

    pub fn is_timeout(self) -> bool {
        self == TransportErrorCode::Timeout
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorCode::Timeout => "timeout",
            TransportErrorCode::ConnectionRefused => "connection refused",
            TransportErrorCode::HostNotFound => "host not found",
            TransportErrorCode::Tls => "TLS failure",
            TransportErrorCode::TooManyRedirects => "too many redirects",
            TransportErrorCode::InvalidUrl => "invalid URL",
            TransportErrorCode::InvalidRequest => "invalid request metadata",
            TransportErrorCode::Io => "I/O error",
            TransportErrorCode::Protocol => "protocol error",
            TransportErrorCode::Other => "transport failure",
        };
        f.write_str(name)
    }
}

/// A request that produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct TransportFailure {
    pub code: TransportErrorCode,
    pub message: String,
}

impl TransportFailure {
    pub fn new(code: TransportErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
