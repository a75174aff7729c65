//! Turns a transport outcome into the client's observable state.
//!
//! # Design
//! A transport failure means there is no response: the error state records
//! the failure and its code, and the response is cleared. Any HTTP response
//! is stored verbatim. Whether a non-2xx status also counts as an error is a
//! caller decision expressed through [`StatusPolicy`]; the default keeps the
//! status as plain data.

use std::borrow::Cow;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::config::StatusPolicy;
use crate::http::{find_header, RawResponse};
use crate::transport::{TransportErrorCode, TransportFailure};

/// The latest HTTP response received by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    status_line: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

impl From<RawResponse> for Response {
    fn from(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            status_line: raw.status_line,
            headers: raw.headers,
            body: raw.body,
        }
    }
}

/// Outcome of the latest dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorState {
    #[default]
    None,
    /// The request could not be assembled and was never sent.
    Encoding(String),
    /// No HTTP response was obtained.
    Transport(TransportFailure),
    /// A response arrived with a non-2xx status under [`StatusPolicy::Strict`].
    Http { status: u16 },
}

impl ErrorState {
    pub fn is_error(&self) -> bool {
        !matches!(self, ErrorState::None)
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, ErrorState::Transport(_))
    }

    pub fn is_http_error(&self) -> bool {
        matches!(self, ErrorState::Http { .. })
    }

    pub fn is_encoding_error(&self) -> bool {
        matches!(self, ErrorState::Encoding(_))
    }

    pub fn transport_error_code(&self) -> Option<TransportErrorCode> {
        match self {
            ErrorState::Transport(failure) => Some(failure.code),
            _ => None,
        }
    }
}

/// Classify what the transport returned.
pub fn classify(
    outcome: Result<RawResponse, TransportFailure>,
    policy: StatusPolicy,
) -> (Option<Response>, ErrorState) {
    match outcome {
        Err(failure) => (None, ErrorState::Transport(failure)),
        Ok(raw) => {
            let (response, state) = classify_response(raw, policy);
            (Some(response), state)
        }
    }
}

/// Classify a response that did arrive.
pub fn classify_response(raw: RawResponse, policy: StatusPolicy) -> (Response, ErrorState) {
    let response = Response::from(raw);
    let state = match policy {
        StatusPolicy::Strict if !response.is_success() => ErrorState::Http {
            status: response.status,
        },
        _ => ErrorState::None,
    };
    (response, state)
}
