//! HTTP request and response types exchanged with the transport.
//!
//! # Design
//! These types describe a request as plain data. The core assembles a
//! `RequestDescriptor` and hands it to a [`crate::Transport`], which performs
//! the I/O and returns a `RawResponse`. Everything in a descriptor is owned
//! except a streamed upload body, which borrows the caller's reader for the
//! duration of one dispatch.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use cookie::Cookie;
use url::Url;

use crate::config::TransportOptions;
use crate::error::ConfigError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether form data for this method travels in the request body rather
    /// than in the query string.
    pub fn sends_form_in_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => return Err(ConfigError::UnknownMethod(s.to_string())),
        };
        Ok(method)
    }
}

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of the `Authorization` header for these credentials.
    pub fn authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of an assembled request.
pub enum RequestBody<'a> {
    Empty,
    Bytes(Bytes),
    /// Streamed from a reader. `len` is sent as `Content-Length` when known.
    Stream {
        reader: Box<dyn Read + 'a>,
        len: Option<u64>,
    },
}

impl RequestBody<'_> {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Length in bytes, if known before sending.
    pub fn len(&self) -> Option<u64> {
        match self {
            RequestBody::Empty => Some(0),
            RequestBody::Bytes(data) => Some(data.len() as u64),
            RequestBody::Stream { len, .. } => *len,
        }
    }
}

impl fmt::Debug for RequestBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            RequestBody::Stream { len, .. } => f.debug_struct("Stream").field("len", len).finish(),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built fresh for every dispatch by [`crate::builder::build`]. Headers hold
/// everything the client resolved (user agent, referrer, content type);
/// cookies and credentials are rendered by the transport.
#[derive(Debug)]
pub struct RequestDescriptor<'a> {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub auth: Option<Credentials>,
    pub body: RequestBody<'a>,
    pub options: TransportOptions,
}

impl RequestDescriptor<'_> {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Cookies rendered as a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let rendered: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| Cookie::new(name.clone(), value.clone()).encoded().to_string())
            .collect();
        Some(rendered.join("; "))
    }

    /// Every header the transport must put on the wire, in order.
    pub fn wire_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if let Some(cookies) = self.cookie_header() {
            headers.push(("Cookie".to_string(), cookies));
        }
        if let Some(credentials) = &self.auth {
            headers.push(("Authorization".to_string(), credentials.authorization()));
        }
        if let RequestBody::Stream { len: Some(len), .. } = &self.body {
            headers.push(("Content-Length".to_string(), len.to_string()));
        }
        headers
    }
}

/// An HTTP response as returned by the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// For example `HTTP/1.1 200 OK`.
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

pub(crate) fn find_header<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
