//! Blocking transport backed by `ureq`.
//!
//! # Design
//! An agent is configured from the descriptor's options for every request, so
//! option changes on the client apply to the very next dispatch. Status codes
//! are never turned into errors here; only failures to obtain a response are.

use std::io;

use bytes::Bytes;
use ureq::http;
use ureq::tls::TlsConfig;
use ureq::{Agent, SendBody};

use crate::config::TransportOptions;
use crate::http::{RawResponse, RequestBody, RequestDescriptor};
use crate::transport::{Transport, TransportErrorCode, TransportFailure};

#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: RequestDescriptor<'_>) -> Result<RawResponse, TransportFailure> {
        let agent = agent(&request.options);

        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in request.wire_headers() {
            builder = builder.header(name, value);
        }

        let result = match request.body {
            RequestBody::Empty => agent.run(builder.body(()).map_err(invalid_request)?),
            RequestBody::Bytes(data) => agent.run(builder.body(data.to_vec()).map_err(invalid_request)?),
            RequestBody::Stream { mut reader, .. } => {
                let body = SendBody::from_reader(&mut *reader);
                agent.run(builder.body(body).map_err(invalid_request)?)
            }
        };

        let mut response = result.map_err(failure)?;
        let status = response.status();
        let status_line = format!("{:?} {}", response.version(), status);
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(failure)?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_line,
            headers,
            body: Bytes::from(body),
        })
    }
}

fn agent(options: &TransportOptions) -> Agent {
    let max_redirects = if options.follow_redirects {
        options.max_redirects
    } else {
        0
    };
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_connect(options.connect_timeout())
        .timeout_global(options.timeout())
        .max_redirects(max_redirects)
        .tls_config(
            TlsConfig::builder()
                .disable_verification(!options.verifies_tls())
                .build(),
        )
        .build()
        .new_agent()
}

/// The URL is already parsed by the builder, so this is a bad header name or value.
fn invalid_request(err: http::Error) -> TransportFailure {
    TransportFailure::new(TransportErrorCode::InvalidRequest, err.to_string())
}

fn failure(err: ureq::Error) -> TransportFailure {
    let code = match &err {
        ureq::Error::Timeout(_) => TransportErrorCode::Timeout,
        ureq::Error::HostNotFound => TransportErrorCode::HostNotFound,
        ureq::Error::ConnectionFailed => TransportErrorCode::ConnectionRefused,
        ureq::Error::TooManyRedirects | ureq::Error::RedirectFailed => TransportErrorCode::TooManyRedirects,
        ureq::Error::BadUri(_) => TransportErrorCode::InvalidUrl,
        ureq::Error::Http(_) => TransportErrorCode::InvalidRequest,
        ureq::Error::Tls(_) => TransportErrorCode::Tls,
        ureq::Error::Protocol(_) => TransportErrorCode::Protocol,
        ureq::Error::Io(io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportErrorCode::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => TransportErrorCode::ConnectionRefused,
            _ => TransportErrorCode::Io,
        },
        _ => TransportErrorCode::Other,
    };
    tracing::debug!(error = %err, %code, "ureq request failed");
    TransportFailure::new(code, err.to_string())
}
