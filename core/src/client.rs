//! Stateful HTTP client façade.
//!
//! # Design
//! `Client` owns one [`OptionStore`], one transport, and the outcome of the
//! latest dispatch. Each verb call builds a fresh request from the live
//! options, runs it through the transport, classifies the outcome and stores
//! it, replacing whatever the previous call left behind. Options are never
//! reset between calls.
//!
//! Dispatch takes `&mut self`, so one client can never have two requests in
//! flight. A failed call (encoding or transport) leaves the client ready for
//! the next one.

use crate::builder::{self, Body};
use crate::classify::{classify_response, ErrorState, Response};
use crate::config::{OptionValue, TransportOption, TransportOptions};
use crate::error::{ClientError, ConfigError};
use crate::http::HttpMethod;
use crate::options::OptionStore;
use crate::transport::Transport;

/// Reusable client that remembers its options across requests.
#[derive(Debug)]
pub struct Client<T> {
    options: OptionStore,
    transport: T,
    response: Option<Response>,
    error: ErrorState,
}

#[cfg(feature = "ureq")]
impl Client<crate::UreqTransport> {
    /// Client backed by the blocking `ureq` transport.
    pub fn new() -> Self {
        Self::with_transport(crate::UreqTransport::new())
    }
}

#[cfg(feature = "ureq")]
impl Default for Client<crate::UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            options: OptionStore::new(),
            transport,
            response: None,
            error: ErrorState::None,
        }
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.set_header(name, value);
        self
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.set_cookie(name, value);
        self
    }

    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) -> &mut Self {
        self.options.set_basic_auth(username, password);
        self
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.options.set_user_agent(user_agent);
        self
    }

    pub fn set_referrer(&mut self, referrer: impl Into<String>) -> &mut Self {
        self.options.set_referrer(referrer);
        self
    }

    pub fn set_option(&mut self, option: TransportOption) -> &mut Self {
        self.options.set_option(option);
        self
    }

    pub fn set_raw_option(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<&mut Self, ConfigError> {
        self.options.set_raw_option(key, value.into())?;
        Ok(self)
    }

    pub fn set_transport_options(&mut self, options: TransportOptions) -> &mut Self {
        self.options.set_transport_options(options);
        self
    }

    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Response of the latest dispatch, if it produced one.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn error_state(&self) -> &ErrorState {
        &self.error
    }

    pub fn get<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Get, url, body)
    }

    pub fn post<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Post, url, body)
    }

    pub fn put<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Put, url, body)
    }

    pub fn patch<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Patch, url, body)
    }

    pub fn delete<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Delete, url, body)
    }

    pub fn head<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Head, url, body)
    }

    pub fn options_request<'a>(&mut self, url: &str, body: impl Into<Body<'a>>) -> Result<&Response, ClientError> {
        self.send(HttpMethod::Options, url, body)
    }

    /// Build, dispatch and classify one request, replacing the stored outcome.
    pub fn send<'a>(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: impl Into<Body<'a>>,
    ) -> Result<&Response, ClientError> {
        self.response = None;

        let request = match builder::build(method, url, body.into(), &self.options) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(%method, url, error = %err, "request not sent");
                self.error = ErrorState::Encoding(err.to_string());
                return Err(err.into());
            }
        };

        tracing::debug!(%method, url = %request.url, "dispatching request");
        let policy = request.options.status_policy;
        let raw = match self.transport.execute(request) {
            Ok(raw) => raw,
            Err(failure) => {
                tracing::warn!(%method, url, code = %failure.code, error = %failure.message, "transport failure");
                self.error = ErrorState::Transport(failure.clone());
                return Err(ClientError::Transport(failure));
            }
        };

        let (response, state) = classify_response(raw, policy);
        self.error = state;
        let response = self.response.insert(response);
        tracing::debug!(status = response.status(), bytes = response.body().len(), "response received");
        match self.error {
            ErrorState::Http { status } => Err(ClientError::Status { status }),
            _ => Ok(response),
        }
    }
}
