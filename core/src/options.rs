//! Per-client option accumulation.
//!
//! # Design
//! `OptionStore` lives as long as its client and is only changed by explicit
//! setter calls. It is never reset between requests: a header, cookie or
//! credential set once is applied to every later request until overwritten.
//! Every key follows last-write-wins. Header names compare case-insensitively
//! and an overwritten header keeps its original position.

use crate::config::{OptionValue, TransportOption, TransportOptions};
use crate::error::ConfigError;
use crate::http::{find_header, Credentials};

pub const USER_AGENT_HEADER: &str = "User-Agent";
pub const REFERER_HEADER: &str = "Referer";

#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    credentials: Option<Credentials>,
    transport: TransportOptions,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.credentials = Some(Credentials::new(username, password));
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.set_header(USER_AGENT_HEADER, user_agent);
    }

    pub fn set_referrer(&mut self, referrer: impl Into<String>) {
        self.set_header(REFERER_HEADER, referrer);
    }

    pub fn set_option(&mut self, option: TransportOption) {
        self.transport.apply(option);
    }

    /// Set a transport option by name. Unknown names and mistyped values are
    /// rejected and leave the store unchanged.
    pub fn set_raw_option(&mut self, key: &str, value: OptionValue) -> Result<(), ConfigError> {
        self.transport.set_raw(key, value)
    }

    pub fn set_transport_options(&mut self, options: TransportOptions) {
        self.transport = options;
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header(USER_AGENT_HEADER)
    }

    pub fn referrer(&self) -> Option<&str> {
        self.header(REFERER_HEADER)
    }

    pub fn transport(&self) -> &TransportOptions {
        &self.transport
    }
}
