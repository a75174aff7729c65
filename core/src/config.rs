//! Transport options carried by every request.
//!
//! # Design
//! The transport's tunables form a closed, typed record instead of a bag of
//! native constants. Options can be set one at a time through
//! [`TransportOption`], by name through [`TransportOptions::set_raw`], or all
//! at once from JSON. Every path rejects names it does not know, so a typo
//! fails when the option is set rather than being silently ignored.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How non-2xx statuses are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Any HTTP response is a success; the status is data for the caller.
    #[default]
    Lenient,
    /// Non-2xx statuses are flagged as HTTP errors.
    Strict,
}

/// Typed transport configuration, snapshotted into every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportOptions {
    pub connect_timeout_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub verify_tls_peer: bool,
    pub verify_tls_host: bool,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    /// Length used for streamed uploads that do not state their own.
    pub infile_size: Option<u64>,
    pub status_policy: StatusPolicy,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            timeout_ms: None,
            verify_tls_peer: true,
            verify_tls_host: true,
            follow_redirects: false,
            max_redirects: 10,
            infile_size: None,
            status_policy: StatusPolicy::Lenient,
        }
    }
}

impl TransportOptions {
    /// Load a full option set from JSON. Unknown fields are rejected.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Certificate checks are skipped when either the peer or the host check
    /// has been turned off.
    pub fn verifies_tls(&self) -> bool {
        self.verify_tls_peer && self.verify_tls_host
    }

    pub fn apply(&mut self, option: TransportOption) {
        match option {
            TransportOption::ConnectTimeoutMs(ms) => self.connect_timeout_ms = Some(ms),
            TransportOption::TimeoutMs(ms) => self.timeout_ms = Some(ms),
            TransportOption::VerifyTlsPeer(on) => self.verify_tls_peer = on,
            TransportOption::VerifyTlsHost(on) => self.verify_tls_host = on,
            TransportOption::FollowRedirects(on) => self.follow_redirects = on,
            TransportOption::MaxRedirects(max) => self.max_redirects = max,
            TransportOption::InfileSize(len) => self.infile_size = Some(len),
            TransportOption::StatusPolicy(policy) => self.status_policy = policy,
        }
    }

    /// Set an option by name, checking the value against the option's type.
    pub fn set_raw(&mut self, key: &str, value: OptionValue) -> Result<(), ConfigError> {
        let key: OptionKey = key.parse()?;
        self.apply(key.with_value(value)?);
        Ok(())
    }
}

/// One typed option assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOption {
    ConnectTimeoutMs(u64),
    TimeoutMs(u64),
    VerifyTlsPeer(bool),
    VerifyTlsHost(bool),
    FollowRedirects(bool),
    MaxRedirects(u32),
    InfileSize(u64),
    StatusPolicy(StatusPolicy),
}

/// Recognized option names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    ConnectTimeoutMs,
    TimeoutMs,
    VerifyTlsPeer,
    VerifyTlsHost,
    FollowRedirects,
    MaxRedirects,
    InfileSize,
    StatusPolicy,
}

impl OptionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::ConnectTimeoutMs => "connect_timeout_ms",
            OptionKey::TimeoutMs => "timeout_ms",
            OptionKey::VerifyTlsPeer => "verify_tls_peer",
            OptionKey::VerifyTlsHost => "verify_tls_host",
            OptionKey::FollowRedirects => "follow_redirects",
            OptionKey::MaxRedirects => "max_redirects",
            OptionKey::InfileSize => "infile_size",
            OptionKey::StatusPolicy => "status_policy",
        }
    }

    fn with_value(self, value: OptionValue) -> Result<TransportOption, ConfigError> {
        let mismatch = |expected| ConfigError::InvalidValue {
            key: self.as_str(),
            expected,
        };
        let option = match (self, value) {
            (OptionKey::ConnectTimeoutMs, OptionValue::Int(ms)) => TransportOption::ConnectTimeoutMs(ms),
            (OptionKey::TimeoutMs, OptionValue::Int(ms)) => TransportOption::TimeoutMs(ms),
            (OptionKey::InfileSize, OptionValue::Int(len)) => TransportOption::InfileSize(len),
            (OptionKey::MaxRedirects, OptionValue::Int(max)) => {
                let max = u32::try_from(max).map_err(|_| mismatch("an integer that fits in 32 bits"))?;
                TransportOption::MaxRedirects(max)
            }
            (OptionKey::VerifyTlsPeer, OptionValue::Bool(on)) => TransportOption::VerifyTlsPeer(on),
            (OptionKey::VerifyTlsHost, OptionValue::Bool(on)) => TransportOption::VerifyTlsHost(on),
            (OptionKey::FollowRedirects, OptionValue::Bool(on)) => TransportOption::FollowRedirects(on),
            (OptionKey::StatusPolicy, OptionValue::Text(text)) => match text.as_str() {
                "lenient" => TransportOption::StatusPolicy(StatusPolicy::Lenient),
                "strict" => TransportOption::StatusPolicy(StatusPolicy::Strict),
                _ => return Err(mismatch("`lenient` or `strict`")),
            },
            (OptionKey::ConnectTimeoutMs | OptionKey::TimeoutMs | OptionKey::InfileSize | OptionKey::MaxRedirects, _) => {
                return Err(mismatch("an integer"))
            }
            (OptionKey::VerifyTlsPeer | OptionKey::VerifyTlsHost | OptionKey::FollowRedirects, _) => {
                return Err(mismatch("a boolean"))
            }
            (OptionKey::StatusPolicy, _) => return Err(mismatch("`lenient` or `strict`")),
        };
        Ok(option)
    }
}

impl FromStr for OptionKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "connect_timeout_ms" => OptionKey::ConnectTimeoutMs,
            "timeout_ms" => OptionKey::TimeoutMs,
            "verify_tls_peer" => OptionKey::VerifyTlsPeer,
            "verify_tls_host" => OptionKey::VerifyTlsHost,
            "follow_redirects" => OptionKey::FollowRedirects,
            "max_redirects" => OptionKey::MaxRedirects,
            "infile_size" => OptionKey::InfileSize,
            "status_policy" => OptionKey::StatusPolicy,
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        };
        Ok(key)
    }
}

/// Untyped value for [`TransportOptions::set_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(u64),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<u64> for OptionValue {
    fn from(value: u64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(u64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}
