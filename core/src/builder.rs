//! Turns a call-site body and the client's options into a request.
//!
//! # Design
//! `build` is the only place where a request takes shape. It parses the URL,
//! decides where form data goes (query string for GET-like verbs, body for
//! POST/PUT/PATCH), opens upload files and merges the option snapshot into
//! headers. Every failure here happens before the transport is involved.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use bytes::Bytes;
use url::Url;

use crate::error::EncodingError;
use crate::form::{self, Form};
use crate::http::{find_header, HttpMethod, RequestBody, RequestDescriptor};
use crate::options::{OptionStore, USER_AGENT_HEADER};

pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

const CONTENT_TYPE: &str = "Content-Type";
const OCTET_STREAM: &str = "application/octet-stream";

/// What a verb call sends.
#[derive(Debug, Default)]
pub enum Body<'a> {
    #[default]
    Empty,
    /// Sent verbatim.
    Raw(Bytes),
    /// Query string or encoded body, depending on the method.
    Form(Form<'a>),
    /// Streamed upload of the file at this path.
    File(PathBuf),
    /// Streamed upload from a caller-owned reader.
    Stream(Upload<'a>),
}

impl Body<'_> {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Body::File(path.into())
    }
}

impl<'a> From<Form<'a>> for Body<'a> {
    fn from(form: Form<'a>) -> Self {
        Body::Form(form)
    }
}

impl<'a> From<Upload<'a>> for Body<'a> {
    fn from(upload: Upload<'a>) -> Self {
        Body::Stream(upload)
    }
}

impl From<Bytes> for Body<'_> {
    fn from(bytes: Bytes) -> Self {
        Body::Raw(bytes)
    }
}

impl From<Vec<u8>> for Body<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Raw(Bytes::from(bytes))
    }
}

impl From<()> for Body<'_> {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

/// A streamed request body read from a reader the caller keeps.
pub struct Upload<'a> {
    reader: &'a mut dyn Read,
    len: Option<u64>,
}

impl<'a> Upload<'a> {
    pub fn new(reader: &'a mut dyn Read) -> Self {
        Self { reader, len: None }
    }

    /// Declare the number of bytes that will be read.
    pub fn size(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }
}

impl std::fmt::Debug for Upload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload").field("len", &self.len).finish()
    }
}

/// Assemble a request from its parts and the current option snapshot.
pub fn build<'a>(
    method: HttpMethod,
    url: &str,
    body: Body<'a>,
    options: &OptionStore,
) -> Result<RequestDescriptor<'a>, EncodingError> {
    let mut url = Url::parse(url).map_err(|source| EncodingError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let (body, content_type) = match body {
        Body::Empty => (RequestBody::Empty, None),
        Body::Raw(bytes) => (RequestBody::Bytes(bytes), None),
        Body::Form(form) if method.sends_form_in_body() => {
            let encoded = form::encode(&form)?;
            (RequestBody::Bytes(encoded.bytes), Some(encoded.content_type))
        }
        Body::Form(form) => {
            append_query(&mut url, &form::encode_query(&form)?);
            (RequestBody::Empty, None)
        }
        Body::File(path) => {
            let unreadable = |source| EncodingError::UnreadableFile {
                field: "body".to_string(),
                path: path.clone(),
                source,
            };
            let file = File::open(&path).map_err(unreadable)?;
            let len = file.metadata().map_err(unreadable)?.len();
            let stream = RequestBody::Stream {
                reader: Box::new(file),
                len: Some(len),
            };
            (stream, Some(OCTET_STREAM.to_string()))
        }
        Body::Stream(upload) => {
            let stream = RequestBody::Stream {
                reader: Box::new(upload.reader),
                len: upload.len.or(options.transport().infile_size),
            };
            (stream, Some(OCTET_STREAM.to_string()))
        }
    };

    let mut headers = options.headers().to_vec();
    if let Some(content_type) = content_type {
        merge_content_type(&mut headers, content_type);
    }
    if find_header(&headers, USER_AGENT_HEADER).is_none() {
        headers.push((USER_AGENT_HEADER.to_string(), USER_AGENT.to_string()));
    }

    Ok(RequestDescriptor {
        method,
        url,
        headers,
        cookies: options.cookies().to_vec(),
        auth: options.credentials().cloned(),
        body,
        options: options.transport().clone(),
    })
}

/// A stored `Content-Type` wins, except that a bare `multipart/*` one
/// receives the boundary the body was framed with.
fn merge_content_type(headers: &mut Vec<(String, String)>, encoded: String) {
    let Some(index) = headers
        .iter()
        .position(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
    else {
        headers.push((CONTENT_TYPE.to_string(), encoded));
        return;
    };
    let stored = &mut headers[index].1;
    let Some(boundary) = boundary_param(&encoded) else {
        return;
    };
    let is_multipart = stored.trim_start().to_ascii_lowercase().starts_with("multipart/");
    if is_multipart && boundary_param(stored).is_none() {
        *stored = format!("{}; boundary={boundary}", stored.trim_end().trim_end_matches(';'));
    }
}

fn boundary_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim().eq_ignore_ascii_case("boundary").then(|| value.trim())
    })
}

fn append_query(url: &mut Url, query: &str) {
    if query.is_empty() {
        return;
    }
    let joined = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
        _ => query.to_string(),
    };
    url.set_query(Some(&joined));
}
