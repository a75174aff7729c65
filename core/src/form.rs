//! Form data and its wire encodings.
//!
//! # Design
//! A [`Form`] is an ordered list of named values that may nest lists and maps
//! to any depth. Encoding flattens it into bracket-notation pairs
//! (`k[]=v`, `k[sub]=v`) in insertion order, then writes either an
//! `application/x-www-form-urlencoded` string or, as soon as one field is a
//! file, a `multipart/form-data` body for the whole form.
//!
//! File fields may appear at the top level or directly inside a top-level
//! list or map. Anything deeper is refused with
//! [`EncodingError::NestedFile`] instead of being dropped.

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::EncodingError;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

const MAX_FILE_DEPTH: usize = 2;

/// Ordered, possibly nested form data.
#[derive(Debug, Clone, Default)]
pub struct Form<'a> {
    fields: Vec<(String, FormValue<'a>)>,
}

/// A single form value.
#[derive(Debug, Clone)]
pub enum FormValue<'a> {
    Text(String),
    List(Vec<FormValue<'a>>),
    Map(Form<'a>),
    File(FileField<'a>),
}

/// A file to upload as a multipart part.
#[derive(Debug, Clone)]
pub enum FileField<'a> {
    /// Read from this path at encoding time.
    Path(PathBuf),
    /// Read from the handle's current position. The caller keeps ownership.
    Handle(&'a File),
}

impl<'a> Form<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field of any value type.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FormValue<'a>>) -> Self {
        self.push(name, value);
        self
    }

    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, FormValue::Text(value.into()))
    }

    pub fn list<V>(self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<FormValue<'a>>,
    {
        self.field(name, FormValue::List(values.into_iter().map(Into::into).collect()))
    }

    pub fn file(self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.field(name, FileField::Path(path.into()))
    }

    pub fn handle(self, name: impl Into<String>, file: &'a File) -> Self {
        self.field(name, FileField::Handle(file))
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FormValue<'a>>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue<'a>)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Whether any value, at any depth, is a file.
    pub fn has_files(&self) -> bool {
        self.fields.iter().any(|(_, value)| value.has_files())
    }
}

impl FormValue<'_> {
    fn has_files(&self) -> bool {
        match self {
            FormValue::Text(_) => false,
            FormValue::List(items) => items.iter().any(FormValue::has_files),
            FormValue::Map(form) => form.has_files(),
            FormValue::File(_) => true,
        }
    }
}

impl<'a, K, V> FromIterator<(K, V)> for Form<'a>
where
    K: Into<String>,
    V: Into<FormValue<'a>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Form::new();
        for (name, value) in iter {
            form.push(name, value);
        }
        form
    }
}

impl From<&str> for FormValue<'_> {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue<'_> {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<&String> for FormValue<'_> {
    fn from(value: &String) -> Self {
        FormValue::Text(value.clone())
    }
}

impl From<bool> for FormValue<'_> {
    fn from(value: bool) -> Self {
        FormValue::Text(if value { "1" } else { "0" }.to_string())
    }
}

macro_rules! text_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FormValue<'_> {
            fn from(value: $ty) -> Self {
                FormValue::Text(value.to_string())
            }
        })*
    };
}

text_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl<'a, V: Into<FormValue<'a>>> From<Vec<V>> for FormValue<'a> {
    fn from(values: Vec<V>) -> Self {
        FormValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<'a> From<Form<'a>> for FormValue<'a> {
    fn from(form: Form<'a>) -> Self {
        FormValue::Map(form)
    }
}

impl<'a> From<FileField<'a>> for FormValue<'a> {
    fn from(file: FileField<'a>) -> Self {
        FormValue::File(file)
    }
}

/// An encoded request body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Encode a form as a request body, picking multipart when it carries files.
pub fn encode(form: &Form<'_>) -> Result<EncodedBody, EncodingError> {
    encode_parts(form, generate_boundary)
}

/// Like [`encode`] but with a fixed multipart boundary.
pub fn encode_with_boundary(form: &Form<'_>, boundary: &str) -> Result<EncodedBody, EncodingError> {
    encode_parts(form, || boundary.to_string())
}

/// Encode a form as a query string. File fields are refused.
pub fn encode_query(form: &Form<'_>) -> Result<String, EncodingError> {
    let pairs = flatten(form)?;
    if let Some((name, _)) = pairs.iter().find(|(_, value)| matches!(value, Flat::File(_))) {
        return Err(EncodingError::FileInQuery { field: name.clone() });
    }
    Ok(urlencode(&pairs))
}

fn encode_parts(form: &Form<'_>, boundary: impl FnOnce() -> String) -> Result<EncodedBody, EncodingError> {
    let pairs = flatten(form)?;
    if !pairs.iter().any(|(_, value)| matches!(value, Flat::File(_))) {
        return Ok(EncodedBody {
            bytes: Bytes::from(urlencode(&pairs)),
            content_type: FORM_URLENCODED.to_string(),
        });
    }

    let mut multipart = Multipart::new(boundary());
    for (name, value) in pairs {
        let part = match value {
            Flat::Text(text) => Part::text(text),
            Flat::File(file) => Part::file(&name, file)?,
        };
        multipart.parts.push((name, part));
    }
    Ok(EncodedBody {
        content_type: multipart.content_type(),
        bytes: multipart.into_body(),
    })
}

enum Flat<'f, 'a> {
    Text(&'f str),
    File(&'f FileField<'a>),
}

fn flatten<'f, 'a>(form: &'f Form<'a>) -> Result<Vec<(String, Flat<'f, 'a>)>, EncodingError> {
    let mut pairs = Vec::new();
    for (name, value) in &form.fields {
        flatten_value(name.clone(), value, 1, &mut pairs)?;
    }
    Ok(pairs)
}

fn flatten_value<'f, 'a>(
    name: String,
    value: &'f FormValue<'a>,
    depth: usize,
    pairs: &mut Vec<(String, Flat<'f, 'a>)>,
) -> Result<(), EncodingError> {
    match value {
        FormValue::Text(text) => pairs.push((name, Flat::Text(text))),
        FormValue::List(items) => {
            for item in items {
                flatten_value(format!("{name}[]"), item, depth + 1, pairs)?;
            }
        }
        FormValue::Map(form) => {
            for (key, item) in &form.fields {
                flatten_value(format!("{name}[{key}]"), item, depth + 1, pairs)?;
            }
        }
        FormValue::File(file) => {
            if depth > MAX_FILE_DEPTH {
                return Err(EncodingError::NestedFile { field: name });
            }
            pairs.push((name, Flat::File(file)));
        }
    }
    Ok(())
}

fn urlencode(pairs: &[(String, Flat<'_, '_>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        if let Flat::Text(text) = value {
            serializer.append_pair(name, text);
        }
    }
    serializer.finish()
}

/// Multipart form-data body under construction.
struct Multipart {
    boundary: String,
    parts: Vec<(String, Part)>,
}

impl Multipart {
    fn new(boundary: String) -> Self {
        Self {
            boundary,
            parts: Vec::new(),
        }
    }

    fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn into_body(self) -> Bytes {
        let mut output = Vec::new();

        for (name, part) in self.parts {
            output.extend_from_slice(b"--");
            output.extend_from_slice(self.boundary.as_bytes());
            output.extend_from_slice(b"\r\n");

            output.extend_from_slice(part.format_headers(&name).as_bytes());
            output.extend_from_slice(b"\r\n\r\n");

            output.extend_from_slice(&part.data);
            output.extend_from_slice(b"\r\n");
        }

        output.extend_from_slice(b"--");
        output.extend_from_slice(self.boundary.as_bytes());
        output.extend_from_slice(b"--\r\n");

        Bytes::from(output)
    }
}

struct Part {
    data: Bytes,
    content_type: Option<&'static str>,
    file_name: Option<String>,
}

impl Part {
    fn text(value: &str) -> Self {
        Self {
            data: Bytes::copy_from_slice(value.as_bytes()),
            content_type: None,
            file_name: None,
        }
    }

    fn file(field: &str, file: &FileField<'_>) -> Result<Self, EncodingError> {
        let (data, file_name) = match file {
            FileField::Path(path) => {
                let data = std::fs::read(path).map_err(|source| EncodingError::UnreadableFile {
                    field: field.to_string(),
                    path: path.clone(),
                    source,
                })?;
                (data, file_name_of(path))
            }
            FileField::Handle(handle) => {
                let mut data = Vec::new();
                let mut reader: &File = handle;
                reader
                    .read_to_end(&mut data)
                    .map_err(|source| EncodingError::UnreadableHandle {
                        field: field.to_string(),
                        source,
                    })?;
                (data, "blob".to_string())
            }
        };
        Ok(Self {
            content_type: Some(sniff_content_type(&data)),
            data: Bytes::from(data),
            file_name: Some(file_name),
        })
    }

    fn format_headers(&self, name: &str) -> String {
        let mut header = format!("Content-Disposition: form-data; name=\"{}\"", escape_quotes(name));

        if let Some(ref filename) = self.file_name {
            header.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
        }

        if let Some(mime) = self.content_type {
            header.push_str(&format!("\r\nContent-Type: {mime}"));
        }

        header
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blob".to_string())
}

fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains(['"', '\\', '\r', '\n']) {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

fn generate_boundary() -> String {
    format!("------------------------{}", Uuid::new_v4().simple())
}

/// Guess a MIME type from the leading bytes of a file.
///
/// Known binary signatures come from `infer`. Anything else that is valid
/// UTF-8 without NUL bytes counts as text.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type();
    }
    if !data.is_empty() && !data.contains(&0) && std::str::from_utf8(data).is_ok() {
        return "text/plain";
    }
    "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::{Seek, SeekFrom, Write};

    use super::*;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01, 0x03, 0x00, 0x00, 0x00, 0x25, 0xdb, 0x56,
        0xca, 0x00, 0x00, 0x00, 0x06, 0x50, 0x4c, 0x54, 0x45, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xa5,
        0xd9, 0x9f, 0xdd, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x60, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x48, 0xaf, 0xa4, 0x71, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e,
        0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    fn body_str(body: &EncodedBody) -> String {
        String::from_utf8_lossy(&body.bytes).into_owned()
    }

    #[test]
    fn sequences_use_empty_brackets_in_order() {
        let form = Form::new()
            .text("test", "post_multidimensional")
            .text("key", "file")
            .list("file", ["wibble", "wubble", "wobble"]);
        let body = encode(&form).unwrap();
        assert_eq!(body.content_type, FORM_URLENCODED);
        assert_eq!(
            body_str(&body),
            "test=post_multidimensional&key=file&file%5B%5D=wibble&file%5B%5D=wubble&file%5B%5D=wobble"
        );
    }

    #[test]
    fn maps_nest_with_named_brackets() {
        let form = Form::new().field(
            "user",
            Form::new()
                .text("name", "ada")
                .field("langs", vec!["en", "fr"])
                .field("address", Form::new().text("city", "London")),
        );
        assert_eq!(
            encode_query(&form).unwrap(),
            "user%5Bname%5D=ada&user%5Blangs%5D%5B%5D=en&user%5Blangs%5D%5B%5D=fr&user%5Baddress%5D%5Bcity%5D=London"
        );
    }

    #[test]
    fn scalars_are_form_urlencoded() {
        let form = Form::new()
            .text("q", "a b&c=d")
            .text("emoji", "é")
            .field("n", 42)
            .field("yes", true)
            .field("no", false);
        assert_eq!(encode_query(&form).unwrap(), "q=a+b%26c%3Dd&emoji=%C3%A9&n=42&yes=1&no=0");
    }

    #[test]
    fn floats_and_narrow_integers_render_as_text() {
        let form = Form::new()
            .field("price", 9.75)
            .field("ratio", 0.5f32)
            .field("whole", 2.0)
            .field("byte", 255u8)
            .field("offset", -8i8)
            .field("port", 8080u16)
            .field("delta", -300i16);
        assert_eq!(
            encode_query(&form).unwrap(),
            "price=9.75&ratio=0.5&whole=2&byte=255&offset=-8&port=8080&delta=-300"
        );
    }

    #[test]
    fn empty_collections_emit_nothing() {
        let form = Form::new()
            .text("a", "1")
            .field("empty", Vec::<String>::new())
            .field("none", Form::new())
            .text("b", "2");
        assert_eq!(encode_query(&form).unwrap(), "a=1&b=2");
        assert_eq!(encode(&Form::new()).unwrap().bytes, Bytes::new());
    }

    #[test]
    fn urlencoded_output_parses_back_in_order() {
        let form = Form::new()
            .text("first", "x y")
            .list("tags", ["b", "a", "c"])
            .text("last", "z");
        let encoded = encode_query(&form).unwrap();

        let mut parsed: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut order = Vec::new();
        for (name, value) in form_urlencoded::parse(encoded.as_bytes()) {
            let key = name.trim_end_matches("[]").to_string();
            if !order.contains(&key) {
                order.push(key.clone());
            }
            parsed.entry(key).or_default().push(value.into_owned());
        }
        assert_eq!(order, ["first", "tags", "last"]);
        assert_eq!(parsed["first"], ["x y"]);
        assert_eq!(parsed["tags"], ["b", "a", "c"]);
        assert_eq!(parsed["last"], ["z"]);
    }

    #[test]
    fn file_field_switches_whole_form_to_multipart() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PNG).unwrap();

        let form = Form::new()
            .text("test", "post_file_path_upload")
            .list("tags", ["a", "b"])
            .file("image", file.path());
        let body = encode_with_boundary(&form, "XyZ").unwrap();
        assert_eq!(body.content_type, "multipart/form-data; boundary=XyZ");

        let text = body_str(&body);
        assert!(text.starts_with("--XyZ\r\nContent-Disposition: form-data; name=\"test\"\r\n\r\npost_file_path_upload\r\n"));
        assert!(text.contains("name=\"tags[]\"\r\n\r\na\r\n--XyZ\r\nContent-Disposition: form-data; name=\"tags[]\"\r\n\r\nb\r\n"));
        let file_name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(text.contains(&format!(
            "name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )));
        assert!(text.ends_with("\r\n--XyZ--\r\n"));
        assert!(body.bytes.windows(PNG.len()).any(|w| w == PNG));
    }

    #[test]
    fn open_handle_is_read_from_current_position() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"skip").unwrap();
        file.write_all(PNG).unwrap();
        file.seek(SeekFrom::Start(4)).unwrap();

        let form = Form::new().handle("upload", &file);
        let body = encode_with_boundary(&form, "b").unwrap();
        let text = body_str(&body);
        assert!(text.contains("name=\"upload\"; filename=\"blob\"\r\nContent-Type: image/png\r\n\r\n"));
        assert!(!text.contains("skip"));
    }

    #[test]
    fn files_directly_inside_a_list_are_allowed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let form = Form::new().field(
            "docs",
            vec![FormValue::File(FileField::Path(file.path().to_path_buf()))],
        );
        let body = encode_with_boundary(&form, "b").unwrap();
        assert!(body_str(&body).contains("name=\"docs[]\"; filename="));
        assert!(body_str(&body).contains("Content-Type: text/plain"));
    }

    #[test]
    fn deeply_nested_file_is_rejected() {
        let nested = FormValue::List(vec![FormValue::List(vec![FormValue::File(FileField::Path(
            PathBuf::from("/tmp/x"),
        ))])]);
        let form = Form::new().text("a", "1").field("files", nested);
        let err = encode(&form).unwrap_err();
        assert!(matches!(err, EncodingError::NestedFile { ref field } if field == "files[][]"));

        let form = Form::new().field("m", Form::new().field("n", Form::new().file("f", "/tmp/x")));
        let err = encode(&form).unwrap_err();
        assert!(matches!(err, EncodingError::NestedFile { ref field } if field == "m[n][f]"));
    }

    #[test]
    fn query_encoding_refuses_files() {
        let form = Form::new().text("a", "1").file("image", "/tmp/image.png");
        let err = encode_query(&form).unwrap_err();
        assert!(matches!(err, EncodingError::FileInQuery { ref field } if field == "image"));
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let form = Form::new().file("image", "/definitely/not/here.png");
        let err = encode(&form).unwrap_err();
        match err {
            EncodingError::UnreadableFile { field, path, .. } => {
                assert_eq!(field, "image");
                assert_eq!(path, PathBuf::from("/definitely/not/here.png"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn has_files_looks_through_nesting() {
        assert!(!Form::new().text("a", "b").has_files());
        assert!(Form::new().field("m", Form::new().file("f", "/x")).has_files());
    }

    #[test]
    fn quotes_in_part_names_are_escaped() {
        assert_eq!(escape_quotes("plain"), "plain");
        assert_eq!(escape_quotes("a\"b"), "a\\\"b");
        assert_eq!(escape_quotes("a\\b"), "a\\\\b");
    }

    #[test]
    fn random_boundaries_differ() {
        assert_ne!(generate_boundary(), generate_boundary());
    }

    #[test]
    fn sniffs_common_signatures() {
        assert_eq!(sniff_content_type(PNG), "image/png");
        assert_eq!(sniff_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff_content_type(b"\xff\xd8\xff\xe0rest"), "image/jpeg");
        assert_eq!(sniff_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(sniff_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(sniff_content_type(b"plain words"), "text/plain");
        assert_eq!(sniff_content_type(b"\x00\x01\x02"), "application/octet-stream");
        assert_eq!(sniff_content_type(b""), "application/octet-stream");
    }
}
