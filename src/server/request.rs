use crate::ids::RequestId;
use http::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A file received in a `multipart/form-data` body.
///
/// The built-in parser keeps uploads in memory (`buffer`). Pre-handlers that
/// spill uploads to disk record the location in `path` instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadedFile {
    /// Form field the file was sent under
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub buffer: Option<Vec<u8>>,
    pub path: Option<PathBuf>,
}

/// Incoming request as seen by middleware and handlers.
///
/// Header names are stored lowercase. Query values repeated in the URL are
/// collected into a JSON array.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub method: Method,
    /// Path without query string
    pub path: String,
    /// Path and query as received
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: Map<String, Value>,
    /// Path parameters captured by the router
    pub params: Map<String, Value>,
    /// Parsed body: JSON, form fields as an object, or text
    pub body: Option<Value>,
    /// Form fields from urlencoded or multipart bodies
    pub form: Map<String, Value>,
    pub files: Vec<UploadedFile>,
    pub raw_body: Vec<u8>,
    /// Swagger operation object of the matched route
    pub operation: Option<Arc<Value>>,
    /// Scopes of the security scheme currently being authorized
    pub required_scopes: Vec<String>,
    /// Peer address when the transport knows it
    pub remote_addr: Option<String>,
    /// Client address, honouring `X-Forwarded-For` when the app trusts proxies
    pub ip: Option<String>,
    /// Free-form values attached by middleware (e.g. authorizer claims)
    pub extensions: Map<String, Value>,
}

impl Request {
    /// Build a request with no headers and no body.
    pub fn new(method: Method, url: &str) -> Self {
        let path = url.split('?').next().unwrap_or("/");
        let path = if path.is_empty() { "/" } else { path };
        Self {
            id: RequestId::new(),
            method,
            path: path.to_string(),
            url: url.to_string(),
            headers: HashMap::new(),
            query: parse_query(url),
            params: Map::new(),
            body: None,
            form: Map::new(),
            files: Vec::new(),
            raw_body: Vec::new(),
            operation: None,
            required_scopes: Vec::new(),
            remote_addr: None,
            ip: None,
            extensions: Map::new(),
        }
    }

    /// Build a request from transport parts, parsing the body by content type.
    pub fn from_parts(
        method: Method,
        url: &str,
        headers: impl IntoIterator<Item = (String, String)>,
        body: Vec<u8>,
    ) -> Self {
        let mut req = Self::new(method, url);
        for (name, value) in headers {
            req.append_header(&name, &value);
        }
        req.id = RequestId::from_header_or_new(req.header("x-request-id"));
        req.set_body(body);
        req
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.append_header(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.set_body(body.into());
        self
    }

    /// Set a JSON body and a matching content type when none is present.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        if !self.headers.contains_key("content-type") {
            self.append_header("content-type", "application/json");
        }
        self.raw_body = body.to_string().into_bytes();
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    fn append_header(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.headers.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.headers.insert(key, value.to_string());
            }
        }
    }

    /// Replace the raw body and re-run body parsing.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = None;
        self.form = Map::new();
        self.files.clear();
        self.raw_body = body;
        if self.raw_body.is_empty() {
            return;
        }

        let content_type = self
            .content_type()
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            match multipart_boundary(self.content_type().unwrap_or("")) {
                Some(boundary) => {
                    let (fields, files) = parse_multipart(&self.raw_body, &boundary);
                    self.body = Some(Value::Object(fields.clone()));
                    self.form = fields;
                    self.files = files;
                }
                None => debug!(request_id = %self.id, "Multipart body without boundary"),
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let fields = collect_pairs(url::form_urlencoded::parse(&self.raw_body));
            self.body = Some(Value::Object(fields.clone()));
            self.form = fields;
        } else if content_type.contains("json") || content_type.is_empty() {
            match serde_json::from_slice::<Value>(&self.raw_body) {
                Ok(json) => self.body = Some(json),
                Err(e) => debug!(request_id = %self.id, error = %e, "JSON body parse failed"),
            }
        } else if content_type.starts_with("text/") {
            self.body = Some(Value::String(
                String::from_utf8_lossy(&self.raw_body).into_owned(),
            ));
        }
    }
}

/// Parse the query string of a URL. Repeated keys become arrays.
pub fn parse_query(url: &str) -> Map<String, Value> {
    match url.split_once('?') {
        Some((_, query)) => collect_pairs(url::form_urlencoded::parse(query.as_bytes())),
        None => Map::new(),
    }
}

fn collect_pairs<'a>(
    pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in pairs {
        let value = Value::String(v.into_owned());
        match out.get_mut(k.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(k.into_owned(), value);
            }
        }
    }
    out
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Split a `multipart/form-data` body into text fields and files.
pub fn parse_multipart(body: &[u8], boundary: &str) -> (Map<String, Value>, Vec<UploadedFile>) {
    let delimiter = format!("--{boundary}").into_bytes();
    let mut fields = Vec::new();
    let mut files = Vec::new();

    let Some(start) = find(body, &delimiter) else {
        return (Map::new(), files);
    };
    let mut rest = &body[start + delimiter.len()..];

    loop {
        if rest.starts_with(b"--") {
            break;
        }
        let chunk = rest.strip_prefix(b"\r\n").unwrap_or(rest);
        let Some(end) = find(chunk, &delimiter) else {
            break;
        };
        let part = &chunk[..end];
        let part = part.strip_suffix(b"\r\n").unwrap_or(part);
        rest = &chunk[end + delimiter.len()..];

        let Some(split) = find(part, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&part[..split]);
        let content = &part[split + 4..];

        let mut name = None;
        let mut filename = None;
        let mut content_type = None;
        for line in head.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("content-disposition") {
                for attr in value.split(';').skip(1) {
                    if let Some((k, v)) = attr.trim().split_once('=') {
                        let v = v.trim().trim_matches('"').to_string();
                        match k.trim() {
                            "name" => name = Some(v),
                            "filename" => filename = Some(v),
                            _ => {}
                        }
                    }
                }
            } else if key.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }

        let Some(name) = name else {
            continue;
        };
        if filename.is_some() {
            files.push(UploadedFile {
                field: name,
                filename,
                content_type,
                buffer: Some(content.to_vec()),
                path: None,
            });
        } else {
            fields.push((
                std::borrow::Cow::Owned(name),
                std::borrow::Cow::Owned(String::from_utf8_lossy(content).into_owned()),
            ));
        }
    }

    (collect_pairs(fields.into_iter()), files)
}
