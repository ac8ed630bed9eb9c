use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;

/// Response body. JSON is kept as a value until it is written so the app's
/// `json spaces` setting can be applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Json(body),
        }
    }

    pub fn ok_json(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Text(body.into()),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Replace any header with the same name (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body as a JSON value, when it is one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Content type implied by the body when the handler set none.
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self.body {
            Body::Empty => None,
            Body::Text(_) => Some("text/plain; charset=utf-8"),
            Body::Json(_) => Some("application/json; charset=utf-8"),
            Body::Bytes(_) => Some("application/octet-stream"),
        }
    }

    /// Serialise the body. `json_spaces > 0` pretty-prints JSON.
    pub fn body_bytes(&self, json_spaces: usize) -> Vec<u8> {
        match &self.body {
            Body::Empty => Vec::new(),
            Body::Text(s) => s.clone().into_bytes(),
            Body::Bytes(b) => b.clone(),
            Body::Json(v) if json_spaces == 0 => v.to_string().into_bytes(),
            Body::Json(v) => {
                let indent = vec![b' '; json_spaces];
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
                let mut out = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
                match serde::Serialize::serialize(v, &mut ser) {
                    Ok(()) => out,
                    Err(_) => v.to_string().into_bytes(),
                }
            }
        }
    }
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

// may_minihttp only accepts `&'static str` header lines. Lines are interned so
// each distinct line is leaked once; values come from the mounted document
// (Allow lists, media types) and handler constants.
static HEADER_LINES: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn intern_header(line: String) -> &'static str {
    let mut lines = match HEADER_LINES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(existing) = lines.get(line.as_str()) {
        return *existing;
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    lines.insert(leaked);
    leaked
}

/// Copy a [`Response`] onto the `may_minihttp` response.
pub fn write_response(res: &mut may_minihttp::Response, response: &Response, json_spaces: usize) {
    res.status_code(response.status as usize, status_reason(response.status));
    let mut has_content_type = false;
    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case("content-type") {
            has_content_type = true;
        }
        res.header(intern_header(format!("{name}: {value}")));
    }
    if !has_content_type {
        if let Some(ct) = response.default_content_type() {
            res.header(intern_header(format!("Content-Type: {ct}")));
        }
    }
    res.body_vec(response.body_bytes(json_spaces));
}
