//! Radix tree keyed by path segments.
//!
//! Patterns use the `:name` parameter syntax. A parameter may carry a literal
//! suffix inside its segment (`:file.json`). Static children are tried before
//! parameter children, and the search backtracks when a branch dead-ends.

use http::Method;
use std::sync::Arc;

use crate::middleware::{Chain, Middleware};

/// Everything registered for one path pattern.
#[derive(Clone, Default)]
pub struct PathEntry {
    /// The pattern as registered, e.g. `/v1/pets/:id`
    pub pattern: String,
    /// Path-level middleware, run for every method before the route chain
    pub guards: Vec<Arc<dyn Middleware>>,
    /// Route chains in registration order
    pub methods: Vec<(Method, Arc<Chain>)>,
}

impl PathEntry {
    /// Chain for `method`. HEAD falls back to GET.
    pub fn chain_for(&self, method: &Method) -> Option<&Arc<Chain>> {
        let find = |m: &Method| {
            self.methods
                .iter()
                .find(|(registered, _)| registered == m)
                .map(|(_, chain)| chain)
        };
        find(method).or_else(|| {
            if *method == Method::HEAD {
                find(&Method::GET)
            } else {
                None
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param { name: String, suffix: String },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(rest) => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                    .unwrap_or(rest.len());
                Segment::Param {
                    name: rest[..end].to_string(),
                    suffix: rest[end..].to_string(),
                }
            }
            None => Segment::Static(raw.to_string()),
        }
    }
}

/// Matching switches that come from app settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// `/Pets` and `/pets` are different paths
    pub case_sensitive: bool,
    /// `/pets/` and `/pets` are different paths
    pub strict: bool,
}

#[derive(Clone)]
struct RadixNode {
    segment: Option<Segment>,
    entry: Option<PathEntry>,
    children: Vec<RadixNode>,
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new(segment: Option<Segment>) -> Self {
        Self {
            segment,
            entry: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn entry_mut(&mut self, segments: &[&str], pattern: &str) -> &mut PathEntry {
        let Some((first, remaining)) = segments.split_first() else {
            return self.entry.get_or_insert_with(|| PathEntry {
                pattern: pattern.to_string(),
                ..PathEntry::default()
            });
        };

        let segment = Segment::parse(first);
        let bucket = match segment {
            Segment::Static(_) => &mut self.children,
            Segment::Param { .. } => &mut self.param_children,
        };
        let idx = match bucket
            .iter()
            .position(|child| child.segment.as_ref() == Some(&segment))
        {
            Some(idx) => idx,
            None => {
                bucket.push(RadixNode::new(Some(segment)));
                bucket.len() - 1
            }
        };
        bucket[idx].entry_mut(remaining, pattern)
    }

    fn search<'a>(
        &'a self,
        segments: &[&str],
        opts: MatchOptions,
        params: &mut Vec<(String, String)>,
    ) -> Option<&'a PathEntry> {
        let Some((first, remaining)) = segments.split_first() else {
            return self.entry.as_ref();
        };

        for child in &self.children {
            if let Some(Segment::Static(s)) = &child.segment {
                let hit = if opts.case_sensitive {
                    s == first
                } else {
                    s.eq_ignore_ascii_case(first)
                };
                if hit {
                    if let Some(entry) = child.search(remaining, opts, params) {
                        return Some(entry);
                    }
                }
            }
        }

        for child in &self.param_children {
            if let Some(Segment::Param { name, suffix }) = &child.segment {
                let value = if suffix.is_empty() {
                    Some(*first)
                } else {
                    first.strip_suffix(suffix.as_str())
                };
                let Some(value) = value.filter(|v| !v.is_empty()) else {
                    continue;
                };
                let decoded = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                params.push((name.clone(), decoded));
                if let Some(entry) = child.search(remaining, opts, params) {
                    return Some(entry);
                }
                params.pop();
            }
        }

        None
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a PathEntry>) {
        if let Some(entry) = &self.entry {
            out.push(entry);
        }
        for child in self.children.iter().chain(self.param_children.iter()) {
            child.collect(out);
        }
    }
}

/// Split a path into segments. Without `strict`, one trailing slash is ignored.
fn split_path(path: &str, strict: bool) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut segments: Vec<&str> = trimmed.split('/').collect();
    if !strict && segments.len() > 1 && segments.last() == Some(&"") {
        segments.pop();
    }
    segments
}

#[derive(Clone)]
pub struct RadixRouter {
    root: RadixNode,
}

impl Default for RadixRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixRouter {
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(None),
        }
    }

    /// Entry for `pattern`, created on first use.
    pub fn entry_mut(&mut self, pattern: &str) -> &mut PathEntry {
        let segments = split_path(pattern, true);
        self.root.entry_mut(&segments, pattern)
    }

    /// Find the entry for a concrete request path and capture its parameters.
    pub fn search(&self, path: &str, opts: MatchOptions) -> Option<(&PathEntry, Vec<(String, String)>)> {
        let segments = split_path(path, opts.strict);
        let mut params = Vec::new();
        let entry = self.root.search(&segments, opts, &mut params)?;
        Some((entry, params))
    }

    pub fn entries(&self) -> Vec<&PathEntry> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }
}
