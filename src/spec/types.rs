use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::handlers::HandlerSpec;
use crate::security::SecurityEntry;
use crate::validator::Validator;

/// A Swagger 2.0 document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    pub swagger: String,
    #[serde(default)]
    pub info: Info,
    pub host: Option<String>,
    pub base_path: Option<String>,
    #[serde(default)]
    pub schemes: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub definitions: BTreeMap<String, Value>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub security_definitions: BTreeMap<String, SecurityDefinition>,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
}

impl PathItem {
    /// Operations in the fixed Swagger order: get, put, post, delete, options, head, patch.
    pub fn operations(&self) -> Vec<(Method, &Operation)> {
        [
            (Method::GET, &self.get),
            (Method::PUT, &self.put),
            (Method::POST, &self.post),
            (Method::DELETE, &self.delete),
            (Method::OPTIONS, &self.options),
            (Method::HEAD, &self.head),
            (Method::PATCH, &self.patch),
        ]
        .into_iter()
        .filter_map(|(m, op)| op.as_ref().map(|op| (m, op)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub consumes: Option<Vec<String>>,
    pub produces: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub responses: BTreeMap<String, Value>,
    /// Name of the registered handler serving this operation
    #[serde(rename = "x-handler")]
    pub x_handler: Option<String>,
}

/// Where a parameter lives on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        };
        f.write_str(s)
    }
}

/// How array parameters are serialised in strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    #[default]
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    /// Separator for the delimited formats; `Multi` repeats the key instead.
    pub fn delimiter(self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Parameter(Parameter),
}

/// A Swagger parameter. Validation keywords (`maximum`, `enum`, `pattern`, ...)
/// and vendor extensions are kept in `constraints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Body parameters only
    pub schema: Option<Value>,
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub format: Option<String>,
    pub items: Option<Value>,
    pub collection_format: Option<CollectionFormat>,
    pub default: Option<Value>,
    #[serde(default)]
    pub allow_empty_value: bool,
    #[serde(flatten)]
    pub constraints: BTreeMap<String, Value>,
}

impl Parameter {
    pub fn new(name: &str, location: ParameterLocation) -> Self {
        Self {
            name: name.to_string(),
            location,
            description: None,
            required: location == ParameterLocation::Path,
            schema: None,
            param_type: None,
            format: None,
            items: None,
            collection_format: None,
            default: None,
            allow_empty_value: false,
            constraints: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, ty: &str) -> Self {
        self.param_type = Some(ty.to_string());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn is_file(&self) -> bool {
        self.param_type.as_deref() == Some("file")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityDefinition {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub description: Option<String>,
    /// Header or query parameter name for `apiKey`
    pub name: Option<String>,
    /// `header` or `query` for `apiKey`
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub flow: Option<String>,
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
    /// Name of the registered authorizer to use instead of the scheme name
    #[serde(rename = "x-authorize")]
    pub x_authorize: Option<String>,
}

/// Scheme name to required scopes, in document order.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A route derived from one operation of the document.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: Method,
    /// Path template as written in the document, e.g. `/pets/{id}`
    pub path: String,
    pub operation_id: Option<String>,
    pub handler: HandlerSpec,
    pub validators: Vec<Validator>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    /// Alternatives; `None` when the operation is open
    pub security: Option<Vec<SecurityEntry>>,
    /// The operation object exactly as it appears in the document
    pub operation: Arc<Value>,
}

/// Serialisable view of a route, exposed on the mounted app.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
    pub parameters: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub security: Vec<String>,
}

impl From<&RouteMeta> for RouteSummary {
    fn from(route: &RouteMeta) -> Self {
        Self {
            method: route.method.to_string(),
            path: route.path.clone(),
            operation_id: route.operation_id.clone(),
            parameters: route
                .validators
                .iter()
                .map(|v| format!("{}:{}", v.parameter.location, v.parameter.name))
                .collect(),
            consumes: route.consumes.clone(),
            produces: route.produces.clone(),
            security: route
                .security
                .as_ref()
                .map(|entries| entries.iter().map(|e| e.scheme.clone()).collect())
                .unwrap_or_default(),
        }
    }
}
