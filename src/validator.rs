//! Per-parameter request validation.
//!
//! Every declared parameter gets a [`Validator`]: the parameter descriptor, an
//! [`Accessor`] for where its value lives, and a [`ParameterValidator`]
//! strategy. [`ValidatorMiddleware`] runs the strategy against the raw value,
//! writes the coerced value back on success, and maps failures to HTTP errors:
//!
//! | Failure                                   | Status | Title                              |
//! |-------------------------------------------|--------|------------------------------------|
//! | parameter named `content-type`            | 415    | Unsupported Media Type             |
//! | required parameter with no usable value   | 400    | Missing Value for Required Header  |
//! | anything else                             | 400    | Bad Request                        |

use jsonschema::Draft;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::accessor::Accessor;
use crate::error::{ConfigError, HttpError};
use crate::middleware::{Flow, Middleware};
use crate::server::Request;
use crate::spec::{CollectionFormat, Parameter, ParameterLocation};

/// Title used when a required value is absent or empty.
pub const MISSING_VALUE_TITLE: &str = "Missing Value for Required Header";

/// Keywords copied from a non-body parameter into its JSON schema.
const SCHEMA_KEYWORDS: &[&str] = &[
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "enum",
    "multipleOf",
];

/// Why a value was rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationFailure {
    pub details: Vec<String>,
    /// The value was absent rather than malformed
    pub missing: bool,
}

impl ValidationFailure {
    pub fn invalid(details: Vec<String>) -> Self {
        Self {
            details,
            missing: false,
        }
    }

    pub fn missing(detail: impl Into<String>) -> Self {
        Self {
            details: vec![detail.into()],
            missing: true,
        }
    }
}

/// Validation strategy for one parameter.
///
/// Receives the raw value (`None` when the request does not carry it) and
/// returns the value to write back, or `None` to leave the request untouched.
pub trait ParameterValidator: Send + Sync {
    fn validate(&self, value: Option<Value>) -> Result<Option<Value>, ValidationFailure>;
}

impl<F> ParameterValidator for F
where
    F: Fn(Option<Value>) -> Result<Option<Value>, ValidationFailure> + Send + Sync,
{
    fn validate(&self, value: Option<Value>) -> Result<Option<Value>, ValidationFailure> {
        self(value)
    }
}

fn is_empty(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Coerces string input to the declared type, then checks it against a
/// draft-4 JSON schema.
pub struct SchemaValidator {
    name: String,
    required: bool,
    allow_empty: bool,
    default: Option<Value>,
    /// Declared type and item type for string coercion; `None` for body
    coercion: Option<(String, Option<String>, CollectionFormat)>,
    schema: jsonschema::Validator,
}

impl SchemaValidator {
    pub fn new(param: &Parameter, definitions: &BTreeMap<String, Value>) -> Result<Self, ConfigError> {
        let (schema, coercion) = if param.location == ParameterLocation::Body {
            (body_schema(param, definitions), None)
        } else {
            let ty = param.param_type.clone().unwrap_or_else(|| "string".to_string());
            let item_ty = param
                .items
                .as_ref()
                .and_then(|i| i.get("type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let format = param.collection_format.unwrap_or_default();
            (parameter_schema(param), Some((ty, item_ty, format)))
        };

        let compiled = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .map_err(|e| ConfigError::Schema {
                parameter: param.name.clone(),
                location: param.location.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            name: param.name.clone(),
            required: param.required,
            allow_empty: param.allow_empty_value,
            default: param.default.clone(),
            coercion,
            schema: compiled,
        })
    }

    fn coerce(&self, value: Value) -> Value {
        match &self.coercion {
            Some((ty, item_ty, format)) => coerce(value, ty, item_ty.as_deref(), *format),
            None => value,
        }
    }
}

impl ParameterValidator for SchemaValidator {
    fn validate(&self, value: Option<Value>) -> Result<Option<Value>, ValidationFailure> {
        if self.allow_empty && matches!(&value, Some(Value::String(s)) if s.is_empty()) {
            return Ok(value);
        }
        let value = if is_empty(&value) {
            match (&self.default, self.required) {
                (Some(default), _) => default.clone(),
                (None, true) => {
                    return Err(ValidationFailure::missing(format!(
                        "Missing required parameter '{}'",
                        self.name
                    )))
                }
                (None, false) => return Ok(None),
            }
        } else {
            match value {
                Some(v) => self.coerce(v),
                None => return Ok(None),
            }
        };

        let details: Vec<String> = self
            .schema
            .iter_errors(&value)
            .map(|e| format!("{}: {}", self.name, e))
            .collect();
        if details.is_empty() {
            Ok(Some(value))
        } else {
            Err(ValidationFailure::invalid(details))
        }
    }
}

/// `type: file` parameters: the upload must be present when required.
pub struct FileValidator {
    name: String,
    required: bool,
}

impl FileValidator {
    pub fn new(param: &Parameter) -> Self {
        Self {
            name: param.name.clone(),
            required: param.required,
        }
    }
}

impl ParameterValidator for FileValidator {
    fn validate(&self, value: Option<Value>) -> Result<Option<Value>, ValidationFailure> {
        if is_empty(&value) {
            if self.required {
                return Err(ValidationFailure::missing(format!(
                    "Missing required file '{}'",
                    self.name
                )));
            }
            return Ok(None);
        }
        Ok(value)
    }
}

fn body_schema(param: &Parameter, definitions: &BTreeMap<String, Value>) -> Value {
    let mut schema = param.schema.clone().unwrap_or_else(|| Value::Object(Map::new()));
    if let Value::Object(obj) = &mut schema {
        if !definitions.is_empty() && !obj.contains_key("definitions") {
            let defs: Map<String, Value> = definitions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            obj.insert("definitions".to_string(), Value::Object(defs));
        }
    }
    schema
}

fn parameter_schema(param: &Parameter) -> Value {
    let mut schema = Map::new();
    if let Some(ty) = &param.param_type {
        schema.insert("type".to_string(), Value::String(ty.clone()));
    }
    if let Some(format) = &param.format {
        schema.insert("format".to_string(), Value::String(format.clone()));
    }
    if let Some(items) = &param.items {
        schema.insert("items".to_string(), items.clone());
    }
    for key in SCHEMA_KEYWORDS {
        if let Some(v) = param.constraints.get(*key) {
            schema.insert((*key).to_string(), v.clone());
        }
    }
    Value::Object(schema)
}

fn coerce_scalar(value: Value, ty: &str) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let parsed = match ty {
        "integer" => s.trim().parse::<i64>().ok().map(Value::from),
        "number" => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "boolean" => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or(value)
}

/// Convert transport strings to the declared type. Values that do not parse
/// are returned unchanged so the schema reports them.
fn coerce(value: Value, ty: &str, item_ty: Option<&str>, format: CollectionFormat) -> Value {
    if ty != "array" {
        return coerce_scalar(value, ty);
    }
    let items: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::String(s) => match format.delimiter() {
            Some(delim) => s
                .split(delim)
                .map(|part| {
                    let part = if delim == ',' { part.trim() } else { part };
                    Value::String(part.to_string())
                })
                .collect(),
            None => vec![Value::String(s)],
        },
        other => return other,
    };
    let item_ty = item_ty.unwrap_or("string");
    Value::Array(items.into_iter().map(|v| coerce_scalar(v, item_ty)).collect())
}

/// A parameter with its accessor and validation strategy.
#[derive(Clone)]
pub struct Validator {
    pub parameter: Parameter,
    pub accessor: Accessor,
    pub strategy: Arc<dyn ParameterValidator>,
}

impl Validator {
    pub fn new(parameter: Parameter, strategy: Arc<dyn ParameterValidator>) -> Self {
        Self {
            accessor: Accessor::for_parameter(&parameter),
            parameter,
            strategy,
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.parameter.name)
            .field("location", &self.parameter.location)
            .field("required", &self.parameter.required)
            .finish()
    }
}

/// Pick the strategy for a parameter: files get a presence check, everything
/// else a schema.
pub fn make_validator(
    parameter: Parameter,
    definitions: &BTreeMap<String, Value>,
) -> Result<Validator, ConfigError> {
    let strategy: Arc<dyn ParameterValidator> = if parameter.is_file() {
        Arc::new(FileValidator::new(&parameter))
    } else {
        Arc::new(SchemaValidator::new(&parameter, definitions)?)
    };
    Ok(Validator::new(parameter, strategy))
}

/// Map a strategy failure to the error sent to the client.
pub fn validation_error(
    parameter: &Parameter,
    raw: Option<&Value>,
    failure: ValidationFailure,
    error_name: &str,
) -> HttpError {
    let detail = failure
        .details
        .into_iter()
        .next()
        .unwrap_or_else(|| format!("Invalid value for parameter '{}'", parameter.name));

    let raw_missing = is_empty(&raw.cloned());
    let err = if parameter.name.eq_ignore_ascii_case("content-type") {
        HttpError::unsupported_media_type(detail)
    } else if parameter.required && (raw_missing || failure.missing) {
        HttpError::new(400, MISSING_VALUE_TITLE, detail)
    } else {
        HttpError::bad_request(detail)
    };
    err.with_name(error_name)
}

/// Runs one [`Validator`] as a chain step.
pub struct ValidatorMiddleware {
    validator: Validator,
    error_name: String,
}

impl ValidatorMiddleware {
    pub fn new(validator: Validator, error_name: &str) -> Self {
        Self {
            validator,
            error_name: error_name.to_string(),
        }
    }
}

impl Middleware for ValidatorMiddleware {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        let Validator {
            parameter,
            accessor,
            strategy,
        } = &self.validator;
        let raw = accessor.get(req);
        match strategy.validate(raw.clone()) {
            Ok(Some(value)) => {
                accessor.set(req, value);
                Ok(Flow::Continue)
            }
            Ok(None) => Ok(Flow::Continue),
            Err(failure) => {
                debug!(
                    request_id = %req.id,
                    parameter = %parameter.name,
                    location = %parameter.location,
                    details = ?failure.details,
                    "Parameter rejected"
                );
                Err(validation_error(parameter, raw.as_ref(), failure, &self.error_name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    fn param(value: Value) -> Parameter {
        serde_json::from_value(value).unwrap()
    }

    fn validator(value: Value) -> Validator {
        make_validator(param(value), &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_coerces_query_integer() {
        let v = validator(json!({"name": "limit", "in": "query", "type": "integer", "maximum": 50}));
        assert_eq!(v.strategy.validate(Some(json!("10"))), Ok(Some(json!(10))));
        assert!(v.strategy.validate(Some(json!("100"))).is_err());
        assert!(v.strategy.validate(Some(json!("ten"))).is_err());
        assert_eq!(v.strategy.validate(None), Ok(None));
    }

    #[test]
    fn test_default_applied() {
        let v = validator(json!({"name": "page", "in": "query", "type": "integer", "default": 1}));
        assert_eq!(v.strategy.validate(None), Ok(Some(json!(1))));
    }

    #[test]
    fn test_collection_formats() {
        let csv = validator(json!({
            "name": "ids", "in": "query", "type": "array",
            "items": {"type": "integer"}
        }));
        assert_eq!(csv.strategy.validate(Some(json!("1, 2,3"))), Ok(Some(json!([1, 2, 3]))));

        let pipes = validator(json!({
            "name": "tags", "in": "query", "type": "array",
            "items": {"type": "string"}, "collectionFormat": "pipes"
        }));
        assert_eq!(pipes.strategy.validate(Some(json!("a|b"))), Ok(Some(json!(["a", "b"]))));

        let multi = validator(json!({
            "name": "tags", "in": "query", "type": "array",
            "items": {"type": "string"}, "collectionFormat": "multi"
        }));
        assert_eq!(multi.strategy.validate(Some(json!("a"))), Ok(Some(json!(["a"]))));
        assert_eq!(
            multi.strategy.validate(Some(json!(["a", "b"]))),
            Ok(Some(json!(["a", "b"])))
        );
    }

    #[test]
    fn test_body_refs_resolve_against_definitions() {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "Pet".to_string(),
            json!({"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}),
        );
        let v = make_validator(
            param(json!({"name": "pet", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Pet"}})),
            &definitions,
        )
        .unwrap();
        assert_eq!(
            v.strategy.validate(Some(json!({"name": "rex"}))),
            Ok(Some(json!({"name": "rex"})))
        );
        let failure = v.strategy.validate(Some(json!({"age": 3}))).unwrap_err();
        assert!(!failure.missing);
        assert!(failure.details[0].starts_with("pet:"));
    }

    #[test]
    fn test_allow_empty_value_skips_coercion() {
        let v = validator(json!({
            "name": "n", "in": "query", "type": "integer", "allowEmptyValue": true
        }));
        assert_eq!(v.strategy.validate(Some(json!(""))), Ok(Some(json!(""))));
        assert_eq!(v.strategy.validate(Some(json!("4"))), Ok(Some(json!(4))));

        let strict = validator(json!({"name": "n", "in": "query", "type": "integer"}));
        assert_eq!(strict.strategy.validate(Some(json!(""))), Ok(None));
    }

    #[test]
    fn test_required_missing() {
        let v = validator(json!({"name": "id", "in": "path", "required": true, "type": "string"}));
        let failure = v.strategy.validate(Some(json!(""))).unwrap_err();
        assert!(failure.missing);
    }

    #[test]
    fn test_file_presence() {
        let v = validator(json!({"name": "doc", "in": "formData", "type": "file", "required": true}));
        assert!(v.strategy.validate(None).unwrap_err().missing);
        assert_eq!(v.strategy.validate(Some(json!("bytes"))), Ok(Some(json!("bytes"))));
    }

    #[test]
    fn test_error_mapping() {
        let content_type = param(json!({"name": "Content-Type", "in": "header", "type": "string"}));
        let err = validation_error(&content_type, Some(&json!("x")), ValidationFailure::default(), "Api");
        assert_eq!((err.status, err.title.as_str()), (415, "Unsupported Media Type"));
        assert_eq!(err.detail, "Invalid value for parameter 'Content-Type'");
        assert_eq!(err.name, "Api");

        let required = param(json!({"name": "x-key", "in": "header", "type": "string", "required": true}));
        let err = validation_error(&required, None, ValidationFailure::invalid(vec!["first".into(), "second".into()]), "Api");
        assert_eq!((err.status, err.title.as_str()), (400, MISSING_VALUE_TITLE));
        assert_eq!(err.detail, "first");

        let err = validation_error(&required, Some(&json!("abc")), ValidationFailure::invalid(vec![]), "Api");
        assert_eq!((err.status, err.title.as_str()), (400, "Bad Request"));
    }

    #[test]
    fn test_middleware_writes_back() {
        let mw = ValidatorMiddleware::new(
            validator(json!({"name": "id", "in": "path", "required": true, "type": "integer"})),
            "Api",
        );
        let mut req = Request::new(Method::GET, "/pets/7");
        req.params.insert("id".into(), json!("7"));
        assert!(matches!(mw.call(&mut req), Ok(Flow::Continue)));
        assert_eq!(req.params["id"], json!(7));

        req.params.insert("id".into(), json!("seven"));
        let err = mw.call(&mut req).unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.title, "Bad Request");
    }

    #[test]
    fn test_custom_strategy() {
        let strict: Arc<dyn ParameterValidator> = Arc::new(
            |value: Option<Value>| -> Result<Option<Value>, ValidationFailure> {
                match value {
                    Some(Value::String(s)) if s == "ok" => Ok(None),
                    _ => Err(ValidationFailure::invalid(vec!["must be ok".into()])),
                }
            },
        );
        let v = Validator::new(param(json!({"name": "q", "in": "query", "type": "string"})), strict);
        assert_eq!(v.strategy.validate(Some(json!("ok"))), Ok(None));
        assert_eq!(
            v.strategy.validate(Some(json!("no"))).unwrap_err().details,
            vec!["must be ok".to_string()]
        );
    }
}
