//! Offline generation of handler and model stubs from an API document.
//!
//! One model file is written per `definitions` entry and one handler file per
//! normalized path: the path with its `{param}` segments removed, so `/pets`
//! and `/pets/{id}` share `pets.rs`. Existing files are never overwritten.
//!
//! Templates are rendered with `minijinja`. The built-in ones live in
//! `templates/`; custom ones receive the same context:
//!
//! - handler: `path`, `module`, `operations[]` with `method`, `path`,
//!   `function`, `operation_id`, `summary`, `parameters[]`
//! - model: `name`, `description`, `properties[]` with `field`, `rename`,
//!   `ty`, `required`, `description`

mod naming;

pub use naming::{field_name, function_name, handler_file_stem, normalized_path, pascal_case, rust_type, snake_case};

use anyhow::{Context, Result};
use minijinja::Environment;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::spec::{ApiDocument, ParameterOrRef};

const HANDLER_TEMPLATE: &str = include_str!("../../templates/handler.rs.jinja");
const MODEL_TEMPLATE: &str = include_str!("../../templates/model.rs.jinja");

/// Where to write and which templates to use.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub handlers_dir: PathBuf,
    pub models_dir: PathBuf,
    pub handler_template: Option<PathBuf>,
    pub model_template: Option<PathBuf>,
}

impl ScaffoldOptions {
    /// `handlers/` and `models/` under `output`, built-in templates.
    pub fn new(output: &Path) -> Self {
        Self {
            handlers_dir: output.join("handlers"),
            models_dir: output.join("models"),
            handler_template: None,
            model_template: None,
        }
    }
}

/// Files written and files left alone because they already existed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaffoldReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ParameterContext {
    name: String,
    location: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    required: bool,
}

#[derive(Debug, Serialize)]
struct OperationContext {
    method: String,
    path: String,
    function: String,
    operation_id: Option<String>,
    summary: Option<String>,
    parameters: Vec<ParameterContext>,
}

#[derive(Debug, Serialize)]
struct HandlerContext {
    path: String,
    module: String,
    operations: Vec<OperationContext>,
}

#[derive(Debug, Serialize)]
struct PropertyContext {
    field: String,
    rename: Option<String>,
    ty: String,
    required: bool,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModelContext {
    name: String,
    description: Option<String>,
    properties: Vec<PropertyContext>,
}

fn template_source(custom: &Option<PathBuf>, builtin: &str) -> Result<String> {
    match custom {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display())),
        None => Ok(builtin.to_string()),
    }
}

fn load_templates<'a>(handler: &'a str, model: &'a str) -> Result<Environment<'a>> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template("handler.rs", handler)
        .context("invalid handler template")?;
    env.add_template("model.rs", model)
        .context("invalid model template")?;
    Ok(env)
}

fn handler_contexts(doc: &ApiDocument) -> BTreeMap<String, HandlerContext> {
    let mut files: BTreeMap<String, HandlerContext> = BTreeMap::new();
    for (path, item) in &doc.paths {
        let stem = handler_file_stem(path);
        let ctx = files.entry(stem.clone()).or_insert_with(|| HandlerContext {
            path: normalized_path(path),
            module: stem,
            operations: Vec::new(),
        });
        for (method, op) in item.operations() {
            let parameters = item
                .parameters
                .iter()
                .chain(&op.parameters)
                .map(|p| match p {
                    ParameterOrRef::Parameter(p) => ParameterContext {
                        name: p.name.clone(),
                        location: p.location.to_string(),
                        ty: p.param_type.clone(),
                        required: p.required,
                    },
                    ParameterOrRef::Ref { reference } => ParameterContext {
                        name: reference.rsplit('/').next().unwrap_or(reference).to_string(),
                        location: "ref".to_string(),
                        ty: None,
                        required: false,
                    },
                })
                .collect();
            ctx.operations.push(OperationContext {
                method: method.to_string(),
                path: path.clone(),
                function: function_name(&method, path, op.operation_id.as_deref()),
                operation_id: op.operation_id.clone(),
                summary: op.summary.clone(),
                parameters,
            });
        }
    }
    files.retain(|_, ctx| !ctx.operations.is_empty());
    files
}

fn model_context(name: &str, schema: &Value) -> ModelContext {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(prop, prop_schema)| {
                    let (field, rename) = field_name(prop);
                    PropertyContext {
                        field,
                        rename,
                        ty: rust_type(prop_schema),
                        required: required.contains(&prop.as_str()),
                        description: prop_schema
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    ModelContext {
        name: pascal_case(name),
        description: schema
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        properties,
    }
}

/// Write `contents` unless the file exists.
fn write_new(path: &Path, contents: &str, report: &mut ScaffoldReport) -> Result<()> {
    if path.exists() {
        warn!(path = %path.display(), "File exists, not overwriting");
        report.skipped.push(path.to_path_buf());
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Generated");
    report.written.push(path.to_path_buf());
    Ok(())
}

/// Generate model and handler files for `doc`.
pub fn scaffold(doc: &ApiDocument, options: &ScaffoldOptions) -> Result<ScaffoldReport> {
    let handler_source = template_source(&options.handler_template, HANDLER_TEMPLATE)?;
    let model_source = template_source(&options.model_template, MODEL_TEMPLATE)?;
    let env = load_templates(&handler_source, &model_source)?;
    let mut report = ScaffoldReport::default();

    if !doc.definitions.is_empty() {
        fs::create_dir_all(&options.models_dir)
            .with_context(|| format!("failed to create {}", options.models_dir.display()))?;
        let template = env.get_template("model.rs")?;
        for (name, schema) in &doc.definitions {
            let rendered = template
                .render(model_context(name, schema))
                .with_context(|| format!("failed to render model {name}"))?;
            let path = options.models_dir.join(format!("{}.rs", snake_case(name)));
            write_new(&path, &rendered, &mut report)?;
        }
    }

    let handlers = handler_contexts(doc);
    if !handlers.is_empty() {
        fs::create_dir_all(&options.handlers_dir)
            .with_context(|| format!("failed to create {}", options.handlers_dir.display()))?;
        let template = env.get_template("handler.rs")?;
        for (stem, ctx) in handlers {
            let rendered = template
                .render(&ctx)
                .with_context(|| format!("failed to render handlers for {}", ctx.path))?;
            let path = options.handlers_dir.join(format!("{stem}.rs"));
            write_new(&path, &rendered, &mut report)?;
        }
    }

    Ok(report)
}
