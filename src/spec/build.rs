use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{ApiDocument, Operation, Parameter, ParameterOrRef, RouteMeta, SecurityRequirement};
use crate::error::ConfigError;
use crate::handlers::HandlerRegistry;
use crate::security::{Authorizers, SecurityEntry};
use crate::validator::make_validator;

/// Resolve a parameter, following `#/parameters/<name>` references.
pub fn resolve_parameter(doc: &ApiDocument, param: &ParameterOrRef) -> Result<Parameter, ConfigError> {
    match param {
        ParameterOrRef::Parameter(p) => Ok(p.clone()),
        ParameterOrRef::Ref { reference } => reference
            .strip_prefix("#/parameters/")
            .and_then(|name| doc.parameters.get(name))
            .cloned()
            .ok_or_else(|| ConfigError::UnresolvedRef(reference.clone())),
    }
}

/// Path-level parameters overridden by operation parameters with the same
/// name and location.
fn merge_parameters(
    doc: &ApiDocument,
    path_params: &[ParameterOrRef],
    op_params: &[ParameterOrRef],
) -> Result<Vec<Parameter>, ConfigError> {
    let mut merged: Vec<Parameter> = Vec::new();
    for raw in path_params.iter().chain(op_params) {
        let param = resolve_parameter(doc, raw)?;
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

/// Flatten requirement objects into ordered alternatives.
///
/// Returns `None` when the operation is open: no requirements at all, or an
/// explicit empty list.
fn security_entries(
    doc: &ApiDocument,
    requirements: &[SecurityRequirement],
    authorizers: &Authorizers,
) -> Option<Vec<SecurityEntry>> {
    let entries: Vec<SecurityEntry> = requirements
        .iter()
        .flat_map(|req| req.iter())
        .map(|(scheme, scopes)| {
            let definition = doc.security_definitions.get(scheme).cloned();
            let key = definition
                .as_ref()
                .and_then(|d| d.x_authorize.clone())
                .unwrap_or_else(|| scheme.clone());
            SecurityEntry {
                scheme: scheme.clone(),
                scopes: scopes.clone(),
                authorizer: authorizers.get(&key).cloned(),
                definition,
            }
        })
        .collect();
    (!entries.is_empty()).then_some(entries)
}

fn operation_fragment(raw: &Value, path: &str, method: &http::Method) -> Value {
    raw.get("paths")
        .and_then(|p| p.get(path))
        .and_then(|item| item.get(method.as_str().to_ascii_lowercase()))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Derive one route per operation that resolves to a handler.
///
/// Operations are visited in path order, then in the fixed Swagger method
/// order. `consumes`, `produces` and `security` fall back to the document
/// level values. Operations with no handler are skipped with a warning.
pub fn build_routes(
    doc: &ApiDocument,
    raw: &Value,
    handlers: &HandlerRegistry,
    authorizers: &Authorizers,
) -> Result<Vec<Arc<RouteMeta>>, ConfigError> {
    let mut routes = Vec::new();

    for (path, item) in &doc.paths {
        for (method, op) in item.operations() {
            let Operation {
                operation_id,
                x_handler,
                ..
            } = op;

            let Some(handler) =
                handlers.resolve(x_handler.as_deref(), operation_id.as_deref(), &method, path)
            else {
                warn!(
                    method = %method,
                    path = %path,
                    operation_id = ?operation_id,
                    "No handler for operation, skipping"
                );
                continue;
            };

            let parameters = merge_parameters(doc, &item.parameters, &op.parameters)?;
            let validators = parameters
                .into_iter()
                .map(|p| make_validator(p, &doc.definitions))
                .collect::<Result<Vec<_>, _>>()?;

            let requirements = op.security.as_deref().unwrap_or(&doc.security);

            let route = RouteMeta {
                method: method.clone(),
                path: path.clone(),
                operation_id: operation_id.clone(),
                handler,
                validators,
                consumes: op.consumes.clone().unwrap_or_else(|| doc.consumes.clone()),
                produces: op.produces.clone().unwrap_or_else(|| doc.produces.clone()),
                security: security_entries(doc, requirements, authorizers),
                operation: Arc::new(operation_fragment(raw, path, &method)),
            };
            debug!(
                method = %route.method,
                path = %route.path,
                validators = route.validators.len(),
                secured = route.security.is_some(),
                "Route derived"
            );
            routes.push(Arc::new(route));
        }
    }

    Ok(routes)
}
