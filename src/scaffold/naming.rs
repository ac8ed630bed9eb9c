//! Identifier and file name derivation for generated code.

use http::Method;
use serde_json::Value;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield",
];

/// `listPets`, `list-pets` and `ListPets` all become `list_pets`.
pub fn snake_case(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                if prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_lower)
                {
                    out.push('_');
                }
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_').to_string();
    match trimmed.chars().next() {
        None => "unnamed".to_string(),
        Some(first) if first.is_ascii_digit() => format!("n_{trimmed}"),
        Some(_) => trimmed,
    }
}

/// `pet_owner` and `pet-owner` become `PetOwner`.
pub fn pascal_case(raw: &str) -> String {
    snake_case(raw)
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Field name for a property, plus the serde rename when it differs.
pub fn field_name(property: &str) -> (String, Option<String>) {
    let mut field = snake_case(property);
    if KEYWORDS.contains(&field.as_str()) {
        field.push('_');
    }
    let rename = (field != property).then(|| property.to_string());
    (field, rename)
}

fn template_param(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

/// Handler file stem for a path: parameter segments dropped, the rest joined
/// with `_`. `/pets` and `/pets/{id}` both give `pets`; `/` gives `root`.
pub fn handler_file_stem(path: &str) -> String {
    let parts: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty() && template_param(s).is_none())
        .map(snake_case)
        .collect();
    if parts.is_empty() {
        "root".to_string()
    } else {
        parts.join("_")
    }
}

/// The path with parameter segments removed, for display.
pub fn normalized_path(path: &str) -> String {
    let kept: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && template_param(s).is_none())
        .collect();
    format!("/{}", kept.join("/"))
}

/// `operationId` in snake case, else `<method>_<segments>` with
/// `by_<param>` for parameter segments.
pub fn function_name(method: &Method, path: &str, operation_id: Option<&str>) -> String {
    if let Some(id) = operation_id.filter(|id| !id.trim().is_empty()) {
        return snake_case(id);
    }
    let mut parts = vec![method.as_str().to_ascii_lowercase()];
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match template_param(segment) {
            Some(param) => parts.push(format!("by_{}", snake_case(param))),
            None => parts.push(snake_case(segment)),
        }
    }
    if parts.len() == 1 {
        parts.push("root".to_string());
    }
    parts.join("_")
}

/// Rust type for a JSON schema fragment.
pub fn rust_type(schema: &Value) -> String {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        let name = reference.rsplit('/').next().unwrap_or(reference);
        return pascal_case(name);
    }
    let format = schema.get("format").and_then(Value::as_str);
    match schema.get("type").and_then(Value::as_str) {
        Some("string") => "String".to_string(),
        Some("integer") => match format {
            Some("int32") => "i32".to_string(),
            _ => "i64".to_string(),
        },
        Some("number") => match format {
            Some("float") => "f32".to_string(),
            _ => "f64".to_string(),
        },
        Some("boolean") => "bool".to_string(),
        Some("array") => {
            let item = schema.get("items").map_or_else(|| "serde_json::Value".to_string(), rust_type);
            format!("Vec<{item}>")
        }
        _ => "serde_json::Value".to_string(),
    }
}
