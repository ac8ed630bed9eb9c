//! Where a parameter's value lives on a request.
//!
//! An [`Accessor`] is a get/set pair chosen from the parameter's `in` field.
//! Validators read the raw value through it and write the coerced value back.

use serde_json::Value;

use crate::server::Request;
use crate::spec::{Parameter, ParameterLocation};

/// Get/set pair for one parameter.
#[derive(Debug, Clone)]
pub struct Accessor {
    name: String,
    location: ParameterLocation,
    file: bool,
}

impl Accessor {
    pub fn for_location(name: &str, location: ParameterLocation, file: bool) -> Self {
        Self {
            name: name.to_string(),
            location,
            file,
        }
    }

    pub fn for_parameter(param: &Parameter) -> Self {
        Self::for_location(&param.name, param.location, param.is_file())
    }

    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Raw value as the request carries it, `None` when absent.
    pub fn get(&self, req: &Request) -> Option<Value> {
        match self.location {
            ParameterLocation::Path => req.params.get(&self.name).cloned(),
            ParameterLocation::Query => req.query.get(&self.name).cloned(),
            ParameterLocation::Header => req
                .header(&self.name)
                .map(|v| Value::String(v.to_string())),
            ParameterLocation::Body => req.body.clone(),
            ParameterLocation::FormData if self.file => {
                let file = req.files.iter().find(|f| f.field == self.name)?;
                if let Some(buffer) = &file.buffer {
                    Some(Value::String(binary_string(buffer)))
                } else {
                    file.path
                        .as_ref()
                        .map(|p| Value::String(p.display().to_string()))
                }
            }
            ParameterLocation::FormData => req.form.get(&self.name).cloned(),
        }
    }

    /// Write a coerced value back. Headers and uploaded files are left alone.
    pub fn set(&self, req: &mut Request, value: Value) {
        match self.location {
            ParameterLocation::Path => {
                req.params.insert(self.name.clone(), value);
            }
            ParameterLocation::Query => {
                req.query.insert(self.name.clone(), value);
            }
            ParameterLocation::Header => {}
            ParameterLocation::Body => req.body = Some(value),
            ParameterLocation::FormData if self.file => {}
            ParameterLocation::FormData => {
                if let Some(Value::Object(fields)) = req.body.as_mut() {
                    fields.insert(self.name.clone(), value.clone());
                }
                req.form.insert(self.name.clone(), value);
            }
        }
    }
}

/// One char per byte (latin-1), so arbitrary binary survives as a string.
fn binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
