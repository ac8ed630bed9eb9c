//! Mounting a Swagger document on an [`App`].
//!
//! ```ignore
//! let mut options = SwaggerizeOptions::new(PathBuf::from("api.yaml"));
//! options.handler("listPets", handler_fn(list_pets));
//! let api = Swaggerize::new(options)?;
//! let mut app = App::new();
//! api.mount(&mut app, "/")?;
//! ```

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::builder::{register_path_guards, register_routes};
use crate::error::{ConfigError, HttpError, DEFAULT_ERROR_NAME};
use crate::handlers::{HandlerRegistry, HandlerSpec};
use crate::security::{Authorizer, Authorizers};
use crate::server::{App, Request, Response};
use crate::spec::{build_routes, parse_document, ApiDocument, ApiSource, RouteMeta, RouteSummary};

pub const DEFAULT_DOCS_PATH: &str = "/api-docs";

/// Settings applied to the app on mount, before caller overrides.
pub fn hardening_settings() -> Vec<(&'static str, Value)> {
    vec![
        ("x-powered-by", Value::Bool(false)),
        ("trust proxy", Value::Bool(false)),
        ("jsonp callback name", Value::Null),
        ("json replacer", Value::Null),
        ("json spaces", Value::from(0)),
        ("case sensitive routing", Value::Bool(false)),
        ("strict routing", Value::Bool(false)),
        ("views", Value::Null),
        ("view cache", Value::Bool(false)),
        ("view engine", Value::Null),
    ]
}

/// The serialisable part of the mount options, e.g. read from YAML:
///
/// ```yaml
/// api: ./api.yaml
/// docspath: /docs
/// errorname: PetStoreError
/// express:
///   json spaces: 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    pub api: Option<ApiSource>,
    /// App setting overrides, applied after the hardening settings
    pub express: BTreeMap<String, Value>,
    /// Directory relative api paths resolve against; defaults to the cwd
    pub basedir: Option<PathBuf>,
    pub docspath: Option<String>,
    pub errorname: Option<String>,
}

impl MountConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<mount config>"),
            message: e.to_string(),
        })
    }

    /// Read a YAML config file. A relative `basedir` (or none) resolves
    /// against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&raw).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.basedir = Some(match config.basedir.take() {
            Some(base) if base.is_absolute() => base,
            Some(base) => dir.join(base),
            None => dir.to_path_buf(),
        });
        Ok(config)
    }
}

/// Everything needed to build a [`Swaggerize`].
#[derive(Clone, Default)]
pub struct SwaggerizeOptions {
    pub config: MountConfig,
    pub handlers: HandlerRegistry,
    pub authorizers: Authorizers,
}

impl SwaggerizeOptions {
    pub fn new(api: impl Into<ApiSource>) -> Self {
        Self::from_config(MountConfig {
            api: Some(api.into()),
            ..MountConfig::default()
        })
    }

    pub fn from_config(config: MountConfig) -> Self {
        Self {
            config,
            handlers: HandlerRegistry::new(),
            authorizers: Authorizers::new(),
        }
    }

    pub fn express(&mut self, name: &str, value: Value) -> &mut Self {
        self.config.express.insert(name.to_string(), value);
        self
    }

    pub fn basedir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.config.basedir = Some(dir.into());
        self
    }

    pub fn docspath(&mut self, path: &str) -> &mut Self {
        self.config.docspath = Some(path.to_string());
        self
    }

    pub fn errorname(&mut self, name: &str) -> &mut Self {
        self.config.errorname = Some(name.to_string());
        self
    }

    /// Handler looked up by `x-handler` or `operationId`.
    pub fn handler(&mut self, name: &str, spec: impl Into<HandlerSpec>) -> &mut Self {
        self.handlers.named(name, spec);
        self
    }

    /// Handler for a method and document path such as `/pets/{id}`.
    pub fn operation(&mut self, method: Method, path: &str, spec: impl Into<HandlerSpec>) -> &mut Self {
        self.handlers.operation(method, path, spec);
        self
    }

    pub fn fallback_handler(&mut self, spec: impl Into<HandlerSpec>) -> &mut Self {
        self.handlers.fallback(spec);
        self
    }

    pub fn authorizer(&mut self, name: &str, authorizer: impl Authorizer + 'static) -> &mut Self {
        self.authorizers.insert(name.to_string(), Arc::new(authorizer));
        self
    }
}

/// The API as exposed on a mounted app.
#[derive(Debug)]
pub struct MountedApi {
    /// The raw document, served at the docs path
    pub api: Arc<Value>,
    pub document: ApiDocument,
    pub routes: Vec<Arc<RouteMeta>>,
    /// Effective base path, without trailing slash (`""` for root)
    pub base_path: String,
    pub docs_path: String,
    pub error_name: String,
}

impl MountedApi {
    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(|r| RouteSummary::from(r.as_ref())).collect()
    }
}

/// A validated, loaded API ready to mount.
#[derive(Debug)]
pub struct Swaggerize {
    api: Arc<Value>,
    document: ApiDocument,
    routes: Vec<Arc<RouteMeta>>,
    express: BTreeMap<String, Value>,
    docs_path: String,
    error_name: String,
}

fn normalize_docs_path(raw: Option<&str>) -> Result<String, ConfigError> {
    let raw = raw.map(str::trim).unwrap_or(DEFAULT_DOCS_PATH);
    if raw.is_empty() || raw == "/" {
        return Err(ConfigError::InvalidOption {
            option: "docspath",
            message: "must name a path below the base path".to_string(),
        });
    }
    Ok(if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    })
}

impl Swaggerize {
    /// Validate options, load the document and derive its routes.
    pub fn new(options: SwaggerizeOptions) -> Result<Self, ConfigError> {
        let SwaggerizeOptions {
            config,
            handlers,
            authorizers,
        } = options;

        let source = config.api.ok_or(ConfigError::MissingApi)?;
        let basedir = match config.basedir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|source| ConfigError::Read {
                path: PathBuf::from("."),
                source,
            })?,
        };
        let docs_path = normalize_docs_path(config.docspath.as_deref())?;
        let error_name = match config.errorname {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::InvalidOption {
                    option: "errorname",
                    message: "must not be empty".to_string(),
                })
            }
            Some(name) => name,
            None => DEFAULT_ERROR_NAME.to_string(),
        };

        let raw = source.resolve(&basedir)?;
        let document = parse_document(&raw)?;
        let routes = build_routes(&document, &raw, &handlers, &authorizers)?;

        info!(
            title = %document.info.title,
            version = %document.info.version,
            routes = routes.len(),
            "Swagger document loaded"
        );

        Ok(Self {
            api: Arc::new(raw),
            document,
            routes,
            express: config.express,
            docs_path,
            error_name,
        })
    }

    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    pub fn routes(&self) -> &[Arc<RouteMeta>] {
        &self.routes
    }

    pub fn error_name(&self) -> &str {
        &self.error_name
    }

    /// Base path used when mounting at `mountpath`: the mount path unless it
    /// is the root, else the document's `basePath`.
    pub fn effective_base_path(&self, mountpath: &str) -> String {
        let chosen = if mountpath.is_empty() || mountpath == "/" {
            self.document.base_path.as_deref().unwrap_or("/")
        } else {
            mountpath
        };
        let trimmed = chosen.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Register the API on `app` under `mountpath`.
    pub fn mount(&self, app: &mut App, mountpath: &str) -> Result<Arc<MountedApi>, ConfigError> {
        if !mountpath.is_empty() && !mountpath.starts_with('/') {
            return Err(ConfigError::InvalidOption {
                option: "mountpath",
                message: format!("{mountpath:?} must start with '/'"),
            });
        }

        app.remove_fallback();

        let base_path = self.effective_base_path(mountpath);

        for (name, value) in hardening_settings() {
            app.set(name, value);
        }
        for (name, value) in &self.express {
            app.set(name, value.clone());
        }

        let mounted = Arc::new(MountedApi {
            api: Arc::clone(&self.api),
            document: self.document.clone(),
            routes: self.routes.clone(),
            base_path: base_path.clone(),
            docs_path: self.docs_path.clone(),
            error_name: self.error_name.clone(),
        });
        app.set_swagger(Arc::clone(&mounted));

        let docs_route = format!("{base_path}{}", self.docs_path);
        let api = Arc::clone(&self.api);
        app.router_mut().get(
            &docs_route,
            Arc::new(move |_req: &mut Request| -> Result<Response, HttpError> {
                Ok(Response::ok_json(api.as_ref().clone()))
            }),
        );

        let router = app.router_mut();
        let routes = register_routes(router, &self.routes, &base_path, &self.error_name);
        let guards = register_path_guards(router, &self.routes, &base_path, &self.error_name);

        let shown_base = if base_path.is_empty() { "/" } else { base_path.as_str() };
        info!(
            base_path = %shown_base,
            docs = %docs_route,
            routes,
            guards,
            "Swagger API mounted"
        );
        Ok(mounted)
    }
}
