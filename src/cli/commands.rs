use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::builder::resolve_path;
use crate::echo::echo_handler;
use crate::logging::{init_logging, LogConfig};
use crate::mount::{MountConfig, Swaggerize, SwaggerizeOptions};
use crate::runtime_config::RuntimeConfig;
use crate::scaffold::{scaffold, ScaffoldOptions};
use crate::server::{App, AppService, HttpServer};
use crate::spec::{load_document, parse_document, ApiDocument, RouteSummary};

/// Command-line interface for swaggerize
#[derive(Debug, Parser)]
#[command(name = "swaggerize")]
#[command(about = "Serve, inspect and scaffold Swagger 2.0 APIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoutesFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mount an API document and serve it, echoing requests back
    Serve {
        /// Swagger 2.0 document (YAML or JSON)
        #[arg(short, long, required_unless_present = "config")]
        api: Option<PathBuf>,

        /// Mount options file (YAML); `--api` overrides its `api`
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides SWAGGERIZE_ADDR
        #[arg(long)]
        addr: Option<String>,

        /// Mount path; `/` uses the document's basePath
        #[arg(long, default_value = "/")]
        mountpath: String,

        #[arg(long)]
        docspath: Option<String>,

        #[arg(long)]
        errorname: Option<String>,
    },
    /// List the routes an API document produces
    Routes {
        #[arg(short, long)]
        api: PathBuf,

        #[arg(long, value_enum, default_value_t = RoutesFormat::Text)]
        format: RoutesFormat,
    },
    /// Generate handler and model stubs; existing files are kept
    Scaffold {
        #[arg(short, long)]
        api: PathBuf,

        /// Directory receiving `handlers/` and `models/`
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[arg(long)]
        handlers_dir: Option<PathBuf>,

        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Custom minijinja template for handler files
        #[arg(long)]
        handler_template: Option<PathBuf>,

        /// Custom minijinja template for model files
        #[arg(long)]
        model_template: Option<PathBuf>,
    },
}

pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let _guard = init_logging(&LogConfig::from_env())?;
    match cli.command {
        Commands::Serve {
            api,
            config,
            addr,
            mountpath,
            docspath,
            errorname,
        } => {
            let mut options = match config {
                Some(path) => SwaggerizeOptions::from_config(MountConfig::from_file(&path)?),
                None => SwaggerizeOptions::default(),
            };
            if let Some(api) = api {
                options.config.api = Some(api.into());
            }
            if let Some(docspath) = docspath {
                options.docspath(&docspath);
            }
            if let Some(errorname) = errorname {
                options.errorname(&errorname);
            }
            options.fallback_handler(echo_handler());
            serve(options, addr.as_deref(), &mountpath)
        }
        Commands::Routes { api, format } => {
            let (document, summaries) = summarize(&api)?;
            print_routes(&document, &summaries, format)
        }
        Commands::Scaffold {
            api,
            output,
            handlers_dir,
            models_dir,
            handler_template,
            model_template,
        } => {
            let document = parse_document(&load_document(&api)?)?;
            let mut options = ScaffoldOptions::new(&output);
            if let Some(dir) = handlers_dir {
                options.handlers_dir = dir;
            }
            if let Some(dir) = models_dir {
                options.models_dir = dir;
            }
            options.handler_template = handler_template;
            options.model_template = model_template;
            let report = scaffold(&document, &options)?;
            println!(
                "{} file(s) written, {} existing file(s) kept",
                report.written.len(),
                report.skipped.len()
            );
            Ok(())
        }
    }
}

fn serve(options: SwaggerizeOptions, addr: Option<&str>, mountpath: &str) -> anyhow::Result<()> {
    let mut runtime = RuntimeConfig::from_env();
    if let Some(addr) = addr {
        runtime.addr = addr.to_string();
    }
    runtime.apply();

    let swaggerize = Swaggerize::new(options)?;
    let mut app = App::new();
    let mounted = swaggerize.mount(&mut app, mountpath)?;
    app.router().dump_routes();
    info!(
        addr = %runtime.addr,
        stack_size = runtime.stack_size,
        docs = %format!("{}{}", mounted.base_path, mounted.docs_path),
        "Starting server"
    );

    let handle = HttpServer(AppService::new(Arc::new(app)))
        .start(runtime.addr.as_str())
        .with_context(|| format!("failed to bind {}", runtime.addr))?;
    handle
        .join()
        .map_err(|e| anyhow!("server coroutine panicked: {e:?}"))
}

/// Mount a document on a scratch app with every operation bound to the echo
/// handler, and list the routes it produced.
pub fn summarize(api: &Path) -> anyhow::Result<(ApiDocument, Vec<RouteSummary>)> {
    let mut options = SwaggerizeOptions::new(api.to_path_buf());
    options.fallback_handler(echo_handler());
    let mut app = App::new();
    let mounted = Swaggerize::new(options)?.mount(&mut app, "/")?;
    Ok((mounted.document.clone(), mounted.summaries()))
}

fn print_routes(
    document: &ApiDocument,
    summaries: &[RouteSummary],
    format: RoutesFormat,
) -> anyhow::Result<()> {
    match format {
        RoutesFormat::Json => println!("{}", serde_json::to_string_pretty(summaries)?),
        RoutesFormat::Text => {
            let base = document.base_path.as_deref().unwrap_or("");
            for route in summaries {
                println!(
                    "{:<7} {:<40} {}",
                    route.method,
                    resolve_path(base, &route.path),
                    route.operation_id.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}
