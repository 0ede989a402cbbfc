//! Service entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!     environment ──▶ config::load ──▶ Config
//!                                        │
//!                                        ▼
//!                           ┌──────────────────────────┐
//!      SIGINT/SIGHUP/ ─────▶│  lifecycle::Coordinator  │
//!      SIGQUIT/SIGTERM      │  (single control queue)  │◀──── listener failure
//!                           └──────┬────────────┬──────┘
//!                                  │            │
//!                                  ▼            ▼
//!                           ┌───────────┐ ┌───────────┐
//!                           │ net: HTTP │ │net: HTTPS │
//!                           │ listener  │ │ listener  │
//!                           └─────┬─────┘ └─────┬─────┘
//!                                 └──────┬──────┘
//!                                        ▼
//!                       net::idle (connection idle limit)
//!                                        ▼
//!                        http: request log → panic guard →
//!                        write timeout → handler timeout → routes
//! ```
//!
//! Exit codes follow `sysexits(3)`: 0 after an OS-requested shutdown, 64 for
//! usage errors, 70 when a listener failed, 78 for configuration errors.

use std::process::ExitCode;

use clap::Parser;
use tracing::Instrument;

use service_template::config::{loader, EnvSource, ProcessEnv};
use service_template::error::sysexits;
use service_template::observability::logging;
use service_template::{Config, Coordinator, ServiceError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "service-template")]
#[command(about = "Serve a static page over HTTP and HTTPS", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(sysexits::USAGE);
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    if cli.version {
        println!("{VERSION}");
        return ExitCode::SUCCESS;
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_startup_error() => {
            eprintln!("{e}");
            e.into()
        }
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            e.into()
        }
    }
}

fn run() -> Result<(), ServiceError> {
    let env = ProcessEnv;
    let level = logging::parse_level(env.var("LOG_LEVEL").as_deref())?;
    let environment = loader::load_environment(&env)?;

    let dispatch = logging::build(level, environment, std::io::stdout);
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| ServiceError::Software(format!("cannot install logger: {e}")))?;

    let config = Config::from_env()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ServiceError::Software(format!("cannot start runtime: {e}")))?;

    runtime.block_on(async {
        let span = logging::service_span(&config.service, VERSION);
        async {
            match serde_json::to_string(&config) {
                Ok(json) => tracing::debug!(config = %json, "configuration loaded"),
                Err(e) => tracing::warn!(error = %e, "cannot serialize configuration"),
            }
            Coordinator::new(config).run().await
        }
        .instrument(span)
        .await
    })
}
