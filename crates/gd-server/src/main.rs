use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gd_server::bootstrap::{self, RuntimeConfig};
use gd_server::classifier::ClassifierClient;
use gd_server::config::AppConfig;
use gd_server::handler::{self, AppState};
use gd_store::{GrievanceStore, SqliteGrievanceStore};

#[derive(Parser)]
#[command(name = "gd", about = "grievance-desk citizen grievance gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Validate configuration file and exit.
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Validate) => {
            run_validate(&cli.config);
        }
        None => {
            let runtime = run_validate(&cli.config);
            init_tracing(&runtime.log_level, &runtime.log_format);
            if let Err(e) = serve(runtime).await {
                eprintln!("Fatal: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn run_validate(path: &Path) -> RuntimeConfig {
    let config = match AppConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading config: {e}");
            std::process::exit(1);
        }
    };

    match bootstrap::into_runtime(config) {
        Ok(runtime) => {
            println!("Config valid: {}", path.display());
            runtime
        }
        Err(e) => {
            eprintln!("Config invalid: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_owned()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(runtime: RuntimeConfig) -> Result<(), anyhow::Error> {
    let store = SqliteGrievanceStore::new(&runtime.storage_path)?;
    store.init()?;

    let classifier = ClassifierClient::new(runtime.classifier)?;

    let state = Arc::new(AppState {
        registry: runtime.registry,
        directory: runtime.directory,
        classifier,
        store: Arc::new(store),
    });

    let app = handler::router(state);

    let listener = tokio::net::TcpListener::bind(&runtime.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "grievance gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
