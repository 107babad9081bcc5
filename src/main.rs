use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::validator::Validation;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use spaceport::auth::TokenGenerator;
use spaceport::config::ServerConfig;
use spaceport::scan::{GeminiClient, ReqwestTransport};
use spaceport::server::validation::validate_username;
use spaceport::server::{AppState, create_router};
use spaceport::store::{SqliteStore, Store};
use spaceport::types::Identity;

const NOT_INITIALIZED: &str =
    "Server not initialized. Run 'spaceport admin init' first to create the database and admin token.";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "spaceport")]
#[command(about = "Spaces and codebases service with CVE scan enrollment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file. Flags below override its values.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and admin token
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Base URL of the Gemini scanning service. Scanning is off without it.
        #[arg(long)]
        gemini_url: Option<String>,

        /// Seconds to wait for a scan before giving up
        #[arg(long)]
        scan_timeout_secs: Option<u64>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and admin token)
    Init {
        /// Data directory for the database and admin token
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(data_dir: PathBuf, non_interactive: bool) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir,
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.admin_token_path();

    if store.has_admin_token()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let generator = TokenGenerator::new();
    let (token, raw_token) = generator.issue(true, None, None)?;

    store.create_token(&token)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        create_identity_prompt(&store, &generator)?;
    }

    Ok(())
}

fn create_identity_prompt(store: &SqliteStore, generator: &TokenGenerator) -> anyhow::Result<()> {
    let create = inquire::Confirm::new("Would you like to create a first identity?")
        .with_default(false)
        .prompt()?;

    if !create {
        return Ok(());
    }

    let username = inquire::Text::new("Username:")
        .with_validator(|input: &str| {
            Ok(match validate_username(input) {
                Ok(()) => Validation::Valid,
                Err(e) => Validation::Invalid(e.message.into()),
            })
        })
        .prompt()?;

    let now = Utc::now();
    let identity = Identity {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        created_at: now,
        updated_at: now,
    };
    store.create_identity(&identity)?;

    let (token, raw_token) = generator.issue(false, Some(identity.id), None)?;
    store.create_token(&token)?;

    println!();
    println!("========================================");
    println!("Created identity '{username}' with token:");
    println!();
    println!("  {raw_token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

struct ServeOverrides {
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    gemini_url: Option<String>,
    scan_timeout_secs: Option<u64>,
}

fn load_config(path: Option<&Path>, overrides: ServeOverrides) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    if let Some(host) = overrides.host {
        config.host = host;
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(data_dir) = overrides.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(url) = overrides.gemini_url {
        config.scan.gemini_url = Some(url);
    }
    if let Some(secs) = overrides.scan_timeout_secs {
        config.scan.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    let token_file = config.admin_token_path();
    if !token_file.exists() {
        bail!(NOT_INITIALIZED);
    }

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    if !store.has_admin_token()? {
        bail!(NOT_INITIALIZED);
    }

    info!("Admin token available at {}", token_file.display());

    let mut state = AppState::new(Arc::new(store));

    match config.scan.gemini_url.as_deref() {
        Some(url) if config.scan.enabled() => {
            let transport = ReqwestTransport::new(config.scan.timeout())?;
            let client =
                GeminiClient::new(url, Arc::new(transport)).with_timeout(config.scan.timeout());
            info!("CVE scan enrollment via {}", client.scan_url());
            state = state.with_scanner(Arc::new(client));
        }
        _ => info!("CVE scan enrollment disabled"),
    }

    let app = create_router(Arc::new(state));
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spaceport=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            gemini_url,
            scan_timeout_secs,
        } => {
            let config = load_config(
                config.as_deref(),
                ServeOverrides {
                    host,
                    port,
                    data_dir,
                    gemini_url,
                    scan_timeout_secs,
                },
            )?;
            run_serve(config).await?;
        }
    }

    Ok(())
}
