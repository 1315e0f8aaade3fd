//! `prefstore` CLI — inspect and seed a preference namespace on disk.
//!
//! Values go to stdout unadorned so they can be piped, and `status` only
//! colours its output when stdout is a terminal. Diagnostics and errors go
//! to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod config;

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use prefstore_core::credentials::CredentialKey;
use prefstore_core::{CredentialStatus, KeyValueStoreManager, PreferencesKeyValueStore, StoreConfig};
use tracing_subscriber::EnvFilter;

use crate::config::{BackendConfig, StorageKind};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";

// ── CLI structure ────────────────────────────────────────────────────

/// prefstore — namespaced preference key-value store.
#[derive(Parser)]
#[command(name = "prefstore", version, about)]
struct Cli {
    /// Storage backend.
    #[arg(long, env = "PREFSTORE_STORAGE", value_enum, default_value = "redb")]
    storage: StorageKind,

    /// Database file (redb) or directory (rocksdb).
    /// Defaults to `./prefstore.redb` or `./prefstore-rocksdb`.
    #[arg(long, env = "PREFSTORE_STORAGE_PATH")]
    path: Option<PathBuf>,

    /// Preference namespace. Falls back to `PREFSTORE_NAMESPACE`, then to
    /// chip.platform.KeyValueStore.
    #[arg(long)]
    namespace: Option<String>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "PREFSTORE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key.
    Get { key: String },
    /// Store a value under a key, replacing any previous value.
    Set { key: String, value: String },
    /// Remove a key (no-op if absent).
    Delete { key: String },
    /// List every key in the namespace.
    List,
    /// Show which credential entries are stored.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{RED}{BOLD}error:{RESET} {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let backend = BackendConfig {
        kind: cli.storage,
        path: cli.path,
    }
    .open()?;
    let config = cli
        .namespace
        .map_or_else(StoreConfig::from_env, StoreConfig::with_namespace);
    let store = PreferencesKeyValueStore::open(backend, &config)
        .context("failed to open preference namespace")?;

    match cli.command {
        Commands::Get { key } => cmd_get(&store, &key).await,
        Commands::Set { key, value } => {
            store
                .set(&key, &value)
                .await
                .with_context(|| format!("failed to write '{key}'"))
        }
        Commands::Delete { key } => store
            .delete(&key)
            .await
            .with_context(|| format!("failed to delete '{key}'")),
        Commands::List => cmd_list(&store).await,
        Commands::Status => cmd_status(&store).await,
    }
}

async fn cmd_get(store: &PreferencesKeyValueStore, key: &str) -> Result<()> {
    let value = store
        .get(key)
        .await
        .with_context(|| format!("failed to read '{key}'"))?;
    match value {
        Some(v) => {
            println!("{v}");
            Ok(())
        }
        None => bail!("key '{key}' not found in namespace '{}'", store.namespace()),
    }
}

async fn cmd_list(store: &PreferencesKeyValueStore) -> Result<()> {
    for key in store.keys().await.context("failed to list keys")? {
        println!("{key}");
    }
    Ok(())
}

async fn cmd_status(store: &PreferencesKeyValueStore) -> Result<()> {
    let status = store
        .credential_status()
        .await
        .context("failed to read credential entries")?;
    let color = std::io::stdout().is_terminal();
    print!("{}", render_status(store.namespace(), &status, color));
    Ok(())
}

fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{style}{text}{RESET}")
    } else {
        text.to_owned()
    }
}

fn render_status(namespace: &str, status: &CredentialStatus, color: bool) -> String {
    let mut out = format!("{} {namespace}\n", paint("namespace", BOLD, color));
    for key in CredentialKey::ALL {
        let mark = if status.is_present(key) {
            paint("present", GREEN, color)
        } else {
            paint("missing", RED, color)
        };
        let _ = writeln!(
            out,
            "  {mark}  {} {}",
            key.label(),
            paint(&format!("({key})"), DIM, color)
        );
    }
    out
}
