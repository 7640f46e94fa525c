//! `clinic-session` command line entry point.
//!
//! Every invocation is a fresh process: it opens the file-backed session
//! storage, restores whatever session a previous run left behind, runs one
//! command, and prints the result as JSON on stdout. Logs go to stderr.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use clinic_session::domain::ports::{
    PrincipalDirectory, SessionCommand, SessionQuery, SharedSecretVerifier, TokioLatency,
};
use clinic_session::domain::{ProfileUpdate, SessionStore};
use clinic_session::outbound::directory::InMemoryPrincipalDirectory;
use clinic_session::outbound::storage::FileSessionStorage;
use clinic_session::settings::SessionSettings;
use color_eyre::eyre::{Context, Report, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::runtime::Builder;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

type FileStore = SessionStore<FileSessionStorage, InMemoryPrincipalDirectory, SharedSecretVerifier>;

/// `clinic-session` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clinic-session",
    about = "Log in, inspect, and edit the locally persisted clinic session",
    version
)]
struct CliArgs {
    /// Directory holding the persisted session. Overrides
    /// `CLINIC_SESSION_STATE_DIR`.
    #[arg(long = "state-dir", value_name = "path")]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Authenticate with an email and password.
    Login { email: String, password: String },
    /// End the current session.
    Logout,
    /// Report whether the persisted token is still valid.
    Status,
    /// Show the last known and the verified principal.
    Whoami,
    /// Shallow-merge a JSON object onto the current principal.
    Update {
        /// JSON object whose top-level keys replace the profile's.
        #[arg(value_name = "json")]
        patch: String,
    },
    /// List every known principal.
    Principals,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let settings = SessionSettings::load_from_iter([OsString::from("clinic-session")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let (store, directory) = build_store(&settings, args.state_dir)?;

    let restored = store.restore().await;
    debug!(restored, "startup restore finished");

    match args.command {
        Command::Login { email, password } => {
            let outcome = store.login(&email, &password).await.map_err(Report::new)?;
            print_json(&outcome)
        }
        Command::Logout => {
            store.logout().await;
            print_json(&json!({ "isAuthenticated": false }))
        }
        Command::Status => print_json(&json!({
            "isAuthenticated": store.is_authenticated(),
            "session": store.snapshot(),
        })),
        Command::Whoami => print_json(&json!({
            "currentPrincipal": store.current_principal(),
            "verifiedPrincipal": store.verified_principal(),
        })),
        Command::Update { patch } => {
            let fields: Map<String, Value> =
                serde_json::from_str(&patch).wrap_err("update must be a JSON object")?;
            let principal = store
                .update_profile(ProfileUpdate::from(fields))
                .await
                .map_err(Report::new)?;
            print_json(&principal)
        }
        Command::Principals => {
            let principals = directory
                .list()
                .await
                .wrap_err("failed to list principals")?;
            print_json(&principals)
        }
    }
}

fn build_store(
    settings: &SessionSettings,
    state_dir: Option<PathBuf>,
) -> Result<(FileStore, Arc<InMemoryPrincipalDirectory>)> {
    let state_dir = utf8(state_dir.unwrap_or_else(|| settings.state_dir()))?;
    let storage = FileSessionStorage::open(&state_dir)
        .wrap_err_with(|| format!("failed to open session storage at {state_dir}"))?;

    let directory = match &settings.directory_path {
        Some(path) => InMemoryPrincipalDirectory::load(&utf8(path.clone())?),
        None => InMemoryPrincipalDirectory::bundled(),
    }
    .wrap_err("failed to load principal directory")?;
    let directory = Arc::new(directory);

    let verifier = SharedSecretVerifier::new(settings.shared_secret().as_str());
    let store = SessionStore::new(
        Arc::new(storage),
        Arc::clone(&directory),
        Arc::new(verifier),
        Arc::new(DefaultClock),
    )
    .with_policy(settings.policy()?)
    .with_latency(Arc::new(TokioLatency));
    Ok((store, directory))
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| eyre!("path {} is not valid UTF-8", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
