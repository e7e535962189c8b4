//! # twilightd: sunset lighting daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse the command line and the daemon configuration (file + env vars)
//! - Load and validate the lighting document; a bad document stops startup
//! - Initialize the `SQLite` firing ledger and run migrations
//! - Pick the lighting client: the LIFX API, or the virtual one for dry runs
//! - Construct application services and the sunset watcher
//! - Build the axum router and serve
//! - Reload the lighting document on `SIGHUP`
//! - On `SIGINT`/`SIGTERM` stop the watcher, cancel every run and drain
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod config;
mod wizard;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use twilight_adapter_config_json::JsonConfigStore;
use twilight_adapter_http_axum::state::AppState;
use twilight_adapter_lifx_reqwest::LifxClient;
use twilight_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteFiringLedger};
use twilight_adapter_sun::SunriseProvider;
use twilight_adapter_virtual::VirtualLightingClient;
use twilight_app::cancel::{CancelToken, cancel_pair};
use twilight_app::player::TransitionPlayer;
use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};
use twilight_app::run_table::RunTable;
use twilight_app::services::{ActionService, ConfigService, DuskService};
use twilight_app::sunset_watcher::SunsetWatcher;
use twilight_domain::config::LightingConfig;
use twilight_domain::gate::TriggerGate;

use crate::config::Config;
use crate::wizard::Wizard;

/// How long active runs get to acknowledge cancellation on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "twilightd")]
#[command(about = "Fades LIFX lights into the evening around local sunset")]
#[command(version)]
struct Cli {
    /// Daemon configuration file.
    #[arg(short, long, default_value = "twilight.toml")]
    config: PathBuf,

    /// Record commands in memory instead of calling the LIFX API.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server and the sunset watcher (default).
    Serve,
    /// Create the lighting document interactively.
    Init,
    /// Append a device to the lighting document interactively.
    AddDevice,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    config.lighting.dry_run |= cli.dry_run;
    init_tracing(&config.logging.filter);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Init => init(&config).await,
        Command::AddDevice => add_device(&config).await,
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let document = &config.lighting.config_path;
    let lighting = ConfigService::load(JsonConfigStore::new(document))
        .await
        .with_context(|| format!("cannot load lighting document {}", document.display()))?;
    let lighting = Arc::new(lighting);

    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("cannot open the firing ledger")?;
    let ledger = Arc::new(SqliteFiringLedger::new(db.pool().clone()));
    let sun = Arc::new(SunriseProvider);

    if config.lighting.dry_run {
        tracing::warn!("dry run, commands are recorded in memory and no light will change");
        let client = Arc::new(VirtualLightingClient::new(lighting.snapshot().default_color));
        run(&config, client, sun, ledger, lighting).await
    } else {
        let client = LifxClient::new(&config.lighting.base_url, config.lighting.request_timeout())
            .context("cannot build the LIFX client")?;
        run(&config, Arc::new(client), sun, ledger, lighting).await
    }
}

async fn run<C, S, L, CS>(
    config: &Config,
    client: Arc<C>,
    sun: Arc<S>,
    ledger: Arc<L>,
    lighting: Arc<ConfigService<CS>>,
) -> anyhow::Result<()>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    let player = TransitionPlayer::new(Arc::clone(&client), config.scheduler.player_options());
    let dusk = DuskService::new(
        player,
        sun,
        ledger,
        RunTable::new(),
        TriggerGate::new(config.scheduler.window()),
    );
    let (stop, stopped) = cancel_pair();

    let watcher = config.scheduler.enabled.then(|| {
        let watcher = SunsetWatcher::new(
            dusk.clone(),
            lighting.subscribe(),
            config.scheduler.poll_interval(),
            config.scheduler.strategy,
        );
        tokio::spawn(watcher.run(stopped.clone()))
    });
    let reloader = tokio::spawn(reload_on_hangup(
        Arc::clone(&lighting),
        dusk.clone(),
        stopped,
    ));

    let state = AppState::new(ActionService::new(client, dusk.clone()), lighting);
    let app = twilight_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {bind_addr}"))?;
    tracing::info!(
        addr = %bind_addr,
        dry_run = config.lighting.dry_run,
        watcher = config.scheduler.enabled,
        "twilightd listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    stop.cancel();
    if let Some(watcher) = watcher {
        if let Err(err) = watcher.await {
            tracing::warn!(error = %err, "sunset watcher ended abnormally");
        }
    }
    if let Err(err) = reloader.await {
        tracing::warn!(error = %err, "reload listener ended abnormally");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, dusk.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("some runs did not stop in time");
    }
    Ok(())
}

#[cfg(unix)]
async fn reload_on_hangup<C, S, L, CS>(
    lighting: Arc<ConfigService<CS>>,
    dusk: DuskService<C, S, L>,
    mut stopped: CancelToken,
) where
    C: LightingClient + 'static,
    S: SunEventProvider,
    L: FiringLedger,
    CS: ConfigStore,
{
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(err) => {
            tracing::warn!(error = %err, "cannot listen for SIGHUP, reload via HTTP only");
            return;
        }
    };
    loop {
        tokio::select! {
            received = hangup.recv() => {
                if received.is_none() {
                    break;
                }
                // A failed reload keeps the previous snapshot and is
                // already logged by the service.
                if let Ok(report) = lighting.reload().await {
                    dusk.apply_reload(&report);
                }
            }
            () = stopped.cancelled() => break,
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup<C, S, L, CS>(
    _lighting: Arc<ConfigService<CS>>,
    _dusk: DuskService<C, S, L>,
    mut stopped: CancelToken,
) {
    stopped.cancelled().await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn init(config: &Config) -> anyhow::Result<()> {
    let store = JsonConfigStore::new(&config.lighting.config_path);
    if store.path().exists() {
        bail!(
            "{} already exists, use `twilightd add-device` to extend it",
            store.path().display()
        );
    }

    let document = {
        let stdin = io::stdin();
        Wizard::new(stdin.lock(), io::stdout()).new_config()?
    };
    document.validate()?;
    store.save(&document).await?;
    println!("wrote {}", store.path().display());
    Ok(())
}

async fn add_device(config: &Config) -> anyhow::Result<()> {
    let path = &config.lighting.config_path;
    let lighting = ConfigService::load(JsonConfigStore::new(path))
        .await
        .context("no valid lighting document yet, run `twilightd init` first")?;

    let device = {
        let stdin = io::stdin();
        Wizard::new(stdin.lock(), io::stdout()).new_device()?
    };
    let mut document = LightingConfig::clone(&lighting.snapshot());
    document.devices.push(device);
    for warning in document.warnings() {
        println!("warning: {warning}");
    }
    lighting.save(document).await?;
    println!("wrote {}", path.display());
    Ok(())
}
