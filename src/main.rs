//! stompscope CLI - interactive tester for STOMP-over-WebSocket endpoints.
//!
//! This is the main binary entry point. See the `stompscope` library for
//! the core functionality.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use stompscope::{tui, Config, ConnectionSettings, SessionManager, StompConnector};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Global flag for signal-triggered shutdown (as Arc for signal-hook compatibility)
static SHUTDOWN_FLAG: std::sync::LazyLock<Arc<AtomicBool>> =
    std::sync::LazyLock::new(|| Arc::new(AtomicBool::new(false)));

// CLI
#[derive(Parser)]
#[command(name = "stompscope")]
#[command(version)]
#[command(about = "Interactive tester for STOMP-over-WebSocket (and SockJS) endpoints")]
struct Cli {
    /// Server URL (http(s):// for SockJS, ws(s):// for raw WebSocket)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Auth token; enables the auth header
    #[arg(long, global = true)]
    token: Option<String>,

    /// Channel to subscribe to (repeatable); replaces configured channels
    #[arg(long = "channel", global = true)]
    channels: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive terminal UI (default)
    Tui,
    /// Connect and print every event as a JSON line until interrupted
    Watch {
        /// Header name carrying the token
        #[arg(long)]
        auth_header: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.url.clone_from(url);
        }
        if let Some(token) = &self.token {
            config.token.clone_from(token);
            config.use_auth = true;
        }
        if !self.channels.is_empty() {
            config.subscriptions.clone_from(&self.channels);
        }
        if let Some(Commands::Watch {
            auth_header: Some(header),
        }) = &self.command
        {
            config.auth_header.clone_from(header);
        }
    }
}

fn register_signals() -> Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::flag;
    flag::register(SIGINT, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGTERM, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGHUP, Arc::clone(&SHUTDOWN_FLAG))?;
    Ok(())
}

fn build_manager(config: &Config, runtime: &tokio::runtime::Runtime) -> SessionManager<StompConnector> {
    if config.use_auth && !config.has_token() {
        log::warn!("Auth enabled without a token; {} will be sent empty", config.auth_header);
    }
    SessionManager::new(
        StompConnector::new(runtime.handle().clone()),
        ConnectionSettings::from_config(config),
        config.subscriptions.iter().collect(),
    )
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("stompscope-io")
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")
}

/// Run the interactive tester.
fn run_tui(mut config: Config) -> Result<()> {
    register_signals()?;
    let runtime = build_runtime()?;
    let manager = build_manager(&config, &runtime);

    log::info!("stompscope v{} starting TUI", env!("CARGO_PKG_VERSION"));
    let mut manager = tui::run(manager, &SHUTDOWN_FLAG)?;
    manager.disconnect();

    if config.remember {
        let settings = manager.settings();
        config.url.clone_from(&settings.url);
        config.use_auth = settings.use_auth;
        config.subscriptions = manager.subscriptions().as_slice().to_vec();
        config.save()?;
        log::info!("Saved form state");
    }

    // Give the client task a moment to send DISCONNECT.
    runtime.shutdown_timeout(std::time::Duration::from_millis(500));
    Ok(())
}

/// Run headless watch mode.
fn run_watch(config: &Config) -> Result<()> {
    register_signals()?;
    let runtime = build_runtime()?;
    let mut manager = build_manager(config, &runtime);

    eprintln!("Watching {} (Ctrl+C to stop)...", config.url);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    stompscope::headless::run(&mut manager, &mut out, &SHUTDOWN_FLAG)?;

    runtime.shutdown_timeout(std::time::Duration::from_millis(500));
    Ok(())
}

fn log_path() -> PathBuf {
    if let Ok(path) = std::env::var("STOMPSCOPE_LOG_FILE") {
        PathBuf::from(path)
    } else if let Ok(dir) = Config::config_dir() {
        dir.join("stompscope.log")
    } else {
        std::env::temp_dir().join("stompscope.log")
    }
}

fn init_logging() -> Result<()> {
    let log_path = log_path();
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file at {}", log_path.display()))?;
    let filter = stompscope::env::Environment::current().default_log_filter();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format_timestamp_secs()
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Set up file logging so the TUI doesn't interfere with log output
    init_logging()?;

    // Set up panic hook to log panics and ensure terminal cleanup
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {:?}", panic_info);
        tui::restore_terminal();
        default_hook(panic_info);
    }));

    let cli = Cli::parse();
    let mut config = Config::load()?;
    cli.apply(&mut config);

    match cli.command {
        None | Some(Commands::Tui) => run_tui(config)?,
        Some(Commands::Watch { .. }) => run_watch(&config)?,
        Some(Commands::Config) => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}
