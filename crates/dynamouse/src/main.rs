//! DynaMouse entry point.
//!
//! Loads the configuration, wires the infrastructure adapters into an
//! [`AssignmentTable`], and keeps the table in sync with device and display
//! changes until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! dynamouse [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Config file [default: platform config dir]
//!   --log-level <LEVEL>   Overrides `general.log_level`
//!   --simulate            Drive the simulated devices from stdin (see below)
//!   --init-config         Write the loaded (or default) config back to disk and exit
//! ```
//!
//! # Simulation commands
//!
//! With `--simulate`, each stdin line is one command:
//!
//! | Line        | Effect                                           |
//! |-------------|--------------------------------------------------|
//! | `<product>` | the device moves                                 |
//! | `+<product>`| a device with that product name is plugged in    |
//! | `-<product>`| the device is unplugged                          |
//!
//! Plugging and unplugging fire `devices_changed`, which rebuilds the table.
//! With the `x11` feature and no `[[displays]]` in the config, the X11 screens
//! are re-enumerated periodically and a change fires `displays_changed`.
//! Embedders that bring their own `DeviceManager` / `DisplayRegistry` get the
//! same rebuild behaviour from their notifications.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, init tracing, optional startup delay
//!  └─ build adapters
//!       ├─ StaticDisplayRegistry   (config, or X11 screens with the `x11` feature)
//!       ├─ InMemoryDeviceManager   (one simulated device per configured mouse)
//!       └─ cursor                  (X11 with the `x11` feature, else virtual)
//!  └─ AssignmentTable::apply_mapping
//!  └─ rebuild task   (re-applies the mapping on devices_changed / displays_changed)
//!  └─ simulate task  (--simulate only)
//!  └─ screen watch   (`x11` feature, no configured displays)
//!  └─ Ctrl-C ─► AssignmentTable::shutdown
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dynamouse::application::assignment_table::AssignmentTable;
use dynamouse::application::ports::{
    CursorController, DeviceListener, DeviceManager, DeviceMapping, DisplayListener,
    DisplayRegistry,
};
use dynamouse::infrastructure::cursor::memory::InMemoryCursor;
use dynamouse::infrastructure::display::memory::StaticDisplayRegistry;
use dynamouse::infrastructure::pointer::memory::{InMemoryDeviceManager, SimulatedPointerDevice};
use dynamouse::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config, save_config_to, AppConfig,
    ConfigError,
};
use dynamouse_core::Display;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Several mice, one cursor: each mouse owns the cursor on its own display.
#[derive(Debug, Parser)]
#[command(
    name = "dynamouse",
    about = "Bind each mouse to a display and hand the cursor over when it moves",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "DYNAMOUSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (`error`, `warn`, `info`, `debug`, `trace`).
    ///
    /// Overrides `general.log_level`; `RUST_LOG` overrides both.
    #[arg(long, env = "DYNAMOUSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Drive the simulated devices from stdin (`name`, `+name`, `-name`).
    #[arg(long)]
    simulate: bool,

    /// Write the config file (defaults filled in) and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn resolve_config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }

    /// Loads `--config` if given, else the platform config file.
    fn load_config(&self) -> Result<AppConfig, ConfigError> {
        match &self.config {
            Some(path) => load_config_from(path),
            None => load_config(),
        }
    }

    fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        match &self.config {
            Some(path) => save_config_to(path, config),
            None => save_config(config),
        }
    }
}

// ── Rebuild trigger ───────────────────────────────────────────────────────────

/// Turns hot-plug notifications into rebuild requests for the main loop.
struct RebuildRequest {
    tx: mpsc::UnboundedSender<()>,
}

impl DeviceListener for RebuildRequest {
    fn devices_changed(&self) {
        let _ = self.tx.send(());
    }
}

impl DisplayListener for RebuildRequest {
    fn displays_changed(&self, _displays: &[Display]) {
        let _ = self.tx.send(());
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.resolve_config_path()?;
    let config = cli
        .load_config()
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    if cli.init_config {
        cli.save_config(&config)
            .with_context(|| format!("failed to write config to {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    let level = cli.log_level.as_deref().unwrap_or(&config.general.log_level);
    let log_file = config
        .general
        .log_file
        .then(|| config_path.with_file_name("dynamouse.log"));
    init_tracing(level, log_file.as_deref())?;

    info!(config = %config_path.display(), "DynaMouse starting");

    if config.general.startup_delay_secs > 0 {
        info!(secs = config.general.startup_delay_secs, "waiting before taking over the mice");
        tokio::time::sleep(Duration::from_secs(config.general.startup_delay_secs)).await;
    }

    // ── Adapters ──────────────────────────────────────────────────────────────
    let displays = build_display_registry(&config);
    let devices = Arc::new(InMemoryDeviceManager::with_products(config.devices.keys()));
    let cursor = build_cursor();
    let table = AssignmentTable::new(devices.clone(), displays.clone(), cursor);

    let mapping: DeviceMapping = config.devices.clone();
    if let Err(e) = table.apply_mapping(&mapping).await {
        error!(error = %e, "initial device mapping failed");
    }

    // ── Rebuild on hot-plug ───────────────────────────────────────────────────
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rebuild = Arc::new(RebuildRequest { tx });
    let device_sub = devices.subscribe(rebuild.clone());
    let display_sub = displays.subscribe(rebuild);

    let rebuild_task = {
        let table = table.clone();
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Coalesce bursts into one rebuild.
                while rx.try_recv().is_ok() {}
                info!("devices or displays changed; rebuilding assignments");
                if let Err(e) = table.apply_mapping(&mapping).await {
                    error!(error = %e, "rebuilding assignments failed");
                }
            }
        })
    };

    let simulate_task = cli.simulate.then(|| {
        info!("simulation mode: `<name>` moves a device, `+<name>` plugs one in, `-<name>` unplugs it");
        tokio::spawn(simulate_from_stdin(devices.clone()))
    });

    #[cfg(all(target_os = "linux", feature = "x11"))]
    let screen_watch = config
        .displays
        .is_empty()
        .then(|| tokio::spawn(watch_x11_screens(displays.clone())));

    // ── Shutdown ──────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");

    device_sub.cancel();
    display_sub.cancel();
    rebuild_task.abort();
    if let Some(task) = simulate_task {
        task.abort();
    }
    #[cfg(all(target_os = "linux", feature = "x11"))]
    if let Some(task) = screen_watch {
        task.abort();
    }
    if let Err(e) = table.shutdown().await {
        error!(error = %e, "failed to release all devices");
    }

    info!("DynaMouse stopped");
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `level`.  With `log_file`, every event is
/// also appended (without ANSI colours) to that file.
fn init_tracing(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

/// Uses the configured displays, or the X11 screens when none are configured
/// and the `x11` feature is enabled.
fn build_display_registry(config: &AppConfig) -> Arc<StaticDisplayRegistry> {
    #[cfg(all(target_os = "linux", feature = "x11"))]
    {
        if config.displays.is_empty() {
            match dynamouse::infrastructure::display::linux::enumerate_displays() {
                Ok(screens) => {
                    info!(count = screens.len(), "using X11 screens as displays");
                    return Arc::new(StaticDisplayRegistry::new(screens));
                }
                Err(e) => warn!(error = %e, "X11 screen enumeration failed"),
            }
        }
    }

    if config.displays.is_empty() {
        warn!("no displays configured; every device will stay uncontrolled");
    }
    Arc::new(StaticDisplayRegistry::new(config.displays.clone()))
}

/// Opens the native cursor, falling back to a virtual one.
fn build_cursor() -> Arc<dyn CursorController> {
    #[cfg(all(target_os = "linux", feature = "x11"))]
    {
        match dynamouse::infrastructure::cursor::linux::X11CursorController::open() {
            Ok(cursor) => return Arc::new(cursor),
            Err(e) => warn!(error = %e, "falling back to a virtual cursor"),
        }
    }

    info!("using a virtual cursor; the real pointer will not move");
    Arc::new(InMemoryCursor::new())
}

/// One line of `--simulate` input.
#[derive(Debug, PartialEq, Eq)]
enum SimulateCommand {
    Move(String),
    Plug(String),
    Unplug(String),
}

impl SimulateCommand {
    /// Parses one stdin line; blank lines yield `None`.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(product) = line.strip_prefix('+') {
            Some(Self::Plug(product.trim().to_string())).filter(|_| !product.trim().is_empty())
        } else if let Some(product) = line.strip_prefix('-') {
            Some(Self::Unplug(product.trim().to_string())).filter(|_| !product.trim().is_empty())
        } else if line.is_empty() {
            None
        } else {
            Some(Self::Move(line.to_string()))
        }
    }

    fn apply(self, devices: &InMemoryDeviceManager) {
        match self {
            Self::Move(product) => match devices.get(&product) {
                Some(device) => {
                    if !device.emit_movement() {
                        info!(%product, "device owns the cursor or is unassigned; movement not reported");
                    }
                }
                None => warn!(%product, known = ?devices.devices(), "unknown device"),
            },
            Self::Plug(product) => {
                info!(%product, "plugging in device");
                devices.insert(Arc::new(SimulatedPointerDevice::new(product)));
            }
            Self::Unplug(product) => {
                if devices.remove(&product).is_none() {
                    warn!(%product, "unplug of unknown device");
                }
            }
        }
    }
}

/// Applies one [`SimulateCommand`] per stdin line until EOF.
async fn simulate_from_stdin(devices: Arc<InMemoryDeviceManager>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(command) = SimulateCommand::parse(&line) {
                    command.apply(&devices);
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}

/// Re-enumerates the X11 screens and publishes changes to `displays`.
#[cfg(all(target_os = "linux", feature = "x11"))]
async fn watch_x11_screens(displays: Arc<StaticDisplayRegistry>) {
    const POLL_INTERVAL: Duration = Duration::from_secs(5);

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.tick().await;
    loop {
        interval.tick().await;
        match dynamouse::infrastructure::display::linux::enumerate_displays() {
            Ok(screens) if screens != displays.displays() => {
                info!(count = screens.len(), "X11 screens changed");
                displays.set_displays(screens);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "X11 screen enumeration failed"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
