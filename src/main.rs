//! gpio-keypadd - GPIO buttons as a virtual keyboard
//!
//! Entry point for the daemon binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gpio_keypadd::config::Config;
use gpio_keypadd::engine::{ButtonEngine, EventCallback, LineRegistry};
use gpio_keypadd::gpio::CdevEdgeSource;
use gpio_keypadd::keypad::Keypad;

/// Command-line arguments for gpio-keypadd
#[derive(Parser, Debug)]
#[command(name = "gpio-keypadd")]
#[command(version, about = "GPIO buttons to virtual keyboard daemon", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/gpio-keypadd/config.toml")]
    pub config: String,

    /// GPIO chip device (overrides config)
    #[arg(long, env = "GPIO_KEYPADD_CHIP")]
    pub chip: Option<String>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("════════════════════════════════════════════════════════");
    info!("  gpio-keypadd v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("════════════════════════════════════════════════════════");

    // Load configuration
    let config = Config::load(&args.config).or_else(|e| {
        warn!("Failed to load config: {e:#}, using defaults");
        Config::default_config()
    })?;
    let config = config.with_overrides(args.chip.clone());

    info!(
        chip = %config.device.chip,
        lines = config.lines.len(),
        "Configuration loaded"
    );

    // Virtual keyboard first: no point claiming GPIO lines if the sink
    // cannot be created.
    let keypad = Keypad::open(
        &config.device.name,
        config.keycodes()?,
        config.keypad_options()?,
    )
    .context("failed to create virtual keyboard")?;
    let keypad = Arc::new(Mutex::new(keypad));

    // Open the edge source for the configured lines.
    let registry = LineRegistry::new(config.line_configs())?;
    let source = CdevEdgeSource::open(
        &config.device.chip,
        &registry.line_requests(),
        config.hw_debounce(),
    )
    .context("failed to open GPIO lines")?;

    // Wire the engine to the keypad.
    let callback_keypad = keypad.clone();
    let callback: EventCallback = Box::new(move |event, index| {
        callback_keypad.lock().handle(event, index);
    });

    let engine = ButtonEngine::start(
        registry,
        config.timing(),
        config.scan_interval(),
        Box::new(source),
        callback,
    )?;

    info!("gpio-keypadd running; press Ctrl-C to exit");

    run_until_shutdown(&engine).await?;

    engine.shutdown();
    info!("gpio-keypadd shut down");
    Ok(())
}

/// Wait for Ctrl-C or an engine fault, whichever comes first.
async fn run_until_shutdown(engine: &ButtonEngine) -> Result<()> {
    let mut health = tokio::time::interval(std::time::Duration::from_millis(500));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for shutdown signal")?;
                info!("shutdown signal received");
                return Ok(());
            }
            _ = health.tick() => {
                if !engine.is_running() {
                    if let Some(fault) = engine.take_fault() {
                        anyhow::bail!("engine stopped: {fault}");
                    }
                    anyhow::bail!("engine stopped unexpectedly");
                }
            }
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("gpio_keypadd={level},warn", level = log_level))
        });

    // If log file is specified, write to both stdout and file
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)?;

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .with(tracing_subscriber::fmt::layer().json().with_writer(file))
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact())
                    .with(tracing_subscriber::fmt::layer().compact().with_ansi(false).with_writer(file))
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
                    .init();
            }
        }
    } else {
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact())
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer())
                    .init();
            }
        }
    }

    Ok(())
}
