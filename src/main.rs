//! sensordash CLI
//!
//! Command-line interface for the sensor dashboard:
//! - Watch a sensor stream and keep charts up to date
//! - Run the simulated feed server
//! - Send control and recording commands
//! - Generate a config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sensordash::config::{generate_default_config, parse_series_list, Config, LoggingConfig};
use sensordash::{ConnectionEvent, Dashboard, LoggingCommand, SensorConnection};

/// How long one-shot commands wait for the connection to open
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "sensordash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time sensor dashboard")]
#[command(long_about = "sensordash streams physiological sensor data over WebSocket\nand keeps a rolling chart per series.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a sensor server and chart incoming series
    Watch {
        /// Sensor server WebSocket URL
        #[arg(short, long)]
        url: Option<String>,
        /// Series to chart (comma-separated)
        #[arg(short, long)]
        series: Option<String>,
        /// Directory receiving the chart files
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run the simulated Bioharness feed server
    Feed {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Time between frames (ms)
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },

    /// Send a control message to the sensor server
    Control {
        /// Message type
        kind: String,
        /// Message value (JSON, or a plain string)
        value: String,
        /// Sensor server WebSocket URL
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Start a recording session on the sensor server
    Record {
        /// Subject identifier
        #[arg(long)]
        subject: String,
        /// Session name
        #[arg(long)]
        name: String,
        /// Sensor server WebSocket URL
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Stop the current recording session
    StopRecord {
        /// Sensor server WebSocket URL
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    init_tracing(&config.logging);
    tracing::info!("sensordash v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Watch { url, series, out } => {
            if let Some(url) = url {
                config.connection.url = url;
            }
            if let Some(series) = series {
                config.charts.series = parse_series_list(&series);
            }
            if let Some(out) = out {
                config.charts.container = out.to_string_lossy().to_string();
            }
            watch(&config).await?;
        }

        Commands::Feed { port, interval_ms } => {
            if let Some(port) = port {
                config.feed.port = port;
            }
            if let Some(interval_ms) = interval_ms {
                config.feed.interval_ms = interval_ms;
            }
            sensordash::feed::serve(&config.feed).await?;
        }

        Commands::Control { kind, value, url } => {
            let url = url.unwrap_or(config.connection.url);
            // Plain words are sent as JSON strings
            let value = serde_json::from_str(&value)
                .unwrap_or(serde_json::Value::String(value));
            send_once(&url, |conn| conn.send_control(kind, value)).await?;
            println!("Control message sent");
        }

        Commands::Record { subject, name, url } => {
            let url = url.unwrap_or(config.connection.url);
            let command = LoggingCommand::Start { subject, name };
            send_once(&url, |conn| conn.send_logging_command(&command)).await?;
            println!("{}", logging_confirmation(&command));
        }

        Commands::StopRecord { url } => {
            let url = url.unwrap_or(config.connection.url);
            let command = LoggingCommand::Stop;
            send_once(&url, |conn| conn.send_logging_command(&command)).await?;
            println!("{}", logging_confirmation(&command));
        }

        // Written above, before logging starts
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sensordash={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Chart a sensor stream until the connection closes or Ctrl+C
async fn watch(config: &Config) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::from_config(&config.charts)?;
    tracing::info!(
        charts = dashboard.registry().len(),
        container = %config.charts.container,
        "Charts initialized"
    );

    let mut connection =
        SensorConnection::new(&config.connection.url).event_buffer(config.connection.event_buffer);
    let events = connection.connect();

    tokio::select! {
        stats = dashboard.run(events) => {
            tracing::info!(
                frames = stats.frames,
                applied = stats.applied,
                ignored = stats.ignored,
                malformed = stats.malformed,
                "Sensor stream ended"
            );
        }
        _ = sensordash::feed::shutdown_signal() => {
            connection.close();
        }
    }

    Ok(())
}

/// Open a connection, send one message once it is open, then close
async fn send_once<F>(url: &str, send: F) -> anyhow::Result<()>
where
    F: FnOnce(&SensorConnection) -> Result<bool, serde_json::Error>,
{
    let mut connection = SensorConnection::new(url);
    let mut events = connection.connect();

    match tokio::time::timeout(CONNECT_TIMEOUT, events.recv()).await {
        Ok(Some(ConnectionEvent::Opened)) => {}
        Ok(Some(ConnectionEvent::Closed { reason })) => {
            bail!("Connection to {} failed: {}", url, reason)
        }
        Ok(_) => bail!("Connection to {} ended unexpectedly", url),
        Err(_) => bail!("Timed out connecting to {}", url),
    }

    if !send(&connection)? {
        bail!("Connection to {} closed before the message was sent", url);
    }

    connection.close();
    drain_until_closed(&mut events).await;
    Ok(())
}

async fn drain_until_closed(events: &mut mpsc::Receiver<ConnectionEvent>) {
    let drain = async {
        while let Some(event) = events.recv().await {
            if let ConnectionEvent::Closed { reason } = event {
                tracing::debug!(reason = %reason, "Connection closed");
                break;
            }
        }
    };
    let _ = tokio::time::timeout(CONNECT_TIMEOUT, drain).await;
}

/// Line printed once a recording command has been sent
fn logging_confirmation(command: &LoggingCommand) -> String {
    match command {
        LoggingCommand::Start { subject, name } => {
            format!("Recording command sent (LOG subject={} name={})", subject, name)
        }
        LoggingCommand::Stop => "Recording command sent (STOP_LOG)".to_string(),
    }
}
