//! # sensordash
//!
//! Real-time sensor dashboard: connects to a sensor collection server over
//! WebSocket and keeps one rolling chart per physiological series.
//!
//! ## Features
//!
//! - **Rolling series**: fixed-capacity FIFO windows, oldest values drop first
//! - **Chart registry**: one chart per configured series, redrawn on each batch
//! - **Streaming**: frames applied one at a time, in arrival order
//! - **Control channel**: JSON envelopes sent back to the server
//! - **Feed server**: simulated Bioharness stream for local development
//!
//! ## Modules
//!
//! - [`chart`]: Series buffers, data tables and chart rendering
//! - [`websocket`]: Wire messages, sensor connection, feed hub
//! - [`dashboard`]: Connection state and frame dispatch
//! - [`feed`]: Simulated sensor feed server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensordash::{Config, Dashboard, SensorConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     // One SVG chart per series in the container directory
//!     let mut dashboard = Dashboard::from_config(&config.charts)?;
//!
//!     let mut connection = SensorConnection::new(&config.connection.url);
//!     let events = connection.connect();
//!
//!     let stats = dashboard.run(events).await;
//!     println!("Applied {} frames", stats.applied);
//!
//!     Ok(())
//! }
//! ```

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod websocket;

// Re-export top-level types for convenience
pub use chart::{
    ChartError, ChartOptions, ChartRegistry, ChartResult, MemoryBackend, RealtimeChart,
    RenderBackend, Series, SvgBackend, DEFAULT_CAPACITY,
};

pub use config::{
    ChartsConfig, Config, ConfigError, ConnectionConfig, FeedConfig, LoggingConfig,
};

pub use dashboard::{Dashboard, DashboardStats, FrameOutcome};

pub use error::{DashboardError, Result};

pub use websocket::{
    ClientMessage, ConnectionEvent, ConnectionHub, ControlMessage, HubConfig, HubError,
    InboundMessage, LoggingCommand, SensorConnection, SensorFrame, SeriesPayload,
};
