//! Dashboard
//!
//! The dashboard context: connection state plus the chart registry. It
//! consumes connection events one at a time, in arrival order, and routes
//! each sensor frame to the charts it names.

use tokio::sync::mpsc;

use crate::chart::{ChartRegistry, RenderBackend, SvgBackend};
use crate::config::ChartsConfig;
use crate::error::Result;
use crate::websocket::{ConnectionEvent, InboundMessage};

/// What happened to one inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A known frame; lists the series that were updated (possibly none)
    Applied { updated: Vec<String> },
    /// Unknown or missing type tag; the frame was dropped
    Ignored { kind: Option<String> },
    /// Not valid JSON; the frame was dropped
    Malformed,
}

/// Frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub frames: u64,
    pub applied: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Connection state and charts of one dashboard
pub struct Dashboard<B: RenderBackend> {
    registry: ChartRegistry<B>,
    /// Open/closed as of the last processed event. Outbound sends are gated
    /// by [`SensorConnection::is_connected`], which is authoritative and may
    /// change before the matching event is processed here.
    ///
    /// [`SensorConnection::is_connected`]: crate::websocket::SensorConnection::is_connected
    connected: bool,
    stats: DashboardStats,
}

impl Dashboard<SvgBackend> {
    /// Build a dashboard rendering SVG charts into the configured container
    pub fn from_config(config: &ChartsConfig) -> Result<Self> {
        let backend = SvgBackend::new(&config.container)?;
        let registry = ChartRegistry::initialize(
            &config.series,
            config.capacity,
            config.width,
            config.height,
            backend,
        )?;
        Ok(Self::new(registry))
    }
}

impl<B: RenderBackend> Dashboard<B> {
    pub fn new(registry: ChartRegistry<B>) -> Self {
        Self {
            registry,
            connected: false,
            stats: DashboardStats::default(),
        }
    }

    /// Apply one connection event. Returns the frame outcome for messages.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> Option<FrameOutcome> {
        match event {
            ConnectionEvent::Opened => {
                self.connected = true;
                tracing::info!("SensorCollector - Connection established");
                None
            }
            ConnectionEvent::Message(text) => Some(self.handle_frame(&text)),
            ConnectionEvent::Closed { reason } => {
                self.connected = false;
                tracing::info!(reason = %reason, "SensorCollector - Connection is closed");
                None
            }
        }
    }

    /// Parse one text frame and dispatch it. Malformed JSON is logged and
    /// dropped.
    pub fn handle_frame(&mut self, text: &str) -> FrameOutcome {
        self.stats.frames += 1;

        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                self.stats.malformed += 1;
                tracing::warn!(error = %e, bytes = text.len(), "Dropping malformed frame");
                return FrameOutcome::Malformed;
            }
        };

        tracing::debug!(kind = ?message.kind(), "SensorCollector - Message received");
        self.dispatch(message)
    }

    /// Route a parsed message by its type
    pub fn dispatch(&mut self, message: InboundMessage) -> FrameOutcome {
        match message {
            InboundMessage::Bioharness(payload) => {
                self.stats.applied += 1;
                let updated = self.registry.handle_data(&payload);
                FrameOutcome::Applied { updated }
            }
            InboundMessage::Unrecognized { kind } => {
                self.stats.ignored += 1;
                tracing::warn!(kind = ?kind, "Could not parse message");
                FrameOutcome::Ignored { kind }
            }
        }
    }

    /// Consume events until the connection task finishes
    pub async fn run(&mut self, mut events: mpsc::Receiver<ConnectionEvent>) -> DashboardStats {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        self.stats
    }

    /// Connection state as seen through processed events
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn registry(&self) -> &ChartRegistry<B> {
        &self.registry
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }
}
