//! WebSocket Connection Hub
//!
//! Tracks every dashboard connected to the feed server and fans sensor
//! frames out to all of them. Commands received from dashboards are
//! republished on a broadcast channel for any internal listener.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ClientMessage, SensorFrame};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all dashboard connections
pub struct ConnectionHub {
    /// Active connections: ConnectionId → frame sender
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<SensorFrame>>>>,
    /// Commands received from any dashboard
    command_tx: broadcast::Sender<ClientMessage>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Capacity of the command broadcast channel
    pub command_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 64,
            command_capacity: 64,
        }
    }
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        let (command_tx, _) = broadcast::channel(config.command_capacity.max(1));

        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            command_tx,
            config,
        }
    }

    /// Register a new connection
    ///
    /// Returns the connection ID, or an error if the connection limit has
    /// been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<SensorFrame>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(id.clone(), sender);

        tracing::info!(connection_id = %id, "Dashboard connected");
        Ok(id)
    }

    pub async fn unregister(&self, id: &str) {
        if self.connections.write().await.remove(id).is_some() {
            tracing::info!(connection_id = %id, "Dashboard disconnected");
        }
    }

    /// Send a frame to every connection. Returns how many accepted it.
    pub async fn broadcast(&self, frame: &SensorFrame) -> usize {
        let connections = self.connections.read().await;

        let sent_count = connections
            .values()
            .filter(|sender| sender.send(frame.clone()).is_ok())
            .count();

        if sent_count > 0 {
            tracing::trace!(receivers = sent_count, "Broadcast frame");
        }
        sent_count
    }

    /// Republish a command received from a dashboard
    pub fn publish_command(&self, command: ClientMessage) {
        // No listeners is fine
        let _ = self.command_tx.send(command);
    }

    /// Receive commands sent by dashboards
    pub fn subscribe_commands(&self) -> broadcast::Receiver<ClientMessage> {
        self.command_tx.subscribe()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::messages::LoggingCommand;
    use std::collections::BTreeMap;

    fn frame(value: f64) -> SensorFrame {
        let mut series = BTreeMap::new();
        series.insert("heart_rate".to_string(), vec![value]);
        SensorFrame::bioharness(1699000000000, series)
    }

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.max_connections, 64);
        assert_eq!(config.command_capacity, 64);
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig {
            max_connections: 2,
            command_capacity: 4,
        });

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.register(tx1).await.unwrap();
        hub.register(tx2).await.unwrap();

        let sent = hub.broadcast(&frame(72.0)).await;

        assert_eq!(sent, 2);
        assert_eq!(rx1.try_recv().unwrap().series["heart_rate"], vec![72.0]);
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_receivers() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.register(tx1).await.unwrap();
        hub.register(tx2).await.unwrap();
        drop(rx1);

        assert_eq!(hub.broadcast(&frame(60.0)).await, 1);
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_commands_republished() {
        let hub = ConnectionHub::new(HubConfig::default());
        let mut commands = hub.subscribe_commands();

        hub.publish_command(ClientMessage::Logging(LoggingCommand::Stop));

        assert_eq!(
            commands.recv().await.unwrap(),
            ClientMessage::Logging(LoggingCommand::Stop)
        );
    }
}
