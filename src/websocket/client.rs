//! WebSocket Client
//!
//! Single connection to the sensor server. The connection runs on its own
//! task and reports open, message and close events over a channel; the
//! consumer processes them in arrival order. There is no reconnection: once
//! closed, the connection stays closed.

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::messages::{ControlMessage, LoggingCommand};

/// Default capacity of the event channel
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Connection lifecycle events, delivered in transport order
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Handshake completed
    Opened,
    /// One text frame
    Message(String),
    /// Connection closed or could not be opened
    Closed { reason: String },
}

/// Commands for the connection task
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Client side of the sensor WebSocket
#[derive(Debug)]
pub struct SensorConnection {
    url: String,
    event_buffer: usize,
    connected: Arc<AtomicBool>,
    outbound_tx: Option<mpsc::UnboundedSender<Outbound>>,
}

impl SensorConnection {
    /// Create an unconnected client for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            connected: Arc::new(AtomicBool::new(false)),
            outbound_tx: None,
        }
    }

    /// Set the capacity of the event channel
    pub fn event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size.max(1);
        self
    }

    /// Open the connection on a background task.
    ///
    /// Returns the event stream. A failed handshake shows up as a single
    /// [`ConnectionEvent::Closed`].
    pub fn connect(&mut self) -> mpsc::Receiver<ConnectionEvent> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(self.event_buffer);

        self.outbound_tx = Some(outbound_tx);

        let url = self.url.clone();
        let connected = Arc::clone(&self.connected);

        tokio::spawn(async move {
            run_connection(url, connected, outbound_rx, event_tx).await;
        });

        event_rx
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Serialize and send a message if the connection is open.
    ///
    /// Returns `Ok(false)` when the message was dropped because the
    /// connection is not open. Nothing is queued for later.
    pub fn send_json<T: Serialize>(&self, message: &T) -> Result<bool, serde_json::Error> {
        if !self.is_connected() {
            tracing::debug!(url = %self.url, "Not connected, dropping outbound message");
            return Ok(false);
        }
        let Some(tx) = &self.outbound_tx else {
            return Ok(false);
        };

        let text = serde_json::to_string(message)?;
        Ok(tx.send(Outbound::Text(text)).is_ok())
    }

    /// Send a `{"type": kind, "value": value}` envelope
    pub fn send_control(
        &self,
        kind: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<bool, serde_json::Error> {
        self.send_json(&ControlMessage::new(kind, value))
    }

    /// Send a recording-session command
    pub fn send_logging_command(&self, command: &LoggingCommand) -> Result<bool, serde_json::Error> {
        self.send_json(command)
    }

    /// Ask the connection task to send a close frame and stop
    pub fn close(&self) {
        if let Some(tx) = &self.outbound_tx {
            let _ = tx.send(Outbound::Close);
        }
    }
}

/// Run one connection until it closes
async fn run_connection(
    url: String,
    connected: Arc<AtomicBool>,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    event_tx: mpsc::Sender<ConnectionEvent>,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Sensor connection failed");
            let _ = event_tx
                .send(ConnectionEvent::Closed {
                    reason: e.to_string(),
                })
                .await;
            return;
        }
    };

    connected.store(true, Ordering::SeqCst);
    tracing::info!(url = %url, "Sensor connection established");
    if event_tx.send(ConnectionEvent::Opened).await.is_err() {
        connected.store(false, Ordering::SeqCst);
        return;
    }

    let (mut write, mut read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if event_tx.send(ConnectionEvent::Message(text)).await.is_err() {
                        let _ = write.send(Message::Close(None)).await;
                        break "event receiver dropped".to_string();
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!(bytes = data.len(), "Ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by server".to_string());
                }
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_string(),
            },
            command = outbound_rx.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        break e.to_string();
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    break "closed by client".to_string();
                }
            },
        }
    };

    connected.store(false, Ordering::SeqCst);
    tracing::info!(url = %url, reason = %reason, "Sensor connection closed");
    let _ = event_tx.send(ConnectionEvent::Closed { reason }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_before_connect_is_dropped() {
        let conn = SensorConnection::new("ws://127.0.0.1:9/ws");
        assert!(!conn.is_connected());
        assert!(!conn.send_control("marker", json!("start")).unwrap());
        assert!(!conn.send_logging_command(&LoggingCommand::Stop).unwrap());
    }

    #[test]
    fn test_send_while_not_open_queues_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = SensorConnection {
            url: "ws://127.0.0.1:9/ws".to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            connected: Arc::new(AtomicBool::new(false)),
            outbound_tx: Some(tx),
        };

        assert!(!conn.send_control("volume", 3).unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_while_open_queues_envelope() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = SensorConnection {
            url: "ws://127.0.0.1:9/ws".to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            connected: Arc::new(AtomicBool::new(true)),
            outbound_tx: Some(tx),
        };

        assert!(conn.send_control("volume", 3).unwrap());
        match rx.try_recv().unwrap() {
            Outbound::Text(text) => {
                let value: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value, json!({"type": "volume", "value": 3}));
            }
            Outbound::Close => panic!("Expected text"),
        }
    }

    #[tokio::test]
    async fn test_failed_connect_reports_closed() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut conn = SensorConnection::new(format!("ws://{addr}/ws"));
        let mut events = conn.connect();

        match events.recv().await {
            Some(ConnectionEvent::Closed { .. }) => {}
            other => panic!("Expected Closed, got {:?}", other),
        }
        assert!(!conn.is_connected());
        assert!(!conn.send_control("marker", 1).unwrap());
    }
}
