//! WebSocket Sensor Stream
//!
//! Both ends of the sensor stream.
//!
//! ## Architecture
//!
//! - **SensorConnection**: dashboard-side client, reports lifecycle events
//!   over a channel and gates outbound sends on the connection state
//! - **Messages**: inbound tagged frames, outbound control envelopes
//! - **ConnectionHub**: feed-side registry of dashboards for fan-out
//! - **Handler**: feed-side upgrade and command handling
//!
//! ## Wire format
//!
//! ```text
//! server → dashboard   {"type": "bioharness", "timestamp": 1699000000000, "ecg": [..], "rr": [..]}
//! dashboard → server   {"type": "<kind>", "value": <any>}
//!                      {"type": "LOG", "subject": "S01", "name": "baseline"}
//!                      {"type": "STOP_LOG"}
//! ```

mod client;
mod handler;
mod hub;
mod messages;

pub use client::{ConnectionEvent, SensorConnection, DEFAULT_EVENT_BUFFER};
pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{
    ClientMessage, ControlMessage, InboundMessage, LoggingCommand, SensorFrame, SeriesPayload,
    BIOHARNESS,
};
