//! Dashboard error types
//!
//! Top-level error for the dashboard and the feed server.

use thiserror::Error;

use crate::chart::ChartError;

/// Errors surfaced by the dashboard and the feed server
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Chart construction or rendering failed
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
