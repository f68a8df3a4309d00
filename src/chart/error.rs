//! Chart error types
//!
//! Errors raised by the data table and the rendering backends.

use thiserror::Error;

/// Errors that can occur in the chart layer
#[derive(Error, Debug)]
pub enum ChartError {
    /// Column index outside the table
    #[error("Column {column} out of range (table has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    /// Row index outside the table
    #[error("Row {row} out of range (table has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    /// Row width does not match the number of columns
    #[error("Row has {got} cells, expected {expected}")]
    RowWidth { got: usize, expected: usize },

    /// Requested chart is not registered
    #[error("Chart not found: {0}")]
    ChartNotFound(String),

    /// Plotting the chart failed
    #[error("Draw error: {0}")]
    Draw(String),

    /// Writing the rendered chart failed
    #[error("Render error: {0}")]
    Render(#[from] std::io::Error),
}

/// Result type alias for chart operations
pub type ChartResult<T> = Result<T, ChartError>;
