//! Real-Time Charts
//!
//! Fixed-window line charts fed by sensor batches.
//!
//! ## Architecture
//!
//! - **Series**: fixed-capacity sample window updated by shift-and-append
//! - **DataTable**: column-typed table backing each chart
//! - **RealtimeChart**: a series, its table and its display options
//! - **ChartRegistry**: one chart per configured series name
//! - **RenderBackend**: where rendered charts go (SVG files or memory)

mod backend;
mod error;
mod options;
mod registry;
mod series;
mod svg;
mod table;

pub use backend::{MemoryBackend, RenderBackend, SvgBackend};
pub use error::{ChartError, ChartResult};
pub use options::{ChartOptions, CurveType, LegendPosition};
pub use registry::{ChartRegistry, RealtimeChart};
pub use series::{Series, DEFAULT_CAPACITY};
pub use svg::render_svg;
pub use table::{Column, ColumnType, DataTable};
