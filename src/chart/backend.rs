//! Rendering backends
//!
//! A chart widget hands its table and options to a [`RenderBackend`], which
//! owns where the rendered document ends up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::ChartResult;
use super::options::ChartOptions;
use super::svg::render_svg;
use super::table::DataTable;

/// Destination for rendered charts
pub trait RenderBackend: Send {
    /// Render one chart into the element identified by `element_id`
    fn render(
        &mut self,
        element_id: &str,
        table: &DataTable,
        options: &ChartOptions,
    ) -> ChartResult<()>;
}

/// Writes each chart as `<container>/<element_id>.svg`
#[derive(Debug, Clone)]
pub struct SvgBackend {
    container: PathBuf,
}

impl SvgBackend {
    /// Create the backend, creating the container directory if needed
    pub fn new(container: impl Into<PathBuf>) -> ChartResult<Self> {
        let container = container.into();
        std::fs::create_dir_all(&container)?;
        tracing::debug!(container = ?container, "Chart container ready");
        Ok(Self { container })
    }

    pub fn container(&self) -> &Path {
        &self.container
    }

    /// Path of the document rendered for `element_id`
    pub fn element_path(&self, element_id: &str) -> PathBuf {
        self.container.join(format!("{element_id}.svg"))
    }
}

impl RenderBackend for SvgBackend {
    fn render(
        &mut self,
        element_id: &str,
        table: &DataTable,
        options: &ChartOptions,
    ) -> ChartResult<()> {
        let document = render_svg(table, options)?;
        std::fs::write(self.element_path(element_id), document)?;
        Ok(())
    }
}

/// Keeps the latest document per element in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: HashMap<String, String>,
    draw_count: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, element_id: &str) -> Option<&str> {
        self.documents.get(element_id).map(String::as_str)
    }

    /// Total number of render calls
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }
}

impl RenderBackend for MemoryBackend {
    fn render(
        &mut self,
        element_id: &str,
        table: &DataTable,
        options: &ChartOptions,
    ) -> ChartResult<()> {
        let document = render_svg(table, options)?;
        self.documents.insert(element_id.to_string(), document);
        self.draw_count += 1;
        Ok(())
    }
}
