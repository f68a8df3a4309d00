//! Chart Registry
//!
//! One real-time line chart per configured series name. Incoming batches are
//! applied to the matching series and only those charts are redrawn.

use std::collections::HashMap;

use super::backend::RenderBackend;
use super::error::{ChartError, ChartResult};
use super::options::ChartOptions;
use super::series::Series;
use super::table::{ColumnType, DataTable};
use crate::websocket::SeriesPayload;

const TIME_COLUMN: usize = 0;
const VALUE_COLUMN: usize = 1;

/// A series bound to its backing table and display options
#[derive(Debug, Clone)]
pub struct RealtimeChart {
    series: Series,
    table: DataTable,
    options: ChartOptions,
    element_id: String,
}

impl RealtimeChart {
    /// Build a chart of `capacity` zero samples.
    ///
    /// The time column is fixed at `0..capacity`; only the value column
    /// changes afterwards.
    pub fn new(name: &str, capacity: usize, options: ChartOptions) -> ChartResult<Self> {
        let series = Series::new(name, capacity);

        let mut table = DataTable::new();
        table.add_column(ColumnType::Number, "Time");
        table.add_column(ColumnType::Number, name);
        table.add_empty_rows(capacity);

        let time: Vec<f64> = (0..capacity).map(|i| i as f64).collect();
        table.set_column(TIME_COLUMN, &time)?;
        table.set_column(VALUE_COLUMN, series.values())?;

        Ok(Self {
            series,
            table,
            options,
            element_id: format!("{name}_chart"),
        })
    }

    /// Shift the batch into the series and copy every sample into the table
    pub fn update(&mut self, batch: &[f64]) -> ChartResult<usize> {
        let written = self.series.push_batch(batch);
        self.table.set_column(VALUE_COLUMN, self.series.values())?;
        Ok(written)
    }

    /// Render the current table
    pub fn draw(&self, backend: &mut dyn RenderBackend) -> ChartResult<()> {
        backend.render(&self.element_id, &self.table, &self.options)
    }

    pub fn name(&self) -> &str {
        self.series.name()
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }
}

/// Registry of real-time charts keyed by series name
pub struct ChartRegistry<B: RenderBackend> {
    /// Configured names, in configuration order
    names: Vec<String>,
    charts: HashMap<String, RealtimeChart>,
    backend: B,
}

impl<B: RenderBackend> ChartRegistry<B> {
    /// Create one chart per configured name and draw it once.
    ///
    /// Duplicate names are ignored after their first occurrence. Names must
    /// be ASCII letters, digits, `_` or `-`, since they become file names in
    /// the render container; anything else is skipped.
    pub fn initialize(
        names: &[String],
        capacity: usize,
        width: u32,
        height: u32,
        mut backend: B,
    ) -> ChartResult<Self> {
        let mut ordered = Vec::with_capacity(names.len());
        let mut charts = HashMap::with_capacity(names.len());

        for name in names {
            if !is_valid_series_name(name) {
                tracing::warn!(series = %name, "Invalid series name ignored");
                continue;
            }
            if charts.contains_key(name) {
                tracing::warn!(series = %name, "Duplicate series name ignored");
                continue;
            }
            let options = ChartOptions::realtime(name.as_str()).size(width, height);
            let chart = RealtimeChart::new(name, capacity, options)?;
            chart.draw(&mut backend)?;

            ordered.push(name.clone());
            charts.insert(name.clone(), chart);
        }

        tracing::info!(charts = charts.len(), capacity, "Chart registry initialized");

        Ok(Self {
            names: ordered,
            charts,
            backend,
        })
    }

    /// Apply a payload: every registered series present in it gets its batch
    /// and a redraw. Series absent from the payload are left untouched.
    ///
    /// Returns the names of the series that were updated.
    pub fn handle_data(&mut self, payload: &SeriesPayload) -> Vec<String> {
        let mut updated = Vec::new();

        for name in &self.names {
            let (Some(batch), Some(chart)) = (payload.batch(name), self.charts.get_mut(name))
            else {
                continue;
            };

            if let Err(e) = chart.update(batch) {
                tracing::error!(series = %name, error = %e, "Failed to apply batch");
                continue;
            }
            if let Err(e) = chart.draw(&mut self.backend) {
                tracing::error!(series = %name, error = %e, "Failed to draw chart");
            }
            updated.push(name.clone());
        }

        tracing::trace!(updated = ?updated, "Applied payload");
        updated
    }

    /// Redraw one chart without changing its data
    pub fn redraw(&mut self, name: &str) -> ChartResult<()> {
        let chart = self
            .charts
            .get(name)
            .ok_or_else(|| ChartError::ChartNotFound(name.to_string()))?;
        chart.draw(&mut self.backend)
    }

    /// Redraw every chart
    pub fn redraw_all(&mut self) -> ChartResult<()> {
        for name in &self.names {
            if let Some(chart) = self.charts.get(name) {
                chart.draw(&mut self.backend)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RealtimeChart> {
        self.charts.get(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn is_valid_series_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::backend::{MemoryBackend, SvgBackend};
    use tempfile::tempdir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn payload(json: &str) -> SeriesPayload {
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        SeriesPayload::from_value(value)
    }

    fn registry(list: &[&str]) -> ChartRegistry<MemoryBackend> {
        ChartRegistry::initialize(&names(list), 1000, 800, 240, MemoryBackend::new()).unwrap()
    }

    #[test]
    fn test_initialize_draws_each_chart() {
        let registry = registry(&["heart_rate", "ecg", "rr"]);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.backend().draw_count(), 3);
        assert!(registry.backend().document("ecg_chart").is_some());

        let chart = registry.get("heart_rate").unwrap();
        assert_eq!(chart.series().capacity(), 1000);
        assert!(chart.series().values().iter().all(|&v| v == 0.0));
        assert_eq!(chart.table().get_cell(999, 0).unwrap(), Some(999.0));
        assert_eq!(chart.table().get_cell(999, 1).unwrap(), Some(0.0));
        assert_eq!(chart.options().title, "heart_rate");
    }

    #[test]
    fn test_duplicate_names_ignored() {
        let registry = registry(&["ecg", "ecg"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), &["ecg".to_string()]);
    }

    #[test]
    fn test_path_like_names_ignored() {
        let dir = tempdir().unwrap();
        let container = dir.path().join("charts");
        let backend = SvgBackend::new(&container).unwrap();

        let registry = ChartRegistry::initialize(
            &names(&["../escape", "a/b", "", "ecg"]),
            10,
            400,
            120,
            backend,
        )
        .unwrap();

        assert_eq!(registry.names(), &["ecg".to_string()]);
        assert!(container.join("ecg_chart.svg").exists());
        assert!(!dir.path().join("escape_chart.svg").exists());
        assert!(!container.join("a").exists());
    }

    #[test]
    fn test_series_name_rules() {
        assert!(is_valid_series_name("heart_rate"));
        assert!(is_valid_series_name("acceleration-x2"));
        assert!(!is_valid_series_name(".."));
        assert!(!is_valid_series_name("a b"));
        assert!(!is_valid_series_name(""));
    }

    #[test]
    fn test_extreme_values_render_cleanly() {
        let mut registry = registry(&["ecg"]);

        let updated = registry.handle_data(&payload(r#"{"ecg": [-1.5e308, 1.5e308]}"#));

        assert_eq!(updated, vec!["ecg"]);
        let document = registry.backend().document("ecg_chart").unwrap();
        assert!(!document.contains("NaN"));
        assert!(!document.contains("inf"));
    }

    #[test]
    fn test_heart_rate_batch_lands_at_tail() {
        let mut registry = registry(&["heart_rate"]);

        let updated = registry.handle_data(&payload(r#"{"heart_rate": [72, 74]}"#));

        assert_eq!(updated, vec!["heart_rate"]);
        let chart = registry.get("heart_rate").unwrap();
        let values = chart.series().values();
        assert_eq!(values.len(), 1000);
        assert!(values[..998].iter().all(|&v| v == 0.0));
        assert_eq!(&values[998..], &[72.0, 74.0]);

        // Table mirrors the buffer
        assert_eq!(chart.table().get_cell(998, 1).unwrap(), Some(72.0));
        assert_eq!(chart.table().get_cell(999, 1).unwrap(), Some(74.0));
        assert_eq!(chart.table().get_cell(999, 0).unwrap(), Some(999.0));
    }

    #[test]
    fn test_only_matching_series_updated() {
        let mut registry = registry(&["heart_rate", "ecg", "breathing"]);
        registry.handle_data(&payload(r#"{"breathing": [1.0, 2.0]}"#));

        let before_hr = registry.get("heart_rate").unwrap().series().clone();
        let before_ecg = registry.get("ecg").unwrap().series().clone();
        let draws_before = registry.backend().draw_count();

        let updated = registry.handle_data(&payload(
            r#"{"ecg": [0.1, 0.2, 0.3], "unknown_series": [5], "timestamp": 1699000000}"#,
        ));

        assert_eq!(updated, vec!["ecg"]);
        assert_eq!(registry.get("heart_rate").unwrap().series(), &before_hr);
        assert_ne!(registry.get("ecg").unwrap().series(), &before_ecg);
        assert_eq!(
            &registry.get("breathing").unwrap().series().values()[998..],
            &[1.0, 2.0]
        );
        // Only the updated chart is redrawn
        assert_eq!(registry.backend().draw_count(), draws_before + 1);
    }

    #[test]
    fn test_empty_payload_touches_nothing() {
        let mut registry = registry(&["heart_rate"]);
        let draws = registry.backend().draw_count();

        assert!(registry.handle_data(&payload("{}")).is_empty());
        assert_eq!(registry.backend().draw_count(), draws);
    }

    #[test]
    fn test_redraw_is_idempotent() {
        let mut registry = registry(&["ecg"]);
        registry.handle_data(&payload(r#"{"ecg": [1, 5, 3, 8]}"#));

        registry.redraw("ecg").unwrap();
        let first = registry.backend().document("ecg_chart").unwrap().to_string();
        registry.redraw("ecg").unwrap();
        let second = registry.backend().document("ecg_chart").unwrap().to_string();

        assert_eq!(first, second);
    }

    #[test]
    fn test_redraw_unknown_chart() {
        let mut registry = registry(&["ecg"]);
        assert!(matches!(
            registry.redraw("rr"),
            Err(ChartError::ChartNotFound(_))
        ));
    }

    #[test]
    fn test_oversized_batch_through_registry() {
        let mut registry = registry(&["ecg"]);
        let batch: Vec<String> = (0..1200).map(|i| i.to_string()).collect();
        let json = format!(r#"{{"ecg": [{}]}}"#, batch.join(","));

        registry.handle_data(&payload(&json));

        let values = registry.get("ecg").unwrap().series().values();
        assert_eq!(values.len(), 1000);
        assert_eq!(values[0], 200.0);
        assert_eq!(values[999], 1199.0);
    }

    #[test]
    fn test_svg_files_written_to_container() {
        let dir = tempdir().unwrap();
        let backend = SvgBackend::new(dir.path()).unwrap();
        let mut registry =
            ChartRegistry::initialize(&names(&["rr", "ecg"]), 100, 400, 120, backend).unwrap();

        let rr_path = dir.path().join("rr_chart.svg");
        assert!(rr_path.exists());
        assert!(dir.path().join("ecg_chart.svg").exists());

        let initial = std::fs::read_to_string(&rr_path).unwrap();
        registry.handle_data(&payload(r#"{"rr": [0.81, 0.79, 0.84]}"#));
        let updated = std::fs::read_to_string(&rr_path).unwrap();
        assert_ne!(initial, updated);

        registry.redraw_all().unwrap();
        assert_eq!(std::fs::read_to_string(&rr_path).unwrap(), updated);
    }
}
