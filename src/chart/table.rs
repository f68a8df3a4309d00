//! Tabular chart data
//!
//! A small column-typed table that backs each chart widget. Column 0 holds
//! the x-axis, later columns hold one series each. Cells are mutated in place
//! and the renderer reads the whole table on every draw.

use super::error::{ChartError, ChartResult};

/// Type of values stored in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Number,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub column_type: ColumnType,
    pub label: String,
}

/// Row-major table of optional numeric cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Option<f64>>>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; existing rows get an empty cell. Returns the column index.
    pub fn add_column(&mut self, column_type: ColumnType, label: impl Into<String>) -> usize {
        self.columns.push(Column {
            column_type,
            label: label.into(),
        });
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Append `count` rows of empty cells
    pub fn add_empty_rows(&mut self, count: usize) {
        let width = self.columns.len();
        self.rows
            .extend(std::iter::repeat_with(|| vec![None; width]).take(count));
    }

    /// Append one row; its width must match the column count
    pub fn add_row(&mut self, cells: Vec<Option<f64>>) -> ChartResult<()> {
        if cells.len() != self.columns.len() {
            return Err(ChartError::RowWidth {
                got: cells.len(),
                expected: self.columns.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: f64) -> ChartResult<()> {
        self.check_column(column)?;
        let rows = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(ChartError::RowOutOfRange { row, rows })?;
        cells[column] = Some(value);
        Ok(())
    }

    pub fn get_cell(&self, row: usize, column: usize) -> ChartResult<Option<f64>> {
        self.check_column(column)?;
        let cells = self.rows.get(row).ok_or(ChartError::RowOutOfRange {
            row,
            rows: self.rows.len(),
        })?;
        Ok(cells[column])
    }

    /// Overwrite a whole column from a slice, starting at row 0
    pub fn set_column(&mut self, column: usize, values: &[f64]) -> ChartResult<()> {
        self.check_column(column)?;
        if values.len() > self.rows.len() {
            return Err(ChartError::RowOutOfRange {
                row: values.len() - 1,
                rows: self.rows.len(),
            });
        }
        for (row, &value) in self.rows.iter_mut().zip(values) {
            row[column] = Some(value);
        }
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Iterate `(x, y)` pairs of two columns, skipping rows with an empty cell
    pub fn points(&self, x_column: usize, y_column: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| match (row.get(x_column), row.get(y_column)) {
                (Some(Some(x)), Some(Some(y))) => Some((*x, *y)),
                _ => None,
            })
    }

    fn check_column(&self, column: usize) -> ChartResult<()> {
        if column >= self.columns.len() {
            return Err(ChartError::ColumnOutOfRange {
                column,
                columns: self.columns.len(),
            });
        }
        Ok(())
    }
}
