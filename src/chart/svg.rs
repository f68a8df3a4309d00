//! SVG line chart rendering
//!
//! Draws a [`DataTable`] with [`ChartOptions`] through the `plotters` SVG
//! backend. Column 0 is the x-axis; every further column is one line.
//! Output depends only on the inputs, so redrawing an unchanged table yields
//! the same document.

use plotters::prelude::*;

use super::error::{ChartError, ChartResult};
use super::options::{ChartOptions, CurveType, LegendPosition};
use super::table::DataTable;

/// Line colors, cycled per series column
const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(0xFF, 0x98, 0x00), // Orange (primary)
    RGBColor(0x4C, 0xAF, 0x50), // Green
    RGBColor(0x21, 0x96, 0xF3), // Blue
    RGBColor(0x9C, 0x27, 0xB0), // Purple
    RGBColor(0xF4, 0x43, 0x36), // Red
    RGBColor(0x00, 0xBC, 0xD4), // Cyan
];

const BACKGROUND: RGBColor = RGBColor(0x1F, 0x29, 0x37);
const TEXT: RGBColor = RGBColor(0xE5, 0xE7, 0xEB);
const GRID: RGBColor = RGBColor(0x37, 0x41, 0x51);

/// Largest magnitude shown on the y-axis; larger samples sit on the edge
const Y_LIMIT: f64 = 1.0e15;

/// Points per segment of a smoothed curve
const SMOOTH_STEPS: usize = 4;

/// Render the table as an SVG line chart
pub fn render_svg(table: &DataTable, options: &ChartOptions) -> ChartResult<String> {
    let series: Vec<(&str, Vec<(f64, f64)>)> = table
        .columns()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(col, column)| (column.label.as_str(), table.points(0, col).collect()))
        .collect();

    let (x_min, x_max) = x_range(series.iter().flat_map(|(_, p)| p.iter().map(|p| p.0)));
    let (y_min, y_max) = y_range(series.iter().flat_map(|(_, p)| p.iter().map(|p| p.1)));

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&BACKGROUND).map_err(draw_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 14).into_font().color(&TEXT))
            .margin(8)
            .x_label_area_size(22)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(5)
            .y_labels(5)
            .axis_style(GRID)
            .bold_line_style(GRID)
            .light_line_style(GRID.mix(0.3))
            .label_style(("sans-serif", 11).into_font().color(&TEXT))
            .draw()
            .map_err(draw_error)?;

        for (idx, (label, points)) in series.iter().enumerate() {
            if points.is_empty() {
                continue;
            }
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
            let clamped: Vec<(f64, f64)> = points
                .iter()
                .map(|&(x, y)| (x, y.clamp(y_min, y_max)))
                .collect();
            let line = match options.curve_type {
                CurveType::None => clamped,
                CurveType::Function => smooth(&clamped),
            };
            // Smoothing may overshoot the padded range
            let line = line.into_iter().map(|(x, y)| (x, y.clamp(y_min, y_max)));

            let drawn = chart
                .draw_series(LineSeries::new(line, color.stroke_width(2)))
                .map_err(draw_error)?;
            if options.legend != LegendPosition::None {
                drawn.label(*label).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            }
        }

        if let Some(position) = label_position(options.legend) {
            chart
                .configure_series_labels()
                .position(position)
                .background_style(BACKGROUND.mix(0.8))
                .border_style(GRID)
                .label_font(("sans-serif", 11).into_font().color(&TEXT))
                .draw()
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
    }

    Ok(svg)
}

fn draw_error(e: impl std::fmt::Display) -> ChartError {
    ChartError::Draw(e.to_string())
}

fn label_position(legend: LegendPosition) -> Option<SeriesLabelPosition> {
    match legend {
        LegendPosition::None => None,
        LegendPosition::Right => Some(SeriesLabelPosition::UpperRight),
        LegendPosition::Top => Some(SeriesLabelPosition::UpperMiddle),
        LegendPosition::Bottom => Some(SeriesLabelPosition::LowerMiddle),
    }
}

/// Min and max of the finite values
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn x_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    match bounds(values) {
        Some((min, max)) if max > min => (min, max),
        Some((min, _)) => (min, min + 1.0),
        None => (0.0, 1.0),
    }
}

/// Y-axis range with 10% padding. Values are clamped to `±Y_LIMIT` first,
/// which keeps the span and the padding finite.
fn y_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let Some((min, max)) = bounds(values.map(|v| v.clamp(-Y_LIMIT, Y_LIMIT))) else {
        return (0.0, 1.0);
    };
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.1;
    (min - pad, max + pad)
}

/// Catmull-Rom interpolation through every point
fn smooth(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(last * SMOOTH_STEPS + 1);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        for step in 0..SMOOTH_STEPS {
            let t = step as f64 / SMOOTH_STEPS as f64;
            out.push((
                catmull_rom(p0.0, p1.0, p2.0, p3.0, t),
                catmull_rom(p0.1, p1.1, p2.1, p3.1, t),
            ));
        }
    }
    out.push(points[last]);
    out
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::table::ColumnType;

    fn table_of(label: &str, values: &[f64]) -> DataTable {
        let mut table = DataTable::new();
        table.add_column(ColumnType::Number, "Time");
        table.add_column(ColumnType::Number, label);
        table.add_empty_rows(values.len());
        let time: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        table.set_column(0, &time).unwrap();
        table.set_column(1, values).unwrap();
        table
    }

    fn ramp_table(n: usize) -> DataTable {
        let values: Vec<f64> = (0..n).map(|i| (i * i) as f64).collect();
        table_of("ecg", &values)
    }

    #[test]
    fn test_render_contains_title_and_line() {
        let svg = render_svg(&ramp_table(10), &ChartOptions::realtime("ecg")).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(">ecg</text>"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_smooth_passes_through_samples() {
        let points = [(0.0, 0.0), (1.0, 4.0), (2.0, 1.0), (3.0, 3.0)];
        let curve = smooth(&points);

        assert_eq!(curve.len(), 3 * SMOOTH_STEPS + 1);
        for (i, point) in points.iter().enumerate() {
            let on_curve = curve[i * SMOOTH_STEPS];
            assert!((on_curve.0 - point.0).abs() < 1e-9);
            assert!((on_curve.1 - point.1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_lines_are_not_smoothed() {
        let points = [(0.0, 1.0), (1.0, 2.0)];
        assert_eq!(smooth(&points), points.to_vec());
    }

    #[test]
    fn test_render_is_deterministic() {
        let table = ramp_table(50);
        let options = ChartOptions::realtime("breathing");
        assert_eq!(
            render_svg(&table, &options).unwrap(),
            render_svg(&table, &options).unwrap()
        );
    }

    #[test]
    fn test_legend_hidden_by_default() {
        let svg = render_svg(&ramp_table(5), &ChartOptions::realtime("rr")).unwrap();
        assert!(!svg.contains(">ecg</text>"));

        let options = ChartOptions::realtime("rr").legend(LegendPosition::Right);
        let svg = render_svg(&ramp_table(5), &options).unwrap();
        assert!(svg.contains(">ecg</text>"));
    }

    #[test]
    fn test_flat_series_renders() {
        let table = table_of("heart_rate", &[0.0; 4]);

        let svg = render_svg(&table, &ChartOptions::realtime("heart_rate")).unwrap();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn test_extreme_values_render() {
        let table = table_of("ecg", &[-1.5e308, 1.5e308, 0.0]);

        let svg = render_svg(&table, &ChartOptions::realtime("ecg")).unwrap();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_y_range_stays_finite() {
        let (lo, hi) = y_range([-1.5e308, 1.5e308].into_iter());
        assert!(lo.is_finite() && hi.is_finite());
        assert!((hi - lo).is_finite());
        assert!(lo < -Y_LIMIT && hi > Y_LIMIT);

        assert_eq!(y_range(std::iter::empty()), (0.0, 1.0));
        assert_eq!(y_range([5.0, 5.0].into_iter()), (4.0, 6.0));

        let (lo, hi) = y_range([0.0, 10.0].into_iter());
        assert_eq!((lo, hi), (-1.0, 11.0));
    }
}
