//! Chart display options

/// Line interpolation between samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveType {
    /// Straight segments
    None,
    /// Smoothed curve through every sample
    #[default]
    Function,
}

/// Where the legend is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPosition {
    #[default]
    None,
    Right,
    Top,
    Bottom,
}

/// Fixed display options for a line chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub title: String,
    pub curve_type: CurveType,
    pub legend: LegendPosition,
    pub width: u32,
    pub height: u32,
}

impl ChartOptions {
    /// Options used for every real-time series chart: smoothed, no legend
    pub fn realtime(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            curve_type: CurveType::Function,
            legend: LegendPosition::None,
            width: 800,
            height: 240,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn curve_type(mut self, curve_type: CurveType) -> Self {
        self.curve_type = curve_type;
        self
    }

    pub fn legend(mut self, legend: LegendPosition) -> Self {
        self.legend = legend;
        self
    }
}
