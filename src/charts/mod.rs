//! Hand-drawn SVG charts
//!
//! Geometry is computed here and serialized as standalone SVG strings. Every
//! render produces a fresh document.

pub mod bar;
pub mod line;
pub mod pie;
pub mod svg;

pub use bar::{bar_heights, BarChart, GroupedBarChart, Series};
pub use line::LineChart;
pub use pie::{arc_path, pie_slices, PieChart, Slice};
pub use svg::{escape, Svg};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const PALETTE: [&str; 8] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
];

/// Negative and non-finite values chart as zero
pub(crate) fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
