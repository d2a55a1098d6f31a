use std::f64::consts::PI;

use super::svg::Svg;
use crate::format::format_percentage;
use super::{clamp_non_negative, PALETTE};

const WIDTH: f64 = 420.0;
const HEIGHT: f64 = 300.0;
const RADIUS: f64 = 110.0;
const CENTER_X: f64 = 140.0;
const CENTER_Y: f64 = 160.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub start_angle: f64,
    pub angle: f64,
}

impl Slice {
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.angle
    }
}

/// Slice angles are `value / total * 2π` with a running start angle.
/// A zero total is floored to 1, which yields zero-angle slices.
pub fn pie_slices(entries: &[(String, f64)]) -> Vec<Slice> {
    let values: Vec<f64> = entries.iter().map(|(_, v)| clamp_non_negative(*v)).collect();
    let sum: f64 = values.iter().sum();
    let total = if sum > 0.0 { sum } else { 1.0 };

    let mut start = 0.0;
    entries
        .iter()
        .zip(values)
        .map(|((label, _), value)| {
            let angle = value / total * 2.0 * PI;
            let slice = Slice {
                label: label.clone(),
                value,
                start_angle: start,
                angle,
            };
            start += angle;
            slice
        })
        .collect()
}

/// Path commands for one wedge; angles measured clockwise from 12 o'clock
pub fn arc_path(cx: f64, cy: f64, r: f64, start: f64, end: f64) -> String {
    let (x1, y1) = (cx + r * start.sin(), cy - r * start.cos());
    let (x2, y2) = (cx + r * end.sin(), cy - r * end.cos());
    let large_arc = if end - start > PI { 1 } else { 0 };
    format!(
        "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z",
        cx, cy, x1, y1, r, r, large_arc, x2, y2
    )
}

#[derive(Debug, Clone)]
pub struct PieChart {
    pub title: String,
    pub entries: Vec<(String, f64)>,
}

impl PieChart {
    pub fn new(title: impl Into<String>, entries: Vec<(String, f64)>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }

    pub fn render(&self) -> String {
        let mut svg = Svg::new(WIDTH, HEIGHT);
        svg.text(WIDTH / 2.0, 20.0, "middle", 14, &self.title);

        let slices = pie_slices(&self.entries);
        let total: f64 = slices.iter().map(|s| s.value).sum();

        if total <= 0.0 {
            svg.circle(CENTER_X, CENTER_Y, RADIUS, "#e0e0e0");
        }

        for (i, slice) in slices.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            if slice.angle >= 2.0 * PI - 1e-9 {
                svg.circle(CENTER_X, CENTER_Y, RADIUS, color);
            } else if slice.angle > 0.0 {
                let d = arc_path(CENTER_X, CENTER_Y, RADIUS, slice.start_angle, slice.end_angle());
                svg.path(&d, color);
            }

            let legend_y = 60.0 + 18.0 * i as f64;
            let share = if total > 0.0 { slice.value / total * 100.0 } else { 0.0 };
            svg.rect(WIDTH - 150.0, legend_y - 10.0, 12.0, 12.0, color);
            svg.text(
                WIDTH - 132.0,
                legend_y,
                "start",
                11,
                &format!("{} ({})", slice.label, format_percentage(share)),
            );
        }

        svg.finish()
    }
}
