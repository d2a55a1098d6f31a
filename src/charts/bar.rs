use super::svg::Svg;
use super::{clamp_non_negative, PALETTE};

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 40.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 30.0;

/// Scales values to `[0, max_height]` against the local maximum.
/// An all-zero (or empty) input scales against 1 so every bar is flat.
pub fn bar_heights(values: &[f64], max_height: f64) -> Vec<f64> {
    let clean: Vec<f64> = values.iter().map(|v| clamp_non_negative(*v)).collect();
    let max = clean.iter().cloned().fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { max } else { 1.0 };
    clean.iter().map(|v| v / scale * max_height).collect()
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn axes(svg: &mut Svg, title: &str) {
    let baseline = HEIGHT - MARGIN_BOTTOM;
    svg.text(WIDTH / 2.0, 18.0, "middle", 14, title);
    svg.line(MARGIN_LEFT, baseline, WIDTH - MARGIN_RIGHT, baseline, "#999");
    svg.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, baseline, "#999");
}

/// One bar per label
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub color: String,
}

impl BarChart {
    pub fn new(title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            title: title.into(),
            labels,
            values,
            color: PALETTE[0].to_string(),
        }
    }

    pub fn render(&self) -> String {
        let mut svg = Svg::new(WIDTH, HEIGHT);
        axes(&mut svg, &self.title);

        let heights = bar_heights(&self.values, plot_height());
        let count = heights.len().max(1) as f64;
        let slot = plot_width() / count;
        let bar_width = slot * 0.7;
        let baseline = HEIGHT - MARGIN_BOTTOM;

        for (i, height) in heights.iter().enumerate() {
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
            svg.rect(x, baseline - height, bar_width, *height, &self.color);
            if let Some(label) = self.labels.get(i) {
                svg.text(x + bar_width / 2.0, baseline + 15.0, "middle", 10, label);
            }
        }

        svg.finish()
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub color: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, color: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            values,
        }
    }
}

/// Side-by-side bars per label, all series sharing one scale
#[derive(Debug, Clone)]
pub struct GroupedBarChart {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl GroupedBarChart {
    pub fn new(title: impl Into<String>, labels: Vec<String>, series: Vec<Series>) -> Self {
        Self {
            title: title.into(),
            labels,
            series,
        }
    }

    pub fn render(&self) -> String {
        let mut svg = Svg::new(WIDTH, HEIGHT);
        axes(&mut svg, &self.title);

        // Scale all series together so bars are comparable across groups
        let flat: Vec<f64> = self.series.iter().flat_map(|s| s.values.iter().cloned()).collect();
        let heights = bar_heights(&flat, plot_height());

        let groups = self.labels.len().max(1) as f64;
        let slot = plot_width() / groups;
        let bar_width = slot * 0.8 / self.series.len().max(1) as f64;
        let baseline = HEIGHT - MARGIN_BOTTOM;

        let mut offset = 0;
        for (s, series) in self.series.iter().enumerate() {
            for (i, _) in series.values.iter().enumerate() {
                let height = heights[offset + i];
                let x = MARGIN_LEFT + slot * i as f64 + slot * 0.1 + bar_width * s as f64;
                svg.rect(x, baseline - height, bar_width, height, &series.color);
            }
            offset += series.values.len();

            let legend_x = WIDTH - MARGIN_RIGHT - 110.0;
            let legend_y = MARGIN_TOP + 14.0 * s as f64;
            svg.rect(legend_x, legend_y - 8.0, 10.0, 10.0, &series.color);
            svg.text(legend_x + 14.0, legend_y, "start", 10, &series.name);
        }

        for (i, label) in self.labels.iter().enumerate() {
            svg.text(MARGIN_LEFT + slot * (i as f64 + 0.5), baseline + 15.0, "middle", 10, label);
        }

        svg.finish()
    }
}
