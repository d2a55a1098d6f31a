use super::svg::Svg;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 240.0;
const PAD: f64 = 24.0;

const UP: &str = "#59a14f";
const DOWN: &str = "#e15759";

/// Price history as a single polyline, green when the last close is at or
/// above the first and red otherwise
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub values: Vec<f64>,
}

impl LineChart {
    pub fn new(title: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            title: title.into(),
            values,
        }
    }

    /// Maps values onto the plot area. A flat series sits on the middle line.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let clean: Vec<f64> = self.values.iter().cloned().filter(|v| v.is_finite()).collect();
        if clean.is_empty() {
            return Vec::new();
        }

        let min = clean.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = clean.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        let plot_w = WIDTH - 2.0 * PAD;
        let plot_h = HEIGHT - 2.0 * PAD;
        let step = if clean.len() > 1 { plot_w / (clean.len() - 1) as f64 } else { 0.0 };

        clean
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let y = if range > 0.0 {
                    PAD + plot_h - (v - min) / range * plot_h
                } else {
                    PAD + plot_h / 2.0
                };
                (PAD + step * i as f64, y)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let mut svg = Svg::new(WIDTH, HEIGHT);
        svg.text(WIDTH / 2.0, 16.0, "middle", 13, &self.title);

        let points = self.points();
        if points.is_empty() {
            svg.text(WIDTH / 2.0, HEIGHT / 2.0, "middle", 12, "No data");
            return svg.finish();
        }

        let rising = match (self.values.first(), self.values.last()) {
            (Some(first), Some(last)) => last >= first,
            _ => true,
        };
        svg.polyline(&points, if rising { UP } else { DOWN });
        svg.finish()
    }
}
