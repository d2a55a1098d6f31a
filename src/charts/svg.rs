use std::fmt::Write;

/// Minimal string builder for standalone SVG documents
#[derive(Debug, Clone)]
pub struct Svg {
    width: f64,
    height: f64,
    body: String,
}

impl Svg {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) -> &mut Self {
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            x, y, width, height, fill
        );
        self
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) -> &mut Self {
        let _ = write!(
            self.body,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
            x1, y1, x2, y2, stroke
        );
        self
    }

    pub fn path(&mut self, d: &str, fill: &str) -> &mut Self {
        let _ = write!(self.body, r#"<path d="{}" fill="{}"/>"#, d, fill);
        self
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str) -> &mut Self {
        let pts: Vec<String> = points.iter().map(|(x, y)| format!("{:.2},{:.2}", x, y)).collect();
        let _ = write!(
            self.body,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-linecap="round"/>"#,
            pts.join(" "),
            stroke
        );
        self
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) -> &mut Self {
        let _ = write!(
            self.body,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            cx, cy, r, fill
        );
        self
    }

    pub fn text(&mut self, x: f64, y: f64, anchor: &str, size: u32, content: &str) -> &mut Self {
        let _ = write!(
            self.body,
            r##"<text x="{:.2}" y="{:.2}" text-anchor="{}" font-size="{}" fill="#333">{}</text>"##,
            x,
            y,
            anchor,
            size,
            escape(content)
        );
        self
    }

    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

/// Escapes text for use in SVG/HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("R&D <\"x\">"), "R&amp;D &lt;&quot;x&quot;&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_document_shape() {
        let mut svg = Svg::new(100.0, 50.0);
        svg.rect(0.0, 10.0, 5.0, 40.0, "#4e79a7").text(2.5, 8.0, "middle", 10, "a<b");
        let out = svg.finish();
        assert!(out.starts_with("<svg"));
        assert!(out.ends_with("</svg>"));
        assert!(out.contains(r#"viewBox="0 0 100 50""#));
        assert!(out.contains("a&lt;b"));
        assert!(out.contains(r#"height="40.00""#));
    }
}
