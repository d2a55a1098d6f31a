use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

impl BannerKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            BannerKind::Error => "error-message",
            BannerKind::Success => "success-message",
        }
    }
}

/// A message that hides itself `ttl` after it was shown.
/// Visibility is computed when asked, so nothing needs to fire later.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Banner {
    pub fn error(message: impl Into<String>, ttl: Duration) -> Self {
        Self::new(BannerKind::Error, message, ttl)
    }

    pub fn success(message: impl Into<String>, ttl: Duration) -> Self {
        Self::new(BannerKind::Success, message, ttl)
    }

    fn new(kind: BannerKind, message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.ttl
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible_at(Instant::now())
    }
}

/// One dashboard panel: its data, a loading flag and an error banner
#[derive(Debug, Clone)]
pub struct Panel<T> {
    pub data: T,
    pub loading: bool,
    error: Option<Banner>,
}

impl<T> Panel<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            loading: false,
            error: None,
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>, ttl: Duration) {
        self.error = Some(Banner::error(message, ttl));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The error banner, if one is still within its display window
    pub fn visible_error(&self) -> Option<&Banner> {
        self.error.as_ref().filter(|b| b.is_visible())
    }
}

impl<T: Default> Default for Panel<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_expires() {
        let banner = Banner::error("Failed to load portfolio. Please try again.", Duration::from_secs(5));
        let shown = banner.shown_at;
        assert!(banner.is_visible_at(shown));
        assert!(banner.is_visible_at(shown + Duration::from_millis(4999)));
        assert!(!banner.is_visible_at(shown + Duration::from_secs(5)));
        assert!(!banner.is_visible_at(shown + Duration::from_secs(60)));
    }

    #[test]
    fn test_panel_error_lifecycle() {
        let mut panel: Panel<Vec<u32>> = Panel::default();
        assert!(panel.visible_error().is_none());

        panel.show_error("boom", Duration::from_secs(5));
        assert_eq!(panel.visible_error().map(|b| b.message.as_str()), Some("boom"));
        assert_eq!(panel.visible_error().map(|b| b.kind), Some(BannerKind::Error));

        panel.clear_error();
        assert!(panel.visible_error().is_none());

        panel.show_error("gone", Duration::ZERO);
        assert!(panel.visible_error().is_none());
    }
}
