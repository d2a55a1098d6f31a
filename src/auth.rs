use axum::http::{header::COOKIE, HeaderMap};

/// Session cookies set by the login flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCookies {
    pub id_token: Option<String>,
    pub local_id: Option<String>,
    pub session: Option<String>,
}

impl AuthCookies {
    /// Parses a `Cookie` header value (`a=1; b=2`)
    pub fn parse(header: &str) -> Self {
        let mut cookies = Self::default();
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.trim() {
                "idToken" => cookies.id_token = Some(value.to_string()),
                "localId" => cookies.local_id = Some(value.to_string()),
                "session" => cookies.session = Some(value.to_string()),
                _ => {}
            }
        }
        cookies
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let joined: Vec<&str> = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        Self::parse(&joined.join("; "))
    }

    /// Live data is only fetched when both tokens are present
    pub fn is_authenticated(&self) -> bool {
        self.id_token.is_some() && self.local_id.is_some()
    }
}
