use url::Url;

/// Query parameters that name the endpoint directly, checked in this order.
const KEY_PARAMS: &[&str] = &["LAYERS", "layers", "layer"];

/// Base used for relative request ids when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Derives the grouping key for a raw request id (a URL-like string).
///
/// Priority: `LAYERS` / `layers` / `layer` query value, then the last
/// non-empty path segment, then the host name. Anything that does not
/// parse comes back unchanged.
#[derive(Debug, Clone)]
pub struct EndpointKeyResolver {
    base: Option<Url>,
}

impl Default for EndpointKeyResolver {
    fn default() -> Self {
        Self::new(Some(DEFAULT_BASE_URL))
    }
}

impl EndpointKeyResolver {
    /// An unparseable `base` is treated as no base at all.
    pub fn new(base: Option<&str>) -> Self {
        Self {
            base: base.and_then(|b| Url::parse(b).ok()),
        }
    }

    /// Resolver without a base: relative ids fall back to the raw input.
    pub fn without_base() -> Self {
        Self { base: None }
    }

    pub fn resolve(&self, raw_id: &str) -> String {
        self.try_resolve(raw_id)
            .unwrap_or_else(|| raw_id.to_string())
    }

    fn try_resolve(&self, raw_id: &str) -> Option<String> {
        let url = self.parse(raw_id)?;

        // ── 1. Explicit layer parameter ─────────────────────────
        for name in KEY_PARAMS {
            let value = url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned());
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                return Some(v);
            }
        }

        // ── 2. Last path segment ────────────────────────────────
        if let Some(segment) = url.path().split('/').filter(|s| !s.is_empty()).last() {
            return Some(segment.to_string());
        }

        // ── 3. Host name ────────────────────────────────────────
        url.host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_string)
    }

    fn parse(&self, raw_id: &str) -> Option<Url> {
        // The url parser silently percent-encodes spaces and strips
        // control characters; such input is not a request id.
        if raw_id.is_empty() || raw_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }

        match Url::parse(raw_id) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.as_ref().and_then(|base| base.join(raw_id).ok())
            }
            Err(_) => None,
        }
    }
}
