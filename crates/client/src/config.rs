use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str = concat!("micro-client/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Settings shared by every request of a [`HttpClient`](crate::HttpClient).
///
/// Deserializable, every missing field takes its default:
///
/// ```
/// use micro_client::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{ "timeout_ms": 2500, "follow_redirects": false }"#).unwrap();
/// assert_eq!(config.timeout().as_millis(), 2500);
/// assert!(!config.follow_redirects());
/// assert_eq!(config.max_redirects(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    user_agent: String,
    /// Bound on one request/response exchange, redirects are bounded separately
    timeout_ms: u64,
    follow_redirects: bool,
    max_redirects: usize,
    read_buffer_size: usize,
    /// Media ranges whose bodies are kept as text, `type/*` matches any subtype
    text_types: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            text_types: vec![
                "text/*".to_string(),
                "application/json".to_string(),
                "application/xml".to_string(),
                "application/javascript".to_string(),
            ],
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_follow_redirects(mut self, follow_redirects: bool) -> Self {
        self.follow_redirects = follow_redirects;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets the initial read buffer, zero falls back to the default
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = if size == 0 { DEFAULT_READ_BUFFER_SIZE } else { size };
        self
    }

    pub fn with_text_types<I, S>(mut self, text_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_types = text_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    pub fn read_buffer_size(&self) -> usize {
        if self.read_buffer_size == 0 { DEFAULT_READ_BUFFER_SIZE } else { self.read_buffer_size }
    }

    pub fn text_types(&self) -> &[String] {
        &self.text_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();

        assert!(config.user_agent().starts_with("micro-client/"));
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.follow_redirects());
        assert_eq!(config.max_redirects(), 10);
        assert!(config.text_types().iter().any(|t| t == "text/*"));
    }

    #[test]
    fn builder() {
        let config = ClientConfig::new()
            .with_user_agent("probe/1.0")
            .with_timeout(Duration::from_millis(1500))
            .with_max_redirects(2)
            .with_read_buffer_size(0)
            .with_text_types(["text/html"]);

        assert_eq!(config.user_agent(), "probe/1.0");
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.max_redirects(), 2);
        assert_eq!(config.read_buffer_size(), DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(config.text_types(), ["text/html"]);
    }

    #[test]
    fn deserialize_partial() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "user_agent": "bot", "max_redirects": 0, "text_types": ["application/json"] }"#).unwrap();

        assert_eq!(config.user_agent(), "bot");
        assert_eq!(config.max_redirects(), 0);
        assert_eq!(config.text_types(), ["application/json"]);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }
}
