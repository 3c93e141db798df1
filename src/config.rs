//! Configuration for the proxy pool.

/// Scheme assumed for list entries written as bare `host:port`.
pub const DEFAULT_SCHEME: &str = "socks5";

/// Configuration for the proxy pool.
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// Proxy addresses to seed the pool with.
    pub proxies: Vec<String>,
    /// Source URLs or file paths to fetch proxy lists from.
    pub sources: Vec<String>,
    /// Maximum number of simultaneously busy proxies, 0 for no limit.
    pub max_busy: usize,
    /// Scheme prepended to addresses given without one.
    pub default_scheme: String,
}

impl ProxyPoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProxyPoolConfigBuilder {
        ProxyPoolConfigBuilder::new()
    }
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        ProxyPoolConfigBuilder::new().build()
    }
}

/// Builder for `ProxyPoolConfig`.
pub struct ProxyPoolConfigBuilder {
    proxies: Vec<String>,
    sources: Vec<String>,
    max_busy: Option<usize>,
    default_scheme: Option<String>,
}

impl ProxyPoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            proxies: Vec::new(),
            sources: Vec::new(),
            max_busy: None,
            default_scheme: None,
        }
    }

    /// Set the proxy addresses to seed the pool with.
    pub fn proxies(mut self, proxies: Vec<impl Into<String>>) -> Self {
        self.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the source URLs or file paths to fetch proxy lists from.
    pub fn sources(mut self, sources: Vec<impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum number of simultaneously busy proxies.
    pub fn max_busy(mut self, max_busy: usize) -> Self {
        self.max_busy = Some(max_busy);
        self
    }

    /// Set the scheme used for addresses given as bare `host:port`.
    pub fn default_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.default_scheme = Some(scheme.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ProxyPoolConfig {
        ProxyPoolConfig {
            proxies: self.proxies,
            sources: self.sources,
            max_busy: self.max_busy.unwrap_or(0),
            default_scheme: self
                .default_scheme
                .unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
        }
    }
}

impl Default for ProxyPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProxyPoolConfig::default();
        assert!(config.proxies.is_empty());
        assert!(config.sources.is_empty());
        assert_eq!(config.max_busy, 0);
        assert_eq!(config.default_scheme, "socks5");
    }

    #[test]
    fn builder_overrides() {
        let config = ProxyPoolConfig::builder()
            .proxies(vec!["127.0.0.1:8080"])
            .sources(vec!["proxies.txt"])
            .max_busy(2)
            .default_scheme("http")
            .build();
        assert_eq!(config.proxies, vec!["127.0.0.1:8080".to_string()]);
        assert_eq!(config.sources, vec!["proxies.txt".to_string()]);
        assert_eq!(config.max_busy, 2);
        assert_eq!(config.default_scheme, "http");
    }
}
