//! Gateway configuration.

use std::time::Duration;

use fiber_core::coin::CoinConfig;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a gateway finds its node and which network it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Node address as `host:port`, without scheme.
    pub node_addr: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Network constants.
    pub coin: CoinConfig,
}

impl GatewayConfig {
    pub fn new(node_addr: impl Into<String>, coin: CoinConfig) -> Self {
        Self {
            node_addr: node_addr.into(),
            timeout: DEFAULT_TIMEOUT,
            coin,
        }
    }

    /// Full URL of a node API path such as `/outputs`.
    pub fn url(&self, path: &str) -> String {
        let addr = self.node_addr.trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            format!("{addr}{path}")
        } else {
            format!("http://{addr}{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_adds_scheme() {
        let cfg = GatewayConfig::new("127.0.0.1:6420", CoinConfig::new("skycoin", "SKY"));
        assert_eq!(cfg.url("/outputs"), "http://127.0.0.1:6420/outputs");
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn url_keeps_explicit_scheme() {
        let cfg = GatewayConfig::new("https://node.example:443/", CoinConfig::new("mdl", "MDL"));
        assert_eq!(cfg.url("/balance"), "https://node.example:443/balance");
    }
}
