use std::fs;
use std::net::Ipv4Addr;

use anyhow::Result;
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::protocol::{DEFAULT_HELLOINT, DEFAULT_LSUINT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Interfaces to run the protocol on. Empty means: discover every
    /// non-loopback IPv4 interface on the host.
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    pub hello_interval: u16,
    pub lsu_interval: u16,
    /// Statically configured default gateway, reinstalled on every
    /// routing-table rebuild.
    #[serde(default)]
    pub default_gateway: Option<DefaultRouteConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub name: String,
    /// Interface address with prefix, e.g. "10.0.1.1/24".
    pub network: Ipv4Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRouteConfig {
    pub via: Ipv4Addr,
    pub dev: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            interfaces: vec![],
            hello_interval: DEFAULT_HELLOINT, // 5 seconds
            lsu_interval: DEFAULT_LSUINT,     // 30 seconds
            default_gateway: None,
        }
    }
}

impl RouterConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: RouterConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let config: RouterConfig = serde_json::from_str(
            r#"{
                "interfaces": [
                    {"name": "eth0", "network": "10.0.1.1/24"},
                    {"name": "eth1", "network": "10.0.2.1/24"}
                ],
                "hello_interval": 5,
                "lsu_interval": 30,
                "default_gateway": {"via": "10.0.1.254", "dev": "eth0"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.interfaces.len(), 2);
        assert_eq!(config.interfaces[0].network.ip(), Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(
            config.interfaces[0].network.mask(),
            Ipv4Addr::new(255, 255, 255, 0)
        );
        assert_eq!(config.default_gateway.unwrap().dev, "eth0");
    }

    #[test]
    fn defaults_match_the_protocol_constants() {
        let config = RouterConfig::default();
        assert_eq!(config.hello_interval, 5);
        assert_eq!(config.lsu_interval, 30);
        assert!(config.interfaces.is_empty());
    }
}
