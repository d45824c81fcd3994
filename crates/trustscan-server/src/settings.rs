use serde::Deserialize;
use trustscan_core::Vendor;

use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: HttpCfg,
    pub surrealdb: crate::db::SurrealdbCfg,
    #[serde(default)]
    pub trust: TrustCfg,
}

#[derive(Debug, Deserialize)]
pub struct HttpCfg {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrustCfg {
    // Vendor bundle paths, one PEM file per vendor
    pub chromium_store_path: String,
    pub mozilla_store_path: String,
    pub msft_store_path: String,

    // Probing settings
    pub probe_timeout_ms: u64,
    pub max_concurrent_probes: usize,
}

impl Default for TrustCfg {
    fn default() -> Self {
        Self {
            chromium_store_path: "./stores/chromium_root_store.pem".to_string(),
            mozilla_store_path: "./stores/mozilla_root_store.pem".to_string(),
            msft_store_path: "./stores/msft_root_store.pem".to_string(),
            probe_timeout_ms: 3000,
            max_concurrent_probes: 8,
        }
    }
}

impl TrustCfg {
    pub fn bundle_path(&self, vendor: Vendor) -> &str {
        match vendor {
            Vendor::GoogleChrome => &self.chromium_store_path,
            Vendor::MozillaFirefox => &self.mozilla_store_path,
            Vendor::MicrosoftEdge => &self.msft_store_path,
        }
    }
}

impl Settings {
    pub fn load(config_path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(config_path)?;
        Ok(toml::from_str(&text)?)
    }
}
