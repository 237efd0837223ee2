//! TOML configuration: admission policy, AES keys and output behaviour.
//!
//! ```toml
//! discovery = false
//! filter_duplicates = true
//! report_unknown = "BTHome"
//! sensor_whitelist = ["54:48:E6:8F:80:A5"]
//! tracker_whitelist = []
//!
//! [aes_keys]
//! "54:48:E6:8F:80:A5" = "231d39c1d7cc1ab1aee224cd096db932"
//! ```

use crate::crypto::EncryptionKeys;
use crate::mac_address::MacAddress;
use crate::parser::BleParser;
use crate::policy::Policy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid AES key for {mac}: {reason}")]
    InvalidKey { mac: MacAddress, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Admit every device; when off only whitelisted addresses are decoded
    pub discovery: bool,
    /// Drop repeated advertisements that carry the same packet id
    pub filter_duplicates: bool,
    pub sensor_whitelist: Vec<MacAddress>,
    pub tracker_whitelist: Vec<MacAddress>,
    /// 32 hex characters per device
    pub aes_keys: BTreeMap<MacAddress, String>,
    /// Vendor label (or "Other") whose unrecognised adverts are logged
    pub report_unknown: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: true,
            filter_duplicates: false,
            sensor_whitelist: Vec::new(),
            tracker_whitelist: Vec::new(),
            aes_keys: BTreeMap::new(),
            report_unknown: None,
        }
    }
}

fn parse_key(mac: MacAddress, key: &str) -> Result<[u8; 16], ConfigError> {
    let mut bytes = [0u8; 16];
    hex::decode_to_slice(key.trim(), &mut bytes).map_err(|e| ConfigError::InvalidKey {
        mac,
        reason: e.to_string(),
    })?;
    Ok(bytes)
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn policy(&self) -> Policy {
        Policy::new(
            self.discovery,
            self.sensor_whitelist.iter().copied(),
            self.tracker_whitelist.iter().copied(),
        )
    }

    pub fn encryption_keys(&self) -> Result<EncryptionKeys, ConfigError> {
        self.aes_keys
            .iter()
            .map(|(mac, key)| Ok((*mac, parse_key(*mac, key)?)))
            .collect()
    }

    /// Build the shared parser described by this configuration.
    pub fn build_parser(&self) -> Result<BleParser, ConfigError> {
        let parser = BleParser::new(self.policy(), self.encryption_keys()?);
        Ok(match &self.report_unknown {
            Some(label) => parser.with_report_unknown(label.clone()),
            None => parser,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Category;
    use crate::policy::Admission;
    use crate::test_utils::{BTHOME_KEY, BTHOME_MAC, TEST_MAC};

    const FULL: &str = r#"
        discovery = false
        filter_duplicates = true
        report_unknown = "Other"
        sensor_whitelist = ["54:48:E6:8F:80:A5"]
        tracker_whitelist = ["aabbccddeeff"]

        [aes_keys]
        "54:48:E6:8F:80:A5" = "231d39c1d7cc1ab1aee224cd096db932"
    "#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.discovery);
        assert!(!config.filter_duplicates);
        assert!(config.encryption_keys().unwrap().is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(FULL).unwrap();
        assert!(!config.discovery);
        assert!(config.filter_duplicates);
        assert_eq!(config.report_unknown.as_deref(), Some("Other"));
        assert_eq!(config.sensor_whitelist, vec![BTHOME_MAC]);
        assert_eq!(config.tracker_whitelist, vec![TEST_MAC]);

        let keys = config.encryption_keys().unwrap();
        assert_eq!(keys.get(&BTHOME_MAC), Some(&BTHOME_KEY));

        let policy = config.policy();
        assert_eq!(policy.admit(&BTHOME_MAC, Category::Sensor), Admission::Admit);
        assert_eq!(policy.admit(&TEST_MAC, Category::Sensor), Admission::Reject);
        assert_eq!(policy.admit(&TEST_MAC, Category::Tracker), Admission::Admit);
    }

    #[test]
    fn test_build_parser() {
        let parser = Config::from_toml(FULL).unwrap().build_parser().unwrap();
        assert!(!parser.policy().is_discovery());
    }

    #[test]
    fn test_invalid_key() {
        let config = Config::from_toml(
            r#"
            [aes_keys]
            "54:48:E6:8F:80:A5" = "231d39"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.encryption_keys(),
            Err(ConfigError::InvalidKey { mac, .. }) if mac == BTHOME_MAC
        ));
    }

    #[test]
    fn test_invalid_mac_and_unknown_field() {
        assert!(Config::from_toml(r#"sensor_whitelist = ["not a mac"]"#).is_err());
        assert!(Config::from_toml("discovry = false").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/bleparser.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
