use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    disk_storage::{DiskStorageInterface, FileFormat},
    reqwest::parse_url,
};

pub const DEFAULT_PRICE_API_URL: &str = "http://localhost:3002/swap/v1";
pub const DEFAULT_NETWORK: &str = "polygon";
pub const DEFAULT_OUT_DIR: &str = "./csv";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub alchemy_api_key: Option<String>,
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alchemy_api_key: None,
            price_api_url: default_price_api_url(),
            network: default_network(),
            out_dir: default_out_dir(),
        }
    }
}

fn default_price_api_url() -> String {
    DEFAULT_PRICE_API_URL.to_string()
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUT_DIR)
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
    const FORMAT: FileFormat = FileFormat::TOML;
}

impl Config {
    pub fn alchemy_api_key(&self) -> crate::Result<&str> {
        self.alchemy_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(crate::Error::AlchemyApiKeyNotSet)
    }

    pub fn price_api_url(&self) -> crate::Result<Url> {
        parse_url(self.price_api_url.trim_end_matches('/'))
    }

    /// Values coming from the command line or environment win over the file.
    pub fn with_overrides(
        mut self,
        alchemy_api_key: Option<String>,
        price_api_url: Option<String>,
        out_dir: Option<PathBuf>,
    ) -> Self {
        if alchemy_api_key.is_some() {
            self.alchemy_api_key = alchemy_api_key;
        }
        if let Some(price_api_url) = price_api_url {
            self.price_api_url = price_api_url;
        }
        if let Some(out_dir) = out_dir {
            self.out_dir = out_dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = toml::from_str("alchemy_api_key = \"abc\"").unwrap();
        assert_eq!(config.alchemy_api_key().unwrap(), "abc");
        assert_eq!(config.price_api_url, DEFAULT_PRICE_API_URL);
        assert_eq!(config.network, DEFAULT_NETWORK);
        assert_eq!(config.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
    }

    #[test]
    fn test_empty_api_key_is_not_set() {
        let config = Config {
            alchemy_api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            config.alchemy_api_key(),
            Err(crate::Error::AlchemyApiKeyNotSet)
        ));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("key".to_string()),
            None,
            Some(PathBuf::from("/tmp/out")),
        );
        assert_eq!(config.alchemy_api_key.as_deref(), Some("key"));
        assert_eq!(config.price_api_url, DEFAULT_PRICE_API_URL);
        assert_eq!(config.out_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_price_api_url_strips_trailing_slash() {
        let config = Config::default().with_overrides(
            None,
            Some("http://prices.local/swap/v1/".to_string()),
            None,
        );
        assert_eq!(
            config.price_api_url().unwrap().as_str(),
            "http://prices.local/swap/v1"
        );
    }
}
