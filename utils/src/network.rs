use std::{collections::BTreeMap, fmt::Display};

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    disk_storage::{DiskStorageInterface, FileFormat},
};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub name: String,
    pub name_alchemy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_aliases: Vec<String>,
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    pub rpc_alchemy: Option<String>,
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (chain_id: {})", self.name, self.chain_id)
    }
}

impl Network {
    pub fn get_rpc(&self, config: &Config) -> crate::Result<String> {
        if let Some(rpc_url) = &self.rpc_url {
            Ok(rpc_url.clone())
        } else if let Some(rpc_alchemy) = &self.rpc_alchemy {
            Ok(rpc_alchemy.replace("{}", config.alchemy_api_key()?))
        } else if let Some(name_alchemy) = &self.name_alchemy {
            Ok(format!(
                "https://{}.g.alchemy.com/v2/{}",
                name_alchemy,
                config.alchemy_api_key()?
            ))
        } else {
            Err(crate::Error::RpcUrlNotFound {
                network: self.name.clone(),
                chain_id: self.chain_id,
            })
        }
    }

    pub fn get_provider(&self, config: &Config) -> crate::Result<DynProvider> {
        let rpc_url = self.get_rpc(config)?;

        rpc_url
            .parse()
            .map_err(|e| crate::Error::UrlParsingFailed(rpc_url, e))
            .map(|rpc_url| ProviderBuilder::new().connect_http(rpc_url).erased())
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name == name
            || self.name_alchemy.as_deref() == Some(name)
            || self.name_aliases.iter().any(|alias| alias == name)
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NetworkStore {
    pub networks: Vec<Network>,
}

impl DiskStorageInterface for NetworkStore {
    const FILE_NAME: &'static str = "networks";
    const FORMAT: FileFormat = FileFormat::YAML;
}

impl NetworkStore {
    /// Built-in networks, with entries from the networks file overriding them by chain id.
    pub fn load_merged() -> crate::Result<Self> {
        Ok(Self::merge(default_networks(), NetworkStore::load()?.networks))
    }

    fn merge(defaults: Vec<Network>, overrides: Vec<Network>) -> Self {
        let mut networks = BTreeMap::<u64, Network>::new();

        for entry in defaults.into_iter().chain(overrides) {
            let entry = match networks.remove(&entry.chain_id) {
                Some(existing) => Network {
                    name: entry.name,
                    name_alchemy: entry.name_alchemy.or(existing.name_alchemy),
                    name_aliases: {
                        let mut aliases = entry.name_aliases;
                        for alias in existing.name_aliases {
                            if !aliases.contains(&alias) {
                                aliases.push(alias);
                            }
                        }
                        aliases
                    },
                    chain_id: entry.chain_id,
                    rpc_url: entry.rpc_url.or(existing.rpc_url),
                    rpc_alchemy: entry.rpc_alchemy.or(existing.rpc_alchemy),
                },
                None => entry,
            };
            networks.insert(entry.chain_id, entry);
        }

        NetworkStore {
            networks: networks.into_values().collect(),
        }
    }

    pub fn get_by_name(&self, network_name: &str) -> crate::Result<Network> {
        self.networks
            .iter()
            .find(|n| n.matches_name(network_name))
            .cloned()
            .ok_or_else(|| crate::Error::NetworkNotFound(network_name.to_string()))
    }
}

fn default_networks() -> Vec<Network> {
    vec![
        Network {
            name: "ethereum".to_string(),
            name_alchemy: Some("eth-mainnet".to_string()),
            name_aliases: vec!["mainnet".to_string()],
            chain_id: 1,
            rpc_url: None,
            rpc_alchemy: None,
        },
        Network {
            name: "polygon".to_string(),
            name_alchemy: Some("polygon-mainnet".to_string()),
            name_aliases: vec!["matic".to_string()],
            chain_id: 137,
            rpc_url: None,
            rpc_alchemy: None,
        },
    ]
}
