//! Static configuration of a run: which addresses are charted, which of them
//! are token sets, known token decimals, tokens needing the precise pricing
//! path, and the historical blocks to sample.
//!
//! The built-in tables can be replaced by `~/.setchart/registry.yaml`.

use std::collections::HashSet;

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::disk_storage::{DiskStorageInterface, FileFormat};

/// Roughly one day of Polygon blocks.
pub const POLYGON_BLOCKS_PER_DAY: u64 = 37_565;

/// Upper bound on `BlockSchedule::count`, about 27 years of daily samples.
pub const MAX_SCHEDULE_COUNT: u64 = 10_000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackedAddress {
    pub symbol: String,
    pub address: Address,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KnownToken {
    pub address: Address,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Walks back from `anchor` in steps of `step`, producing `count` blocks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlockSchedule {
    pub anchor: u64,
    #[serde(default = "default_step")]
    pub step: u64,
    pub count: u64,
}

fn default_step() -> u64 {
    POLYGON_BLOCKS_PER_DAY
}

impl BlockSchedule {
    pub fn expand(&self) -> Vec<u64> {
        (0..self.count)
            .map_while(|i| {
                i.checked_mul(self.step)
                    .and_then(|offset| self.anchor.checked_sub(offset))
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Registry {
    pub tracked: Vec<TrackedAddress>,
    pub portfolios: Vec<Address>,
    #[serde(default)]
    pub known_tokens: Vec<KnownToken>,
    #[serde(default)]
    pub precision_required: Vec<Address>,
    #[serde(default)]
    pub blocks: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<BlockSchedule>,
}

impl DiskStorageInterface for Registry {
    const FILE_NAME: &'static str = "registry";
    const FORMAT: FileFormat = FileFormat::YAML;
}

impl Registry {
    pub fn is_portfolio(&self, address: &Address) -> bool {
        self.portfolios.contains(address)
    }

    pub fn is_precision_required(&self, address: &Address) -> bool {
        self.precision_required.contains(address)
    }

    pub fn known_token(&self, address: &Address) -> Option<&KnownToken> {
        self.known_tokens.iter().find(|t| &t.address == address)
    }

    /// Explicit blocks take priority over the schedule.
    pub fn block_list(&self) -> Vec<u64> {
        if !self.blocks.is_empty() {
            self.blocks.clone()
        } else {
            self.schedule
                .as_ref()
                .map(BlockSchedule::expand)
                .unwrap_or_default()
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &TrackedAddress> {
        self.tracked.iter().filter(|t| t.active)
    }

    /// Looks a tracked entry up by symbol (case-insensitive) or by address.
    pub fn find(&self, symbol_or_address: &str) -> Option<&TrackedAddress> {
        let by_address = setchart_common::address::parse_address(symbol_or_address).ok();
        self.tracked.iter().find(|t| {
            t.symbol.eq_ignore_ascii_case(symbol_or_address) || Some(t.address) == by_address
        })
    }

    pub fn validate(&self) -> crate::Result<()> {
        let mut symbols = HashSet::new();
        for entry in &self.tracked {
            if entry.symbol.trim().is_empty() {
                return Err(crate::Error::InvalidRegistry(format!(
                    "empty symbol for {}",
                    entry.address
                )));
            }
            if !symbols.insert(entry.symbol.to_ascii_uppercase()) {
                return Err(crate::Error::InvalidRegistry(format!(
                    "duplicate symbol {}",
                    entry.symbol
                )));
            }
        }

        if let Some(schedule) = &self.schedule {
            if schedule.step == 0 {
                return Err(crate::Error::InvalidRegistry(
                    "schedule step must be greater than zero".to_string(),
                ));
            }
            if schedule.count > MAX_SCHEDULE_COUNT {
                return Err(crate::Error::InvalidRegistry(format!(
                    "schedule count {} exceeds the maximum of {MAX_SCHEDULE_COUNT}",
                    schedule.count
                )));
            }
        }

        if self.block_list().is_empty() {
            return Err(crate::Error::InvalidRegistry(
                "no historical blocks configured".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        let tracked = |symbol: &str, address: Address, active: bool| TrackedAddress {
            symbol: symbol.to_string(),
            address,
            active,
        };
        let known = |address: Address, decimals: u8, symbol: &str| KnownToken {
            address,
            decimals,
            symbol: Some(symbol.to_string()),
        };

        Self {
            tracked: vec![
                tracked("BMI", address!("0xb4f78a05ab16cd3e6d0100112d0cc431942859bb"), false),
                tracked("BTBTC", address!("0x58f7c5707ba8e09b5e61cebe8821f65434372344"), true),
                tracked("BTETH", address!("0x07a79127182a1c303d11ecda951310ec1c2e1444"), true),
                tracked("BTMAT", address!("0xb87352b4c3eb9daed09cd4996dff85c122394912"), true),
                tracked("DBTC", address!("0xf2aa5ccea80c246a71e97b418173fcc956408d3f"), false),
                tracked("DETH", address!("0x72b467cacbdbec5918d8eec0371ca33e6fd42421"), false),
                tracked("DMATI", address!("0xab80a6e2909c8089ebd84f331c05bbefa3276cd2"), false),
                tracked("DMI", address!("0xb5253c58b8a361d9901922b23ec9fb9e7d38c98a"), false),
                tracked("DVI", address!("0x62135f85899d97aed95f4405d710208e68b99f39"), false),
                tracked("EIGHT", address!("0xd3c5406b4c0e7ef5d325f47fa6ee08371d100b2b"), false),
                tracked("EMI", address!("0xd3ef811331a98d24a2b2fb64cebeea5af31b2568"), false),
                tracked("FOMO", address!("0x3c0744e72abb3a312122c2118f01f9ee2eb79d43"), false),
                tracked("HORSE", address!("0x330ff0afe63f42eb478c92da79b0ce0c69070183"), false),
                tracked("KEV", address!("0x4315c720cad5aa41d7535902b58b015eea6f97b0"), false),
                tracked("MMI", address!("0xdfddd9811796f72ba32a031724f5b1403cd48b91"), false),
                tracked("MTBTC", address!("0x71b41b3b19aac53ca4063aec2d17fc3caeb38026"), true),
                tracked("MTETH", address!("0x72ca52512b93e8d67309af0c14c1a225bcbd3548"), true),
                tracked("PEI", address!("0x55a40b33cff2eb062e7aa76506b7de711f2b2aff"), false),
                tracked("QMB", address!("0xabcc2102065ba01c6df1a5a5a57158f452403b70"), true),
                tracked("QME", address!("0x9984d846a3dc77aa0488f3758976b149e8475995"), true),
                tracked("QMM", address!("0x20ab4cb8f8da39582bc92da954ab1bb128f4e244"), true),
                tracked("SMI", address!("0xad2b726fd2bd3a7f8f4b3929152438eba637ef19"), false),
                tracked("SSPOTS", address!("0x99dd5231314005f26ce147e50f9bac2365217fce"), false),
                tracked("SURF", address!("0xb656d21e3bfa5aed5405760b891ba539f4ceb976"), false),
                tracked("SWAP", address!("0x25ad32265c9354c29e145c902ae876f6b69806f2"), true),
                tracked("SWBYF", address!("0xe525deec6eb2566c29c272bb69eed2e8a46389dc"), true),
                tracked("SWD", address!("0xaee24d5296444c007a532696aada9de5ce6cafd0"), true),
                tracked("SWEYF", address!("0x8fcdd8372b5bcd27524546ad02b198c899d8ab2a"), true),
                tracked("SWMYF", address!("0x2c9227bf5fc806f94601ecaf5bc027cad801b3b6"), true),
                tracked("SWYF", address!("0xdc8d88d9e57cc7be548f76e5e413c4838f953018"), true),
                tracked("SWX", address!("0x24ec3c300ff53b96937c39b686844db9e471421e"), false),
                tracked("WETH", address!("0x7ceb23fd6bc0add59e62ac25578270cff1b9f619"), true),
                tracked("WBTC", address!("0x1bfd67037b42cf73acf2047067bd4f2c47d9bfd6"), true),
            ],
            portfolios: vec![
                address!("0x25ad32265c9354c29e145c902ae876f6b69806f2"), // alpha portfolio
                address!("0x71b41b3b19aac53ca4063aec2d17fc3caeb38026"), // macro trend btc
                address!("0x72ca52512b93e8d67309af0c14c1a225bcbd3548"), // macro trend eth
                address!("0xabcc2102065ba01c6df1a5a5a57158f452403b70"), // quantum momentum btc
                address!("0x9984d846a3dc77aa0488f3758976b149e8475995"), // quantum momentum eth
                address!("0x20ab4cb8f8da39582bc92da954ab1bb128f4e244"), // quantum momentum matic
                address!("0x58f7c5707ba8e09b5e61cebe8821f65434372344"), // buy the dip btc
                address!("0x07a79127182a1c303d11ecda951310ec1c2e1444"), // buy the dip eth
                address!("0xb87352b4c3eb9daed09cd4996dff85c122394912"), // buy the dip matic
                address!("0xf2aa5ccea80c246a71e97b418173fcc956408d3f"), // discretionary btc
                address!("0x72b467cacbdbec5918d8eec0371ca33e6fd42421"), // discretionary eth
                address!("0xab80a6e2909c8089ebd84f331c05bbefa3276cd2"), // discretionary matic
                address!("0x62135f85899d97aed95f4405d710208e68b99f39"), // defi value index
                address!("0xb4f78a05ab16cd3e6d0100112d0cc431942859bb"), // btc momentum index
                address!("0xd3ef811331a98d24a2b2fb64cebeea5af31b2568"), // eth momentum index
                address!("0xdfddd9811796f72ba32a031724f5b1403cd48b91"), // matic momentum index
                address!("0xb5253c58b8a361d9901922b23ec9fb9e7d38c98a"), // dpi momentum index
                address!("0xad2b726fd2bd3a7f8f4b3929152438eba637ef19"), // swd momentum index
                address!("0x55a40b33cff2eb062e7aa76506b7de711f2b2aff"), // polygon ecosystem index
            ],
            known_tokens: vec![
                known(address!("0x7ceb23fd6bc0add59e62ac25578270cff1b9f619"), 18, "WETH"),
                known(address!("0x1bfd67037b42cf73acf2047067bd4f2c47d9bfd6"), 8, "WBTC"),
                known(address!("0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"), 18, "WMATIC"),
                known(address!("0x2791bca1f2de4661ed88a30c99a7a9449aa84174"), 6, "USDC"),
                known(address!("0xc2132d05d31c914a87c6611c10748aeb04b58e8f"), 6, "USDT"),
                known(address!("0x8f3cf7ad23cd3cadbd9735aff958023239c6a063"), 18, "DAI"),
            ],
            precision_required: vec![
                address!("0x340f412860da7b7823df372a2b59ff78b7ae6abc"),
                address!("0x130ce4e4f76c2265f94a961d70618562de0bb8d2"),
                address!("0x4f025829c4b13df652f38abd2ab901185ff1e609"),
            ],
            blocks: vec![30_915_738],
            schedule: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = Registry::default();
        registry.validate().unwrap();

        assert_eq!(registry.portfolios.len(), 19);
        assert_eq!(registry.precision_required.len(), 3);
        assert_eq!(registry.block_list(), vec![30_915_738]);
    }

    #[test]
    fn test_active_entries() {
        let registry = Registry::default();
        let active: Vec<&str> = registry.active().map(|t| t.symbol.as_str()).collect();

        assert!(active.contains(&"BTBTC"));
        assert!(active.contains(&"WETH"));
        assert!(!active.contains(&"BMI"));
    }

    #[test]
    fn test_find_by_symbol_or_any_case_address() {
        let registry = Registry::default();

        let by_symbol = registry.find("mteth").unwrap();
        let by_address = registry
            .find("0x72Ca52512b93E8D67309aF0C14C1A225bcbd3548")
            .unwrap();

        assert_eq!(by_symbol, by_address);
        assert!(registry.is_portfolio(&by_symbol.address));
        assert!(registry.find("NOPE").is_none());
    }

    #[test]
    fn test_plain_tokens_are_not_portfolios() {
        let registry = Registry::default();
        let weth = registry.find("WETH").unwrap();

        assert!(!registry.is_portfolio(&weth.address));
        assert_eq!(registry.known_token(&weth.address).unwrap().decimals, 18);
    }

    #[test]
    fn test_schedule_expansion() {
        let schedule = BlockSchedule {
            anchor: 100,
            step: 30,
            count: 5,
        };
        assert_eq!(schedule.expand(), vec![100, 70, 40, 10]);

        let registry = Registry {
            blocks: vec![],
            schedule: Some(BlockSchedule {
                anchor: 1_000,
                step: 10,
                count: 3,
            }),
            ..Default::default()
        };
        assert_eq!(registry.block_list(), vec![1_000, 990, 980]);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_blocks() {
        let mut registry = Registry::default();
        registry.tracked.push(registry.tracked[0].clone());
        assert!(matches!(
            registry.validate(),
            Err(crate::Error::InvalidRegistry(_))
        ));

        let registry = Registry {
            blocks: vec![],
            schedule: None,
            ..Default::default()
        };
        assert!(matches!(
            registry.validate(),
            Err(crate::Error::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_validate_caps_schedule_count() {
        let schedule = |count| Registry {
            blocks: vec![],
            schedule: Some(BlockSchedule {
                anchor: 30_915_738,
                step: POLYGON_BLOCKS_PER_DAY,
                count,
            }),
            ..Default::default()
        };

        schedule(MAX_SCHEDULE_COUNT).validate().unwrap();
        assert!(matches!(
            schedule(MAX_SCHEDULE_COUNT + 1).validate(),
            Err(crate::Error::InvalidRegistry(_))
        ));
        assert!(matches!(
            schedule(u64::MAX).validate(),
            Err(crate::Error::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_of_mixed_case_override() {
        let yaml = r#"
tracked:
  - symbol: P
    address: "0x58F7C5707BA8E09B5E61CEBE8821F65434372344"
portfolios:
  - "0x58f7c5707ba8e09b5e61cebe8821f65434372344"
blocks: [200, 100]
"#;
        let registry: Registry = serde_yaml::from_str(yaml).unwrap();
        registry.validate().unwrap();

        assert!(registry.tracked[0].active);
        assert!(registry.is_portfolio(&registry.tracked[0].address));
        assert_eq!(registry.block_list(), vec![200, 100]);
    }

    #[test]
    fn test_save_and_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("registry.yaml");

        let mut registry = Registry::default();
        registry.tracked.retain(|t| t.active);
        registry.save_to(&path).unwrap();

        assert_eq!(Registry::load_from(&path).unwrap(), registry);
        assert!(matches!(
            Registry::load_from(&dir.path().join("missing.yaml")),
            Err(crate::Error::FileReadFailed(..))
        ));
    }
}
