//! In-memory chain and price sources for pipeline tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::primitives::{address, Address, U256};
use setchart_utils::registry::{KnownToken, Registry, TrackedAddress};

use crate::{
    traits::{BlockSource, MetadataSource, PositionSource, PriceSource},
    types::{Position, PricePoint, TokenMeta},
};

pub const P: Address = address!("0x1000000000000000000000000000000000000001");
pub const TOKEN: Address = address!("0x2000000000000000000000000000000000000002");
pub const T1: Address = address!("0xa0000000000000000000000000000000000000a1");
pub const T2: Address = address!("0xa0000000000000000000000000000000000000a2");
pub const PRECISE: Address = address!("0xb0000000000000000000000000000000000000b1");

/// 2022-07-13 12:00:00 UTC
pub const JULY_13_NOON: u64 = 1_657_713_600;
pub const DAY: u64 = 86_400;

/// `n` whole tokens at 18 decimals.
pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// P is a portfolio, TOKEN a plain token. T1 is known at 18 decimals, T2 and
/// PRECISE need a live lookup.
pub fn test_registry() -> Registry {
    Registry {
        tracked: vec![
            TrackedAddress {
                symbol: "P".to_string(),
                address: P,
                active: true,
            },
            TrackedAddress {
                symbol: "TOKEN".to_string(),
                address: TOKEN,
                active: true,
            },
        ],
        portfolios: vec![P],
        known_tokens: vec![
            KnownToken {
                address: T1,
                decimals: 18,
                symbol: None,
            },
            KnownToken {
                address: TOKEN,
                decimals: 18,
                symbol: None,
            },
        ],
        precision_required: vec![PRECISE],
        blocks: vec![100, 200],
        schedule: None,
    }
}

#[derive(Default)]
pub struct MockChain {
    timestamps: HashMap<u64, u64>,
    positions: HashMap<(Address, u64), Vec<Position>>,
    decimals: HashMap<Address, u8>,
    decimals_calls: AtomicUsize,
    positions_calls: AtomicUsize,
}

impl MockChain {
    pub fn with_block(mut self, block: u64, timestamp: u64) -> Self {
        self.timestamps.insert(block, timestamp);
        self
    }

    pub fn with_positions(mut self, portfolio: Address, block: u64, positions: &[(Address, U256)]) -> Self {
        self.positions.insert(
            (portfolio, block),
            positions
                .iter()
                .map(|(component, raw_units)| Position {
                    component: *component,
                    raw_units: *raw_units,
                })
                .collect(),
        );
        self
    }

    pub fn with_decimals(mut self, token: Address, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    pub fn decimals_calls(&self) -> usize {
        self.decimals_calls.load(Ordering::SeqCst)
    }

    pub fn positions_calls(&self) -> usize {
        self.positions_calls.load(Ordering::SeqCst)
    }
}

impl BlockSource for MockChain {
    async fn timestamp(&self, block: u64) -> crate::Result<u64> {
        self.timestamps
            .get(&block)
            .copied()
            .ok_or_else(|| crate::Error::BlockFetchFailed {
                block,
                reason: "unknown block".to_string(),
            })
    }
}

impl PositionSource for MockChain {
    async fn positions(&self, portfolio: Address, block: u64) -> crate::Result<Vec<Position>> {
        self.positions_calls.fetch_add(1, Ordering::SeqCst);
        self.positions
            .get(&(portfolio, block))
            .cloned()
            .ok_or_else(|| crate::Error::PositionFetchFailed {
                portfolio,
                block,
                reason: "execution reverted".to_string(),
            })
    }
}

impl MetadataSource for MockChain {
    async fn decimals(&self, token: Address) -> crate::Result<u8> {
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| crate::Error::MetadataUnavailable {
                token,
                reason: "decimals() reverted".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub tokens: Vec<Address>,
    pub block: u64,
    pub precision: bool,
}

#[derive(Default)]
pub struct MockPrices {
    prices: HashMap<(Address, u64), f64>,
    requests: Mutex<Vec<PriceRequest>>,
}

impl MockPrices {
    pub fn with_price(mut self, token: Address, block: u64, price: f64) -> Self {
        self.prices.insert((token, block), price);
        self
    }

    pub fn requests(&self) -> Vec<PriceRequest> {
        self.requests.lock().expect("poisoned").clone()
    }
}

impl PriceSource for MockPrices {
    async fn prices(
        &self,
        tokens: &[TokenMeta],
        block: u64,
        precision: bool,
    ) -> crate::Result<Vec<PricePoint>> {
        self.requests.lock().expect("poisoned").push(PriceRequest {
            tokens: tokens.iter().map(|t| t.address).collect(),
            block,
            precision,
        });

        tokens
            .iter()
            .map(|t| {
                self.prices
                    .get(&(t.address, block))
                    .map(|price| PricePoint {
                        token: t.address,
                        price: *price,
                    })
                    .ok_or_else(|| crate::Error::PriceFetchFailed {
                        block,
                        reason: format!("no price for {}", t.symbol),
                    })
            })
            .collect()
    }
}
