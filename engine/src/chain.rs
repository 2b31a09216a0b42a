use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::Address,
    providers::{DynProvider, Provider},
};
use setchart_common::{erc20::IERC20, set_token::ISetToken};
use setchart_utils::{config::Config, network::Network};

use crate::{
    traits::{BlockSource, MetadataSource, PositionSource},
    types::Position,
};

/// Read-only view of the chain through a JSON-RPC node.
pub struct RpcChain {
    provider: DynProvider,
}

impl RpcChain {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    pub fn from_network(network: &Network, config: &Config) -> crate::Result<Self> {
        Ok(Self::new(network.get_provider(config)?))
    }
}

impl BlockSource for RpcChain {
    async fn timestamp(&self, block: u64) -> crate::Result<u64> {
        let response = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block))
            .await
            .map_err(|e| crate::Error::BlockFetchFailed {
                block,
                reason: e.to_string(),
            })?;

        response
            .map(|b| b.header.timestamp)
            .ok_or_else(|| crate::Error::BlockFetchFailed {
                block,
                reason: "block not found".to_string(),
            })
    }
}

impl PositionSource for RpcChain {
    async fn positions(&self, portfolio: Address, block: u64) -> crate::Result<Vec<Position>> {
        let fail = |reason: String| crate::Error::PositionFetchFailed {
            portfolio,
            block,
            reason,
        };

        let positions = ISetToken::new(portfolio, self.provider.clone())
            .getPositions()
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(|e| fail(e.to_string()))?;

        convert_positions(portfolio, block, positions)
    }
}

/// Debt positions carry a negative unit and cannot be valued as holdings.
fn convert_positions(
    portfolio: Address,
    block: u64,
    positions: Vec<ISetToken::Position>,
) -> crate::Result<Vec<Position>> {
    positions
        .into_iter()
        .map(|p| {
            if p.unit.is_negative() {
                Err(crate::Error::PositionFetchFailed {
                    portfolio,
                    block,
                    reason: format!("negative unit {} for component {}", p.unit, p.component),
                })
            } else {
                Ok(Position {
                    component: p.component,
                    raw_units: p.unit.into_raw(),
                })
            }
        })
        .collect()
}

impl MetadataSource for RpcChain {
    async fn decimals(&self, token: Address) -> crate::Result<u8> {
        IERC20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(|e| crate::Error::MetadataUnavailable {
                token,
                reason: e.to_string(),
            })
    }
}
