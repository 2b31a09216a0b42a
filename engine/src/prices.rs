use std::collections::HashMap;

use alloy::primitives::Address;
use setchart_common::address::parse_address;
use setchart_utils::price_history::{BuyToken, HistoryEntry, HistoryRequest, PriceHistoryApi};

use crate::{
    traits::PriceSource,
    types::{PricePoint, TokenMeta},
};

/// Prices from the swap API's `/history` endpoint, one request per block.
pub struct HistoryPriceSource {
    api: PriceHistoryApi,
}

impl HistoryPriceSource {
    pub fn new(api: PriceHistoryApi) -> Self {
        Self { api }
    }
}

impl PriceSource for HistoryPriceSource {
    async fn prices(
        &self,
        tokens: &[TokenMeta],
        block: u64,
        precision: bool,
    ) -> crate::Result<Vec<PricePoint>> {
        let request = HistoryRequest {
            buy_tokens: tokens
                .iter()
                .map(|t| BuyToken {
                    token_address: t.address,
                    decimals: t.decimals,
                    symbol: t.symbol.clone(),
                })
                .collect(),
            start_block: block,
            precision,
        };

        let entries =
            self.api
                .history(&request)
                .await
                .map_err(|e| crate::Error::PriceFetchFailed {
                    block,
                    reason: e.to_string(),
                })?;

        correlate(tokens, entries, block)
    }
}

/// Matches response entries back to the requested tokens by address, never by
/// position. Entries carry the address either in `tokenAddress` or, as the API
/// echoes our request, in `symbol`.
pub fn correlate(
    tokens: &[TokenMeta],
    entries: Vec<HistoryEntry>,
    block: u64,
) -> crate::Result<Vec<PricePoint>> {
    let mismatch = |reason: String| crate::Error::PriceCorrelationError { block, reason };

    if entries.len() != tokens.len() {
        return Err(mismatch(format!(
            "requested {} tokens, received {} entries",
            tokens.len(),
            entries.len()
        )));
    }

    let mut by_token = HashMap::<Address, f64>::with_capacity(entries.len());

    for entry in entries {
        let key = entry.token_address.as_deref().unwrap_or(&entry.symbol);
        let token = parse_address(key)
            .map_err(|_| mismatch(format!("entry key '{key}' is not an address")))?;

        if !tokens.iter().any(|t| t.address == token) {
            return Err(mismatch(format!("entry for unrequested token {key}")));
        }

        let price = entry
            .prices
            .first()
            .copied()
            .ok_or_else(|| crate::Error::PriceFetchFailed {
                block,
                reason: format!("no price returned for {key}"),
            })?;

        if !price.is_finite() || price < 0.0 {
            return Err(crate::Error::PriceFetchFailed {
                block,
                reason: format!("unusable price {price} for {key}"),
            });
        }

        if by_token.insert(token, price).is_some() {
            return Err(mismatch(format!("duplicate entry for {key}")));
        }
    }

    tokens
        .iter()
        .map(|t| {
            by_token
                .get(&t.address)
                .map(|price| PricePoint {
                    token: t.address,
                    price: *price,
                })
                .ok_or_else(|| mismatch(format!("no entry for {}", t.symbol)))
        })
        .collect()
}
