//! Seams between the valuation pipeline and the outside world. The chain and
//! HTTP implementations live in `chain` and `prices`, tests use in-memory ones.

use std::future::Future;

use alloy::primitives::Address;

use crate::types::{Position, PricePoint, TokenMeta};

pub trait BlockSource {
    /// Unix timestamp (seconds) of `block`.
    fn timestamp(&self, block: u64) -> impl Future<Output = crate::Result<u64>> + Send;
}

pub trait PositionSource {
    /// Holdings of `portfolio` with the read pinned to `block`.
    fn positions(
        &self,
        portfolio: Address,
        block: u64,
    ) -> impl Future<Output = crate::Result<Vec<Position>>> + Send;
}

pub trait MetadataSource {
    /// Live decimals lookup, used when the registry does not know the token.
    fn decimals(&self, token: Address) -> impl Future<Output = crate::Result<u8>> + Send;
}

pub trait PriceSource {
    /// One price per requested token at `block`, in request order.
    fn prices(
        &self,
        tokens: &[TokenMeta],
        block: u64,
        precision: bool,
    ) -> impl Future<Output = crate::Result<Vec<PricePoint>>> + Send;
}
