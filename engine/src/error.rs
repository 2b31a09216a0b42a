use std::path::PathBuf;

use alloy::primitives::Address;
use setchart_common::address::canonical;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    UtilsError(#[from] setchart_utils::Error),

    #[error("Decimals unavailable for token {token}. (Error: {reason})", token = canonical(token))]
    MetadataUnavailable { token: Address, reason: String },

    #[error("Token {token} declares {decimals} decimals which cannot be scaled.", token = canonical(token))]
    InvalidDecimals { token: Address, decimals: u8 },

    #[error("Failed to fetch positions of {portfolio} at block {block}. (Error: {reason})", portfolio = canonical(portfolio))]
    PositionFetchFailed {
        portfolio: Address,
        block: u64,
        reason: String,
    },

    #[error("Failed to fetch prices at block {block}. (Error: {reason})")]
    PriceFetchFailed { block: u64, reason: String },

    #[error("Price response at block {block} does not match the request: {reason}.")]
    PriceCorrelationError { block: u64, reason: String },

    #[error("Failed to fetch block {block}. (Error: {reason})")]
    BlockFetchFailed { block: u64, reason: String },

    #[error("Block {block} has an unusable timestamp {timestamp}.")]
    InvalidTimestamp { block: u64, timestamp: u64 },

    #[error("All {failed} blocks failed for {address}, last error: {last_error}", address = canonical(address))]
    AllBlocksFailed {
        address: Address,
        failed: usize,
        last_error: Box<Error>,
    },

    #[error("'{0}' is neither a tracked symbol nor an address.")]
    UnknownTrackedAddress(String),

    #[error("Failed to write CSV {path:?}. (Error: {reason})")]
    ExportFailed { path: PathBuf, reason: String },

    #[error("{} tracked addresses failed: {}", .0.len(), .0.join(", "))]
    RunFailed(Vec<String>),
}

impl Error {
    /// Errors scoped to a single historical block. The pipeline drops the
    /// sample and moves on when it sees one of these.
    pub fn is_block_scoped(&self) -> bool {
        matches!(
            self,
            Error::MetadataUnavailable { .. }
                | Error::InvalidDecimals { .. }
                | Error::PositionFetchFailed { .. }
                | Error::PriceFetchFailed { .. }
                | Error::PriceCorrelationError { .. }
                | Error::BlockFetchFailed { .. }
                | Error::InvalidTimestamp { .. }
        )
    }
}
