mod error;
pub use error::{Error, Result};

pub mod chain;
pub mod export;
pub mod metadata;
pub mod prices;
pub mod runner;
pub mod traits;
pub mod types;
pub mod valuation;

#[cfg(test)]
mod testutils;

pub use runner::{RunOptions, RunSummary, Runner};
pub use types::{Position, PricePoint, TokenMeta, ValuationSample};
pub use valuation::Valuation;
