//! Turns per-block holdings and prices into a value series.
//!
//! For a token set, every block gets a fresh `getPositions()` read, decimals
//! for each distinct component, one batched price request, and the weighted
//! sum of scaled holdings times prices. For a plain token the series is its
//! price. A block that fails at any step is dropped from the series; the run
//! only fails as a whole when every block did.

use std::slice;

use alloy::primitives::{Address, U256};
use chrono::NaiveDate;
use setchart_common::address::canonical;
use setchart_utils::registry::Registry;

use crate::{
    metadata::MetadataResolver,
    traits::{BlockSource, MetadataSource, PositionSource, PriceSource},
    types::{scale_units, utc_day, weighted_value, TokenMeta, ValuationSample},
};

pub struct Valuation<'a, C, P> {
    registry: &'a Registry,
    chain: &'a C,
    prices: &'a P,
}

impl<'a, C, P> Valuation<'a, C, P>
where
    C: BlockSource + PositionSource + MetadataSource + Sync,
    P: PriceSource + Sync,
{
    pub fn new(registry: &'a Registry, chain: &'a C, prices: &'a P) -> Self {
        Self {
            registry,
            chain,
            prices,
        }
    }

    /// Samples come out in the order of `blocks`, at most one per block.
    pub async fn compute_value_series(
        &self,
        address: Address,
        blocks: &[u64],
    ) -> crate::Result<Vec<ValuationSample>> {
        if self.registry.is_portfolio(&address) {
            self.portfolio_series(address, blocks).await
        } else {
            self.token_series(address, blocks).await
        }
    }

    async fn portfolio_series(
        &self,
        portfolio: Address,
        blocks: &[u64],
    ) -> crate::Result<Vec<ValuationSample>> {
        let mut series = Series::new(portfolio, blocks.len());
        for &block in blocks {
            let sample = self.portfolio_sample(portfolio, block).await.map(Some);
            series.record(block, sample)?;
        }
        series.finish()
    }

    async fn portfolio_sample(
        &self,
        portfolio: Address,
        block: u64,
    ) -> crate::Result<ValuationSample> {
        let date = self.date_of(block).await?;
        let positions = self.chain.positions(portfolio, block).await?;

        // a component can show up more than once (default and external positions)
        let mut holdings: Vec<(Address, U256)> = Vec::with_capacity(positions.len());
        for position in positions {
            match holdings.iter_mut().find(|(c, _)| *c == position.component) {
                Some((_, units)) => {
                    *units = units.checked_add(position.raw_units).ok_or_else(|| {
                        crate::Error::PositionFetchFailed {
                            portfolio,
                            block,
                            reason: format!(
                                "summed units of {} overflow",
                                canonical(&position.component)
                            ),
                        }
                    })?
                }
                None => holdings.push((position.component, position.raw_units)),
            }
        }

        if holdings.is_empty() {
            tracing::debug!(portfolio = %canonical(&portfolio), block, "no positions");
            return Ok(ValuationSample { date, price: 0.0 });
        }

        let resolver = MetadataResolver::new(self.registry, self.chain);
        let mut tokens = Vec::with_capacity(holdings.len());
        for (component, _) in &holdings {
            tokens.push(resolver.resolve_meta(*component).await?);
        }

        let precision = self.needs_precision(&tokens);
        let prices = self.prices.prices(&tokens, block, precision).await?;

        if prices.len() != tokens.len() {
            return Err(crate::Error::PriceCorrelationError {
                block,
                reason: format!("{} prices for {} components", prices.len(), tokens.len()),
            });
        }

        let mut components = Vec::with_capacity(tokens.len());
        for ((meta, (_, raw_units)), point) in tokens.iter().zip(&holdings).zip(&prices) {
            if point.token != meta.address {
                return Err(crate::Error::PriceCorrelationError {
                    block,
                    reason: format!(
                        "price for {} returned in place of {}",
                        canonical(&point.token),
                        meta.symbol
                    ),
                });
            }
            let amount =
                scale_units(*raw_units, meta.decimals).ok_or(crate::Error::InvalidDecimals {
                    token: meta.address,
                    decimals: meta.decimals,
                })?;
            components.push((amount, point.price));
        }

        let price = weighted_value(components);
        if !price.is_finite() {
            return Err(crate::Error::PriceFetchFailed {
                block,
                reason: format!("portfolio value is not finite: {price}"),
            });
        }

        Ok(ValuationSample { date, price })
    }

    async fn token_series(
        &self,
        token: Address,
        blocks: &[u64],
    ) -> crate::Result<Vec<ValuationSample>> {
        let meta = MetadataResolver::new(self.registry, self.chain)
            .resolve_meta(token)
            .await?;
        let precision = self.needs_precision(slice::from_ref(&meta));

        let mut series = Series::new(token, blocks.len());
        for &block in blocks {
            let sample = self.token_sample(&meta, block, precision).await;
            series.record(block, sample)?;
        }
        series.finish()
    }

    /// `None` when the price is exactly zero: plain tokens never chart a zero.
    async fn token_sample(
        &self,
        meta: &TokenMeta,
        block: u64,
        precision: bool,
    ) -> crate::Result<Option<ValuationSample>> {
        let date = self.date_of(block).await?;
        let prices = self
            .prices
            .prices(slice::from_ref(meta), block, precision)
            .await?;

        let point = match prices.as_slice() {
            [point] if point.token == meta.address => point,
            _ => {
                return Err(crate::Error::PriceCorrelationError {
                    block,
                    reason: format!("expected a single price for {}", meta.symbol),
                })
            }
        };

        if point.price == 0.0 {
            tracing::debug!(token = %meta.symbol, block, "zero price, sample dropped");
            return Ok(None);
        }

        Ok(Some(ValuationSample {
            date,
            price: point.price,
        }))
    }

    async fn date_of(&self, block: u64) -> crate::Result<NaiveDate> {
        let timestamp = self.chain.timestamp(block).await?;
        utc_day(timestamp).ok_or(crate::Error::InvalidTimestamp { block, timestamp })
    }

    fn needs_precision(&self, tokens: &[TokenMeta]) -> bool {
        tokens
            .iter()
            .any(|t| self.registry.is_precision_required(&t.address))
    }
}

/// Accumulates samples and remembers why blocks were skipped.
struct Series {
    address: Address,
    samples: Vec<ValuationSample>,
    attempted: usize,
    failed: usize,
    last_error: Option<crate::Error>,
}

impl Series {
    fn new(address: Address, capacity: usize) -> Self {
        Self {
            address,
            samples: Vec::with_capacity(capacity),
            attempted: 0,
            failed: 0,
            last_error: None,
        }
    }

    fn record(
        &mut self,
        block: u64,
        result: crate::Result<Option<ValuationSample>>,
    ) -> crate::Result<()> {
        self.attempted += 1;
        match result {
            Ok(Some(sample)) => {
                tracing::debug!(block, date = %sample.date, price = sample.price, "sample");
                self.samples.push(sample);
            }
            Ok(None) => {}
            Err(err) if err.is_block_scoped() => {
                tracing::warn!(
                    address = %canonical(&self.address),
                    block,
                    "skipping block: {err}"
                );
                self.failed += 1;
                self.last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Only fails when every attempted block failed. Blocks dropped for a
    /// zero price still count as fetched.
    fn finish(self) -> crate::Result<Vec<ValuationSample>> {
        match self.last_error {
            Some(last_error) if self.failed == self.attempted => {
                Err(crate::Error::AllBlocksFailed {
                    address: self.address,
                    failed: self.failed,
                    last_error: Box::new(last_error),
                })
            }
            _ => Ok(self.samples),
        }
    }
}
