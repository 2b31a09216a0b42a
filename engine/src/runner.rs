use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use setchart_utils::registry::{Registry, TrackedAddress};

use crate::{
    export::CsvExporter,
    traits::{BlockSource, MetadataSource, PositionSource, PriceSource},
    valuation::Valuation,
};

#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Symbols or addresses to export; empty means every active entry.
    pub only: Vec<String>,
    pub include_inactive: bool,
    pub out_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Exported {
    pub symbol: String,
    pub path: PathBuf,
    pub samples: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub exported: Vec<Exported>,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn into_result(self) -> crate::Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(crate::Error::RunFailed(self.failed))
        }
    }
}

pub struct Runner<'a, C, P> {
    registry: &'a Registry,
    valuation: Valuation<'a, C, P>,
}

impl<'a, C, P> Runner<'a, C, P>
where
    C: BlockSource + PositionSource + MetadataSource + Sync,
    P: PriceSource + Sync,
{
    pub fn new(registry: &'a Registry, chain: &'a C, prices: &'a P) -> Self {
        Self {
            registry,
            valuation: Valuation::new(registry, chain, prices),
        }
    }

    /// Entries the run will visit, in registry order. An explicit selection
    /// includes inactive entries.
    pub fn selection(&self, options: &RunOptions) -> crate::Result<Vec<&'a TrackedAddress>> {
        let registry = self.registry;
        if options.only.is_empty() {
            return Ok(if options.include_inactive {
                registry.tracked.iter().collect()
            } else {
                registry.active().collect()
            });
        }

        let mut wanted = Vec::with_capacity(options.only.len());
        for key in &options.only {
            let entry = registry
                .find(key)
                .ok_or_else(|| crate::Error::UnknownTrackedAddress(key.clone()))?;
            wanted.push(entry.address);
        }

        Ok(registry
            .tracked
            .iter()
            .filter(|t| wanted.contains(&t.address))
            .collect())
    }

    /// Exports every selected address. A failing address is logged and
    /// recorded in the summary, the remaining ones still run.
    pub async fn run(&self, options: &RunOptions) -> crate::Result<RunSummary> {
        let selection = self.selection(options)?;
        let blocks = self.registry.block_list();
        let exporter = CsvExporter::new(&options.out_dir);

        tracing::info!(
            addresses = selection.len(),
            blocks = blocks.len(),
            out_dir = %exporter.out_dir().display(),
            "starting export"
        );

        let mut summary = RunSummary::default();
        for entry in selection {
            let started = Instant::now();
            let result = match self
                .valuation
                .compute_value_series(entry.address, &blocks)
                .await
            {
                Ok(series) => exporter
                    .export(&entry.symbol, &series)
                    .map(|path| (path, series.len())),
                Err(err) => Err(err),
            };
            let elapsed = started.elapsed();

            match result {
                Ok((path, samples)) => {
                    tracing::info!(samples, "CSV written for {}", entry.symbol);
                    summary.exported.push(Exported {
                        symbol: entry.symbol.clone(),
                        path,
                        samples,
                        elapsed,
                    });
                }
                Err(err) => {
                    tracing::error!("{} failed: {err}", entry.symbol);
                    summary.failed.push(entry.symbol.clone());
                }
            }
            tracing::info!("{} took {} ms", entry.symbol, elapsed.as_millis());
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::testutils::*;

    fn options(out_dir: PathBuf) -> RunOptions {
        RunOptions {
            only: vec![],
            include_inactive: false,
            out_dir,
        }
    }

    fn chain() -> MockChain {
        MockChain::default()
            .with_block(100, JULY_13_NOON)
            .with_block(200, JULY_13_NOON + DAY)
            .with_positions(P, 100, &[(T1, ether(5))])
            .with_positions(P, 200, &[(T1, ether(5))])
    }

    #[tokio::test]
    async fn test_run_exports_every_active_address() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry();
        let chain = chain();
        let prices = MockPrices::default()
            .with_price(T1, 100, 2.0)
            .with_price(T1, 200, 3.0)
            .with_price(TOKEN, 100, 1_500.0)
            .with_price(TOKEN, 200, 1_600.0);

        let summary = Runner::new(&registry, &chain, &prices)
            .run(&options(dir.path().to_path_buf()))
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let symbols: Vec<&str> = summary.exported.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["P", "TOKEN"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("P.csv")).unwrap(),
            "date,price\n2022-07-14,15.0\n2022-07-13,10.0\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("TOKEN.csv")).unwrap(),
            "date,price\n2022-07-14,1600.0\n2022-07-13,1500.0\n"
        );
    }

    #[tokio::test]
    async fn test_run_continues_past_failed_address() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry();
        let chain = chain();
        let prices = MockPrices::default()
            .with_price(T1, 100, 2.0)
            .with_price(T1, 200, 2.0);

        let summary = Runner::new(&registry, &chain, &prices)
            .run(&options(dir.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(summary.exported.len(), 1);
        assert_eq!(summary.failed, vec!["TOKEN".to_string()]);
        assert!(dir.path().join("P.csv").exists());
        assert!(!dir.path().join("TOKEN.csv").exists());

        let err = summary.into_result().unwrap_err();
        assert!(matches!(err, crate::Error::RunFailed(ref failed) if failed == &["TOKEN"]));
    }

    #[tokio::test]
    async fn test_selection() {
        let mut registry = test_registry();
        registry.tracked[1].active = false;
        let chain = chain();
        let prices = MockPrices::default();
        let runner = Runner::new(&registry, &chain, &prices);
        let symbols = |selection: Vec<&TrackedAddress>| {
            selection
                .into_iter()
                .map(|t| t.symbol.clone())
                .collect::<Vec<_>>()
        };

        let mut opts = options(PathBuf::from("unused"));
        assert_eq!(symbols(runner.selection(&opts).unwrap()), vec!["P"]);

        opts.include_inactive = true;
        assert_eq!(symbols(runner.selection(&opts).unwrap()), vec!["P", "TOKEN"]);

        opts.include_inactive = false;
        opts.only = vec!["token".to_string()];
        assert_eq!(symbols(runner.selection(&opts).unwrap()), vec!["TOKEN"]);

        opts.only = vec![setchart_common::address::canonical(&P)];
        assert_eq!(symbols(runner.selection(&opts).unwrap()), vec!["P"]);

        opts.only = vec!["NOPE".to_string()];
        assert!(matches!(
            runner.selection(&opts),
            Err(crate::Error::UnknownTrackedAddress(_))
        ));
    }
}
