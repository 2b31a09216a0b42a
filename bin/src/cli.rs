use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use setchart_common::address::canonical;
use setchart_engine::{
    chain::RpcChain, export::write_series, metadata::MetadataResolver,
    prices::HistoryPriceSource, RunOptions, Runner, Valuation,
};
use setchart_utils::{
    alloy::StringExt,
    config::Config,
    disk_storage::DiskStorageInterface,
    network::NetworkStore,
    price_history::PriceHistoryApi,
    registry::Registry,
};

/// Historical TokenSet valuation exported as CSV
#[derive(Parser, Debug)]
#[command(name = "setchart", bin_name = "setchart", version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// Log debug output of the pipeline
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Registry file to use instead of ~/.setchart/registry.yaml
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    #[arg(long, env = "ALCHEMY_API_KEY", global = true, hide_env_values = true)]
    pub alchemy_api_key: Option<String>,

    /// Base URL of the swap API serving `/history`
    #[arg(long, env = "BASE_URL_0X", global = true)]
    pub price_api_url: Option<String>,

    /// Network name or alias, defaults to the configured one
    #[arg(long, global = true)]
    pub network: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a CSV per tracked address (default)
    Run {
        /// Only export these symbols or addresses, may be repeated
        #[arg(long)]
        only: Vec<String>,

        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Also export entries marked inactive
        #[arg(long)]
        include_inactive: bool,
    },

    /// Print the tracked addresses
    #[command(alias = "ls")]
    List,

    /// Print the value series of one address without writing files
    Value {
        /// Tracked symbol or any token / token set address
        target: String,

        /// Blocks to sample, defaults to the registry's blocks
        #[arg(long = "block")]
        blocks: Vec<u64>,
    },

    /// Resolve the decimals of a token
    Decimals { token: String },

    /// Write the default config and registry to ~/.setchart for editing
    Init {
        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn run(self) -> setchart_engine::Result<()> {
        // must not depend on the files it writes
        if let Some(Commands::Init { force }) = self.cmd {
            return init(force);
        }

        let mut config = Config::load()?.with_overrides(
            self.alchemy_api_key,
            self.price_api_url,
            self.cmd.as_ref().and_then(|cmd| match cmd {
                Commands::Run { out_dir, .. } => out_dir.clone(),
                _ => None,
            }),
        );
        if let Some(network) = self.network {
            config.network = network;
        }

        let registry = match &self.registry {
            Some(path) => Registry::load_from(path)?,
            None => Registry::load()?,
        };
        registry.validate()?;

        let cmd = self.cmd.unwrap_or(Commands::Run {
            only: vec![],
            out_dir: None,
            include_inactive: false,
        });

        match cmd {
            Commands::Run {
                only,
                include_inactive,
                ..
            } => {
                let chain = connect(&config)?;
                let prices = HistoryPriceSource::new(PriceHistoryApi::new(config.price_api_url()?));
                let options = RunOptions {
                    only,
                    include_inactive,
                    out_dir: config.out_dir.clone(),
                };

                let summary = Runner::new(&registry, &chain, &prices)
                    .run(&options)
                    .await?;
                for exported in &summary.exported {
                    println!(
                        "{} {} ({} samples)",
                        style("✓").green(),
                        exported.path.display(),
                        exported.samples
                    );
                }
                summary.into_result()?;
            }
            Commands::List => list(&registry),
            Commands::Value { target, blocks } => {
                let address = match registry.find(&target) {
                    Some(entry) => entry.address,
                    None => target
                        .parse_as_address()
                        .map_err(|_| setchart_engine::Error::UnknownTrackedAddress(target))?,
                };
                let blocks = if blocks.is_empty() {
                    registry.block_list()
                } else {
                    blocks
                };

                let chain = connect(&config)?;
                let prices = HistoryPriceSource::new(PriceHistoryApi::new(config.price_api_url()?));
                let series = Valuation::new(&registry, &chain, &prices)
                    .compute_value_series(address, &blocks)
                    .await?;

                write_series(io::stdout().lock(), &series).map_err(|e| {
                    setchart_engine::Error::ExportFailed {
                        path: PathBuf::from("<stdout>"),
                        reason: e.to_string(),
                    }
                })?;
            }
            Commands::Decimals { token } => {
                let token = token.parse_as_address()?;
                let chain = connect(&config)?;
                let decimals = MetadataResolver::new(&registry, &chain)
                    .resolve_decimals(token)
                    .await?;
                println!("{decimals}");
            }
            Commands::Init { force } => init(force)?,
        }

        Ok(())
    }
}

fn connect(config: &Config) -> setchart_engine::Result<RpcChain> {
    let network = NetworkStore::load_merged()?.get_by_name(&config.network)?;
    tracing::debug!(%network, "connecting");
    RpcChain::from_network(&network, config)
}

fn init(force: bool) -> setchart_engine::Result<()> {
    write_default(Config::default(), force)?;
    write_default(Registry::default(), force)
}

fn write_default<T: DiskStorageInterface>(value: T, force: bool) -> setchart_engine::Result<()> {
    let path = T::path()?;
    if path.exists() && !force {
        println!("{} {} exists, skipped", style("-").dim(), path.display());
        return Ok(());
    }

    value.save()?;
    println!("{} {}", style("✓").green(), path.display());
    Ok(())
}

fn list(registry: &Registry) {
    for entry in &registry.tracked {
        let kind = if registry.is_portfolio(&entry.address) {
            "set"
        } else {
            "token"
        };
        let line = format!("{:<12} {} {:<5}", entry.symbol, canonical(&entry.address), kind);
        if entry.active {
            println!("{line}");
        } else {
            println!("{} {}", style(line).dim(), style("(inactive)").dim());
        }
    }
}
