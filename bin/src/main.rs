use clap::Parser;
use console::style;

mod cli;
mod panic_hook;

#[tokio::main]
async fn main() {
    panic_hook::set();

    let cli = cli::Cli::parse();

    if let Err(err) = setchart_utils::log::init(cli.verbose) {
        eprintln!("{} {err}", style("warning:").yellow());
    }

    if let Err(err) = cli.run().await {
        eprintln!("{} {err}", style("error:").red());
        std::process::exit(1);
    }
}
