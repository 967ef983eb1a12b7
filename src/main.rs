use clap::Parser;
use std::sync::Arc;

use depfresh::{
    cli, command, git::SystemCommandRunner, registry::RegistryClient,
    result::Result,
};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("depfresh")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli_args = cli::Args::parse();

    initialize_logger(cli_args.debug)?;

    let registry = Box::new(RegistryClient::new());
    let runner = Arc::new(SystemCommandRunner);

    command::execute(&cli_args, registry, runner).await
}
