//! kube-autoupdate CLI entry point.

use clap::Parser;

use autoupdate_cli::commands::{dispatch, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    autoupdate_cli::logging::init(config.log_level, config.log_format);

    if let Err(e) = dispatch(cli.command, config).await {
        tracing::error!(error = %e, "Exiting");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
