use clap::Parser;
use report_issue_panel::cli::commands::{cmd_check, cmd_preview, cmd_run};
use report_issue_panel::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { service_url, trace } => {
            cmd_run(&config, service_url.as_deref(), trace.as_deref()).await?;
        }
        Commands::Preview { mode, values } => {
            print!("{}", cmd_preview(&config, &mode, &values)?);
        }
        Commands::Check => {
            print!("{}", cmd_check(&config)?);
        }
    }

    Ok(())
}

/// RUST_LOG wins; otherwise -v / -vv raise the default `info` level.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
