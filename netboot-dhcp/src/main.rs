use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use netboot_dhcp::config::{default_settings, load_config, Settings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod extract_cmd;
mod lease_cmd;
mod wait_cmd;

use cli::{Cli, Command, ExchangeOverrides, InterfaceOverrides, OutputFormat, ShowConfigArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = base_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Lease(args) => lease_cmd::run_lease(args, settings),
        Command::Wait(args) => wait_cmd::run_wait(args, settings),
        Command::Extract(args) => extract_cmd::run_extract(args),
        Command::ShowConfig(args) => run_show_config(args, settings),
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .try_init()
        .ok();
}

fn base_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(default_settings()),
    }
}

/// Apply command-line overrides and re-check the result.
pub(crate) fn with_overrides(
    mut settings: Settings,
    exchange: &ExchangeOverrides,
    link: &InterfaceOverrides,
) -> Result<Settings> {
    if let Some(ms) = exchange.read_timeout_ms {
        settings.exchange.read_timeout_ms = ms;
    }
    if let Some(ms) = exchange.write_timeout_ms {
        settings.exchange.write_timeout_ms = ms;
    }
    if let Some(ms) = link.up_timeout_ms {
        settings.interface.up_timeout_ms = ms;
    }
    if let Some(ms) = link.poll_interval_ms {
        settings.interface.poll_interval_ms = ms;
    }
    settings
        .validate("command line")
        .context("invalid command-line override")?;
    Ok(settings)
}

fn run_show_config(args: ShowConfigArgs, settings: Settings) -> Result<()> {
    let settings = with_overrides(settings, &args.exchange, &args.link)?;
    match args.format {
        OutputFormat::Text => print!("{}", toml::to_string(&settings)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
    }
    Ok(())
}
