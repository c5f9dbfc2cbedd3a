use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "netboot-dhcp")]
#[command(about = "Acquire a DHCP lease and print the derived network configuration")]
pub struct Cli {
    /// Settings file. Defaults to the built-in configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Wait for the link, run Discover/Offer/Request/Ack and print the result.
    Lease(LeaseArgs),
    /// Wait until an interface reports up.
    Wait(WaitArgs),
    /// Print the configuration carried by a stored reply datagram.
    Extract(ExtractArgs),
    /// Print the effective settings.
    ShowConfig(ShowConfigArgs),
}

/// Overrides for the `[exchange]` settings.
#[derive(Args, Debug, Default)]
pub struct ExchangeOverrides {
    /// Time to wait for each reply, in milliseconds.
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,
    /// Time allowed for each send, in milliseconds.
    #[arg(long)]
    pub write_timeout_ms: Option<u64>,
}

/// Overrides for the `[interface]` settings.
#[derive(Args, Debug, Default)]
pub struct InterfaceOverrides {
    /// Time to wait for the link to come up, in milliseconds.
    #[arg(long)]
    pub up_timeout_ms: Option<u64>,
    /// Delay between link checks, in milliseconds.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct LeaseArgs {
    /// Interface to acquire a lease on.
    pub interface: String,
    #[command(flatten)]
    pub exchange: ExchangeOverrides,
    #[command(flatten)]
    pub link: InterfaceOverrides,
    /// Host name option (12) to send.
    #[arg(long)]
    pub hostname: Option<String>,
    /// Vendor class identifier option (60) to send.
    #[arg(long)]
    pub class_id: Option<String>,
    /// Client identifier option (61) to send.
    #[arg(long)]
    pub client_id: Option<String>,
    /// Extra option code to add to the parameter request list. Repeatable.
    #[arg(long = "request-option", value_name = "CODE")]
    pub request_options: Vec<u8>,
    /// Clear the broadcast flag on outgoing messages.
    #[arg(long)]
    pub unicast: bool,
    /// Apply the configuration to the interface after a successful lease.
    #[arg(long)]
    pub apply: bool,
    /// Also print a summary of every exchanged message.
    #[arg(long)]
    pub conversation: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct WaitArgs {
    pub interface: String,
    #[command(flatten)]
    pub link: InterfaceOverrides,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// File holding one raw reply datagram.
    pub file: PathBuf,
    /// Decode the file as a DHCPv6 Reply instead of a DHCPv4 Ack.
    #[arg(long)]
    pub v6: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub exchange: ExchangeOverrides,
    #[command(flatten)]
    pub link: InterfaceOverrides,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
