use anyhow::{Context, Result};
use netboot_core::ExtractNetConf;
use netboot_dhcp::reply::{load_reply, Protocol};
use netboot_dhcp::report::render_netconf;

use crate::cli::{ExtractArgs, OutputFormat};

pub fn run_extract(args: ExtractArgs) -> Result<()> {
    let protocol = if args.v6 { Protocol::V6 } else { Protocol::V4 };
    let reply = load_reply(&args.file, protocol)?;
    let netconf = reply
        .net_conf()
        .with_context(|| format!("no usable configuration in {}", args.file.display()))?;

    match args.format {
        OutputFormat::Text => println!("{}", render_netconf(&netconf)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&netconf)?),
    }
    Ok(())
}
