use anyhow::{Context, Result};
use netboot_core::{wait_until_up, SystemInterfaces};
use netboot_dhcp::config::Settings;
use netboot_dhcp::report::render_interface;

use crate::cli::{ExchangeOverrides, WaitArgs};

pub fn run_wait(args: WaitArgs, settings: Settings) -> Result<()> {
    let settings = crate::with_overrides(settings, &ExchangeOverrides::default(), &args.link)?;
    let iface = wait_until_up(&SystemInterfaces, &args.interface, &settings.ifup_options())
        .with_context(|| format!("interface {} did not come up", args.interface))?;
    println!("{}", render_interface(&iface));
    Ok(())
}
