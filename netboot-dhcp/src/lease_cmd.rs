use anyhow::{bail, Context, Result};
use netboot_core::{
    configure_interface, netconf_from_v4, wait_until_up, Client, SystemInterfaces, UdpTransport,
};
use netboot_dhcp::config::Settings;
use netboot_dhcp::modifiers::RequestCustomization;
use netboot_dhcp::report::{conversation_lines, render_netconf, LeaseReport};
use tracing::{info, warn};

use crate::cli::{LeaseArgs, OutputFormat};

pub fn run_lease(args: LeaseArgs, settings: Settings) -> Result<()> {
    let settings = crate::with_overrides(settings, &args.exchange, &args.link)?;
    let config = settings.exchange_config();

    let iface = wait_until_up(&SystemInterfaces, &args.interface, &settings.ifup_options())
        .with_context(|| format!("interface {} did not come up", args.interface))?;

    let local = config.local()?;
    let transport = UdpTransport::bind(iface.name(), local)
        .with_context(|| format!("failed to bind {local} on {}", iface.name()))?;
    let mut client = Client::new(transport, config)?;

    let modifiers = request_customization(&args).modifiers();
    let conversation = match client.exchange(&iface, &modifiers) {
        Ok(conversation) => conversation,
        Err(failure) => {
            for line in conversation_lines(&failure.conversation) {
                warn!("{line}");
            }
            return Err(failure).with_context(|| format!("no lease on {}", iface.name()));
        }
    };

    let Some(ack) = conversation.ack() else {
        bail!("exchange on {} finished without an Ack", iface.name());
    };
    let netconf = netconf_from_v4(ack)
        .with_context(|| format!("Ack on {} carried no usable configuration", iface.name()))?;
    info!(ifname = iface.name(), addresses = netconf.addresses().len(), "lease acquired");

    let transcript = if args.conversation {
        conversation_lines(&conversation)
    } else {
        Vec::new()
    };

    match args.format {
        OutputFormat::Text => {
            for line in &transcript {
                println!("{line}");
            }
            println!("{}", render_netconf(&netconf));
        }
        OutputFormat::Json => {
            let report = LeaseReport {
                interface: iface.name(),
                netconf: &netconf,
                conversation: transcript,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if args.apply {
        configure_interface(iface.name(), &netconf)
            .with_context(|| format!("failed to apply configuration to {}", iface.name()))?;
    }

    Ok(())
}

fn request_customization(args: &LeaseArgs) -> RequestCustomization {
    RequestCustomization {
        hostname: args.hostname.clone(),
        class_id: args.class_id.clone(),
        client_id: args.client_id.clone(),
        request_options: args.request_options.clone(),
        unicast: args.unicast,
    }
}
