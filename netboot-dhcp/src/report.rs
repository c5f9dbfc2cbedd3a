use std::fmt::Display;

use netboot_core::message::summary;
use netboot_core::{Conversation, Interface, NetConf};
use serde::Serialize;

/// JSON shape of a `lease` run.
#[derive(Debug, Serialize)]
pub struct LeaseReport<'a> {
    pub interface: &'a str,
    pub netconf: &'a NetConf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<String>,
}

/// One `key=value` line per populated field, in a stable order.
pub fn render_netconf(netconf: &NetConf) -> String {
    let mut lines = Vec::new();
    for addr in netconf.addresses() {
        lines.push(format!("address={addr}"));
    }
    push_list(&mut lines, "router", netconf.routers());
    push_list(&mut lines, "dns", netconf.dns_servers());
    push_list(&mut lines, "search", netconf.dns_search_list());
    push_list(&mut lines, "ntp", netconf.ntp_servers());
    if lines.is_empty() {
        return "no configuration".to_string();
    }
    lines.join("\n")
}

fn push_list<T: Display>(lines: &mut Vec<String>, key: &str, values: &[T]) {
    if values.is_empty() {
        return;
    }
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    lines.push(format!("{key}={joined}"));
}

/// Step-prefixed summaries of every message exchanged so far.
pub fn conversation_lines(conversation: &Conversation) -> Vec<String> {
    conversation
        .steps()
        .map(|(step, msg)| format!("{step}: {}", summary(msg)))
        .collect()
}

pub fn render_interface(iface: &Interface) -> String {
    let hw = iface
        .hardware_addr()
        .map(|addr| netboot_core::message::format_hw_addr(&addr))
        .unwrap_or_else(|| "-".to_string());
    let index = iface
        .index()
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "interface={} index={index} hwaddr={hw} up={}",
        iface.name(),
        iface.is_up()
    )
}
