use dhcproto::v4::{DhcpOption, Flags, HType, Message, MessageType, Opcode, OptionCode};

use crate::modifiers::{apply_all, Modifier};

/// Options every Discover and Request asks the server for.
pub const DEFAULT_REQUESTED_OPTIONS: [OptionCode; 4] = [
    OptionCode::SubnetMask,
    OptionCode::Router,
    OptionCode::DomainName,
    OptionCode::DomainNameServer,
];

/// Build a broadcast Discover for the interface owning `hw_addr`.
///
/// The transaction id is random unless a modifier overrides it.
pub fn new_discovery(hw_addr: &[u8], modifiers: &[Modifier]) -> Message {
    let mut msg = Message::default();
    msg.set_opcode(Opcode::BootRequest)
        .set_htype(HType::Eth)
        .set_chaddr(hw_addr)
        .set_xid(rand::random())
        .set_flags(Flags::default().set_broadcast());
    msg.opts_mut()
        .insert(DhcpOption::MessageType(MessageType::Discover));
    msg.opts_mut().insert(DhcpOption::ParameterRequestList(
        DEFAULT_REQUESTED_OPTIONS.to_vec(),
    ));
    apply_all(&mut msg, modifiers);
    msg
}

/// Build the Request that accepts `offer`.
///
/// Identity fields, the offered address and the server identifier are taken
/// from the offer before `modifiers` run.
pub fn new_request_from_offer(offer: &Message, modifiers: &[Modifier]) -> Message {
    let mut msg = Message::default();
    msg.set_opcode(Opcode::BootRequest)
        .set_htype(offer.htype())
        .set_chaddr(offer.chaddr())
        .set_xid(offer.xid())
        .set_flags(offer.flags())
        .set_ciaddr(offer.ciaddr())
        .set_giaddr(offer.giaddr());
    msg.opts_mut()
        .insert(DhcpOption::MessageType(MessageType::Request));
    msg.opts_mut()
        .insert(DhcpOption::RequestedIpAddress(offer.yiaddr()));
    if let Some(DhcpOption::ServerIdentifier(server)) =
        offer.opts().get(OptionCode::ServerIdentifier)
    {
        msg.opts_mut()
            .insert(DhcpOption::ServerIdentifier(*server));
    }
    msg.opts_mut().insert(DhcpOption::ParameterRequestList(
        DEFAULT_REQUESTED_OPTIONS.to_vec(),
    ));
    apply_all(&mut msg, modifiers);
    msg
}

/// One-line description of a message for logs and diagnostics.
pub fn summary(msg: &Message) -> String {
    let msg_type = msg
        .opts()
        .msg_type()
        .map(|t| format!("{t:?}"))
        .unwrap_or_else(|| "untyped".to_string());
    let server = match msg.opts().get(OptionCode::ServerIdentifier) {
        Some(DhcpOption::ServerIdentifier(ip)) => ip.to_string(),
        _ => "-".to_string(),
    };
    let chaddr = msg.chaddr();
    let hlen = usize::from(msg.hlen()).min(chaddr.len());
    format!(
        "{msg_type} xid=0x{:08x} op={:?} chaddr={} ciaddr={} yiaddr={} siaddr={} server_id={server}",
        msg.xid(),
        msg.opcode(),
        format_hw_addr(&chaddr[..hlen]),
        msg.ciaddr(),
        msg.yiaddr(),
        msg.siaddr(),
    )
}

/// Colon-separated lowercase hex, the usual MAC notation.
pub fn format_hw_addr(addr: &[u8]) -> String {
    addr.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::modifiers::{with_hostname, with_transaction_id};

    const HW: [u8; 6] = [0x02, 0x00, 0x5e, 0x10, 0x20, 0x30];

    fn offer() -> Message {
        let mut msg = Message::default();
        msg.set_opcode(Opcode::BootReply)
            .set_htype(HType::Eth)
            .set_chaddr(&HW)
            .set_xid(42)
            .set_yiaddr(Ipv4Addr::new(192, 0, 2, 50));
        msg.opts_mut()
            .insert(DhcpOption::MessageType(MessageType::Offer));
        msg.opts_mut()
            .insert(DhcpOption::ServerIdentifier(Ipv4Addr::new(192, 0, 2, 1)));
        msg
    }

    #[test]
    fn discovery_is_broadcast_request() {
        let msg = new_discovery(&HW, &[]);
        assert_eq!(msg.opcode(), Opcode::BootRequest);
        assert_eq!(msg.opts().msg_type(), Some(MessageType::Discover));
        assert_eq!(&msg.chaddr()[..6], &HW[..]);
        assert!(msg.flags().broadcast());
        assert!(msg.opts().get(OptionCode::ParameterRequestList).is_some());
    }

    #[test]
    fn discovery_applies_modifiers_last() {
        let msg = new_discovery(&HW, &[with_transaction_id(9), with_hostname("pxe")]);
        assert_eq!(msg.xid(), 9);
        assert_eq!(
            msg.opts().get(OptionCode::Hostname),
            Some(&DhcpOption::Hostname("pxe".to_string()))
        );
    }

    #[test]
    fn request_copies_offer_identity() {
        let request = new_request_from_offer(&offer(), &[]);
        assert_eq!(request.xid(), 42);
        assert_eq!(request.opcode(), Opcode::BootRequest);
        assert_eq!(&request.chaddr()[..6], &HW[..]);
        assert_eq!(request.opts().msg_type(), Some(MessageType::Request));
        assert_eq!(
            request.opts().get(OptionCode::RequestedIpAddress),
            Some(&DhcpOption::RequestedIpAddress(Ipv4Addr::new(192, 0, 2, 50)))
        );
        assert_eq!(
            request.opts().get(OptionCode::ServerIdentifier),
            Some(&DhcpOption::ServerIdentifier(Ipv4Addr::new(192, 0, 2, 1)))
        );
    }

    #[test]
    fn request_without_server_identifier_omits_it() {
        let mut offer = offer();
        offer.opts_mut().remove(OptionCode::ServerIdentifier);
        let request = new_request_from_offer(&offer, &[]);
        assert!(request.opts().get(OptionCode::ServerIdentifier).is_none());
    }

    #[test]
    fn summary_names_type_and_addresses() {
        let line = summary(&offer());
        assert!(line.starts_with("Offer xid=0x0000002a"));
        assert!(line.contains("yiaddr=192.0.2.50"));
        assert!(line.contains("server_id=192.0.2.1"));
        assert!(line.contains("chaddr=02:00:5e:10:20:30"));
    }
}
