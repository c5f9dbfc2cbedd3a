//! Caller-supplied message transforms.
//!
//! A [`Modifier`] is a pure function over a DHCPv4 message. The exchange
//! applies the caller's modifiers, in order, to the Discover and again to the
//! Request built from the Offer, after the builder has set its own fields.

use std::fmt;
use std::sync::Arc;

use dhcproto::v4::{DhcpOption, Flags, Message, OptionCode};

/// One ordered transform applied to an outgoing message.
#[derive(Clone)]
pub struct Modifier(Arc<dyn Fn(&mut Message) + Send + Sync>);

impl Modifier {
    pub fn new(f: impl Fn(&mut Message) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, message: &mut Message) {
        (self.0)(message)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Modifier(..)")
    }
}

/// Apply `modifiers` to `message` in slice order.
pub fn apply_all(message: &mut Message, modifiers: &[Modifier]) {
    for modifier in modifiers {
        modifier.apply(message);
    }
}

/// Insert `option`, replacing any option with the same code.
pub fn with_option(option: DhcpOption) -> Modifier {
    Modifier::new(move |msg| {
        msg.opts_mut().insert(option.clone());
    })
}

/// Set the host name option (12).
pub fn with_hostname(hostname: impl Into<String>) -> Modifier {
    with_option(DhcpOption::Hostname(hostname.into()))
}

/// Set the vendor class identifier option (60).
pub fn with_class_identifier(class_id: impl Into<Vec<u8>>) -> Modifier {
    with_option(DhcpOption::ClassIdentifier(class_id.into()))
}

/// Set the client identifier option (61).
pub fn with_client_identifier(client_id: impl Into<Vec<u8>>) -> Modifier {
    with_option(DhcpOption::ClientIdentifier(client_id.into()))
}

/// Append `codes` to the parameter request list, skipping duplicates.
pub fn with_requested_options(codes: Vec<OptionCode>) -> Modifier {
    Modifier::new(move |msg| {
        let mut list = match msg.opts().get(OptionCode::ParameterRequestList) {
            Some(DhcpOption::ParameterRequestList(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        for code in &codes {
            if !list.contains(code) {
                list.push(*code);
            }
        }
        msg.opts_mut()
            .insert(DhcpOption::ParameterRequestList(list));
    })
}

/// Set or clear the broadcast flag.
pub fn with_broadcast(broadcast: bool) -> Modifier {
    Modifier::new(move |msg| {
        let flags = if broadcast {
            Flags::default().set_broadcast()
        } else {
            Flags::default()
        };
        msg.set_flags(flags);
    })
}

/// Force a transaction id instead of the random one chosen by the builder.
pub fn with_transaction_id(xid: u32) -> Modifier {
    Modifier::new(move |msg| {
        msg.set_xid(xid);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_apply_in_order() {
        let mut msg = Message::default();
        apply_all(
            &mut msg,
            &[with_hostname("first"), with_hostname("second")],
        );
        assert_eq!(
            msg.opts().get(OptionCode::Hostname),
            Some(&DhcpOption::Hostname("second".to_string()))
        );
    }

    #[test]
    fn requested_options_merge_without_duplicates() {
        let mut msg = Message::default();
        apply_all(
            &mut msg,
            &[
                with_requested_options(vec![OptionCode::SubnetMask, OptionCode::Router]),
                with_requested_options(vec![OptionCode::Router, OptionCode::NtpServers]),
            ],
        );
        assert_eq!(
            msg.opts().get(OptionCode::ParameterRequestList),
            Some(&DhcpOption::ParameterRequestList(vec![
                OptionCode::SubnetMask,
                OptionCode::Router,
                OptionCode::NtpServers,
            ]))
        );
    }

    #[test]
    fn broadcast_flag_toggles() {
        let mut msg = Message::default();
        with_broadcast(true).apply(&mut msg);
        assert!(msg.flags().broadcast());
        with_broadcast(false).apply(&mut msg);
        assert!(!msg.flags().broadcast());
    }

    #[test]
    fn transaction_id_is_forced() {
        let mut msg = Message::default();
        with_transaction_id(0xdead_beef).apply(&mut msg);
        assert_eq!(msg.xid(), 0xdead_beef);
    }
}
