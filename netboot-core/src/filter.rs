use dhcproto::v4::{Message, MessageType, Opcode};

/// Decide whether `message` is the reply the exchange is waiting for.
///
/// The transaction id and opcode must match. `message_type` of `None`
/// accepts any DHCP message type.
pub fn accept(
    message: &Message,
    xid: u32,
    opcode: Opcode,
    message_type: Option<MessageType>,
) -> bool {
    if message.xid() != xid || message.opcode() != opcode {
        return false;
    }
    match message_type {
        None => true,
        Some(expected) => message.opts().msg_type() == Some(expected),
    }
}
