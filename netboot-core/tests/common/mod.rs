#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use dhcproto::v4::{DhcpOption, HType, Message, MessageType, Opcode};
use dhcproto::{Decodable, Decoder, Encodable};
use netboot_core::Transport;

pub const HW: [u8; 6] = [0x02, 0x42, 0xac, 0x11, 0x00, 0x02];
pub const XID: u32 = 0x1234_5678;

/// What the scripted transport hands back on the next receive.
pub enum Incoming {
    Datagram(Vec<u8>),
    Error(io::ErrorKind),
}

/// In-memory transport replaying a fixed script of datagrams.
///
/// Once the script runs out, receives either time out immediately or, with
/// `endless_noise`, keep returning garbage until the read deadline passes.
#[derive(Default)]
pub struct ScriptedTransport {
    pub incoming: VecDeque<Incoming>,
    pub sent: Vec<(Vec<u8>, SocketAddr)>,
    pub read_deadlines: Vec<Instant>,
    pub write_deadlines: Vec<Instant>,
    pub fail_send: Option<io::ErrorKind>,
    pub endless_noise: bool,
    read_deadline: Option<Instant>,
}

impl ScriptedTransport {
    pub fn new(incoming: Vec<Incoming>) -> Self {
        Self {
            incoming: incoming.into(),
            ..Self::default()
        }
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent
            .iter()
            .map(|(bytes, _)| Message::decode(&mut Decoder::new(bytes)).expect("sent message decodes"))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send_to(&mut self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        if let Some(kind) = self.fail_send {
            return Err(io::Error::new(kind, "scripted send failure"));
        }
        self.sent.push((buf.to_vec(), dest));
        Ok(buf.len())
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let from: SocketAddr = "192.0.2.1:67".parse().expect("addr");
        match self.incoming.pop_front() {
            Some(Incoming::Datagram(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok((bytes.len(), from))
            }
            Some(Incoming::Error(kind)) => Err(io::Error::new(kind, "scripted receive failure")),
            None if self.endless_noise => {
                let deadline = self.read_deadline.expect("read deadline armed");
                if Instant::now() >= deadline {
                    return Err(io::Error::new(io::ErrorKind::WouldBlock, "deadline"));
                }
                buf[..3].copy_from_slice(&[1, 2, 3]);
                Ok((3, from))
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no more datagrams")),
        }
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.read_deadline = Some(deadline);
        self.read_deadlines.push(deadline);
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.write_deadlines.push(deadline);
        Ok(())
    }
}

/// Server reply for transaction `xid`.
pub fn reply(xid: u32, msg_type: MessageType) -> Message {
    let mut msg = Message::default();
    msg.set_opcode(Opcode::BootReply)
        .set_htype(HType::Eth)
        .set_chaddr(&HW)
        .set_xid(xid)
        .set_yiaddr(Ipv4Addr::new(192, 0, 2, 50));
    msg.opts_mut().insert(DhcpOption::MessageType(msg_type));
    msg.opts_mut()
        .insert(DhcpOption::ServerIdentifier(Ipv4Addr::new(192, 0, 2, 1)));
    msg.opts_mut()
        .insert(DhcpOption::SubnetMask(Ipv4Addr::new(255, 255, 255, 0)));
    msg.opts_mut().insert(DhcpOption::AddressLeaseTime(3600));
    msg
}

pub fn datagram(msg: &Message) -> Incoming {
    Incoming::Datagram(msg.to_vec().expect("encode reply"))
}
