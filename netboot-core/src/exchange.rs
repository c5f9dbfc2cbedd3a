//! The DHCPv4 Discover/Offer/Request/Ack exchange.
//!
//! One call to [`Client::exchange`] performs exactly one attempt. Each step
//! sends once and then reads until a reply passes [`crate::filter::accept`]
//! or the step's read deadline passes. Unparsable datagrams and replies for
//! other transactions are logged and skipped.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use dhcproto::error::EncodeError;
use dhcproto::v4::{Message, MessageType, Opcode};
use dhcproto::{Decodable, Decoder, Encodable};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ExchangeConfig};
use crate::filter::accept;
use crate::ifup::Interface;
use crate::message::{new_discovery, new_request_from_offer, summary};
use crate::modifiers::Modifier;
use crate::transport::{is_timeout, Transport};

/// Largest datagram the receive loop reads in one call.
pub const MAX_UDP_RECEIVED_PACKET_SIZE: usize = 8192;

/// Position of a message within a [`Conversation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Discover,
    Offer,
    Request,
    Ack,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Discover, Step::Offer, Step::Request, Step::Ack];

    fn index(self) -> usize {
        match self {
            Step::Discover => 0,
            Step::Offer => 1,
            Step::Request => 2,
            Step::Ack => 3,
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Discover => "discover",
            Step::Offer => "offer",
            Step::Request => "request",
            Step::Ack => "ack",
        };
        f.write_str(name)
    }
}

/// Messages of one exchange attempt, in step order.
///
/// Holds at most one message per step and never skips a step.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, step: Step) -> Option<&Message> {
        self.messages.get(step.index())
    }

    pub fn discover(&self) -> Option<&Message> {
        self.get(Step::Discover)
    }

    pub fn offer(&self) -> Option<&Message> {
        self.get(Step::Offer)
    }

    pub fn request(&self) -> Option<&Message> {
        self.get(Step::Request)
    }

    pub fn ack(&self) -> Option<&Message> {
        self.get(Step::Ack)
    }

    /// Last step that completed.
    pub fn last_step(&self) -> Option<Step> {
        self.messages.len().checked_sub(1).map(|i| Step::ALL[i])
    }

    /// Pair each message with its step.
    pub fn steps(&self) -> impl Iterator<Item = (Step, &Message)> {
        Step::ALL.into_iter().zip(self.messages.iter())
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    fn record(&mut self, step: Step, message: Message) -> &Message {
        debug_assert_eq!(self.messages.len(), step.index(), "out of order {step}");
        self.messages.push(message);
        &self.messages[step.index()]
    }
}

/// Reasons a single send/receive step fails.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("timed out waiting for {}", describe_expected(.expected))]
    Timeout { expected: Option<MessageType> },
    #[error("failed to arm {which} deadline: {source}")]
    Deadline {
        which: &'static str,
        source: io::Error,
    },
    #[error("failed to send DHCP packet: {source}")]
    Send { source: io::Error },
    #[error("failed to receive DHCP response: {source}")]
    Receive { source: io::Error },
    #[error("failed to encode DHCP packet: {source}")]
    Encode { source: EncodeError },
    #[error("interface {name} has no hardware address")]
    NoHardwareAddress { name: String },
}

fn describe_expected(expected: &Option<MessageType>) -> String {
    match expected {
        Some(t) => format!("{t:?}"),
        None => "any reply".to_string(),
    }
}

/// A failed exchange together with everything exchanged before the failure.
#[derive(Debug, Error)]
#[error("DHCP exchange stopped after {} of 4 messages: {error}", .conversation.len())]
pub struct ExchangeFailure {
    pub conversation: Conversation,
    #[source]
    pub error: ExchangeError,
}

impl ExchangeFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self.error, ExchangeError::Timeout { .. })
    }
}

/// Performs DHCPv4 exchanges over a [`Transport`].
#[derive(Debug)]
pub struct Client<T> {
    transport: T,
    config: ExchangeConfig,
    remote: SocketAddr,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: ExchangeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let remote = SocketAddr::V4(config.remote()?);
        Ok(Self {
            transport,
            config,
            remote,
        })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run Discover, Offer, Request, Ack for `iface`.
    ///
    /// `modifiers` are applied in order to the Discover, then again to the
    /// Request derived from the Offer. On failure the conversation holds every
    /// message recorded before the failing step; a Request is recorded before
    /// it is sent.
    pub fn exchange(
        &mut self,
        iface: &Interface,
        modifiers: &[Modifier],
    ) -> Result<Conversation, ExchangeFailure> {
        let mut conversation = Conversation::default();

        let Some(hw_addr) = iface.hardware_addr() else {
            return Err(ExchangeFailure {
                conversation,
                error: ExchangeError::NoHardwareAddress {
                    name: iface.name().to_string(),
                },
            });
        };

        let discover = new_discovery(&hw_addr, modifiers);
        let sent = conversation.record(Step::Discover, discover);
        let offer = match self.send_receive(sent, Some(MessageType::Offer)) {
            Ok(offer) => offer,
            Err(error) => return Err(ExchangeFailure { conversation, error }),
        };
        let offer = conversation.record(Step::Offer, offer);

        let request = new_request_from_offer(offer, modifiers);
        let sent = conversation.record(Step::Request, request);
        let ack = match self.send_receive(sent, Some(MessageType::Ack)) {
            Ok(ack) => ack,
            Err(error) => return Err(ExchangeFailure { conversation, error }),
        };
        conversation.record(Step::Ack, ack);

        Ok(conversation)
    }

    /// Send `packet` once and wait for a reply of `message_type`.
    ///
    /// `None` accepts any reply carrying the packet's transaction id.
    pub fn send_receive(
        &mut self,
        packet: &Message,
        message_type: Option<MessageType>,
    ) -> Result<Message, ExchangeError> {
        let bytes = packet
            .to_vec()
            .map_err(|source| ExchangeError::Encode { source })?;

        let write_deadline = deadline_after("write", self.config.write_timeout)?;
        self.transport
            .set_write_deadline(write_deadline)
            .map_err(|source| ExchangeError::Deadline {
                which: "write",
                source,
            })?;
        self.transport
            .send_to(&bytes, self.remote)
            .map_err(|source| ExchangeError::Send { source })?;
        info!(remote = %self.remote, "sent {}", summary(packet));

        let read_deadline = deadline_after("read", self.config.read_timeout)?;
        self.transport
            .set_read_deadline(read_deadline)
            .map_err(|source| ExchangeError::Deadline {
                which: "read",
                source,
            })?;

        let mut buf = vec![0u8; MAX_UDP_RECEIVED_PACKET_SIZE];
        loop {
            if Instant::now() >= read_deadline {
                return Err(self.timed_out(message_type));
            }
            let (n, from) = match self.transport.recv_from(&mut buf) {
                Ok(received) => received,
                Err(err) if is_timeout(&err) => return Err(self.timed_out(message_type)),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(ExchangeError::Receive { source }),
            };

            let response = match Message::decode(&mut Decoder::new(&buf[..n])) {
                Ok(response) => response,
                Err(err) => {
                    debug!(%from, error = %err, "discarding unparsable DHCPv4 datagram");
                    continue;
                }
            };

            if !accept(&response, packet.xid(), Opcode::BootReply, message_type) {
                debug!(%from, "ignoring {}", summary(&response));
                continue;
            }

            info!(%from, "received {}", summary(&response));
            return Ok(response);
        }
    }

    fn timed_out(&self, expected: Option<MessageType>) -> ExchangeError {
        warn!(
            timeout = ?self.config.read_timeout,
            "no {} before read deadline",
            describe_expected(&expected)
        );
        ExchangeError::Timeout { expected }
    }
}

/// Absolute deadline `timeout` from now.
fn deadline_after(which: &'static str, timeout: Duration) -> Result<Instant, ExchangeError> {
    Instant::now()
        .checked_add(timeout)
        .ok_or_else(|| ExchangeError::Deadline {
            which,
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{which} timeout of {timeout:?} is past the end of the clock"),
            ),
        })
}
