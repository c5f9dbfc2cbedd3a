//! Client-side DHCP exchange and network configuration extraction.
//!
//! The crate covers the two parts of netboot address acquisition that need
//! protocol reasoning: running a single Discover/Offer/Request/Ack exchange
//! over an unreliable broadcast transport, and turning the server's final
//! reply (DHCPv4 or DHCPv6) into a normalized [`NetConf`].
//!
//! Wire encoding is delegated to `dhcproto`. Nothing here programs the
//! operating system's interfaces, routes or resolver.
//!
//! # Layout
//!
//! - [`transport`]: datagram transport with absolute read/write deadlines
//! - [`filter`]: reply acceptance predicate
//! - [`modifiers`]: ordered message transforms supplied by the caller
//! - [`message`]: Discover/Request builders and diagnostics summaries
//! - [`exchange`]: the DORA client and its [`Conversation`]
//! - [`netconf`]: v4/v6 reply to [`NetConf`] extraction
//! - [`ifup`]: interface lookup and readiness polling
//! - [`config`]: per-client exchange configuration
//!
//! # Examples
//!
//! ```ignore
//! use netboot_core::{
//!     netconf_from_v4, wait_until_up, Client, ExchangeConfig, IfUpOptions, SystemInterfaces,
//!     UdpTransport,
//! };
//!
//! let iface = wait_until_up(&SystemInterfaces, "eth0", &IfUpOptions::default())?;
//! let config = ExchangeConfig::default();
//! let transport = UdpTransport::bind(iface.name(), config.local()?)?;
//! let mut client = Client::new(transport, config)?;
//! let conversation = client.exchange(&iface, &[])?;
//! let netconf = netconf_from_v4(conversation.ack().expect("ack"))?;
//! ```

pub mod config;
pub mod exchange;
pub mod filter;
pub mod ifup;
pub mod message;
pub mod modifiers;
pub mod netconf;
pub mod transport;

pub use config::{ConfigError, ExchangeConfig};
pub use exchange::{
    Client, Conversation, ExchangeError, ExchangeFailure, Step, MAX_UDP_RECEIVED_PACKET_SIZE,
};
pub use ifup::{wait_until_up, IfUpError, IfUpOptions, Interface, InterfaceQuery, SystemInterfaces};
pub use modifiers::Modifier;
pub use netconf::{
    configure_interface, netconf_from_v4, netconf_from_v6, AddrConf, ExtractNetConf, NetConf,
    NetConfError,
};
pub use transport::{is_timeout, Transport, UdpTransport};
