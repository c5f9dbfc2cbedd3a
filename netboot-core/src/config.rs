use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use thiserror::Error;

/// Well-known DHCPv4 server port.
pub const SERVER_PORT: u16 = 67;
/// Well-known DHCPv4 client port.
pub const CLIENT_PORT: u16 = 68;

/// Default time to wait for a reply after sending.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);
/// Default time allowed for a send to complete.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors returned when an [`ExchangeConfig`] cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {role} address {addr}: not an IPv4 address")]
    NotIpv4 { role: &'static str, addr: SocketAddr },
    #[error("{which} timeout must be greater than zero")]
    ZeroTimeout { which: &'static str },
}

/// Timeouts and endpoints for one DHCPv4 client.
///
/// The value is owned by the client performing the exchange. Callers that
/// want process-wide defaults keep them in their own configuration layer and
/// pass a copy in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// How long each receive step waits for a matching reply.
    pub read_timeout: Duration,
    /// How long each send may take.
    pub write_timeout: Duration,
    /// Local bind address. `None` means `0.0.0.0:68`.
    pub local_addr: Option<SocketAddr>,
    /// Destination for outgoing messages. `None` means `255.255.255.255:67`.
    pub remote_addr: Option<SocketAddr>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            local_addr: None,
            remote_addr: None,
        }
    }
}

impl ExchangeConfig {
    /// Resolved local address, falling back to the unspecified client address.
    pub fn local(&self) -> Result<SocketAddrV4, ConfigError> {
        let default = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, CLIENT_PORT);
        to_v4("local", self.local_addr, default)
    }

    /// Resolved remote address, falling back to the limited broadcast address.
    pub fn remote(&self) -> Result<SocketAddrV4, ConfigError> {
        let default = SocketAddrV4::new(Ipv4Addr::BROADCAST, SERVER_PORT);
        to_v4("remote", self.remote_addr, default)
    }

    /// Check that addresses resolve and timeouts are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { which: "read" });
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { which: "write" });
        }
        self.local()?;
        self.remote()?;
        Ok(())
    }
}

fn to_v4(
    role: &'static str,
    addr: Option<SocketAddr>,
    default: SocketAddrV4,
) -> Result<SocketAddrV4, ConfigError> {
    match addr {
        None => Ok(default),
        Some(SocketAddr::V4(v4)) => Ok(v4),
        Some(addr @ SocketAddr::V6(_)) => Err(ConfigError::NotIpv4 { role, addr }),
    }
}
