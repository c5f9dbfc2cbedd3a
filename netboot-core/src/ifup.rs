//! Interface lookup and link readiness.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

/// Default upper bound on waiting for a link.
pub const DEFAULT_IFUP_TIMEOUT: Duration = Duration::from_secs(10);
/// Default delay between link state checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors returned by interface lookup and [`wait_until_up`].
#[derive(Debug, Error)]
pub enum IfUpError {
    #[error("interface {name} not found")]
    NotFound { name: String },
    #[error("failed to look up interface {name}: {source}")]
    Lookup { name: String, source: io::Error },
    #[error("timed out while waiting for {name} to come up")]
    Timeout { name: String, timeout: Duration },
    #[error("interface lookup is not supported on this platform")]
    Unsupported,
}

/// Snapshot of a network interface at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    index: Option<u32>,
    hardware_addr: Option<[u8; 6]>,
    up: bool,
}

impl Interface {
    pub fn new(name: impl Into<String>, hardware_addr: Option<[u8; 6]>, up: bool) -> Self {
        Self {
            name: name.into(),
            index: None,
            hardware_addr,
            up,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn hardware_addr(&self) -> Option<[u8; 6]> {
        self.hardware_addr
    }

    pub fn is_up(&self) -> bool {
        self.up
    }
}

/// Polling parameters for [`wait_until_up`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfUpOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for IfUpOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_IFUP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Source of interface state.
pub trait InterfaceQuery {
    fn lookup(&self, name: &str) -> Result<Interface, IfUpError>;
}

/// Wait until `name` reports the up flag.
///
/// Lookup errors end the wait immediately. An interface that is already up is
/// returned without sleeping.
pub fn wait_until_up<Q: InterfaceQuery + ?Sized>(
    query: &Q,
    name: &str,
    options: &IfUpOptions,
) -> Result<Interface, IfUpError> {
    let start = Instant::now();
    loop {
        let iface = query.lookup(name)?;
        if iface.is_up() {
            info!(ifname = name, waited = ?start.elapsed(), "interface is up");
            return Ok(iface);
        }

        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            return Err(IfUpError::Timeout {
                name: name.to_string(),
                timeout: options.timeout,
            });
        }
        debug!(ifname = name, "interface not up yet");
        thread::sleep(options.poll_interval.min(options.timeout - elapsed));
    }
}

/// Interface state as reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

#[cfg(unix)]
impl InterfaceQuery for SystemInterfaces {
    fn lookup(&self, name: &str) -> Result<Interface, IfUpError> {
        use nix::ifaddrs::getifaddrs;
        use nix::net::if_::{if_nametoindex, InterfaceFlags};

        let addrs = getifaddrs().map_err(|errno| IfUpError::Lookup {
            name: name.to_string(),
            source: io::Error::from(errno),
        })?;

        let mut found: Option<Interface> = None;
        for ifaddr in addrs.filter(|a| a.interface_name == name) {
            let iface = found.get_or_insert_with(|| Interface::new(name, None, false));
            iface.up |= ifaddr.flags.contains(InterfaceFlags::IFF_UP);
            if iface.hardware_addr.is_none() {
                iface.hardware_addr = ifaddr.address.as_ref().and_then(link_layer_addr);
            }
        }

        let mut iface = found.ok_or_else(|| IfUpError::NotFound {
            name: name.to_string(),
        })?;
        iface.index = if_nametoindex(name).ok();
        Ok(iface)
    }
}

#[cfg(not(unix))]
impl InterfaceQuery for SystemInterfaces {
    fn lookup(&self, _name: &str) -> Result<Interface, IfUpError> {
        Err(IfUpError::Unsupported)
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
fn link_layer_addr(addr: &nix::sys::socket::SockaddrStorage) -> Option<[u8; 6]> {
    addr.as_link_addr().and_then(|link| link.addr())
}

#[cfg(all(
    unix,
    not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))
))]
fn link_layer_addr(_addr: &nix::sys::socket::SockaddrStorage) -> Option<[u8; 6]> {
    None
}
