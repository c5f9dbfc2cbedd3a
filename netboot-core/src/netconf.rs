//! Normalized network configuration derived from a DHCP reply.
//!
//! DHCPv4 and DHCPv6 describe addresses differently: v4 hands out one address
//! with a netmask and a lease time, v6 hands out any number of addresses each
//! with its own preferred/valid lifetime pair. Both are reduced to the same
//! [`NetConf`].
//!
//! Extraction is all-or-nothing. Any error aborts before a [`NetConf`] is
//! built.

use std::fmt::{self, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use dhcproto::v4::{self, OptionCode};
use dhcproto::{v6, Name};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

/// Errors raised while extracting a [`NetConf`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetConfError {
    #[error("no {0} option in reply")]
    MissingOption(&'static str),
    #[error("{0} is missing or zero in reply")]
    MissingField(&'static str),
    #[error("invalid {option}: {reason}")]
    InvalidValue {
        option: &'static str,
        reason: String,
    },
    #[error("{0} is not supported on this platform")]
    Unsupported(String),
}

/// One address assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddrConf {
    address: IpAddr,
    prefix_len: u8,
    #[serde(rename = "preferred_lifetime_secs", serialize_with = "as_secs")]
    preferred_lifetime: Duration,
    #[serde(rename = "valid_lifetime_secs", serialize_with = "as_secs")]
    valid_lifetime: Duration,
}

impl AddrConf {
    pub fn new(
        address: IpAddr,
        prefix_len: u8,
        preferred_lifetime: Duration,
        valid_lifetime: Duration,
    ) -> Self {
        Self {
            address,
            prefix_len,
            preferred_lifetime,
            valid_lifetime,
        }
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn preferred_lifetime(&self) -> Duration {
        self.preferred_lifetime
    }

    pub fn valid_lifetime(&self) -> Duration {
        self.valid_lifetime
    }
}

impl Display for AddrConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} preferred={}s valid={}s",
            self.address,
            self.prefix_len,
            self.preferred_lifetime.as_secs(),
            self.valid_lifetime.as_secs()
        )
    }
}

fn as_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

/// Addresses, resolvers, routers and time servers for one interface.
///
/// Built once by extraction and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetConf {
    addresses: Vec<AddrConf>,
    dns_servers: Vec<IpAddr>,
    dns_search_list: Vec<String>,
    routers: Vec<IpAddr>,
    ntp_servers: Vec<IpAddr>,
}

impl NetConf {
    pub fn addresses(&self) -> &[AddrConf] {
        &self.addresses
    }

    /// DNS servers in the order the server listed them.
    pub fn dns_servers(&self) -> &[IpAddr] {
        &self.dns_servers
    }

    pub fn dns_search_list(&self) -> &[String] {
        &self.dns_search_list
    }

    pub fn routers(&self) -> &[IpAddr] {
        &self.routers
    }

    pub fn ntp_servers(&self) -> &[IpAddr] {
        &self.ntp_servers
    }
}

/// Conversion of a protocol reply into a [`NetConf`].
pub trait ExtractNetConf {
    fn net_conf(&self) -> Result<NetConf, NetConfError>;
}

impl ExtractNetConf for v4::Message {
    fn net_conf(&self) -> Result<NetConf, NetConfError> {
        netconf_from_v4(self)
    }
}

impl ExtractNetConf for v6::Message {
    fn net_conf(&self) -> Result<NetConf, NetConfError> {
        netconf_from_v6(self)
    }
}

/// Extract configuration from a DHCPv6 Reply.
///
/// The first IA_NA is required. DNS servers, the domain search list and NTP
/// servers are taken when present and left empty otherwise.
pub fn netconf_from_v6(msg: &v6::Message) -> Result<NetConf, NetConfError> {
    let iana = msg
        .opts()
        .iter()
        .find_map(|opt| match opt {
            v6::DhcpOption::IANA(iana) => Some(iana),
            _ => None,
        })
        .ok_or(NetConfError::MissingOption("IA_NA"))?;

    let addresses = iana
        .opts
        .iter()
        .filter_map(|opt| match opt {
            v6::DhcpOption::IAAddr(ia_addr) => Some(AddrConf::new(
                IpAddr::V6(ia_addr.addr),
                128,
                Duration::from_secs(u64::from(ia_addr.preferred_life)),
                Duration::from_secs(u64::from(ia_addr.valid_life)),
            )),
            _ => None,
        })
        .collect();

    let dns_servers = match msg.opts().get(v6::OptionCode::DomainNameServers) {
        Some(v6::DhcpOption::DomainNameServers(addrs)) => {
            addrs.iter().copied().map(IpAddr::V6).collect()
        }
        _ => Vec::new(),
    };

    let dns_search_list = match msg.opts().get(v6::OptionCode::DomainSearchList) {
        Some(v6::DhcpOption::DomainSearchList(names)) => search_labels(names),
        _ => Vec::new(),
    };

    let ntp_servers = match msg.opts().get(v6::OptionCode::NtpServer) {
        Some(v6::DhcpOption::NtpServer(suboptions)) => suboptions
            .iter()
            .filter_map(|sub| match sub {
                v6::NtpSuboption::ServerAddress(addr)
                | v6::NtpSuboption::MulticastAddress(addr) => Some(IpAddr::V6(*addr)),
                v6::NtpSuboption::FQDN(_) => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(NetConf {
        addresses,
        dns_servers,
        dns_search_list,
        routers: Vec::new(),
        ntp_servers,
    })
}

/// Extract configuration from a DHCPv4 Ack (or Offer).
///
/// `yiaddr` and a subnet mask are required. A missing lease time counts as
/// zero. A domain search option that is present but lists no domains is
/// rejected; an absent one is not.
pub fn netconf_from_v4(msg: &v4::Message) -> Result<NetConf, NetConfError> {
    let address = msg.yiaddr();
    if address.is_unspecified() {
        return Err(NetConfError::MissingField("your IP address"));
    }

    let mask = match msg.opts().get(OptionCode::SubnetMask) {
        Some(v4::DhcpOption::SubnetMask(mask)) => *mask,
        _ => return Err(NetConfError::MissingOption("subnet mask")),
    };
    let prefix_len = match mask_prefix_len(mask) {
        Some(len) if len > 0 => len,
        _ => {
            return Err(NetConfError::InvalidValue {
                option: "subnet mask",
                reason: format!("{mask} has no usable prefix"),
            })
        }
    };

    let lease = match msg.opts().get(OptionCode::AddressLeaseTime) {
        Some(v4::DhcpOption::AddressLeaseTime(secs)) => Duration::from_secs(u64::from(*secs)),
        _ => Duration::ZERO,
    };

    let dns_search_list = match msg.opts().get(OptionCode::DomainSearch) {
        None => Vec::new(),
        Some(v4::DhcpOption::DomainSearch(names)) => {
            let labels = search_labels(names);
            if labels.is_empty() {
                return Err(NetConfError::InvalidValue {
                    option: "domain search list",
                    reason: "option is present but lists no domains".to_string(),
                });
            }
            labels
        }
        Some(other) => {
            return Err(NetConfError::InvalidValue {
                option: "domain search list",
                reason: format!("unexpected option {other:?}"),
            })
        }
    };

    Ok(NetConf {
        addresses: vec![AddrConf::new(
            IpAddr::V4(address),
            prefix_len,
            Duration::ZERO,
            lease,
        )],
        dns_servers: v4_addrs(msg, OptionCode::DomainNameServer),
        dns_search_list,
        routers: v4_addrs(msg, OptionCode::Router),
        ntp_servers: v4_addrs(msg, OptionCode::NtpServers),
    })
}

/// Apply `netconf` to the operating system.
///
/// Address, route and resolver programming is left to platform tooling;
/// this always reports [`NetConfError::Unsupported`] so callers never assume
/// it happened.
pub fn configure_interface(ifname: &str, netconf: &NetConf) -> Result<(), NetConfError> {
    debug!(
        ifname,
        addresses = netconf.addresses.len(),
        "refusing to program interface"
    );
    Err(NetConfError::Unsupported(format!(
        "applying network configuration to {ifname}"
    )))
}

/// Prefix length of a contiguous netmask; `None` for non-contiguous masks.
fn mask_prefix_len(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let ones = bits.leading_ones();
    (bits.count_ones() == ones).then_some(ones as u8)
}

/// Dotted labels without the trailing root dot; the root name itself is dropped.
fn search_labels(names: &[Name]) -> Vec<String> {
    names
        .iter()
        .map(|name| name.to_utf8().trim_end_matches('.').to_string())
        .filter(|label| !label.is_empty())
        .collect()
}

fn v4_addrs(msg: &v4::Message, code: OptionCode) -> Vec<IpAddr> {
    match msg.opts().get(code) {
        Some(v4::DhcpOption::Router(addrs))
        | Some(v4::DhcpOption::DomainNameServer(addrs))
        | Some(v4::DhcpOption::NtpServers(addrs)) => {
            addrs.iter().copied().map(IpAddr::V4).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_masks_have_prefix_lengths() {
        assert_eq!(mask_prefix_len(Ipv4Addr::new(255, 255, 255, 0)), Some(24));
        assert_eq!(mask_prefix_len(Ipv4Addr::new(255, 255, 255, 255)), Some(32));
        assert_eq!(mask_prefix_len(Ipv4Addr::new(0, 0, 0, 0)), Some(0));
    }

    #[test]
    fn non_contiguous_masks_are_rejected() {
        assert_eq!(mask_prefix_len(Ipv4Addr::new(255, 0, 255, 0)), None);
    }

    #[test]
    fn addr_conf_display() {
        let addr = AddrConf::new(
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 50)),
            24,
            Duration::ZERO,
            Duration::from_secs(3600),
        );
        assert_eq!(addr.to_string(), "192.0.2.50/24 preferred=0s valid=3600s");
    }

    #[test]
    fn search_labels_drop_root_and_trailing_dot() {
        let names = vec![
            Name::from_ascii("example.com.").expect("name"),
            Name::root(),
            Name::from_ascii("lab.example.org").expect("name"),
        ];
        assert_eq!(
            search_labels(&names),
            vec!["example.com".to_string(), "lab.example.org".to_string()]
        );
    }

    #[test]
    fn configure_interface_is_unsupported() {
        let err = configure_interface("eth0", &NetConf::default()).expect_err("unsupported");
        assert!(matches!(err, NetConfError::Unsupported(_)));
        assert!(err.to_string().contains("eth0"));
    }
}
