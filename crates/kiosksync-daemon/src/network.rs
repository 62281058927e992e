//! Terminal network address discovery
//!
//! The agent binds to its address on the terminal VPN rather than to a
//! wildcard, so a server-side reverse lookup always reaches the right
//! interface. Discovery scans the host's interfaces for IPv4 addresses
//! inside the configured network and demands exactly one match: zero
//! means the VPN is down, more than one means the host is misconfigured.

use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid network specification: {0}")]
    InvalidSpec(String),
    #[error("could not enumerate network interfaces: {0}")]
    Enumerate(#[from] std::io::Error),
    #[error("no address within {0} found")]
    NoAddress(Ipv4Network),
    #[error("multiple addresses within {network} found: {addresses:?}")]
    Ambiguous {
        network: Ipv4Network,
        addresses: Vec<Ipv4Addr>,
    },
}

/// An IPv4 network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Network {
    address: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Network {
    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    /// Whether the given address lies within this network.
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from(addr) & mask == u32::from(self.address) & mask
    }
}

impl FromStr for Ipv4Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NetworkError::InvalidSpec(s.to_string());

        let (address, prefix) = s.split_once('/').ok_or_else(invalid)?;
        let address: Ipv4Addr = address.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

        if prefix > 32 {
            return Err(invalid());
        }

        Ok(Self { address, prefix })
    }
}

impl std::fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

/// Find the host's single IPv4 address inside the given network.
pub fn discover_address(network: Ipv4Network) -> Result<Ipv4Addr, NetworkError> {
    let addresses: Vec<Ipv4Addr> = if_addrs::get_if_addrs()?
        .into_iter()
        .filter_map(|interface| match interface.ip() {
            std::net::IpAddr::V4(addr) => Some(addr),
            std::net::IpAddr::V6(_) => None,
        })
        .filter(|addr| network.contains(*addr))
        .collect();

    match addresses.as_slice() {
        [] => Err(NetworkError::NoAddress(network)),
        [addr] => Ok(*addr),
        _ => Err(NetworkError::Ambiguous { network, addresses }),
    }
}
