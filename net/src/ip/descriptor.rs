// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::ipv4::{
    Contains, InvalidIpv4PrefixLength, Ipv4Prefix, Ipv4PrefixLen, Ipv4PrefixParseError,
};
use crate::ipv6::{InvalidIpv6PrefixLength, Ipv6Prefix, Ipv6PrefixLen, Ipv6PrefixParseError};
use ipnet::IpNet;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;

/// An IP network: an address with every bit beyond the prefix length cleared, plus that prefix
/// length.
///
/// The address family is carried by the variant and is always the family of the address the
/// descriptor was built from.  There is no way to build a descriptor with host bits set, so two
/// descriptors are equal exactly when they designate the same network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NetworkDescriptor {
    /// An IPv4 network
    V4(Ipv4Prefix),
    /// An IPv6 network
    V6(Ipv6Prefix),
}

/// The prefix length was out of range for the family of the address it was paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPrefixLength {
    /// Prefix length too long for ipv4
    #[error(transparent)]
    V4(#[from] InvalidIpv4PrefixLength),
    /// Prefix length too long for ipv6
    #[error(transparent)]
    V6(#[from] InvalidIpv6PrefixLength),
}

/// Errors which may occur when parsing a [`NetworkDescriptor`] from CIDR notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkDescriptorParseError {
    /// A failed attempt to parse an ipv4 network
    #[error(transparent)]
    V4(#[from] Ipv4PrefixParseError),
    /// A failed attempt to parse an ipv6 network
    #[error(transparent)]
    V6(#[from] Ipv6PrefixParseError),
    /// Input is neither an ipv4 nor an ipv6 network
    #[error("failed to parse input '{0}' as ipv4 or ipv6 network")]
    ParseFailure(String),
}

impl NetworkDescriptor {
    /// Build the network of length `len` containing `addr`.
    ///
    /// Host bits of `addr` are cleared; this is the only way to build a descriptor from
    /// untrusted parts.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPrefixLength`] if `len` exceeds the bit width of the family of `addr`.
    pub fn new_masked(
        addr: impl Into<IpAddr> + Debug,
        len: u8,
    ) -> Result<Self, InvalidPrefixLength> {
        Ok(match addr.into() {
            IpAddr::V4(addr) => NetworkDescriptor::V4(Ipv4Prefix::new_masked(addr, len)?),
            IpAddr::V6(addr) => NetworkDescriptor::V6(Ipv6Prefix::new_masked(addr, len)?),
        })
    }

    /// Returns the network address.
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        match self {
            NetworkDescriptor::V4(p) => IpAddr::V4(p.address()),
            NetworkDescriptor::V6(p) => IpAddr::V6(p.address()),
        }
    }

    /// Returns the network address as raw bytes: 4 for IPv4, 16 for IPv6.
    #[must_use]
    pub fn octets(&self) -> Vec<u8> {
        match self {
            NetworkDescriptor::V4(p) => p.address().octets().to_vec(),
            NetworkDescriptor::V6(p) => p.address().octets().to_vec(),
        }
    }

    /// Returns the prefix length of the network.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        match self {
            NetworkDescriptor::V4(p) => p.prefix_len().as_u8(),
            NetworkDescriptor::V6(p) => p.prefix_len().as_u8(),
        }
    }

    /// Returns the bit width of the address family (32 or 128).
    #[must_use]
    pub const fn max_prefix_len(&self) -> u8 {
        match self {
            NetworkDescriptor::V4(_) => Ipv4PrefixLen::MAX_LEN,
            NetworkDescriptor::V6(_) => Ipv6PrefixLen::MAX_LEN,
        }
    }

    /// Returns true if this descriptor designates a single address.
    #[must_use]
    pub const fn is_host_route(&self) -> bool {
        match self {
            NetworkDescriptor::V4(p) => p.is_host_route(),
            NetworkDescriptor::V6(p) => p.is_host_route(),
        }
    }

    /// Safe cast of [`NetworkDescriptor`] to `ipnet::IpNet`
    #[must_use]
    pub const fn as_net(&self) -> IpNet {
        match self {
            NetworkDescriptor::V4(p) => IpNet::V4(p.as_net()),
            NetworkDescriptor::V6(p) => IpNet::V6(p.as_net()),
        }
    }
}

impl From<IpAddr> for NetworkDescriptor {
    fn from(value: IpAddr) -> Self {
        match value {
            IpAddr::V4(addr) => NetworkDescriptor::V4(Ipv4Prefix::from(addr)),
            IpAddr::V6(addr) => NetworkDescriptor::V6(Ipv6Prefix::from(addr)),
        }
    }
}

impl From<Ipv4Prefix> for NetworkDescriptor {
    fn from(value: Ipv4Prefix) -> Self {
        NetworkDescriptor::V4(value)
    }
}

impl From<Ipv6Prefix> for NetworkDescriptor {
    fn from(value: Ipv6Prefix) -> Self {
        NetworkDescriptor::V6(value)
    }
}

impl From<NetworkDescriptor> for IpNet {
    fn from(value: NetworkDescriptor) -> Self {
        value.as_net()
    }
}

impl Display for NetworkDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkDescriptor::V4(p) => write!(f, "{p}"),
            NetworkDescriptor::V6(p) => write!(f, "{p}"),
        }
    }
}

impl FromStr for NetworkDescriptor {
    type Err = NetworkDescriptorParseError;

    /// Parse a network in CIDR notation.  The prefix length is mandatory and host bits must be
    /// clear.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match IpNet::from_str(s) {
            Ok(IpNet::V4(_)) => Ok(NetworkDescriptor::V4(Ipv4Prefix::from_str(s)?)),
            Ok(IpNet::V6(_)) => Ok(NetworkDescriptor::V6(Ipv6Prefix::from_str(s)?)),
            Err(_) => Err(NetworkDescriptorParseError::ParseFailure(s.to_string())),
        }
    }
}

impl Contains<NetworkDescriptor> for NetworkDescriptor {
    fn contains(&self, other: NetworkDescriptor) -> bool {
        match (self, other) {
            (NetworkDescriptor::V4(x), NetworkDescriptor::V4(y)) => x.contains(y),
            (NetworkDescriptor::V6(x), NetworkDescriptor::V6(y)) => x.contains(y),
            _ => false,
        }
    }
}

impl Contains<IpAddr> for NetworkDescriptor {
    fn contains(&self, other: IpAddr) -> bool {
        match (self, other) {
            (NetworkDescriptor::V4(x), IpAddr::V4(y)) => x.contains(y),
            (NetworkDescriptor::V6(x), IpAddr::V6(y)) => x.contains(y),
            _ => false,
        }
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::ip::NetworkDescriptor;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for NetworkDescriptor {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(if driver.gen_bool(Some(0.5))? {
                NetworkDescriptor::V4(driver.produce()?)
            } else {
                NetworkDescriptor::V6(driver.produce()?)
            })
        }
    }
}
