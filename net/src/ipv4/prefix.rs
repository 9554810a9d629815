// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::AssertErrUnreachable;
use ipnet::{AddrParseError, Ipv4Net};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::debug;

/// An [`Ipv4Addr`] with a prefix length describing a network in CIDR notation.
///
/// Unlike [`Ipv4Net`] from the `ipnet` crate, this type ensures that only network bits are set
/// in the address.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Ipv4Net", into = "Ipv4Net"))]
#[repr(transparent)]
pub struct Ipv4Prefix(Ipv4Net);

/// A checked type describing the values 0 to 32, which constitute all legal prefix lengths for
/// Ipv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[repr(transparent)]
pub struct Ipv4PrefixLen(u8);

/// An error indicating that an invalid prefix length was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIpv4PrefixLength {
    /// The provided length is too long to form a legal [`Ipv4PrefixLen`]
    #[error("invalid prefix length {0}, max is {MAX}", MAX = Ipv4PrefixLen::MAX_LEN)]
    TooLong(u8),
}

/// An error indicating that an invalid network was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIpv4Network {
    /// The provided network description contains set non-network bits
    #[error("address {0}/{1} contains non network bits")]
    AddressContainsNonNetworkBits(Ipv4Addr, Ipv4PrefixLen),
    /// The provided prefix length is invalid
    #[error(transparent)]
    InvalidPrefix(#[from] InvalidIpv4PrefixLength),
}

/// An error produced when a string is not a valid Ipv4 network in CIDR notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ipv4PrefixParseError {
    /// failure to interpret string as an ip and a prefix length
    #[error(transparent)]
    AddrParseError(AddrParseError),
    /// the ip and prefix length do not form a network
    #[error(transparent)]
    InvalidIpv4Network(InvalidIpv4Network),
}

impl Ipv4PrefixLen {
    /// The largest possible prefix length for IPv4 (i.e. /32)
    pub const MAX_LEN: u8 = 32;
    /// The host route prefix length (i.e. /32)
    pub const MAX: Self = Self(Self::MAX_LEN);
    /// The "match everything" prefix length (i.e. /0)
    pub const MIN: Self = Self(0);

    /// Constructor which asserts if the provided length is invalid.
    ///
    /// # Panics
    ///
    /// Panics if the provided length is greater than [`Ipv4PrefixLen::MAX_LEN`].
    #[must_use]
    pub const fn new_assert(len: u8) -> Self {
        assert!(len <= Self::MAX_LEN, "invalid prefix length");
        Self(len)
    }

    /// Constructor which checks that the provided length is valid.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIpv4PrefixLength::TooLong`] if the provided length is greater than
    /// [`Ipv4PrefixLen::MAX_LEN`].
    pub const fn try_new(len: u8) -> Result<Ipv4PrefixLen, InvalidIpv4PrefixLength> {
        if len > Self::MAX_LEN {
            return Err(InvalidIpv4PrefixLength::TooLong(len));
        }
        Ok(Ipv4PrefixLen(len))
    }

    /// Interpret the [`Ipv4PrefixLen`] as a `u8`
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// The netmask selecting the network bits of this length (high order bits set)
    #[must_use]
    pub const fn mask(&self) -> u32 {
        match u32::MAX.checked_shl((Self::MAX_LEN - self.0) as u32) {
            Some(mask) => mask,
            None => 0,
        }
    }
}

impl TryFrom<u8> for Ipv4PrefixLen {
    type Error = InvalidIpv4PrefixLength;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ipv4PrefixLen::try_new(value)
    }
}

impl From<Ipv4PrefixLen> for u8 {
    fn from(value: Ipv4PrefixLen) -> Self {
        value.0
    }
}

impl PartialEq<u8> for Ipv4PrefixLen {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Ipv4PrefixLen> for u8 {
    fn eq(&self, other: &Ipv4PrefixLen) -> bool {
        *self == other.0
    }
}

impl Display for Ipv4PrefixLen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ipv4Prefix {
    /// The root [`Ipv4Prefix`], aka 0.0.0.0/0
    pub const ROOT: Ipv4Prefix = Ipv4Prefix::new_assert([0, 0, 0, 0], 0);

    /// Validating constructor which panics if the arguments are invalid.
    /// Useful in const contexts and testing.
    ///
    /// # Panics
    ///
    /// * Panics if the provided prefix length is greater than 32
    /// * Panics if the provided address contains non-network bits.
    #[must_use]
    pub const fn new_assert(addr: [u8; 4], len: u8) -> Self {
        let addr = Ipv4Addr::new(addr[0], addr[1], addr[2], addr[3]);
        let len = Ipv4PrefixLen::new_assert(len);
        assert!(
            addr.to_bits() & len.mask() == addr.to_bits(),
            "Ipv4Prefix address contains non network bits"
        );
        Ipv4Prefix(Ipv4Net::new_assert(addr, len.0))
    }

    /// Build the network containing `addr`, clearing every bit beyond the prefix length.
    ///
    /// This is the constructor to use on untrusted input: any host address is accepted and
    /// normalized to its network address.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of `len` if it is not a legal [`Ipv4PrefixLen`].
    pub fn new_masked<E>(
        addr: impl Into<Ipv4Addr> + Debug,
        len: impl TryInto<Ipv4PrefixLen, Error = E> + Debug,
    ) -> Result<Ipv4Prefix, E> {
        let addr = addr.into();
        let len = len.try_into()?;
        let network = Ipv4Addr::from_bits(addr.to_bits() & len.mask());
        if network != addr {
            debug!(%addr, %len, %network, "clearing host bits");
        }
        Ok(Ipv4Prefix(Ipv4Net::new(network, len.0).err_unreachable()))
    }

    /// Constructor which refuses addresses with host bits set.
    ///
    /// # Errors
    ///
    /// * Returns [`InvalidIpv4Network::InvalidPrefix`] if the provided prefix length is greater
    ///   than [`Ipv4PrefixLen::MAX_LEN`].
    /// * Returns [`InvalidIpv4Network::AddressContainsNonNetworkBits`] if the provided address
    ///   contains non-network bits.
    pub fn new_strict(
        addr: impl Into<Ipv4Addr> + Debug,
        len: impl TryInto<Ipv4PrefixLen, Error = InvalidIpv4PrefixLength> + Debug,
    ) -> Result<Ipv4Prefix, InvalidIpv4Network> {
        let addr = addr.into();
        let len = len.try_into()?;
        if addr.to_bits() & len.mask() != addr.to_bits() {
            return Err(InvalidIpv4Network::AddressContainsNonNetworkBits(addr, len));
        }
        Ok(Ipv4Prefix(Ipv4Net::new(addr, len.0).err_unreachable()))
    }

    /// Returns the address of the network.
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        self.0.addr()
    }

    /// Returns the prefix length of the network.
    #[must_use]
    pub const fn prefix_len(&self) -> Ipv4PrefixLen {
        Ipv4PrefixLen(self.0.prefix_len()) // checked already
    }

    /// Returns true if this network designates a single address (i.e. a /32)
    #[must_use]
    pub const fn is_host_route(&self) -> bool {
        self.0.prefix_len() == Ipv4PrefixLen::MAX_LEN
    }

    /// Safe cast of [`Ipv4Prefix`] to `ipnet::Ipv4Net`
    #[must_use]
    pub const fn as_net(&self) -> Ipv4Net {
        self.0
    }
}

impl From<Ipv4Addr> for Ipv4Prefix {
    fn from(value: Ipv4Addr) -> Self {
        Ipv4Prefix(Ipv4Net::new(value, Ipv4PrefixLen::MAX_LEN).err_unreachable())
    }
}

impl From<Ipv4Prefix> for Ipv4Net {
    fn from(value: Ipv4Prefix) -> Self {
        value.0
    }
}

impl TryFrom<Ipv4Net> for Ipv4Prefix {
    type Error = InvalidIpv4Network;

    fn try_from(value: Ipv4Net) -> Result<Self, Self::Error> {
        Ipv4Prefix::new_strict(value.addr(), value.prefix_len())
    }
}

impl Display for Ipv4Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address(), self.prefix_len())
    }
}

impl FromStr for Ipv4Prefix {
    type Err = Ipv4PrefixParseError;

    /// Parse an [`Ipv4Prefix`] from CIDR notation.
    ///
    /// # Errors
    ///
    /// * Returns [`Ipv4PrefixParseError::AddrParseError`] if the string is not of the form
    ///   `a.b.c.d/n`.
    /// * Returns [`Ipv4PrefixParseError::InvalidIpv4Network`] if host bits are set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net = Ipv4Net::from_str(s).map_err(Ipv4PrefixParseError::AddrParseError)?;
        Ipv4Prefix::try_from(net).map_err(Ipv4PrefixParseError::InvalidIpv4Network)
    }
}

/// Trait to describe containment relationships between different data types.
pub trait Contains<T> {
    /// Returns true if self "contains" other
    fn contains(&self, other: T) -> bool;
}

impl Contains<Ipv4Prefix> for Ipv4Prefix {
    fn contains(&self, other: Ipv4Prefix) -> bool {
        self.0.contains(&other.0)
    }
}

impl Contains<Ipv4Addr> for Ipv4Prefix {
    fn contains(&self, other: Ipv4Addr) -> bool {
        self.0.contains(&other)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::ipv4::{Ipv4Prefix, Ipv4PrefixLen};
    use bolero::{Driver, TypeGenerator};
    use std::net::Ipv4Addr;
    use std::ops::Bound;

    impl TypeGenerator for Ipv4PrefixLen {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(Ipv4PrefixLen::new_assert(driver.gen_u8(
                Bound::Included(&0),
                Bound::Included(&Ipv4PrefixLen::MAX_LEN),
            )?))
        }
    }

    impl TypeGenerator for Ipv4Prefix {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let addr: Ipv4Addr = driver.produce()?;
            let len: Ipv4PrefixLen = driver.produce()?;
            Ipv4Prefix::new_masked(addr, len).ok()
        }
    }
}
