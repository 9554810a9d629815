// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::AssertErrUnreachable;
use crate::ipv4::Contains;
use ipnet::{AddrParseError, Ipv6Net};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv6Addr;
use std::str::FromStr;
use tracing::debug;

/// An [`Ipv6Addr`] with a prefix length describing a network in CIDR notation.
///
/// Unlike [`Ipv6Net`] from the `ipnet` crate, this type ensures that only network bits are set
/// in the address.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Ipv6Net", into = "Ipv6Net"))]
#[repr(transparent)]
pub struct Ipv6Prefix(Ipv6Net);

/// A checked type describing the values 0 to 128, which constitute all legal prefix lengths for
/// Ipv6 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[repr(transparent)]
pub struct Ipv6PrefixLen(u8);

/// An error indicating that an invalid prefix length was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIpv6PrefixLength {
    /// The provided length is too long to form a legal [`Ipv6PrefixLen`]
    #[error("invalid prefix length {0}, max is {MAX}", MAX = Ipv6PrefixLen::MAX_LEN)]
    TooLong(u8),
}

/// An error indicating that an invalid network was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIpv6Network {
    /// The provided network description contains set non-network bits
    #[error("address {0}/{1} contains non network bits")]
    AddressContainsNonNetworkBits(Ipv6Addr, Ipv6PrefixLen),
    /// The provided prefix length is invalid
    #[error(transparent)]
    InvalidPrefix(#[from] InvalidIpv6PrefixLength),
}

/// An error produced when a string is not a valid Ipv6 network in CIDR notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ipv6PrefixParseError {
    /// failure to interpret string as an ip and a prefix length
    #[error(transparent)]
    AddrParseError(AddrParseError),
    /// the ip and prefix length do not form a network
    #[error(transparent)]
    InvalidIpv6Network(InvalidIpv6Network),
}

impl Ipv6PrefixLen {
    /// The largest possible prefix length for IPv6 (i.e. /128)
    pub const MAX_LEN: u8 = 128;
    /// The host route prefix length (i.e. /128)
    pub const MAX: Self = Self(Self::MAX_LEN);
    /// The "match everything" prefix length (i.e. /0)
    pub const MIN: Self = Self(0);

    /// Constructor which asserts if the provided length is invalid.
    ///
    /// # Panics
    ///
    /// Panics if the provided length is greater than [`Ipv6PrefixLen::MAX_LEN`].
    #[must_use]
    pub const fn new_assert(len: u8) -> Self {
        assert!(len <= Self::MAX_LEN, "invalid prefix length");
        Self(len)
    }

    /// Constructor which checks that the provided length is valid.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIpv6PrefixLength::TooLong`] if the provided length is greater than
    /// [`Ipv6PrefixLen::MAX_LEN`].
    pub const fn try_new(len: u8) -> Result<Ipv6PrefixLen, InvalidIpv6PrefixLength> {
        if len > Self::MAX_LEN {
            return Err(InvalidIpv6PrefixLength::TooLong(len));
        }
        Ok(Ipv6PrefixLen(len))
    }

    /// Interpret the [`Ipv6PrefixLen`] as a `u8`
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// The netmask selecting the network bits of this length (high order bits set)
    #[must_use]
    pub const fn mask(&self) -> u128 {
        match u128::MAX.checked_shl((Self::MAX_LEN - self.0) as u32) {
            Some(mask) => mask,
            None => 0,
        }
    }
}

impl TryFrom<u8> for Ipv6PrefixLen {
    type Error = InvalidIpv6PrefixLength;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ipv6PrefixLen::try_new(value)
    }
}

impl From<Ipv6PrefixLen> for u8 {
    fn from(value: Ipv6PrefixLen) -> Self {
        value.0
    }
}

impl PartialEq<u8> for Ipv6PrefixLen {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Ipv6PrefixLen> for u8 {
    fn eq(&self, other: &Ipv6PrefixLen) -> bool {
        *self == other.0
    }
}

impl Display for Ipv6PrefixLen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ipv6Prefix {
    /// The root [`Ipv6Prefix`], aka ::/0
    pub const ROOT: Ipv6Prefix = Ipv6Prefix::new_assert([0; 16], 0);

    /// Validating constructor which panics if the arguments are invalid.
    /// Useful in const contexts and testing.
    ///
    /// # Panics
    ///
    /// * Panics if the provided prefix length is greater than 128
    /// * Panics if the provided address contains non-network bits.
    #[must_use]
    pub const fn new_assert(addr: [u8; 16], len: u8) -> Self {
        let addr = Ipv6Addr::from_bits(u128::from_be_bytes(addr));
        let len = Ipv6PrefixLen::new_assert(len);
        assert!(
            addr.to_bits() & len.mask() == addr.to_bits(),
            "Ipv6Prefix address contains non network bits"
        );
        Ipv6Prefix(Ipv6Net::new_assert(addr, len.0))
    }

    /// Build the network containing `addr`, clearing every bit beyond the prefix length.
    ///
    /// This is the constructor to use on untrusted input: any host address is accepted and
    /// normalized to its network address.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of `len` if it is not a legal [`Ipv6PrefixLen`].
    pub fn new_masked<E>(
        addr: impl Into<Ipv6Addr> + Debug,
        len: impl TryInto<Ipv6PrefixLen, Error = E> + Debug,
    ) -> Result<Ipv6Prefix, E> {
        let addr = addr.into();
        let len = len.try_into()?;
        let network = Ipv6Addr::from_bits(addr.to_bits() & len.mask());
        if network != addr {
            debug!(%addr, %len, %network, "clearing host bits");
        }
        Ok(Ipv6Prefix(Ipv6Net::new(network, len.0).err_unreachable()))
    }

    /// Constructor which refuses addresses with host bits set.
    ///
    /// # Errors
    ///
    /// * Returns [`InvalidIpv6Network::InvalidPrefix`] if the provided prefix length is greater
    ///   than [`Ipv6PrefixLen::MAX_LEN`].
    /// * Returns [`InvalidIpv6Network::AddressContainsNonNetworkBits`] if the provided address
    ///   contains non-network bits.
    pub fn new_strict(
        addr: impl Into<Ipv6Addr> + Debug,
        len: impl TryInto<Ipv6PrefixLen, Error = InvalidIpv6PrefixLength> + Debug,
    ) -> Result<Ipv6Prefix, InvalidIpv6Network> {
        let addr = addr.into();
        let len = len.try_into()?;
        if addr.to_bits() & len.mask() != addr.to_bits() {
            return Err(InvalidIpv6Network::AddressContainsNonNetworkBits(addr, len));
        }
        Ok(Ipv6Prefix(Ipv6Net::new(addr, len.0).err_unreachable()))
    }

    /// Returns the address of the network.
    #[must_use]
    pub const fn address(&self) -> Ipv6Addr {
        self.0.addr()
    }

    /// Returns the prefix length of the network.
    #[must_use]
    pub const fn prefix_len(&self) -> Ipv6PrefixLen {
        Ipv6PrefixLen(self.0.prefix_len()) // checked already
    }

    /// Returns true if this network designates a single address (i.e. a /128)
    #[must_use]
    pub const fn is_host_route(&self) -> bool {
        self.0.prefix_len() == Ipv6PrefixLen::MAX_LEN
    }

    /// Safe cast of [`Ipv6Prefix`] to `ipnet::Ipv6Net`
    #[must_use]
    pub const fn as_net(&self) -> Ipv6Net {
        self.0
    }
}

impl From<Ipv6Addr> for Ipv6Prefix {
    fn from(value: Ipv6Addr) -> Self {
        Ipv6Prefix(Ipv6Net::new(value, Ipv6PrefixLen::MAX_LEN).err_unreachable())
    }
}

impl From<Ipv6Prefix> for Ipv6Net {
    fn from(value: Ipv6Prefix) -> Self {
        value.0
    }
}

impl TryFrom<Ipv6Net> for Ipv6Prefix {
    type Error = InvalidIpv6Network;

    fn try_from(value: Ipv6Net) -> Result<Self, Self::Error> {
        Ipv6Prefix::new_strict(value.addr(), value.prefix_len())
    }
}

impl Display for Ipv6Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address(), self.prefix_len())
    }
}

impl FromStr for Ipv6Prefix {
    type Err = Ipv6PrefixParseError;

    /// Parse an [`Ipv6Prefix`] from CIDR notation.
    ///
    /// # Errors
    ///
    /// * Returns [`Ipv6PrefixParseError::AddrParseError`] if the string is not of the form
    ///   `addr6/n`.
    /// * Returns [`Ipv6PrefixParseError::InvalidIpv6Network`] if host bits are set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net = Ipv6Net::from_str(s).map_err(Ipv6PrefixParseError::AddrParseError)?;
        Ipv6Prefix::try_from(net).map_err(Ipv6PrefixParseError::InvalidIpv6Network)
    }
}

impl Contains<Ipv6Prefix> for Ipv6Prefix {
    fn contains(&self, other: Ipv6Prefix) -> bool {
        self.0.contains(&other.0)
    }
}

impl Contains<Ipv6Addr> for Ipv6Prefix {
    fn contains(&self, other: Ipv6Addr) -> bool {
        self.0.contains(&other)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::ipv6::{Ipv6Prefix, Ipv6PrefixLen};
    use bolero::{Driver, TypeGenerator};
    use std::net::Ipv6Addr;
    use std::ops::Bound;

    impl TypeGenerator for Ipv6PrefixLen {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(Ipv6PrefixLen::new_assert(driver.gen_u8(
                Bound::Included(&0),
                Bound::Included(&Ipv6PrefixLen::MAX_LEN),
            )?))
        }
    }

    impl TypeGenerator for Ipv6Prefix {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let addr: Ipv6Addr = driver.produce()?;
            let len: Ipv6PrefixLen = driver.produce()?;
            Ipv6Prefix::new_masked(addr, len).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ipv4::Contains;
    use crate::ipv6::{
        InvalidIpv6Network, InvalidIpv6PrefixLength, Ipv6Prefix, Ipv6PrefixLen,
        Ipv6PrefixParseError,
    };
    use std::net::Ipv6Addr;
    use std::str::FromStr;

    #[test]
    #[should_panic]
    fn non_network_bits_panic_in_asserting_constructor() {
        let _ = Ipv6Prefix::new_assert(Ipv6Addr::LOCALHOST.octets(), 64);
    }

    #[test]
    fn prefix_len_bounds() {
        bolero::check!().with_type().cloned().for_each(|val: u8| {
            match Ipv6PrefixLen::try_new(val) {
                Ok(len) => {
                    assert!(val <= Ipv6PrefixLen::MAX_LEN);
                    assert_eq!(len, val);
                }
                Err(InvalidIpv6PrefixLength::TooLong(err_val)) => {
                    assert_eq!(err_val, val);
                    assert!(val > Ipv6PrefixLen::MAX_LEN);
                }
            }
        });
    }

    #[test]
    fn masks() {
        assert_eq!(Ipv6PrefixLen::MIN.mask(), 0);
        assert_eq!(Ipv6PrefixLen::new_assert(96).mask(), u128::MAX << 32);
        assert_eq!(Ipv6PrefixLen::new_assert(127).mask(), u128::MAX - 1);
        assert_eq!(Ipv6PrefixLen::MAX.mask(), u128::MAX);
    }

    #[test]
    fn masked_constructor_clears_host_bits() {
        let addr = Ipv6Addr::new(0, 0, 0, 0, 1, 0x5ee, 0xbad, 0xc0de);
        let prefix = Ipv6Prefix::new_masked(addr, 96u8).unwrap();
        assert_eq!(prefix.address(), Ipv6Addr::new(0, 0, 0, 0, 1, 0x5ee, 0, 0));
        assert_eq!(prefix.prefix_len(), 96);

        let addr = Ipv6Addr::new(0xcafe, 0xfeed, 0, 0, 0, 0, 0, 1);
        let prefix = Ipv6Prefix::new_masked(addr, 127u8).unwrap();
        assert_eq!(prefix.address(), Ipv6Addr::new(0xcafe, 0xfeed, 0, 0, 0, 0, 0, 0));

        let prefix = Ipv6Prefix::new_masked(addr, 0u8).unwrap();
        assert_eq!(prefix, Ipv6Prefix::ROOT);
        assert_eq!(prefix.address(), Ipv6Addr::UNSPECIFIED);

        let prefix = Ipv6Prefix::new_masked(addr, 128u8).unwrap();
        assert!(prefix.is_host_route());
        assert_eq!(prefix, Ipv6Prefix::from(addr));
    }

    #[test]
    fn masked_constructor_rejects_long_prefix() {
        assert_eq!(
            Ipv6Prefix::new_masked(Ipv6Addr::LOCALHOST, 129u8),
            Err(InvalidIpv6PrefixLength::TooLong(129))
        );
    }

    #[test]
    fn non_network_bits_in_strict_constructor_returns_error() {
        let ip = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
        match Ipv6Prefix::new_strict(ip, 127u8) {
            Err(InvalidIpv6Network::AddressContainsNonNetworkBits(err_ip, err_len)) => {
                assert_eq!(err_ip, ip);
                assert_eq!(err_len, 127);
            }
            other => unreachable!("{other:?}"),
        }
    }

    #[test]
    fn display_uses_compressed_form_and_carries_length() {
        let addr = Ipv6Addr::new(0xcafe, 0xfeed, 0, 0, 0, 0, 0, 0);
        assert_eq!(
            Ipv6Prefix::new_masked(addr, 127u8).unwrap().to_string(),
            "cafe:feed::/127"
        );
        assert_eq!(Ipv6Prefix::from(Ipv6Addr::LOCALHOST).to_string(), "::1/128");
        assert_eq!(Ipv6Prefix::ROOT.to_string(), "::/0");
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!(Ipv6Prefix::from_str("::/0").unwrap(), Ipv6Prefix::ROOT);
        assert!(matches!(
            Ipv6Prefix::from_str("::1/64"),
            Err(Ipv6PrefixParseError::InvalidIpv6Network(_))
        ));
        assert!(matches!(
            Ipv6Prefix::from_str("::1"),
            Err(Ipv6PrefixParseError::AddrParseError(_))
        ));
    }

    #[test]
    fn generated_prefixes_are_normalized() {
        bolero::check!()
            .with_type()
            .cloned()
            .for_each(|network: Ipv6Prefix| {
                assert_eq!(network.as_net().trunc(), network.as_net());
                assert!(network.contains(network));
                assert!(network.contains(network.address()));
                assert_eq!(Ipv6Prefix::from_str(&network.to_string()).unwrap(), network);
            });
    }

    #[test]
    fn masking_is_idempotent() {
        bolero::check!()
            .with_type()
            .cloned()
            .for_each(|(addr, len): (Ipv6Addr, Ipv6PrefixLen)| {
                let once = Ipv6Prefix::new_masked(addr, len).unwrap();
                let twice = Ipv6Prefix::new_masked(once.address(), once.prefix_len()).unwrap();
                assert_eq!(once, twice);
                assert!(once.contains(addr));
            });
    }
}
