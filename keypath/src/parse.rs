// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Extraction of [`NetworkDescriptor`]s from key paths.

use crate::path::KeyPath;
use net::NetworkDescriptor;
use net::ip::InvalidPrefixLength;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::trace;

/// Reasons a key path does not hold a network descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyPathError {
    /// The path ends in a prefix length with nothing before it
    #[error("key path '{0}' has no address segment")]
    MissingAddress(String),
    /// The address segment is neither an ipv4 nor an ipv6 literal
    #[error("'{0}' is not an ipv4 or ipv6 address")]
    InvalidAddress(String),
    /// The prefix length does not fit the address family
    #[error(transparent)]
    InvalidPrefixLength(#[from] InvalidPrefixLength),
    /// The prefix length does not even fit in a byte
    #[error("prefix length {0} is out of range")]
    PrefixLengthOutOfRange(u32),
}

/// Parse an ip literal, trying each family in turn.
fn parse_address(segment: &str) -> Option<IpAddr> {
    segment
        .parse::<Ipv4Addr>()
        .map(IpAddr::V4)
        .or_else(|_| segment.parse::<Ipv6Addr>().map(IpAddr::V6))
        .ok()
}

/// Parse the network held by a key path, reporting why when there is none.
///
/// Without an explicit prefix length the descriptor is a host route.  Host bits of the address
/// are cleared.
///
/// # Errors
///
/// Returns a [`KeyPathError`] describing why `path` is not a network descriptor key.
pub fn try_parse_descriptor(path: &str) -> Result<NetworkDescriptor, KeyPathError> {
    let key = KeyPath::new(path);
    let segment = key
        .address_segment()
        .ok_or_else(|| KeyPathError::MissingAddress(path.to_string()))?;
    let addr =
        parse_address(segment).ok_or_else(|| KeyPathError::InvalidAddress(segment.to_string()))?;
    let Some(len) = key.prefix_len_segment() else {
        return Ok(NetworkDescriptor::from(addr));
    };
    let len = u8::try_from(len).map_err(|_| KeyPathError::PrefixLengthOutOfRange(len))?;
    Ok(NetworkDescriptor::new_masked(addr, len)?)
}

/// Parse the network held by a key path.
///
/// Returns [`None`] if `path` does not end in an address (and optional prefix length) forming a
/// valid network.  This is routine when scanning a key space, so misses are only traced.
#[must_use]
pub fn parse_descriptor(path: &str) -> Option<NetworkDescriptor> {
    try_parse_descriptor(path)
        .inspect_err(|e| trace!(path, "not a network descriptor: {e}"))
        .ok()
}

/// Lazily extract the networks of a batch of candidate key paths, in order, skipping the paths
/// which do not hold one.
pub fn scan_descriptors<'a, I>(paths: I) -> impl Iterator<Item = NetworkDescriptor> + use<'a, I>
where
    I: IntoIterator<Item = &'a str>,
{
    paths.into_iter().filter_map(parse_descriptor)
}

#[cfg(test)]
mod tests {
    use super::{KeyPathError, parse_descriptor, scan_descriptors, try_parse_descriptor};
    use net::NetworkDescriptor;
    use net::ip::InvalidPrefixLength;
    use net::ipv4::{InvalidIpv4PrefixLength, Ipv4Prefix};
    use net::ipv6::{InvalidIpv6PrefixLength, Ipv6Prefix};
    use pretty_assertions::assert_eq;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use tracing_test::traced_test;

    fn v4(addr: [u8; 4], len: u8) -> NetworkDescriptor {
        NetworkDescriptor::V4(Ipv4Prefix::new_assert(addr, len))
    }

    fn v6(addr: [u8; 16], len: u8) -> NetworkDescriptor {
        NetworkDescriptor::V6(Ipv6Prefix::new_assert(addr, len))
    }

    #[test]
    fn key_paths() {
        let table = [
            ("befw/$alias$/$test$/192.168.0.5/24", v4([192, 168, 0, 0], 24)),
            ("befw/sercvice_tcp_2200/192.168.0.5", v4([192, 168, 0, 5], 32)),
            ("befw/sercvice_tcp_2200/10.0.0.5/8", v4([10, 0, 0, 0], 8)),
            (
                "befw/sercvice_tcp_2200/::1:5ee:bad:c0de/96",
                v6([0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x05, 0xee, 0, 0, 0, 0], 96),
            ),
            (
                "befw/sercvice_tcp_2200/cafe:feed::/127",
                v6([0xca, 0xfe, 0xfe, 0xed, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0], 127),
            ),
            ("befw/sercvice_tcp_2200/::/0", v6([0; 16], 0)),
        ];
        for (path, expected) in table {
            assert_eq!(parse_descriptor(path), Some(expected), "{path}");
        }
    }

    #[test]
    fn default_prefix_is_host_route() {
        let desc = parse_descriptor("x/192.168.0.5").unwrap();
        assert_eq!(desc.prefix_len(), 32);
        assert_eq!(desc.address(), Ipv4Addr::new(192, 168, 0, 5));
        assert!(desc.is_host_route());

        let desc = parse_descriptor("x/::1").unwrap();
        assert_eq!(desc.prefix_len(), 128);
        assert_eq!(desc.address(), Ipv6Addr::LOCALHOST);
    }

    #[test]
    fn host_bits_are_cleared() {
        let desc = parse_descriptor("x/192.168.0.5/24").unwrap();
        assert_eq!(desc.address(), Ipv4Addr::new(192, 168, 0, 0));
        assert_eq!(desc.prefix_len(), 24);
    }

    #[test]
    fn zero_length_matches_everything() {
        assert_eq!(parse_descriptor("x/10.20.30.40/0"), Some(v4([0; 4], 0)));
        assert_eq!(parse_descriptor("x/cafe::1/0"), Some(v6([0; 16], 0)));
    }

    #[test]
    fn decorations_are_transparent() {
        assert_eq!(
            parse_descriptor("befw/$alias$/$test$/192.168.0.5/24"),
            parse_descriptor("192.168.0.5/24")
        );
        assert_eq!(
            parse_descriptor("a/b/c/d/e/f/2001:db8::1/32"),
            parse_descriptor("2001:db8::1/32")
        );
    }

    #[test]
    fn misses() {
        for path in [
            "not/an/address/at/all",
            "",
            "/",
            "24",
            "befw/service/192.168.0.5/",
            "befw/service/192.168.0/24",
            "befw/service/192.168.0.5/-1",
            "befw/service/192.168.0.5/24/",
            "befw/service/fe80::1%eth0/64",
        ] {
            assert_eq!(parse_descriptor(path), None, "{path}");
        }
    }

    #[test]
    fn miss_reasons() {
        assert_eq!(
            try_parse_descriptor("24"),
            Err(KeyPathError::MissingAddress("24".to_string()))
        );
        assert_eq!(
            try_parse_descriptor("not/an/address"),
            Err(KeyPathError::InvalidAddress("address".to_string()))
        );
        assert_eq!(
            try_parse_descriptor("x/192.168.0.5/33"),
            Err(KeyPathError::InvalidPrefixLength(InvalidPrefixLength::V4(
                InvalidIpv4PrefixLength::TooLong(33)
            )))
        );
        assert_eq!(
            try_parse_descriptor("x/::1/129"),
            Err(KeyPathError::InvalidPrefixLength(InvalidPrefixLength::V6(
                InvalidIpv6PrefixLength::TooLong(129)
            )))
        );
        assert_eq!(
            try_parse_descriptor("x/::1/4096"),
            Err(KeyPathError::PrefixLengthOutOfRange(4096))
        );
    }

    #[test]
    fn ipv6_accepts_lengths_beyond_ipv4_range() {
        assert_eq!(
            parse_descriptor("x/2001:db8::1/64"),
            Some(v6(
                [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                64
            ))
        );
        assert_eq!(parse_descriptor("x/10.0.0.1/64"), None);
    }

    #[test]
    #[traced_test]
    fn misses_are_traced() {
        assert_eq!(parse_descriptor("befw/$alias$/not-an-ip"), None);
        assert!(logs_contain("not a network descriptor"));
    }

    #[test]
    fn scan_skips_misses_and_keeps_order() {
        let keys = [
            "befw/ssh/10.0.0.5/8",
            "befw/ssh",
            "befw/ssh/::/0",
            "befw/$alias$/$test$",
            "befw/ssh/10.0.0.5/8",
        ];
        assert_eq!(
            scan_descriptors(keys).collect::<Vec<_>>(),
            vec![v4([10, 0, 0, 0], 8), v6([0; 16], 0), v4([10, 0, 0, 0], 8)]
        );
    }

    #[test]
    fn concurrent_scans_agree() {
        let keys: Vec<String> = (0..=32u8)
            .map(|len| format!("befw/$alias$/172.16.254.1/{len}"))
            .collect();
        let expected: Vec<_> = scan_descriptors(keys.iter().map(String::as_str)).collect();
        assert_eq!(expected.len(), 33);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let found: Vec<_> = scan_descriptors(keys.iter().map(String::as_str)).collect();
                    assert_eq!(found, expected);
                });
            }
        });
    }

    #[test]
    fn parsed_descriptors_are_normalized() {
        bolero::check!()
            .with_type()
            .cloned()
            .for_each(|(addr, len, base): (std::net::IpAddr, u8, String)| {
                let path = format!("{base}/{addr}/{len}");
                if let Some(desc) = parse_descriptor(&path) {
                    assert_eq!(desc.as_net().trunc(), desc.as_net());
                    assert_eq!(desc.prefix_len(), len);
                    assert_eq!(desc.address().is_ipv4(), addr.is_ipv4());
                } else {
                    assert!(len > if addr.is_ipv4() { 32 } else { 128 });
                }
            });
    }
}
