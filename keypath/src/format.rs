// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Rendering of [`NetworkDescriptor`]s in CIDR notation.

use net::NetworkDescriptor;

/// Lazily render each descriptor as CIDR text, in input order.
///
/// IPv4 networks are written in dotted decimal, IPv6 networks in compressed colon-hex form.  The
/// prefix length is always present, host routes included.  Duplicates are kept.
pub fn cidrs<'a, I>(descriptors: I) -> impl Iterator<Item = String> + Clone + use<'a, I>
where
    I: IntoIterator<Item = &'a NetworkDescriptor>,
    I::IntoIter: Clone,
{
    descriptors.into_iter().map(ToString::to_string)
}

/// Render every descriptor as CIDR text, one string per descriptor, in input order.
#[must_use]
pub fn format_descriptors(descriptors: &[NetworkDescriptor]) -> Vec<String> {
    cidrs(descriptors).collect()
}
