// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Position based tokenization of `/` separated key paths.
//!
//! A key path holding a network looks like
//!
//! ```text
//! <decoration>/<decoration>/.../<ip address>[/<prefix length>]
//! ```
//!
//! Decorations (service names, `$alias$` wrappers, ...) are never looked at.  Only the last one
//! or two segments matter: if the last segment is a non-negative integer it is the prefix length
//! and the address is the segment before it, otherwise the last segment is the address.

use net::NetworkDescriptor;

/// Segment separator of key paths.
pub const SEPARATOR: char = '/';

/// A key path split into its decorations, address segment and optional prefix length segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPath<'a> {
    decorations: Option<&'a str>,
    address: Option<&'a str>,
    prefix_len: Option<u32>,
}

impl<'a> KeyPath<'a> {
    /// Split `path` from the tail.
    #[must_use]
    pub fn new(path: &'a str) -> Self {
        let (head, last) = split_last(path);
        match last.parse::<u32>() {
            Ok(len) => {
                let (decorations, address) = match head {
                    Some(head) => {
                        let (decorations, address) = split_last(head);
                        (decorations, Some(address))
                    }
                    None => (None, None),
                };
                KeyPath {
                    decorations,
                    address,
                    prefix_len: Some(len),
                }
            }
            Err(_) => KeyPath {
                decorations: head,
                address: Some(last),
                prefix_len: None,
            },
        }
    }

    /// The segment expected to hold the ip address literal, if the path has one.
    #[must_use]
    pub const fn address_segment(&self) -> Option<&'a str> {
        self.address
    }

    /// The explicit prefix length, if the last segment is an integer.
    #[must_use]
    pub const fn prefix_len_segment(&self) -> Option<u32> {
        self.prefix_len
    }

    /// Iterate over the leading segments which carry no network information.
    pub fn decorations(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.decorations
            .into_iter()
            .flat_map(|head| head.split(SEPARATOR))
    }

    /// Build the key path a store would hold for `descriptor` under `base`.
    ///
    /// The prefix length is always written, so parsing the result yields `descriptor` back.
    /// An empty `base` yields a path made of the address and the prefix length only.
    #[must_use]
    pub fn render(base: &str, descriptor: &NetworkDescriptor) -> String {
        let base = base.trim_end_matches(SEPARATOR);
        let address = descriptor.address();
        let len = descriptor.prefix_len();
        if base.is_empty() {
            format!("{address}{SEPARATOR}{len}")
        } else {
            format!("{base}{SEPARATOR}{address}{SEPARATOR}{len}")
        }
    }
}

fn split_last(s: &str) -> (Option<&str>, &str) {
    match s.rsplit_once(SEPARATOR) {
        Some((head, last)) => (Some(head), last),
        None => (None, s),
    }
}
