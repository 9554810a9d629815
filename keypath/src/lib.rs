// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Conversion between key paths, CIDR text and [`NetworkDescriptor`]s.
//!
//! Configuration stores name firewall networks with keys such as
//! `befw/$alias$/ssh/192.168.0.5/24`.  [`parse_descriptor`] recovers the network such a key
//! ends with (here `192.168.0.0/24`), and [`format_descriptors`] turns networks back into CIDR
//! strings.  Both are pure functions and may be called from any number of threads.

#![deny(
    unsafe_code,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]

pub mod format;
pub mod parse;
pub mod path;

pub use format::{cidrs, format_descriptors};
pub use net::NetworkDescriptor;
pub use parse::{KeyPathError, parse_descriptor, scan_descriptors, try_parse_descriptor};
pub use path::KeyPath;
