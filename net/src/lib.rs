// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Masked IPv4 and IPv6 networks, normalized at construction.

#![deny(
    unsafe_code,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::should_panic_without_expect)] // we panic in const constructors with simple asserts

use core::fmt::Debug;

pub mod ip;
pub mod ipv4;
pub mod ipv6;

pub use ip::NetworkDescriptor;

/// Assert that the [`Err`] / [`None`] case is unreachable and unwrap the value.
pub trait AssertErrUnreachable {
    /// The success type.  Usually the [`Ok`] in a [`Result`] or the [`Some`] in an [`Option`].
    type Ok;
    /// Assert that the [`Err`] / [`None`] case is unreachable and unwrap the value.
    ///
    /// This panics exactly like `unwrap` if the assertion is wrong; the distinct name records
    /// that the failure conditions were considered and ruled out.
    fn err_unreachable(self) -> Self::Ok;
}

impl<Ok, Err: Debug> AssertErrUnreachable for Result<Ok, Err> {
    type Ok = Ok;

    fn err_unreachable(self) -> Ok {
        self.unwrap_or_else(|err| unreachable!("{err:?}"))
    }
}

impl<Some> AssertErrUnreachable for Option<Some> {
    type Ok = Some;

    fn err_unreachable(self) -> Some {
        self.unwrap_or_else(|| unreachable!("option is none"))
    }
}
