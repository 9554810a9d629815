// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Family agnostic network descriptors

mod descriptor;

pub use descriptor::*;
