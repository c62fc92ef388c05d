// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PCIe configuration-space access and compliance sequencing.
//!
//! A [`PcieInfo`] owns the table of ECAM regions discovered on the platform
//! and resolves (Bus, Device, Function) addresses plus register offsets to
//! physical addresses inside the right region. The [`sequencer`] runs the
//! PCIe test group in [`checks`] on top of it.

#![allow(clippy::style)]

pub mod cfg;
pub mod checks;
pub mod ecam;
pub mod hw;
pub mod mmio;
pub mod platform;
pub mod sequencer;
pub mod status;

#[cfg(test)]
pub(crate) mod test;

pub use cfg::CfgError;
pub use ecam::{EcamRegion, EcamTable, InfoError, InfoField, PcieInfo};
pub use hw::pci::Bdf;
pub use mmio::Mmio;
pub use platform::Platform;
pub use sequencer::{ComplianceTest, Role, Sequencer, SkipList};
pub use status::Status;
