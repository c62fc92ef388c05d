// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The PCIe compliance test group.

use slog::Logger;

use crate::sequencer::{Role, Sequencer, SkipList, PCIE_TEST_NUM_BASE};

mod p001;
mod p002;
mod p003;

pub use p001::EcamPresence;
pub use p002::McfgEcamMatch;
pub use p003::UnpopulatedCfgReadsOnes;

/// Builds the PCIe group in its fixed order. ECAM presence gates the rest,
/// since both later tests rely on a populated region table.
pub fn pcie_group(skip: SkipList, log: Logger) -> Sequencer {
    Sequencer::new(PCIE_TEST_NUM_BASE, skip, log)
        .with(Role::Gate, Box::new(EcamPresence))
        .with(Role::Normal, Box::new(McfgEcamMatch))
        .with(Role::Normal, Box::new(UnpopulatedCfgReadsOnes))
}
