// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::cfg::ConfigSpace;
use crate::ecam::InfoField;
use crate::sequencer::{ComplianceTest, PCIE_TEST_NUM_BASE};
use crate::status::Status;

/// The platform describes at least one ECAM region, and every region has a
/// base address.
pub struct EcamPresence;

impl ComplianceTest for EcamPresence {
    fn num(&self) -> u32 {
        PCIE_TEST_NUM_BASE + 1
    }

    fn desc(&self) -> &'static str {
        "Check ECAM Presence"
    }

    fn run(&self, cfg: &ConfigSpace<'_>, _num_pe: u32) -> Status {
        let info = cfg.info();
        let log = info.log();

        let num_ecam = info.get_info(InfoField::NumEcam, 0) as u32;
        if num_ecam == 0 {
            slog::error!(log, "no ECAM regions found");
            return Status::Fail;
        }

        for idx in 0..num_ecam {
            if info.get_info(InfoField::Ecam, idx) == 0 {
                slog::error!(log, "ECAM base is zero"; "index" => idx);
                return Status::Fail;
            }
        }
        Status::Pass
    }
}
