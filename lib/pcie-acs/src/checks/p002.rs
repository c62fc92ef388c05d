// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::cfg::ConfigSpace;
use crate::ecam::InfoField;
use crate::sequencer::{ComplianceTest, PCIE_TEST_NUM_BASE};
use crate::status::Status;

/// The ECAM base recorded by firmware matches the first region in the table.
pub struct McfgEcamMatch;

impl ComplianceTest for McfgEcamMatch {
    fn num(&self) -> u32 {
        PCIE_TEST_NUM_BASE + 2
    }

    fn desc(&self) -> &'static str {
        "Check ECAM value in MCFG table"
    }

    fn run(&self, cfg: &ConfigSpace<'_>, _num_pe: u32) -> Status {
        let info = cfg.info();

        let mcfg = info.get_info(InfoField::McfgEcam, 0);
        let ecam = info.get_info(InfoField::Ecam, 0);
        if mcfg == 0 || mcfg != ecam {
            slog::error!(info.log(), "ECAM base does not match MCFG";
                "mcfg" => format!("{mcfg:#x}"),
                "ecam" => format!("{ecam:#x}"));
            return Status::Fail;
        }
        Status::Pass
    }
}
