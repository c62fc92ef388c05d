// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::cfg::ConfigSpace;
use crate::hw::pci::bits::{
    CFG_NONE, PCIE_MAX_BUS, PCIE_MAX_DEV, REG_VENDOR_ID, VENDOR_ID_NONE,
};
use crate::hw::pci::Bdf;
use crate::sequencer::{ComplianceTest, PCIE_TEST_NUM_BASE};
use crate::status::Status;

/// Reads of configuration space where no function responds return all ones
/// across the whole dword, not just in the vendor ID.
///
/// Function 0 of every device on every bus decoded by the table is probed.
pub struct UnpopulatedCfgReadsOnes;

impl ComplianceTest for UnpopulatedCfgReadsOnes {
    fn num(&self) -> u32 {
        PCIE_TEST_NUM_BASE + 3
    }

    fn desc(&self) -> &'static str {
        "Check unpopulated config space reads as all ones"
    }

    fn run(&self, cfg: &ConfigSpace<'_>, _num_pe: u32) -> Status {
        let info = cfg.info();
        let log = info.log();
        let Some(table) = info.table() else {
            slog::error!(log, "PCIe info table is not created");
            return Status::Error;
        };

        let mut found = 0u32;
        for region in table.entries() {
            let end_bus = region.end_bus.min(PCIE_MAX_BUS - 1);
            for bus in region.start_bus..=end_bus {
                for dev in 0..PCIE_MAX_DEV {
                    // Both bounds were clamped above.
                    let Some(bdf) = Bdf::new(bus as u8, dev as u8, 0) else {
                        continue;
                    };
                    let read = cfg.try_read_cfg(bdf.packed(), REG_VENDOR_ID);
                    let val = match read {
                        Ok(val) => val,
                        Err(e) => {
                            slog::error!(log, "config read failed: {}", e;
                                "bdf" => %bdf);
                            return Status::Error;
                        }
                    };

                    if val as u16 != VENDOR_ID_NONE {
                        found += 1;
                    } else if val != CFG_NONE {
                        slog::error!(log,
                            "unpopulated function reads {:#x}", val;
                            "bdf" => %bdf);
                        return Status::Fail;
                    }
                }
            }
        }

        if found == 0 {
            slog::warn!(log, "no PCIe functions found");
            return Status::Skip;
        }
        Status::Pass
    }
}
