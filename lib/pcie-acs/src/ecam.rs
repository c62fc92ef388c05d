// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The table of ECAM regions discovered on the platform.

use slog::Logger;

use crate::platform::Platform;

/// One Enhanced Configuration Access Mechanism window.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct EcamRegion {
    /// Physical address of the window. Zero means discovery did not find
    /// one, and the region must not be accessed.
    pub ecam_base: u64,
    pub segment_num: u32,
    pub start_bus: u32,
    pub end_bus: u32,
}

impl EcamRegion {
    pub const fn new(
        ecam_base: u64,
        segment_num: u32,
        start_bus: u32,
        end_bus: u32,
    ) -> Self {
        Self { ecam_base, segment_num, start_bus, end_bus }
    }

    pub const fn decodes(&self, bus: u32) -> bool {
        bus >= self.start_bus && bus <= self.end_bus
    }
}

/// Backing storage for the ECAM regions, in discovery order.
#[derive(Clone, Debug, Default)]
pub struct EcamTable {
    entries: Vec<EcamRegion>,
}

impl EcamTable {
    pub fn push(&mut self, region: EcamRegion) {
        self.entries.push(region);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn num_entries(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn entries(&self) -> &[EcamRegion] {
        &self.entries
    }

    /// Returns the first region, in table order, whose bus range contains
    /// `bus`.
    ///
    /// Segments are not considered: should two segments decode the same bus
    /// number, the earlier entry wins.
    pub fn lookup(&self, bus: u32) -> Option<&EcamRegion> {
        self.entries.iter().find(|r| r.decodes(bus))
    }
}

/// Selector for [`PcieInfo::get_info`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, strum::Display)]
#[repr(u32)]
pub enum InfoField {
    NumEcam = 1,
    /// The firmware-recorded ECAM base, answered by the platform rather
    /// than by the table.
    McfgEcam,
    Ecam,
    StartBus,
    EndBus,
    Segment,
}

#[derive(thiserror::Error, Copy, Clone, Eq, PartialEq, Debug)]
pub enum InfoError {
    #[error("PCIe info table is not created")]
    NotCreated,
    #[error("PCIe info table has no entries")]
    Empty,
    #[error("invalid index {index}, table has {num_entries} entries")]
    IndexOutOfRange { index: u32, num_entries: u32 },
}

/// Owner of the ECAM region table for the duration of a test run.
///
/// The table does not exist until [`PcieInfo::create_info_table`] is called
/// and is gone again after [`PcieInfo::free_info_table`]. Queries made
/// outside that window are logged and answered with 0.
pub struct PcieInfo {
    table: Option<EcamTable>,
    platform: Box<dyn Platform>,
    log: Logger,
}

impl PcieInfo {
    pub fn new(platform: Box<dyn Platform>, log: Logger) -> Self {
        Self { table: None, platform, log }
    }

    /// Takes ownership of `table`, has the platform populate it and makes it
    /// the active table.
    pub fn create_info_table(&mut self, mut table: EcamTable) {
        if self.table.is_some() {
            slog::warn!(self.log, "replacing existing PCIe info table");
        }
        table.clear();
        self.platform.discover_ecam(&mut table);
        let num_ecam = table.num_entries();
        self.table = Some(table);

        slog::info!(self.log, "PCIE_INFO: Number of ECAM regions";
            "num_ecam" => num_ecam);
    }

    /// Releases the table storage.
    pub fn free_info_table(&mut self) {
        if self.table.take().is_none() {
            slog::warn!(self.log, "PCIe info table freed before creation");
        }
    }

    pub fn table(&self) -> Option<&EcamTable> {
        self.table.as_ref()
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    /// Looks up `field` of the region at `index`.
    ///
    /// The index is checked for every selector, including the ones that do
    /// not depend on it, so an empty table answers [`InfoError::Empty`] even
    /// for [`InfoField::NumEcam`].
    pub fn try_get_info(
        &self,
        field: InfoField,
        index: u32,
    ) -> Result<u64, InfoError> {
        let table = self.table.as_ref().ok_or(InfoError::NotCreated)?;
        let num_entries = table.num_entries();
        let region = match table.entries().get(index as usize) {
            Some(region) => region,
            None if num_entries == 0 => return Err(InfoError::Empty),
            None => {
                return Err(InfoError::IndexOutOfRange { index, num_entries })
            }
        };

        Ok(match field {
            InfoField::NumEcam => u64::from(num_entries),
            InfoField::McfgEcam => self.platform.mcfg_ecam_base(),
            InfoField::Ecam => region.ecam_base,
            InfoField::StartBus => u64::from(region.start_bus),
            InfoField::EndBus => u64::from(region.end_bus),
            InfoField::Segment => u64::from(region.segment_num),
        })
    }

    /// Like [`PcieInfo::try_get_info`], but logs failures and reports them
    /// as 0. An empty table is an expected state and is not logged.
    pub fn get_info(&self, field: InfoField, index: u32) -> u64 {
        match self.try_get_info(field, index) {
            Ok(val) => val,
            Err(InfoError::Empty) => 0,
            Err(e) => {
                slog::error!(self.log, "GET_PCIe_INFO: {}", e;
                    "field" => %field, "index" => index);
                0
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform::StaticPlatform;
    use crate::test::{capture_log, created_info, two_segment_regions};

    #[test]
    fn fields_by_index() {
        let (log, _) = capture_log();
        let info = created_info(two_segment_regions(), log);

        assert_eq!(info.get_info(InfoField::NumEcam, 0), 2);
        assert_eq!(info.get_info(InfoField::NumEcam, 1), 2);
        assert_eq!(info.get_info(InfoField::Ecam, 1), 0x5000_0000);
        assert_eq!(info.get_info(InfoField::StartBus, 1), 0x80);
        assert_eq!(info.get_info(InfoField::EndBus, 0), 0x7f);
        assert_eq!(info.get_info(InfoField::Segment, 1), 1);
        assert_eq!(info.get_info(InfoField::McfgEcam, 0), 0x4000_0000);
    }

    #[test]
    fn uninitialized_table_logs_and_returns_zero() {
        let (log, records) = capture_log();
        let info = PcieInfo::new(Box::new(StaticPlatform::default()), log);

        assert_eq!(
            info.try_get_info(InfoField::NumEcam, 0),
            Err(InfoError::NotCreated)
        );
        assert_eq!(info.get_info(InfoField::Ecam, 0), 0);
        assert_eq!(records.errors(), 1);
    }

    #[test]
    fn empty_table_is_silent() {
        let (log, records) = capture_log();
        let info = created_info(Vec::new(), log);
        records.clear();

        for idx in [0, 1, 7, u32::MAX] {
            assert_eq!(info.get_info(InfoField::Ecam, idx), 0);
            assert_eq!(info.get_info(InfoField::NumEcam, idx), 0);
        }
        assert_eq!(
            info.try_get_info(InfoField::Ecam, 0),
            Err(InfoError::Empty)
        );
        assert!(records.is_empty());
    }

    #[test]
    fn out_of_range_index_logs() {
        let (log, records) = capture_log();
        let info = created_info(two_segment_regions(), log);

        assert_eq!(info.get_info(InfoField::Ecam, 2), 0);
        assert_eq!(
            info.try_get_info(InfoField::StartBus, 5),
            Err(InfoError::IndexOutOfRange { index: 5, num_entries: 2 })
        );
        assert_eq!(records.errors(), 1);
    }

    #[test]
    fn create_logs_count_and_free_forgets() {
        let (log, records) = capture_log();
        let mut info = created_info(two_segment_regions(), log);
        assert!(records.contains("Number of ECAM regions"));
        assert!(info.table().is_some());

        info.free_info_table();
        assert!(info.table().is_none());
        assert_eq!(
            info.try_get_info(InfoField::NumEcam, 0),
            Err(InfoError::NotCreated)
        );
    }

    #[test]
    fn recreate_discards_previous_contents() {
        let (log, _) = capture_log();
        let mut info = created_info(two_segment_regions(), log);

        let mut stale = EcamTable::default();
        stale.push(EcamRegion::new(0xdead_0000, 9, 0, 0));
        info.create_info_table(stale);
        assert_eq!(info.get_info(InfoField::NumEcam, 0), 2);
        assert_eq!(info.get_info(InfoField::Ecam, 0), 0x4000_0000);
    }

    #[test]
    fn lookup_takes_first_match() {
        let mut table = EcamTable::default();
        table.push(EcamRegion::new(0x1000_0000, 0, 0, 0x1f));
        table.push(EcamRegion::new(0x2000_0000, 1, 0x10, 0x3f));

        assert_eq!(table.lookup(0x10).map(|r| r.ecam_base), Some(0x1000_0000));
        assert_eq!(table.lookup(0x20).map(|r| r.ecam_base), Some(0x2000_0000));
        assert_eq!(table.lookup(0x40), None);
    }
}
