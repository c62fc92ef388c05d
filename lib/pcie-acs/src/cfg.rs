// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration space reads and writes through ECAM.

use crate::ecam::PcieInfo;
use crate::hw::pci::bits::{LEN_CFG_ECAM, PCIE_MAX_DEV, PCIE_MAX_FUNC};
use crate::hw::pci::RawBdf;
use crate::mmio::Mmio;

#[derive(thiserror::Error, Copy, Clone, Eq, PartialEq, Debug)]
pub enum CfgError {
    #[error("invalid Bus/Dev/Func {0:#x}")]
    InvalidBdf(u32),
    #[error("PCIe info table is not created")]
    NotCreated,
    #[error("ECAM base is zero for bus {bus}")]
    ZeroEcamBase { bus: u32 },
    #[error("no ECAM region decodes bus {bus}")]
    NoRegion { bus: u32 },
    #[error("config address overflows for ECAM base {ecam_base:#x}")]
    AddressOverflow { ecam_base: u64 },
}

/// Offset of a function's configuration space from the base of the ECAM
/// region holding its bus.
///
/// The function number is added as a byte offset rather than scaled by the
/// size of a configuration space.
pub const fn ecam_offset(bus: u32, dev: u32, func: u32) -> u64 {
    bus as u64 * PCIE_MAX_DEV as u64 * PCIE_MAX_FUNC as u64 * LEN_CFG_ECAM
        + dev as u64 * PCIE_MAX_FUNC as u64 * LEN_CFG_ECAM
        + func as u64
}

/// Accessor for PCIe configuration space.
///
/// Every access resolves its region afresh from the info table; nothing is
/// cached between calls.
pub struct ConfigSpace<'a> {
    info: &'a PcieInfo,
    mmio: &'a dyn Mmio,
}

impl<'a> ConfigSpace<'a> {
    pub fn new(info: &'a PcieInfo, mmio: &'a dyn Mmio) -> Self {
        Self { info, mmio }
    }

    pub fn info(&self) -> &'a PcieInfo {
        self.info
    }

    /// Resolves `bdf` (packed) and `offset` to a physical address.
    ///
    /// A bus decoded by no region resolves against a base of zero when
    /// `strict` is false.
    fn resolve(
        &self,
        bdf: u32,
        offset: u32,
        strict: bool,
    ) -> Result<u64, CfgError> {
        let raw = RawBdf::unpack(bdf);
        if !raw.is_valid() {
            return Err(CfgError::InvalidBdf(bdf));
        }
        let table = self.info.table().ok_or(CfgError::NotCreated)?;

        let ecam_base = match table.lookup(raw.bus) {
            Some(region) if region.ecam_base == 0 => {
                return Err(CfgError::ZeroEcamBase { bus: raw.bus })
            }
            Some(region) => region.ecam_base,
            None if strict => return Err(CfgError::NoRegion { bus: raw.bus }),
            None => {
                slog::warn!(self.info.log(),
                    "no ECAM region decodes bus, using base 0";
                    "bus" => raw.bus);
                0
            }
        };

        let addr = ecam_base
            .checked_add(ecam_offset(raw.bus, raw.dev, raw.func))
            .and_then(|addr| addr.checked_add(u64::from(offset)))
            .ok_or(CfgError::AddressOverflow { ecam_base })?;
        slog::debug!(self.info.log(), "calculated config address";
            "addr" => format!("{addr:#x}"));
        Ok(addr)
    }

    /// Physical address of register `offset` of `bdf`, failing if no region
    /// decodes its bus.
    pub fn cfg_addr(&self, bdf: u32, offset: u32) -> Result<u64, CfgError> {
        self.resolve(bdf, offset, true)
    }

    /// Reads the dword at `offset` in the configuration space of `bdf`.
    pub fn try_read_cfg(&self, bdf: u32, offset: u32) -> Result<u32, CfgError> {
        let addr = self.cfg_addr(bdf, offset)?;
        Ok(self.mmio.read32(addr))
    }

    /// Writes `val` to the dword at `offset` in the configuration space of
    /// `bdf`.
    pub fn try_write_cfg(
        &self,
        bdf: u32,
        offset: u32,
        val: u32,
    ) -> Result<(), CfgError> {
        let addr = self.cfg_addr(bdf, offset)?;
        self.mmio.write32(addr, val);
        Ok(())
    }

    /// Reads the dword at `offset` in the configuration space of `bdf`.
    ///
    /// Failures are logged and read as 0, which callers cannot tell apart
    /// from a register holding 0; use [`ConfigSpace::try_read_cfg`] where
    /// that matters.
    pub fn read_cfg(&self, bdf: u32, offset: u32) -> u32 {
        match self.resolve(bdf, offset, false) {
            Ok(addr) => self.mmio.read32(addr),
            Err(e) => {
                slog::error!(self.info.log(), "Read PCIe_CFG: {}", e);
                0
            }
        }
    }

    /// Writes `val` to the dword at `offset` in the configuration space of
    /// `bdf`. Failures are logged and the write is dropped.
    pub fn write_cfg(&self, bdf: u32, offset: u32, val: u32) {
        match self.resolve(bdf, offset, false) {
            Ok(addr) => self.mmio.write32(addr, val),
            Err(e) => {
                slog::error!(self.info.log(), "Write PCIe_CFG: {}", e);
            }
        }
    }
}
