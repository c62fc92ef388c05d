// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform discovery of ECAM regions.

use std::path::Path;

use crate::ecam::{EcamRegion, EcamTable};

pub mod mcfg;

pub use mcfg::{Mcfg, McfgError};

/// Source of the platform's ECAM layout.
pub trait Platform {
    /// Fills `table` with the ECAM regions present on this platform.
    ///
    /// Regions are trusted as reported: bus ranges within a segment are
    /// expected not to overlap and `start_bus <= end_bus`.
    fn discover_ecam(&self, table: &mut EcamTable);

    /// The raw ECAM base as recorded by firmware, independent of the table.
    fn mcfg_ecam_base(&self) -> u64;
}

/// A platform whose regions are known up front, e.g. from configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticPlatform {
    regions: Vec<EcamRegion>,
    mcfg_base: Option<u64>,
}

impl StaticPlatform {
    pub fn new(regions: Vec<EcamRegion>) -> Self {
        Self { regions, mcfg_base: None }
    }

    /// Overrides the value reported by [`Platform::mcfg_ecam_base`], which
    /// otherwise is the base of the first region.
    pub fn with_mcfg_base(mut self, base: u64) -> Self {
        self.mcfg_base = Some(base);
        self
    }
}

impl Platform for StaticPlatform {
    fn discover_ecam(&self, table: &mut EcamTable) {
        for region in &self.regions {
            table.push(*region);
        }
    }

    fn mcfg_ecam_base(&self) -> u64 {
        self.mcfg_base
            .unwrap_or_else(|| self.regions.first().map_or(0, |r| r.ecam_base))
    }
}

/// A platform described by its firmware MCFG table.
#[derive(Clone, Debug)]
pub struct McfgPlatform {
    mcfg: Mcfg,
}

impl McfgPlatform {
    pub fn new(mcfg: Mcfg) -> Self {
        Self { mcfg }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, McfgError> {
        Ok(Self::new(Mcfg::load(path)?))
    }
}

impl Platform for McfgPlatform {
    fn discover_ecam(&self, table: &mut EcamTable) {
        for alloc in &self.mcfg.allocations {
            table.push(EcamRegion::from(alloc));
        }
    }

    fn mcfg_ecam_base(&self) -> u64 {
        self.mcfg.first_ecam_base()
    }
}
