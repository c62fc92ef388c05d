// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use pcie_acs::ecam::EcamRegion;
use pcie_acs::hw::pci::bits::PCIE_MAX_BUS;
use pcie_acs::sequencer::MAX_TEST_SKIP_NUM;

/// Configuration for a compliance run.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub main: Main,

    #[serde(default)]
    pub platform: Platform,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Main {
    /// Compliance level under test. Level 0 does not require PCIe.
    ///
    /// Default: 1
    #[serde(default = "default_level")]
    pub level: u32,

    /// Number of processing elements the tests may use.
    ///
    /// Default: 1
    #[serde(default = "default_num_pe")]
    pub num_pe: u32,

    /// Test or group numbers not to run.
    #[serde(default)]
    pub skip: Vec<u32>,
}
impl Default for Main {
    fn default() -> Self {
        Self {
            level: default_level(),
            num_pe: default_num_pe(),
            skip: Vec::new(),
        }
    }
}

fn default_level() -> u32 {
    1
}
fn default_num_pe() -> u32 {
    1
}

/// Where the ECAM layout of the platform comes from.
///
/// An MCFG table, when named, takes precedence over static entries.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Platform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcfg: Option<String>,

    #[serde(default, rename = "ecam")]
    pub ecam_regions: Vec<EcamEntry>,
}

/// A statically described ECAM region.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct EcamEntry {
    pub base: u64,
    #[serde(default)]
    pub segment: u32,
    pub start_bus: u32,
    pub end_bus: u32,
}

impl From<&EcamEntry> for EcamRegion {
    fn from(entry: &EcamEntry) -> Self {
        EcamRegion::new(
            entry.base,
            entry.segment,
            entry.start_bus,
            entry.end_bus,
        )
    }
}

/// Errors which may be returned when parsing the configuration.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot parse toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("skip list has {0} entries, at most {MAX_TEST_SKIP_NUM} allowed")]
    SkipListTooLong(usize),

    #[error(
        "ECAM entry {index} has start bus {start_bus} above end bus {end_bus}"
    )]
    BusRange { index: usize, start_bus: u32, end_bus: u32 },

    #[error("ECAM entry {index} ends at bus {end_bus}, past the last bus")]
    BusTooLarge { index: usize, end_bus: u32 },
}

impl Config {
    /// Checks constraints that the TOML structure alone cannot express.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.main.skip.len() > MAX_TEST_SKIP_NUM {
            return Err(ParseError::SkipListTooLong(self.main.skip.len()));
        }
        for (index, entry) in self.platform.ecam_regions.iter().enumerate() {
            if entry.start_bus > entry.end_bus {
                return Err(ParseError::BusRange {
                    index,
                    start_bus: entry.start_bus,
                    end_bus: entry.end_bus,
                });
            }
            if entry.end_bus >= PCIE_MAX_BUS {
                return Err(ParseError::BusTooLarge {
                    index,
                    end_bus: entry.end_bus,
                });
            }
        }
        Ok(())
    }

    pub fn ecam_regions(&self) -> Vec<EcamRegion> {
        self.platform.ecam_regions.iter().map(EcamRegion::from).collect()
    }
}

/// Parses and validates configuration from a TOML string.
pub fn from_str(contents: &str) -> Result<Config, ParseError> {
    let cfg = toml::from_str::<Config>(contents)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parses a TOML file into a configuration object.
pub fn parse<P: AsRef<Path>>(path: P) -> Result<Config, ParseError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    from_str(&contents)
}
