// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ACPI MCFG table parsing.
//!
//! The MCFG table carries one allocation entry per ECAM window: the window's
//! physical base, its PCI segment group and the bus numbers it decodes.

use std::path::Path;

use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::ecam::EcamRegion;

pub const MCFG_SIGNATURE: [u8; 4] = *b"MCFG";

/// Where Linux exposes the raw firmware MCFG table.
pub const SYSFS_MCFG_PATH: &str = "/sys/firmware/acpi/tables/MCFG";

// Reserved bytes between the SDT header and the first allocation entry.
const LEN_MCFG_RESERVED: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum McfgError {
    #[error("table of {0} bytes is too short for an MCFG header")]
    TooShort(usize),
    #[error("unexpected table signature {0:?}")]
    Signature([u8; 4]),
    #[error("header length {length} exceeds the {available} bytes supplied")]
    Truncated { length: usize, available: usize },
    #[error("table checksum does not sum to zero")]
    Checksum,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard ACPI system description table header.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, FromBytes, IntoBytes, Immutable)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: U32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: U32,
    pub creator_id: U32,
    pub creator_revision: U32,
}

/// One "configuration space base address allocation" structure.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, FromBytes, IntoBytes, Immutable)]
pub struct McfgAllocation {
    pub base_address: U64,
    pub segment_group: U16,
    pub start_bus: u8,
    pub end_bus: u8,
    pub reserved: U32,
}

impl McfgAllocation {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

impl From<&McfgAllocation> for EcamRegion {
    fn from(alloc: &McfgAllocation) -> Self {
        EcamRegion {
            ecam_base: alloc.base_address.get(),
            segment_num: u32::from(alloc.segment_group.get()),
            start_bus: u32::from(alloc.start_bus),
            end_bus: u32::from(alloc.end_bus),
        }
    }
}

/// A validated MCFG table.
#[derive(Clone, Debug)]
pub struct Mcfg {
    pub header: SdtHeader,
    pub allocations: Vec<McfgAllocation>,
}

impl Mcfg {
    /// Parses an MCFG table image, checking its signature, length and
    /// checksum.
    ///
    /// Bytes past the length recorded in the header are ignored, as is a
    /// trailing fragment shorter than a whole allocation entry.
    pub fn parse(raw: &[u8]) -> Result<Self, McfgError> {
        let (header, _) = SdtHeader::read_from_prefix(raw)
            .map_err(|_| McfgError::TooShort(raw.len()))?;
        if header.signature != MCFG_SIGNATURE {
            return Err(McfgError::Signature(header.signature));
        }

        let length = header.length.get() as usize;
        if length > raw.len() {
            return Err(McfgError::Truncated { length, available: raw.len() });
        }
        let body_start = std::mem::size_of::<SdtHeader>() + LEN_MCFG_RESERVED;
        if length < body_start {
            return Err(McfgError::TooShort(length));
        }

        let table = &raw[..length];
        let sum = table.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        if sum != 0 {
            return Err(McfgError::Checksum);
        }

        let allocations = table[body_start..]
            .chunks_exact(McfgAllocation::SIZE)
            .filter_map(|chunk| McfgAllocation::read_from_bytes(chunk).ok())
            .collect();

        Ok(Self { header, allocations })
    }

    /// Reads and parses an MCFG table from a file, such as
    /// [`SYSFS_MCFG_PATH`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, McfgError> {
        let raw = std::fs::read(path.as_ref())?;
        Self::parse(&raw)
    }

    /// The ECAM base of the first allocation entry, or 0 when there is none.
    pub fn first_ecam_base(&self) -> u64 {
        self.allocations.first().map_or(0, |a| a.base_address.get())
    }
}
