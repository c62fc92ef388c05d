// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt::Result as FmtResult;
use std::fmt::{Display, Formatter};

pub mod bits;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
pub struct BusNum(u8);
impl BusNum {
    pub const fn new(n: u8) -> Self {
        Self(n)
    }
}
#[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
pub struct DevNum(u8);
impl DevNum {
    /// Attempts to make a new PCI [DevNum]
    ///
    /// Returns [`Option::None`] if `n` is outside the range for a valid PCI
    /// device.
    pub const fn new(n: u8) -> Option<Self> {
        if n <= bits::MASK_DEV {
            Some(Self(n))
        } else {
            None
        }
    }
}
#[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
pub struct FuncNum(u8);
impl FuncNum {
    /// Attempts to make a new PCI [FuncNum]
    ///
    /// Returns [`Option::None`] if `n` is outside the range for a valid PCI
    /// function.
    pub const fn new(n: u8) -> Option<Self> {
        if n <= bits::MASK_FUNC {
            Some(Self(n))
        } else {
            None
        }
    }
}

/// The fields of a packed BDF, split apart but not yet range-checked.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RawBdf {
    pub bus: u32,
    pub dev: u32,
    pub func: u32,
}

impl RawBdf {
    /// Splits a packed BDF into its bus, device and function fields.
    ///
    /// Device and function are the low two bytes; everything above them is
    /// taken as the bus number, so a bus field wider than 8 bits is preserved
    /// and rejected later by [`RawBdf::is_valid`].
    pub const fn unpack(bdf: u32) -> Self {
        Self {
            bus: bdf >> bits::SHIFT_PACKED_BUS,
            dev: (bdf >> bits::SHIFT_PACKED_DEV) & bits::MASK_PACKED_FIELD,
            func: bdf & bits::MASK_PACKED_FIELD,
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.bus < bits::PCIE_MAX_BUS
            && self.dev < bits::PCIE_MAX_DEV
            && self.func < bits::PCIE_MAX_FUNC
    }
}

/// Bus, Device, Function.
///
/// Acts as an address for PCI and PCIe device functionality.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
pub struct Bdf {
    pub bus: BusNum,
    pub dev: DevNum,
    pub func: FuncNum,
}

impl Bdf {
    /// Attempts to make a new PCI [Bdf].
    ///
    /// Returns [`Option::None`] if the values would not fit within a BDF.
    pub const fn new(bus: u8, dev: u8, func: u8) -> Option<Self> {
        match (DevNum::new(dev), FuncNum::new(func)) {
            (Some(dev), Some(func)) => {
                Some(Self { bus: BusNum::new(bus), dev, func })
            }
            _ => None,
        }
    }

    /// Decodes a packed BDF (bus in bits 16 and up, device in bits 8..16,
    /// function in bits 0..8).
    pub const fn from_packed(bdf: u32) -> Option<Self> {
        let raw = RawBdf::unpack(bdf);
        if raw.is_valid() {
            Self::new(raw.bus as u8, raw.dev as u8, raw.func as u8)
        } else {
            None
        }
    }

    /// Encodes this BDF in the packed form accepted by the config accessors.
    pub const fn packed(&self) -> u32 {
        (self.bus.0 as u32) << bits::SHIFT_PACKED_BUS
            | (self.dev.0 as u32) << bits::SHIFT_PACKED_DEV
            | self.func.0 as u32
    }
}
impl Display for Bdf {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}.{}", self.bus.0, self.dev.0, self.func.0)
    }
}
