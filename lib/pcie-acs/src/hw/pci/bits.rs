// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PCI config registers and ECAM layout.

/// Size of the configuration space of one function under ECAM.
pub const LEN_CFG_ECAM: u64 = 0x1000;

/// Number of bus numbers in a PCIe segment.
pub const PCIE_MAX_BUS: u32 = 256;
/// Number of devices on a single bus.
pub const PCIE_MAX_DEV: u32 = 32;
/// Number of functions in a single device.
pub const PCIE_MAX_FUNC: u32 = 8;

pub(super) const MASK_FUNC: u8 = 0x07;
pub(super) const MASK_DEV: u8 = 0x1f;

// Field positions within a packed BDF. The bus field is not masked when
// unpacking so that out-of-range bus numbers remain detectable.
pub(super) const SHIFT_PACKED_BUS: u32 = 16;
pub(super) const SHIFT_PACKED_DEV: u32 = 8;
pub(super) const MASK_PACKED_FIELD: u32 = 0xff;

pub const REG_VENDOR_ID: u32 = 0x00;

/// Vendor ID returned when no function responds at a BDF.
pub const VENDOR_ID_NONE: u16 = 0xffff;
/// Dword returned by a read of unpopulated configuration space.
pub const CFG_NONE: u32 = 0xffff_ffff;
