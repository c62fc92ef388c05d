// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical memory access primitive used for configuration space.

use std::sync::Arc;

/// 32-bit, naturally aligned access to physical memory.
///
/// Implementations must complete each access before returning and must not
/// reorder accesses across calls.
pub trait Mmio {
    fn read32(&self, addr: u64) -> u32;
    fn write32(&self, addr: u64, val: u32);
}

impl<T: Mmio + ?Sized> Mmio for &T {
    fn read32(&self, addr: u64) -> u32 {
        (**self).read32(addr)
    }
    fn write32(&self, addr: u64, val: u32) {
        (**self).write32(addr, val)
    }
}

impl<T: Mmio + ?Sized> Mmio for Arc<T> {
    fn read32(&self, addr: u64) -> u32 {
        (**self).read32(addr)
    }
    fn write32(&self, addr: u64, val: u32) {
        (**self).write32(addr, val)
    }
}
