// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical memory access through a `/dev/mem`-style device.

use std::fs::{File, OpenOptions};
use std::io::{Error, Result};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;

use pcie_acs::hw::pci::bits::CFG_NONE;
use pcie_acs::Mmio;

/// A single page of physical memory, mapped for the duration of one access.
struct PageMap {
    ptr: NonNull<u8>,
    len: usize,
}
impl PageMap {
    fn new(fp: &File, page_addr: u64, len: usize) -> Result<Self> {
        let off = libc::off_t::try_from(page_addr)
            .map_err(|_| Error::from_raw_os_error(libc::EOVERFLOW))?;

        // Safety: a fresh shared mapping of the device; nothing else in the
        // process aliases it.
        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fp.as_raw_fd(),
                off,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(Error::last_os_error());
        }
        let ptr =
            NonNull::new(ptr as *mut u8).ok_or_else(Error::last_os_error)?;
        Ok(Self { ptr, len })
    }

    fn reg(&self, off: usize) -> *mut u32 {
        debug_assert!(off + 4 <= self.len);
        // Safety: `off` is within the mapping, as asserted above.
        unsafe { self.ptr.as_ptr().add(off) as *mut u32 }
    }
}
impl Drop for PageMap {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.len);
        }
    }
}

pub struct DevMem {
    fp: File,
    page_size: u64,
    log: slog::Logger,
}

impl DevMem {
    pub fn open<P: AsRef<Path>>(path: P, log: slog::Logger) -> Result<Self> {
        let fp = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path.as_ref())?;

        // Safety: sysconf has no memory-safety preconditions.
        let page_size = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
            n if n > 0 => n as u64,
            _ => 4096,
        };
        Ok(Self { fp, page_size, log })
    }

    /// Maps the page holding `addr` and hands `f` a pointer to the dword.
    fn with_reg<T>(
        &self,
        addr: u64,
        f: impl FnOnce(*mut u32) -> T,
    ) -> Option<T> {
        if addr % 4 != 0 {
            slog::error!(self.log, "unaligned 32-bit access";
                "addr" => format!("{addr:#x}"));
            return None;
        }
        let page_addr = addr & !(self.page_size - 1);
        match PageMap::new(&self.fp, page_addr, self.page_size as usize) {
            Ok(map) => Some(f(map.reg((addr - page_addr) as usize))),
            Err(e) => {
                slog::error!(self.log, "cannot map physical page: {}", e;
                    "addr" => format!("{addr:#x}"));
                None
            }
        }
    }
}

impl Mmio for DevMem {
    fn read32(&self, addr: u64) -> u32 {
        // Safety: the pointer is aligned and inside a live mapping.
        self.with_reg(addr, |reg| unsafe { reg.read_volatile() })
            .unwrap_or(CFG_NONE)
    }

    fn write32(&self, addr: u64, val: u32) {
        // Safety: the pointer is aligned and inside a live mapping.
        let _ = self.with_reg(addr, |reg| unsafe { reg.write_volatile(val) });
    }
}
