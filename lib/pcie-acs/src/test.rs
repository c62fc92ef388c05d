// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Common test prep setup

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use slog::{Drain, Level, Logger, Never, OwnedKVList, Record};

use crate::ecam::{EcamRegion, EcamTable, PcieInfo};
use crate::hw::pci::bits::CFG_NONE;
use crate::mmio::Mmio;
use crate::platform::StaticPlatform;

/// Messages emitted through a logger from [`capture_log`].
#[derive(Clone, Default)]
pub(crate) struct Captured {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}
impl Captured {
    pub(crate) fn count(&self, level: Level) -> usize {
        self.records.lock().unwrap().iter().filter(|(l, _)| *l == level).count()
    }
    pub(crate) fn errors(&self) -> usize {
        self.count(Level::Error)
    }
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.records.lock().unwrap().iter().any(|(_, msg)| msg.contains(needle))
    }
    pub(crate) fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
    pub(crate) fn clear(&self) {
        self.records.lock().unwrap().clear()
    }
}

struct CaptureDrain(Captured);
impl Drain for CaptureDrain {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, _: &OwnedKVList) -> Result<(), Never> {
        self.0
            .records
            .lock()
            .unwrap()
            .push((record.level(), record.msg().to_string()));
        Ok(())
    }
}

/// A logger whose output is kept for inspection.
pub(crate) fn capture_log() -> (Logger, Captured) {
    let captured = Captured::default();
    let log = Logger::root(CaptureDrain(captured.clone()), slog::o!());
    (log, captured)
}

/// A terminal logger for tests where the output is only of interest when
/// something goes wrong.
pub(crate) fn build_log() -> Logger {
    let decorator =
        slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    Logger::root(drain, slog::o!())
}

/// Segment 0 decodes buses 0..=0x7f, segment 1 decodes 0x80..=0xff.
pub(crate) fn two_segment_regions() -> Vec<EcamRegion> {
    vec![
        EcamRegion::new(0x4000_0000, 0, 0, 0x7f),
        EcamRegion::new(0x5000_0000, 1, 0x80, 0xff),
    ]
}

/// A created [`PcieInfo`] backed by a [`StaticPlatform`] with `regions`.
pub(crate) fn created_info(
    regions: Vec<EcamRegion>,
    log: Logger,
) -> PcieInfo {
    let mut info = PcieInfo::new(Box::new(StaticPlatform::new(regions)), log);
    info.create_info_table(EcamTable::default());
    info
}

/// A single access observed by [`StubMemory`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Access {
    Read(u64),
    Write(u64, u32),
}

#[derive(Default)]
struct StubInner {
    cells: BTreeMap<u64, u32>,
    accesses: Vec<Access>,
}

/// Sparse in-memory stand-in for physical memory.
///
/// Dwords that were never written read back as all-ones, which is what an
/// unpopulated configuration space returns on real hardware. Every access is
/// recorded so callers can check what was (or was not) touched.
#[derive(Default)]
pub(crate) struct StubMemory {
    inner: Mutex<StubInner>,
}

impl StubMemory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `val` at `addr` without recording an access.
    pub(crate) fn preload(&self, addr: u64, val: u32) {
        self.inner.lock().unwrap().cells.insert(addr, val);
    }

    /// Returns the accesses performed so far, oldest first.
    pub(crate) fn accesses(&self) -> Vec<Access> {
        self.inner.lock().unwrap().accesses.clone()
    }
}

impl Mmio for StubMemory {
    fn read32(&self, addr: u64) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.accesses.push(Access::Read(addr));
        inner.cells.get(&addr).copied().unwrap_or(CFG_NONE)
    }
    fn write32(&self, addr: u64, val: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.accesses.push(Access::Write(addr, val));
        inner.cells.insert(addr, val);
    }
}
