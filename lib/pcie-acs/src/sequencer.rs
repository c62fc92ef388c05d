// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered execution of a group of compliance tests.

use slog::Logger;

use crate::cfg::ConfigSpace;
use crate::status::Status;

/// Number identifying the PCIe test group. Tests in the group are numbered
/// upwards from here, and the number itself in the skip list skips the whole
/// group.
pub const PCIE_TEST_NUM_BASE: u32 = 400;

/// Capacity of a [`SkipList`].
pub const MAX_TEST_SKIP_NUM: usize = 3;

/// A single compliance check.
pub trait ComplianceTest {
    /// Test number, unique across all groups.
    fn num(&self) -> u32;

    /// One-line description for the test log.
    fn desc(&self) -> &'static str;

    /// Runs the check on `num_pe` processing elements.
    fn run(&self, cfg: &ConfigSpace<'_>, num_pe: u32) -> Status;
}

/// How a test's outcome affects the tests after it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Role {
    /// Later tests depend on this one: if it does not pass, the rest of the
    /// group is not run.
    Gate,
    Normal,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("skip list holds at most {MAX_TEST_SKIP_NUM} entries, got {0}")]
pub struct SkipListFull(pub usize);

/// Test and group numbers the user asked not to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkipList {
    nums: Vec<u32>,
}

impl SkipList {
    pub fn new(nums: &[u32]) -> Result<Self, SkipListFull> {
        if nums.len() > MAX_TEST_SKIP_NUM {
            return Err(SkipListFull(nums.len()));
        }
        Ok(Self { nums: nums.to_vec() })
    }

    pub fn contains(&self, num: u32) -> bool {
        self.nums.contains(&num)
    }
}

struct Entry {
    role: Role,
    test: Box<dyn ComplianceTest>,
}

/// Runs a group of tests in registration order and folds their outcomes.
pub struct Sequencer {
    group_base: u32,
    tests: Vec<Entry>,
    skip: SkipList,
    log: Logger,
}

impl Sequencer {
    pub fn new(group_base: u32, skip: SkipList, log: Logger) -> Self {
        Self { group_base, tests: Vec::new(), skip, log }
    }

    /// Appends `test` to the end of the group.
    pub fn add(&mut self, role: Role, test: Box<dyn ComplianceTest>) {
        self.tests.push(Entry { role, test });
    }

    pub fn with(mut self, role: Role, test: Box<dyn ComplianceTest>) -> Self {
        self.add(role, test);
        self
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Decides whether the group is skipped as a whole at `level`, without
    /// touching configuration space. Returns the group's status if so.
    pub fn skipped_as_group(&self, level: u32) -> Option<Status> {
        if level == 0 {
            slog::warn!(self.log,
                "PCIe compliance is required only from Level 1");
            return Some(Status::Skip);
        }
        if self.skip.contains(self.group_base) {
            slog::info!(self.log, "USER Override - Skipping all PCIe tests");
            return Some(Status::Skip);
        }
        None
    }

    /// Runs the group at compliance `level` and returns the consolidated
    /// status.
    ///
    /// Nothing runs when `level` is 0 or the group number is in the skip
    /// list. Tests named individually in the skip list are not run and count
    /// as [`Status::Skip`]. A [`Role::Gate`] test that does not pass, or is
    /// skipped, ends the run early with its own status.
    pub fn execute_tests(
        &self,
        cfg: &ConfigSpace<'_>,
        level: u32,
        num_pe: u32,
    ) -> Status {
        if let Some(status) = self.skipped_as_group(level) {
            return status;
        }

        let mut status = Status::Pass;
        for Entry { role, test } in &self.tests {
            let log = self.log.new(slog::o!("test" => test.num()));
            let result = if self.skip.contains(test.num()) {
                slog::info!(log, "USER Override - Skipping test";
                    "desc" => test.desc());
                Status::Skip
            } else {
                slog::info!(log, "START";
                    "desc" => test.desc(), "level" => level);
                let result = test.run(cfg, num_pe);
                slog::info!(log, "END"; "status" => %result);
                result
            };

            status = status.combine(result);
            if *role == Role::Gate && !result.is_pass() {
                slog::warn!(log, "*** Skipping remaining PCIe tests ***");
                return result;
            }
        }

        if !status.is_pass() {
            slog::error!(self.log, "One or more PCIe tests have not passed";
                "status" => %status);
        }
        status
    }
}
