// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outcome of a compliance test.

/// Result of a test or of a group of tests.
///
/// Variants are ordered by severity. Combining two statuses keeps the more
/// severe one, so `Pass` is the identity and any other outcome dominates it.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Debug,
    Ord,
    PartialOrd,
    Default,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Pass,
    Skip,
    Fail,
    Error,
}

impl Status {
    /// Joins two outcomes, keeping the more severe.
    pub fn combine(self, other: Status) -> Status {
        self.max(other)
    }

    pub fn is_pass(&self) -> bool {
        *self == Status::Pass
    }

    /// Process exit code for this outcome.
    pub fn code(&self) -> i32 {
        match self {
            Status::Pass => 0,
            Status::Skip => 1,
            Status::Fail => 2,
            Status::Error => 3,
        }
    }
}

impl FromIterator<Status> for Status {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        iter.into_iter().fold(Status::Pass, Status::combine)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pass_is_identity() {
        for s in [Status::Pass, Status::Skip, Status::Fail, Status::Error] {
            assert_eq!(Status::Pass.combine(s), s);
            assert_eq!(s.combine(Status::Pass), s);
        }
    }

    #[test]
    fn severity_order() {
        assert_eq!(Status::Skip.combine(Status::Fail), Status::Fail);
        assert_eq!(Status::Error.combine(Status::Fail), Status::Error);
        let all = [Status::Pass, Status::Skip, Status::Pass];
        assert_eq!(all.into_iter().collect::<Status>(), Status::Skip);
        assert_eq!(std::iter::empty().collect::<Status>(), Status::Pass);
    }

    #[test]
    fn display() {
        assert_eq!(Status::Fail.to_string(), "FAIL");
        let s: &'static str = Status::Skip.into();
        assert_eq!(s, "SKIP");
    }
}
