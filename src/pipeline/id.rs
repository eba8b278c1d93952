//! Identity types for the pipeline system.
//!
//! `ColumnIdx` is a direct index into the registry's column vector.
//! `Generation` tags fetched snapshots, `Revision` tags stage outputs so a
//! downstream cache can tell whether its input changed without comparing rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into `ColumnRegistry::columns` and into each row's cell cache.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnIdx(pub u32);

impl ColumnIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ColumnIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnIdx({})", self.0)
    }
}

/// Monotonically increasing fetch generation, assigned when a fetch is issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation that precedes every fetch. Never applied as a snapshot.
    pub const ZERO: Generation = Generation(0);

    #[inline]
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation({})", self.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen {}", self.0)
    }
}

impl From<u64> for Generation {
    fn from(value: u64) -> Self {
        Generation(value)
    }
}

/// Identity of one stage output. Bumped every time the stage recomputes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Revision(pub u64);

impl Revision {
    #[inline]
    pub fn bump(&mut self) -> Revision {
        self.0 += 1;
        *self
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}
