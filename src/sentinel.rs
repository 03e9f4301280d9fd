//! Sentinel Module
//!
//! Unique marker values that can never collide with a real argument or value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// Ids below this are reserved for the crate's static sentinels.
const FIRST_DYNAMIC_ID: u64 = 16;

static NEXT_ID: AtomicU64 = AtomicU64::new(FIRST_DYNAMIC_ID);

// == Sentinel ==
/// A named marker whose identity is unique.
///
/// Two sentinels are equal only if they are the same marker: creating a second
/// sentinel with the same name yields a distinct value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sentinel {
    id: u64,
    name: &'static str,
}

/// Separates positional from named arguments inside a composite cache key.
pub const KWARG_MARK: Sentinel = Sentinel {
    id: 1,
    name: "_KWARG_MARK",
};

impl Sentinel {
    /// Creates a fresh sentinel, distinct from every other sentinel.
    pub fn new(name: &'static str) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// The sentinel's display name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id < FIRST_DYNAMIC_ID {
            f.write_str(self.name)
        } else {
            write!(f, "Sentinel({:?})", self.name)
        }
    }
}
