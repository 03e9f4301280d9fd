//! Eviction Policy Module
//!
//! The two recency disciplines a cache can run with.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CacheError;

// == Eviction Policy ==
/// Selects which entry a full cache gives up.
///
/// Both policies promote an entry when it is written. Only `Lru` also promotes
/// on a read hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently inserted: reads never reorder entries
    Lri,
    /// Least recently used: read hits move the entry to the newest position
    #[default]
    Lru,
}

impl EvictionPolicy {
    /// Whether a read hit promotes the entry.
    pub fn promotes_on_read(self) -> bool {
        matches!(self, EvictionPolicy::Lru)
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Lri => f.write_str("lri"),
            EvictionPolicy::Lru => f.write_str("lru"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lri" => Ok(EvictionPolicy::Lri),
            "lru" => Ok(EvictionPolicy::Lru),
            other => Err(CacheError::InvalidArgument(format!(
                "unknown eviction policy {:?}, expected \"lri\" or \"lru\"",
                other
            ))),
        }
    }
}
