//! Validation result cache.

pub mod key;
pub mod memory;
pub mod sweep;

pub use key::hash_license_key;
pub use memory::{CacheEntry, CacheStats, ValidationCache};
pub use sweep::SweepHandle;
