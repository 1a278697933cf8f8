//! Local persistence of the license record.

pub mod file;

pub use file::FileLicenseStore;

use crate::protocol::models::LicenseSnapshot;
use crate::LicensewardError;

/// Persistence for the single local license record.
///
/// Implementations must report a missing record as `LicenseNotFound` and an
/// undecodable one as `LicenseCorrupt`, and must leave the stored record
/// unchanged when `save` fails.
pub trait LicenseStore: Send + Sync {
    /// Persist the license record, replacing any previous one.
    fn save(&self, snapshot: &LicenseSnapshot) -> Result<(), LicensewardError>;

    /// Load the license record.
    fn load(&self) -> Result<LicenseSnapshot, LicensewardError>;
}
