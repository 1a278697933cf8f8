//! License policies.

pub mod renewal;

pub use renewal::{RenewalAdvisory, RenewalEvaluator, RenewalUrgency};
