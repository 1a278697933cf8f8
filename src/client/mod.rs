//! License authority client contract.

pub mod authority;

pub use authority::RemoteAuthority;
