//! Command execution functions, one module per subcommand.
//!
//! Every command returns the process exit code on success; failures
//! propagate as [`crate::error::ReleaseError`].

pub mod check_key;
pub mod collect;
pub mod flatten;
pub mod keygen;
pub mod merge;
pub mod release;
pub mod sign_updater;
pub mod sync_version;
