//! Kernel module - server infrastructure and dependencies.

pub mod directory;
pub mod test_dependencies;

pub use directory::{digest_secret, PgDirectory};
pub use test_dependencies::InMemoryDirectory;
