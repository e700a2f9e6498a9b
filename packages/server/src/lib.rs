// PREreview access control - API core
//
// This crate decides whether a request may reach a PREreview API route.
// Policies are evaluated against the caller's session or API key and the
// community, persona, or user named in the request path.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
