//! Shared plumbing for the member workspace: logging setup, small HTTP-facing types and
//! serde helpers used by the server crate.

pub mod types;
pub mod utils;
