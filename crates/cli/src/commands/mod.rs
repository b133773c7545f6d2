//! CLI command implementations.

pub mod mail;
pub mod session;
