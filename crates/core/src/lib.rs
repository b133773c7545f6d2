//! Folio Core - Shared types library.
//!
//! This crate provides common types used across all Folio components:
//! - `site` - Contact dispatch and admin session guard (axum)
//! - `cli` - Operator tools for the mail relay and admin sessions
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no SMTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated emails, admin roles, and session records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
