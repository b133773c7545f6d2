//! Core types for Folio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod session;

pub use email::{Email, EmailError};
pub use id::SessionId;
pub use role::AdminRole;
pub use session::{SessionRecord, SessionUser};
