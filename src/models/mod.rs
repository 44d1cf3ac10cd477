//! Domain models for the session core.
//!
//! This module provides:
//! - `Profile`: the authenticated actor driving the client
//! - `Role`: the closed role enumeration used for route authorization

pub mod profile;

pub use profile::{Profile, Role};
