//! HTTP client module for the hosted backend.
//!
//! This module provides the `HttpAuthProvider` for communicating with the
//! backend's auth and profile endpoints.
//!
//! The backend uses JWT bearer token authentication plus a per-project
//! api key header on every request.

pub mod client;
pub mod error;

pub use client::HttpAuthProvider;
pub use error::ApiError;
