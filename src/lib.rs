//! Shiftgate - session lifecycle and client-side authorization core.
//!
//! This crate is the control core of a time-tracking web client: it
//! decides, on every navigation and every periodic tick, whether the
//! current actor is authenticated, whether their session is about to
//! lapse, and what cached identity data may be trusted.
//!
//! Components:
//! - [`store::IdentityStore`]: single source of truth for the actor,
//!   lifecycle flags, and the embedded TTL cache
//! - [`cache::ClientCache`]: in-memory key/value map with per-entry
//!   absolute expiry, evicted lazily on access
//! - [`monitor`]: background session polling with a pre-expiry warning
//!   countdown and explicit timer cancellation
//! - [`guard::RouteGuard`]: the per-navigation authorization gate
//! - [`api::HttpAuthProvider`]: the HTTP boundary to the hosted
//!   authentication and profile backend
//!
//! Every expiry-detecting path converges on
//! [`store::IdentityStore::handle_expiration`], which clears the actor
//! and cache together before issuing the login redirect. Errors from
//! the provider never reach UI code; they normalize to redirects
//! (fail closed).

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod guard;
pub mod models;
pub mod monitor;
pub mod store;

pub use api::{ApiError, HttpAuthProvider};
pub use auth::{AuthProvider, ProviderSession, SessionState, TokenStore};
pub use cache::ClientCache;
pub use config::Config;
pub use guard::{RouteDecision, RouteGuard};
pub use models::{Profile, Role};
pub use monitor::{MonitorEvent, MonitorHandle, SessionMonitor};
pub use store::{IdentityStore, Navigator, Route, SnapshotStore, StoreEvent};
