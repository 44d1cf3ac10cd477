//! In-memory caching module for actor-scoped data.
//!
//! This module provides the `ClientCache` for short-lived reuse of
//! slow-changing lookups (e.g. a resolved profile). Entries carry an
//! absolute expiry fixed at write time and default to a 5 minute TTL.
//!
//! The cache has no size bound and no LRU: entries are keyed per-actor
//! and cleared wholesale on logout or expiry, so growth is bounded by
//! session lifetime.

pub mod store;

pub use store::{CacheEntry, ClientCache};
