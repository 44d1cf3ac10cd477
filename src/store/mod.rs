//! Identity store: the single source of truth for "who is acting now".
//!
//! This module provides:
//! - `IdentityStore`: actor, initialization flag, session-expired flag,
//!   and the embedded client cache, with the designated mutation entry
//!   points (`set_actor`, cache writes, `handle_expiration`, `logout`)
//! - `StoreEvent` / subscriptions: observers notified synchronously in
//!   the same turn as the mutation
//! - `Navigator` / `Route`: the injected redirect seam
//! - `SnapshotStore`: the persisted {actor, cache} snapshot restored at
//!   process start
//!
//! Every expiry-detecting code path (monitor, failed API call, guard
//! failure) funnels into `handle_expiration` so the actor and cache are
//! never cleared independently.

pub mod identity;
pub mod snapshot;

pub use identity::{IdentityStore, Navigator, NoopNavigator, Route, StoreEvent};
pub use snapshot::{Snapshot, SnapshotStore};
