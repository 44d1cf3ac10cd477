//! Authentication boundary for the session core.
//!
//! This module provides:
//! - `ProviderSession` / `SessionState`: the provider's session object and
//!   the derived validity view computed from it
//! - `AuthProvider`: the trait every session check goes through
//! - `TokenStore`: secure OS-level refresh-token storage via keyring
//!
//! Sessions carry an absolute expiry and are always compared against
//! current wall-clock time at check time.

pub mod provider;
pub mod session;
pub mod tokens;

pub use provider::AuthProvider;
pub use session::{ProviderSession, SessionState};
pub use tokens::TokenStore;
