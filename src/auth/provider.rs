use async_trait::async_trait;

use crate::api::ApiError;
use crate::auth::ProviderSession;
use crate::models::Profile;

/// Boundary trait for the hosted authentication provider.
///
/// Every session check in the crate goes through this trait, so tests can
/// substitute a scripted provider and the HTTP client stays swappable.
/// Callers treat any error as "no valid session" (fail closed).
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fetch the current session, or `None` if the provider has none.
    async fn get_session(&self) -> Result<Option<ProviderSession>, ApiError>;

    /// Exchange the refresh token for a session with a new expiry.
    async fn refresh_session(&self) -> Result<ProviderSession, ApiError>;

    /// Invalidate the provider session.
    async fn sign_out(&self) -> Result<(), ApiError>;

    /// Look up the profile row backing a user id, or `None` if it no
    /// longer exists.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, ApiError>;
}
