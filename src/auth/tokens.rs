use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use crate::config::APP_NAME;

/// OS keychain storage for the provider refresh token.
///
/// Entries are keyed by `(APP_NAME, user_id)`, one per signed-in user.
/// `handle_expiration` and logout purge the entry so no credential
/// remnant survives a cleared session.
pub struct TokenStore;

impl TokenStore {
    fn entry(user_id: &str) -> Result<Entry> {
        Entry::new(APP_NAME, user_id).context("Failed to create keyring entry")
    }

    /// Store a refresh token for a user in the OS keychain
    pub fn store(user_id: &str, refresh_token: &str) -> Result<()> {
        Self::entry(user_id)?
            .set_password(refresh_token)
            .context("Failed to store refresh token in keychain")?;
        Ok(())
    }

    /// Recover the refresh token for a user from the OS keychain.
    ///
    /// Best-effort: a missing entry or an unavailable keychain both come
    /// back as `None`, and the caller treats the session as
    /// unrecoverable. Used when the held session predates this process.
    pub fn restore(user_id: &str) -> Option<String> {
        match Self::entry(user_id).and_then(|entry| {
            entry
                .get_password()
                .context("Failed to retrieve refresh token from keychain")
        }) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, user_id, "No keychain refresh token");
                None
            }
        }
    }

    /// Delete the stored refresh token for a user
    pub fn delete(user_id: &str) -> Result<()> {
        Self::entry(user_id)?
            .delete_credential()
            .context("Failed to delete refresh token from keychain")?;
        Ok(())
    }
}
