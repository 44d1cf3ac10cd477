use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lead window before expiry in which the monitor raises a warning.
const WARNING_LEAD_MINUTES: i64 = 5;

/// Session object issued by the authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl ProviderSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the session is close enough to expiry to warn the user.
    pub fn needs_refresh(&self) -> bool {
        let warn_at = self.expires_at - Duration::minutes(WARNING_LEAD_MINUTES);
        Utc::now() > warn_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Seconds remaining until expiry (for countdown display).
    pub fn seconds_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_seconds().max(0)
    }

    /// Derive the validity view as of now.
    pub fn state(&self) -> SessionState {
        SessionState {
            valid: !self.is_expired(),
            expires_at: self.expires_at,
        }
    }
}

/// Derived validity view of a provider session.
///
/// Never stored; recomputed against wall-clock time at every check so a
/// cached expiry older than the polling interval is never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
}
