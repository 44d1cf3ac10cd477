use serde::{Deserialize, Serialize};

/// Role assigned to a profile row.
///
/// Matches the backend `profiles.role` column, which is a lowercase
/// text enum. Unknown values fail deserialization rather than mapping
/// to a default, so a schema change surfaces immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
    Hr,
    Accountant,
}

impl Role {
    /// Display name for UI labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
            Role::Hr => "HR",
            Role::Accountant => "Accountant",
        }
    }

    /// Whether this role may manage other users.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin | Role::Hr)
    }
}

/// The authenticated actor currently driving the client.
///
/// Owned by the `IdentityStore` while a session is active; dropped
/// wholesale on logout or expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub force_password_change: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Profile {
    /// Check membership in an allowed-role set.
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}
