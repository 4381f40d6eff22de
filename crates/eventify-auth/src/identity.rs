//! The signed-in user as the backend describes it.

use crate::navigation::routes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. Decides which dashboard a user may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Participant,
    Organizer,
    SuperAdmin,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Participant => "PARTICIPANT",
            Role::Organizer => "ORGANIZER",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Dashboard a user with this role lands on after sign-in.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Participant => routes::PARTICIPANT_DASHBOARD,
            Role::Organizer => routes::ORGANIZER_DASHBOARD,
            Role::SuperAdmin => routes::SUPER_ADMIN_DASHBOARD,
        }
    }

    /// Roles a visitor may pick for themselves when signing up.
    pub fn is_self_assignable(self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts the wire name as well as the dashboard slug
    /// (`participant`, `organizer`, `super-admin`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "participant" => Ok(Role::Participant),
            "organizer" => Ok(Role::Organizer),
            "super_admin" | "superadmin" | "admin" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Identity {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
