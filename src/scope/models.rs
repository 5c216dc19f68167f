use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A factory (plant) as served by the backend. Immutable from this
/// crate's point of view; rows come back active-only, ordered by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factory {
    pub factory_id: Uuid,
    pub factory_code: String,
    pub factory_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Factory {
    pub fn new(id: Uuid, code: &str, name: &str) -> Self {
        Self {
            factory_id: id,
            factory_code: code.to_string(),
            factory_name: name.to_string(),
            is_active: true,
            created_at: None,
        }
    }
}

/// Closed set of user roles.
///
/// The privilege check lives in exactly one place: `is_privileged_admin`.
/// Only a system admin may switch their active factory freely; everyone
/// else is pinned to their assignment and can at most observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SystemAdmin,
    Admin,
    User,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::Admin => "admin",
            Self::User => "user",
            Self::Viewer => "viewer",
        }
    }

    /// Whether this role may freely switch the active factory.
    pub fn is_privileged_admin(&self) -> bool {
        matches!(self, Self::SystemAdmin)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system_admin" => Ok(Self::SystemAdmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the identity source hands over at login time, driving the
/// initial scope load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
    pub assigned_factory_id: Option<Uuid>,
    pub role: UserRole,
}

/// Read-only view of the scope state, published to subscribers whenever
/// it changes. Collaborators that cache tenant-scoped data refetch when
/// `resolved_factory_id` moves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopeSnapshot {
    pub resolved_factory_id: Option<Uuid>,
    pub active_factory: Option<Factory>,
    pub viewing_factory: Option<Factory>,
    pub observer_mode: bool,
    pub initialized: bool,
}
