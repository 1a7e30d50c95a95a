//! Post ownership authorization.
//!
//! Decides whether an (optionally anonymous) principal may perform an action
//! on a post. Rules are evaluated in a fixed precedence order:
//!
//! 1. `Read` is always allowed, even anonymously.
//! 2. `Create` requires any authenticated principal.
//! 3. `Update` requires ownership. Admins get no override.
//! 4. `Delete` requires ownership or the admin role.
//!
//! The update/delete asymmetry is intentional policy: an admin may remove
//! someone else's post but never edit it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Role of an authenticated user.
///
/// Stored as an open string; parsed into this closed set once on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(Error::DataIntegrity(format!("unrecognized role '{other}'"))),
        }
    }
}

/// The authenticated caller of one request. Derived from a verified access
/// token and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub const fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Action attempted on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Outcome of an authorization check. Denial is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    const fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Decide whether `principal` may perform `action` on a resource owned by
/// `resource_owner_id`.
///
/// `resource_owner_id` is ignored for `Read` and `Create`. For `Update` and
/// `Delete` a missing owner never matches a principal, so only the admin
/// delete override can still allow.
pub fn decide(
    principal: Option<&Principal>,
    action: Action,
    resource_owner_id: Option<i64>,
) -> Decision {
    let owns = |p: &Principal| resource_owner_id == Some(p.id);
    let allowed = match action {
        Action::Read => true,
        Action::Create => principal.is_some(),
        Action::Update => principal.is_some_and(owns),
        Action::Delete => principal.is_some_and(|p| owns(p) || p.is_admin()),
    };
    Decision::from_bool(allowed)
}
