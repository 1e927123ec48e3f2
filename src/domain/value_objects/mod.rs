//! Value objects shared by the aggregates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role as carried by the authenticated identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::User => "user", Self::Admin => "admin" }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = RoleError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)] pub struct RoleError(String);
impl std::error::Error for RoleError {}
impl fmt::Display for RoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown role: {}", self.0) }
}

/// The user on whose behalf an operation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn user(id: Uuid) -> Self { Self { id, role: Role::User } }
    pub fn admin(id: Uuid) -> Self { Self { id, role: Role::Admin } }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// Owner-or-admin check used by every per-record permission gate.
    pub fn may_act_for(&self, owner: Uuid) -> bool { self.is_admin() || self.id == owner }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" user ".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_actor_access() {
        let owner = Uuid::now_v7();
        let stranger = Actor::user(Uuid::now_v7());
        assert!(Actor::user(owner).may_act_for(owner));
        assert!(!stranger.may_act_for(owner));
        assert!(Actor::admin(Uuid::now_v7()).may_act_for(owner));
    }
}
