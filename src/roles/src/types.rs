//! Role record and query type definitions

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Set of role names
pub type RoleSet = HashSet<String>;

/// Capabilities stored with every role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Role has every privilege
    #[serde(default)]
    pub is_superuser: bool,

    /// Role may authenticate a session
    #[serde(default)]
    pub can_login: bool,
}

impl RoleConfig {
    /// Create a config with both capabilities unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the superuser capability
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    /// Set the login capability
    pub fn with_login(mut self, can_login: bool) -> Self {
        self.can_login = can_login;
        self
    }
}

/// Differential update for altering an existing role
///
/// Only fields that are `Some` are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_login: Option<bool>,
}

impl RoleConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = Some(is_superuser);
        self
    }

    pub fn login(mut self, can_login: bool) -> Self {
        self.can_login = Some(can_login);
        self
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.is_superuser.is_none() && self.can_login.is_none()
    }

    /// Apply the present fields to `config`, leaving the rest untouched
    pub fn apply_to(&self, config: &mut RoleConfig) {
        if let Some(is_superuser) = self.is_superuser {
            config.is_superuser = is_superuser;
        }
        if let Some(can_login) = self.can_login {
            config.can_login = can_login;
        }
    }
}

/// Whether a granted-roles query follows grant edges transitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecursiveRoleQuery {
    /// Full transitive closure
    Yes,
    /// Direct grants only
    No,
}

impl From<bool> for RecursiveRoleQuery {
    fn from(recursive: bool) -> Self {
        if recursive {
            RecursiveRoleQuery::Yes
        } else {
            RecursiveRoleQuery::No
        }
    }
}
