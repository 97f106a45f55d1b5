//! Role store adapters
//!
//! A store persists role records (name -> [`RoleConfig`]) and grant edges
//! (grantee -> directly granted roles). Every call is independently atomic;
//! no call spans more than one record or edge. The store enforces none of the
//! role-graph invariants: that is the role manager's job.
//!
//! Each store also owns a [`WriteGate`] that every manager over it (or over
//! any clone of it) locks around a mutation, so checks and writes from
//! different managers cannot interleave.

pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;

pub use memory::InMemoryRoleStore;
#[cfg(feature = "sled-backend")]
pub use self::sled::SledRoleStore;

use crate::error::StoreResult;
use crate::types::{RoleConfig, RoleSet};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mutation gate shared by all handles to one store
pub type WriteGate = Arc<Mutex<()>>;

/// Storage interface for role records and grant edges
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// The gate shared by this store and all of its clones
    fn write_gate(&self) -> WriteGate;

    /// Open connections or files. Called once by the manager's `start`.
    async fn open(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Release connections or flush files. Called once by the manager's `stop`.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Get a role record by name
    async fn get_role(&self, name: &str) -> StoreResult<Option<RoleConfig>>;

    /// Insert or overwrite a role record
    async fn put_role(&self, name: &str, config: RoleConfig) -> StoreResult<()>;

    /// Delete a role record. Returns false if it was absent.
    async fn delete_role(&self, name: &str) -> StoreResult<bool>;

    /// Names of all role records
    async fn list_roles(&self) -> StoreResult<RoleSet>;

    /// Check whether a role record exists
    async fn role_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.get_role(name).await?.is_some())
    }

    /// Roles directly granted to `grantee`
    async fn get_grants(&self, grantee: &str) -> StoreResult<RoleSet>;

    /// Roles that directly include `role`
    async fn get_grantees(&self, role: &str) -> StoreResult<RoleSet>;

    /// Insert the edge `grantee -> role`. Returns false if already present.
    async fn insert_grant(&self, grantee: &str, role: &str) -> StoreResult<bool>;

    /// Remove the edge `grantee -> role`. Returns false if it was absent.
    async fn remove_grant(&self, grantee: &str, role: &str) -> StoreResult<bool>;
}
