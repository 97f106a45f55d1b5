//! Persistent role store on sled
//!
//! Layout:
//!
//! - tree `roles`: role name -> JSON-encoded [`RoleConfig`]
//! - tree `role_members`: `len(grantee) grantee role` -> empty value, with the
//!   grantee length as a big-endian `u32`
//!
//! One key per edge keeps every edge mutation a single atomic write. The
//! length prefix keeps keys unambiguous for any role name, so a grantee's
//! edges are exactly the keys under its prefix.

use super::{RoleStore, WriteGate};
use crate::error::{StoreError, StoreResult};
use crate::types::{RoleConfig, RoleSet};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const TREE_ROLES: &str = "roles";
const TREE_MEMBERS: &str = "role_members";
const LEN_PREFIX: usize = 4;

/// sled-backed role store
#[derive(Debug, Clone)]
pub struct SledRoleStore {
    db: sled::Db,
    roles: sled::Tree,
    members: sled::Tree,
    gate: WriteGate,
}

impl SledRoleStore {
    /// Open or create a store at `path`
    pub fn open_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path.as_ref()).map_err(backend)?;
        Self::from_db(db)
    }

    /// Open a throwaway store that is deleted on drop
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(backend)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let roles = db.open_tree(TREE_ROLES).map_err(backend)?;
        let members = db.open_tree(TREE_MEMBERS).map_err(backend)?;
        Ok(Self {
            db,
            roles,
            members,
            gate: WriteGate::default(),
        })
    }

    fn grantee_prefix(grantee: &str) -> StoreResult<Vec<u8>> {
        let len = u32::try_from(grantee.len())
            .map_err(|_| StoreError::Serialization("role name too long".to_string()))?;
        let mut prefix = Vec::with_capacity(LEN_PREFIX + grantee.len());
        prefix.extend_from_slice(&len.to_be_bytes());
        prefix.extend_from_slice(grantee.as_bytes());
        Ok(prefix)
    }

    fn edge_key(grantee: &str, role: &str) -> StoreResult<Vec<u8>> {
        let mut key = Self::grantee_prefix(grantee)?;
        key.extend_from_slice(role.as_bytes());
        Ok(key)
    }

    fn split_edge_key(key: &[u8]) -> StoreResult<(String, String)> {
        let malformed = || StoreError::Serialization("malformed edge key".to_string());

        let len: [u8; LEN_PREFIX] = key
            .get(..LEN_PREFIX)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(malformed)?;
        let end = LEN_PREFIX + u32::from_be_bytes(len) as usize;
        let grantee = key.get(LEN_PREFIX..end).ok_or_else(malformed)?;
        Ok((utf8(grantee)?, utf8(&key[end..])?))
    }
}

fn backend(e: sled::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn utf8(bytes: &[u8]) -> StoreResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| StoreError::Serialization(format!("invalid role name: {}", e)))
}

#[async_trait]
impl RoleStore for SledRoleStore {
    fn write_gate(&self) -> WriteGate {
        Arc::clone(&self.gate)
    }

    async fn close(&self) -> StoreResult<()> {
        let flushed = self.db.flush_async().await.map_err(backend)?;
        debug!(bytes = flushed, "flushed role store");
        Ok(())
    }

    async fn get_role(&self, name: &str) -> StoreResult<Option<RoleConfig>> {
        match self.roles.get(name.as_bytes()).map_err(backend)? {
            Some(value) => {
                let config = serde_json::from_slice(&value)
                    .map_err(|e| StoreError::Serialization(format!("role {}: {}", name, e)))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    async fn put_role(&self, name: &str, config: RoleConfig) -> StoreResult<()> {
        let value = serde_json::to_vec(&config)
            .map_err(|e| StoreError::Serialization(format!("role {}: {}", name, e)))?;
        self.roles.insert(name.as_bytes(), value).map_err(backend)?;
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> StoreResult<bool> {
        Ok(self.roles.remove(name.as_bytes()).map_err(backend)?.is_some())
    }

    async fn list_roles(&self) -> StoreResult<RoleSet> {
        let mut names = RoleSet::new();
        for key in self.roles.iter().keys() {
            names.insert(utf8(&key.map_err(backend)?)?);
        }
        Ok(names)
    }

    async fn role_exists(&self, name: &str) -> StoreResult<bool> {
        self.roles.contains_key(name.as_bytes()).map_err(backend)
    }

    async fn get_grants(&self, grantee: &str) -> StoreResult<RoleSet> {
        let prefix = Self::grantee_prefix(grantee)?;

        let mut granted = RoleSet::new();
        for key in self.members.scan_prefix(&prefix).keys() {
            let (_, role) = Self::split_edge_key(&key.map_err(backend)?)?;
            granted.insert(role);
        }
        Ok(granted)
    }

    async fn get_grantees(&self, role: &str) -> StoreResult<RoleSet> {
        let mut grantees = RoleSet::new();
        for key in self.members.iter().keys() {
            let (grantee, granted) = Self::split_edge_key(&key.map_err(backend)?)?;
            if granted == role {
                grantees.insert(grantee);
            }
        }
        Ok(grantees)
    }

    async fn insert_grant(&self, grantee: &str, role: &str) -> StoreResult<bool> {
        let previous = self
            .members
            .insert(Self::edge_key(grantee, role)?, Vec::<u8>::new())
            .map_err(backend)?;
        Ok(previous.is_none())
    }

    async fn remove_grant(&self, grantee: &str, role: &str) -> StoreResult<bool> {
        let previous = self
            .members
            .remove(Self::edge_key(grantee, role)?)
            .map_err(backend)?;
        Ok(previous.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roles_roundtrip() {
        let store = SledRoleStore::temporary().unwrap();
        let config = RoleConfig::new().with_superuser(true);

        store.put_role("root", config).await.unwrap();
        assert_eq!(store.get_role("root").await.unwrap(), Some(config));
        assert!(store.role_exists("root").await.unwrap());
        assert_eq!(store.list_roles().await.unwrap().len(), 1);

        assert!(store.delete_role("root").await.unwrap());
        assert!(!store.role_exists("root").await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_prefix_does_not_leak() {
        let store = SledRoleStore::temporary().unwrap();

        store.insert_grant("al", "admin").await.unwrap();
        store.insert_grant("alice", "ops").await.unwrap();

        let al: Vec<String> = store.get_grants("al").await.unwrap().into_iter().collect();
        assert_eq!(al, vec!["admin".to_string()]);
        assert_eq!(store.get_grantees("ops").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edges_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = SledRoleStore::open_path(dir.path()).unwrap();
            store.put_role("a", RoleConfig::new()).await.unwrap();
            store.insert_grant("a", "b").await.unwrap();
            store.close().await.unwrap();
        }

        let store = SledRoleStore::open_path(dir.path()).unwrap();
        assert!(store.role_exists("a").await.unwrap());
        assert!(store.get_grants("a").await.unwrap().contains("b"));
        assert!(!store.insert_grant("a", "b").await.unwrap());
        assert!(store.remove_grant("a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_nul_in_name_keeps_edges_apart() {
        let store = SledRoleStore::temporary().unwrap();

        store.insert_grant("a\0b", "c").await.unwrap();
        store.insert_grant("a", "b\0c").await.unwrap();

        let set = |names: &[&str]| -> RoleSet { names.iter().map(|n| n.to_string()).collect() };
        assert_eq!(store.get_grants("a\0b").await.unwrap(), set(&["c"]));
        assert_eq!(store.get_grants("a").await.unwrap(), set(&["b\0c"]));
        assert_eq!(store.get_grantees("c").await.unwrap(), set(&["a\0b"]));

        assert!(store.remove_grant("a\0b", "c").await.unwrap());
        assert!(store.get_grants("a\0b").await.unwrap().is_empty());
        assert_eq!(store.get_grants("a").await.unwrap(), set(&["b\0c"]));
    }

    #[test]
    fn test_edge_key_decodes_back() {
        let key = SledRoleStore::edge_key("x\0y", "").unwrap();
        assert_eq!(
            SledRoleStore::split_edge_key(&key).unwrap(),
            ("x\0y".to_string(), String::new())
        );
        assert!(SledRoleStore::split_edge_key(&[0, 0, 0, 9, b'a']).is_err());
    }
}
