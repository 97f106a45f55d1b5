//! In-memory role store

use super::{RoleStore, WriteGate};
use crate::error::{StoreError, StoreResult};
use crate::types::{RoleConfig, RoleSet};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    roles: HashMap<String, RoleConfig>,
    grants: HashMap<String, RoleSet>,
}

/// In-memory role store, mainly for tests and single-process deployments.
///
/// Can be switched unavailable to exercise error propagation.
#[derive(Debug, Clone)]
pub struct InMemoryRoleStore {
    state: Arc<RwLock<State>>,
    available: Arc<AtomicBool>,
    gate: WriteGate,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            available: Arc::new(AtomicBool::new(true)),
            gate: WriteGate::default(),
        }
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`] (or recover)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        }
    }
}

impl Default for InMemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    fn write_gate(&self) -> WriteGate {
        Arc::clone(&self.gate)
    }

    async fn get_role(&self, name: &str) -> StoreResult<Option<RoleConfig>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.roles.get(name).copied())
    }

    async fn put_role(&self, name: &str, config: RoleConfig) -> StoreResult<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        state.roles.insert(name.to_string(), config);
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> StoreResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state.roles.remove(name).is_some())
    }

    async fn list_roles(&self) -> StoreResult<RoleSet> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.roles.keys().cloned().collect())
    }

    async fn get_grants(&self, grantee: &str) -> StoreResult<RoleSet> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.grants.get(grantee).cloned().unwrap_or_default())
    }

    async fn get_grantees(&self, role: &str) -> StoreResult<RoleSet> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|(_, granted)| granted.contains(role))
            .map(|(grantee, _)| grantee.clone())
            .collect())
    }

    async fn insert_grant(&self, grantee: &str, role: &str) -> StoreResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state
            .grants
            .entry(grantee.to_string())
            .or_default()
            .insert(role.to_string()))
    }

    async fn remove_grant(&self, grantee: &str, role: &str) -> StoreResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let removed = match state.grants.get_mut(grantee) {
            Some(granted) => granted.remove(role),
            None => false,
        };
        if state.grants.get(grantee).map_or(false, |g| g.is_empty()) {
            state.grants.remove(grantee);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_role_records() {
        let store = InMemoryRoleStore::new();

        assert_eq!(store.get_role("alice").await.unwrap(), None);
        store
            .put_role("alice", RoleConfig::new().with_login(true))
            .await
            .unwrap();

        assert!(store.role_exists("alice").await.unwrap());
        assert!(store.get_role("alice").await.unwrap().unwrap().can_login);
        assert!(store.delete_role("alice").await.unwrap());
        assert!(!store.delete_role("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_edges() {
        let store = InMemoryRoleStore::new();

        assert!(store.insert_grant("alice", "admin").await.unwrap());
        assert!(!store.insert_grant("alice", "admin").await.unwrap());
        assert!(store.insert_grant("bob", "admin").await.unwrap());

        let grantees = store.get_grantees("admin").await.unwrap();
        assert_eq!(grantees.len(), 2);
        assert!(store.get_grants("alice").await.unwrap().contains("admin"));

        assert!(store.remove_grant("alice", "admin").await.unwrap());
        assert!(!store.remove_grant("alice", "admin").await.unwrap());
        assert!(store.get_grants("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = InMemoryRoleStore::new();
        store.set_available(false);

        let err = store.list_roles().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        store.set_available(true);
        assert!(store.list_roles().await.unwrap().is_empty());
    }
}
