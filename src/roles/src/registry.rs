//! Named role-manager implementations
//!
//! Configuration selects a role manager by name. Names are fully qualified
//! (`org.apache.cassandra.auth.CassandraRoleManager`), but the short form
//! (`CassandraRoleManager`) resolves to the registered qualified name.

use crate::manager::{RoleManager, StandardRoleManager, STANDARD_ROLE_MANAGER_NAME};
use crate::store::RoleStore;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No role manager registered under {0}")]
    NoSuchManager(String),
}

/// Builds a role manager instance
pub type ManagerFactory = Arc<dyn Fn() -> Arc<dyn RoleManager> + Send + Sync>;

/// Maps qualified implementation names to factories
#[derive(Clone, Default)]
pub struct RoleManagerRegistry {
    factories: HashMap<String, ManagerFactory>,
}

fn is_qualified(name: &str) -> bool {
    name.contains('.')
}

impl RoleManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard manager over `store`
    pub fn with_defaults<S>(store: S) -> Self
    where
        S: RoleStore + Clone + 'static,
    {
        let mut registry = Self::new();
        registry.register(STANDARD_ROLE_MANAGER_NAME, move || {
            Arc::new(StandardRoleManager::new(store.clone())) as Arc<dyn RoleManager>
        });
        registry
    }

    /// Register `factory` under a qualified name, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn RoleManager> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Expand a short name to the registered qualified name.
    ///
    /// Qualified names and unknown short names are returned unchanged.
    pub fn to_qualified_name(&self, name: &str) -> String {
        if is_qualified(name) {
            return name.to_string();
        }

        self.factories
            .keys()
            .find(|registered| {
                registered
                    .rsplit_once('.')
                    .map_or(false, |(_, short)| short == name)
            })
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Build the manager registered under `name` (short or qualified)
    pub fn create(&self, name: &str) -> Result<Arc<dyn RoleManager>, RegistryError> {
        let qualified = self.to_qualified_name(name);
        let factory = self
            .factories
            .get(&qualified)
            .ok_or_else(|| RegistryError::NoSuchManager(name.to_string()))?;
        Ok(factory())
    }
}

impl std::fmt::Debug for RoleManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleManagerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRoleStore;

    #[test]
    fn test_short_name_resolution() {
        let registry = RoleManagerRegistry::with_defaults(InMemoryRoleStore::new());

        assert_eq!(
            registry.to_qualified_name("CassandraRoleManager"),
            STANDARD_ROLE_MANAGER_NAME
        );
        assert_eq!(
            registry.to_qualified_name(STANDARD_ROLE_MANAGER_NAME),
            STANDARD_ROLE_MANAGER_NAME
        );
        assert_eq!(registry.to_qualified_name("Unknown"), "Unknown");
        assert_eq!(registry.to_qualified_name("com.example.Other"), "com.example.Other");
    }

    #[test]
    fn test_create_by_either_name() {
        let registry = RoleManagerRegistry::with_defaults(InMemoryRoleStore::new());

        let manager = registry.create("CassandraRoleManager").unwrap();
        assert_eq!(manager.qualified_name(), STANDARD_ROLE_MANAGER_NAME);

        let manager = registry.create(STANDARD_ROLE_MANAGER_NAME).unwrap();
        assert_eq!(manager.qualified_name(), STANDARD_ROLE_MANAGER_NAME);
    }

    #[test]
    fn test_unknown_manager() {
        let registry = RoleManagerRegistry::new();
        assert_eq!(
            registry.create("Missing").err(),
            Some(RegistryError::NoSuchManager("Missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_instances_share_store() {
        let store = InMemoryRoleStore::new();
        let registry = RoleManagerRegistry::with_defaults(store.clone());

        let first = registry.create("CassandraRoleManager").unwrap();
        first.create("alice", &Default::default()).await.unwrap();

        let second = registry.create("CassandraRoleManager").unwrap();
        assert!(second.exists("alice").await.unwrap());
    }
}
