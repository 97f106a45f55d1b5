//! Role manager contract and the store-backed implementation
//!
//! The [`RoleManager`] trait is what statement execution and session
//! authentication depend on. It maintains the role graph and answers
//! structural queries; it never enforces access control.
//!
//! [`StandardRoleManager`] implements the contract over any [`RoleStore`]:
//!
//! - **Existence checks** come first on every operation
//! - **Cycle prevention**: a grant is rejected when the target role already
//!   reaches the grantee (or the edge exists)
//! - **Single writer**: mutations are serialized behind the store's write
//!   gate, so a read-check-then-write sequence cannot interleave with another
//!   mutation, even one issued through a different manager over the same store
//! - **Cascading drop**: every edge touching a dropped role is removed
//!
//! # Example
//!
//! ```rust
//! use cretoai_roles::{InMemoryRoleStore, RecursiveRoleQuery, RoleConfig, RoleManager, StandardRoleManager};
//!
//! # async fn example() -> cretoai_roles::Result<()> {
//! let manager = StandardRoleManager::new(InMemoryRoleStore::new());
//! manager.start().await?;
//!
//! manager.create("alice", &RoleConfig::new().with_login(true)).await?;
//! manager.create("admin", &RoleConfig::new().with_superuser(true)).await?;
//! manager.grant("alice", "admin").await?;
//!
//! let granted = manager.query_granted("alice", RecursiveRoleQuery::Yes).await?;
//! assert!(granted.contains("admin"));
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, RoleError};
use crate::graph::RoleGraph;
use crate::resource::{Resource, ResourceSet};
use crate::store::{RoleStore, WriteGate};
use crate::types::{RecursiveRoleQuery, RoleConfig, RoleConfigUpdate, RoleSet};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, info, instrument, warn};

/// Compatibility identifier reported by [`StandardRoleManager`]
pub const STANDARD_ROLE_MANAGER_NAME: &str = "org.apache.cassandra.auth.CassandraRoleManager";

/// Keyspace holding the role tables
pub const AUTH_KEYSPACE: &str = "system_auth";

/// Table of role records
pub const ROLES_TABLE: &str = "roles";

/// Table of grant edges
pub const ROLE_MEMBERS_TABLE: &str = "role_members";

/// Abstract client for managing roles.
///
/// All state is held by an external store. Implementations report the
/// argument errors documented on each method and pass store failures through
/// as [`RoleError::Store`].
#[async_trait]
pub trait RoleManager: Send + Sync {
    /// Stable, versioned name of this implementation for introspection tools
    fn qualified_name(&self) -> &str;

    /// Resources the manager's own administrative operations must be protected by
    fn protected_resources(&self) -> &ResourceSet;

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Fails with [`RoleError::RoleAlreadyExists`] if the role was created before.
    async fn create(&self, role_name: &str, config: &RoleConfig) -> Result<()>;

    /// Fails with [`RoleError::NonexistentRole`] if the role does not exist.
    async fn drop(&self, role_name: &str) -> Result<()>;

    /// Fails with [`RoleError::NonexistentRole`] if the role does not exist.
    async fn alter(&self, role_name: &str, update: &RoleConfigUpdate) -> Result<()>;

    /// Grant `role_name` to `grantee_name`.
    ///
    /// Fails with [`RoleError::NonexistentRole`] if either role is undefined,
    /// and with [`RoleError::RoleAlreadyIncluded`] if the grant would be
    /// redundant or create a cycle.
    async fn grant(&self, grantee_name: &str, role_name: &str) -> Result<()>;

    /// Revoke `role_name` from `revokee_name`.
    ///
    /// Fails with [`RoleError::NonexistentRole`] if either role is undefined,
    /// and with [`RoleError::RevokeUngranted`] if there is no direct grant.
    async fn revoke(&self, revokee_name: &str, role_name: &str) -> Result<()>;

    /// Fails with [`RoleError::NonexistentRole`] if the grantee does not exist.
    async fn query_granted(&self, grantee: &str, mode: RecursiveRoleQuery) -> Result<RoleSet>;

    async fn query_all(&self) -> Result<RoleSet>;

    async fn exists(&self, role_name: &str) -> Result<bool>;

    /// Fails with [`RoleError::NonexistentRole`] if the role does not exist.
    async fn is_superuser(&self, role_name: &str) -> Result<bool>;

    /// Fails with [`RoleError::NonexistentRole`] if the role does not exist.
    async fn can_login(&self, role_name: &str) -> Result<bool>;

    /// Load every role and its direct grants into a [`RoleGraph`].
    ///
    /// Not a consistent snapshot: concurrent mutations may be partially seen.
    async fn snapshot(&self) -> Result<RoleGraph> {
        let mut graph = RoleGraph::new();
        for name in self.query_all().await? {
            let granted = match self.query_granted(&name, RecursiveRoleQuery::No).await {
                Ok(granted) => granted,
                // Dropped since it was listed
                Err(RoleError::NonexistentRole { .. }) => continue,
                Err(e) => return Err(e),
            };
            if !granted.is_empty() {
                graph.set_direct(&name, granted);
            }
            graph.add_role(name);
        }
        Ok(graph)
    }
}

const STATE_NEW: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Role manager backed by a [`RoleStore`]
pub struct StandardRoleManager<S: RoleStore> {
    store: S,

    /// Serializes graph mutations across every manager sharing the store
    writer: WriteGate,

    protected: ResourceSet,

    lifecycle: AtomicU8,
}

impl<S: RoleStore> StandardRoleManager<S> {
    pub fn new(store: S) -> Self {
        let protected = [
            Resource::Roles,
            Resource::table(AUTH_KEYSPACE, ROLES_TABLE),
            Resource::table(AUTH_KEYSPACE, ROLE_MEMBERS_TABLE),
        ]
        .into_iter()
        .collect();

        Self {
            writer: store.write_gate(),
            store,
            protected,
            lifecycle: AtomicU8::new(STATE_NEW),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn get_config(&self, role_name: &str) -> Result<RoleConfig> {
        self.store
            .get_role(role_name)
            .await?
            .ok_or_else(|| RoleError::nonexistent(role_name))
    }

    async fn require_exists(&self, role_name: &str) -> Result<()> {
        if self.store.role_exists(role_name).await? {
            Ok(())
        } else {
            Err(RoleError::nonexistent(role_name))
        }
    }

    /// Read the subgraph reachable from `start` into memory.
    ///
    /// Each role's edges are read once, so the walk is bounded by the number
    /// of roles even if the store was corrupted with a cycle.
    async fn load_reachable(&self, start: &str) -> Result<RoleGraph> {
        let mut graph = RoleGraph::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.to_string());
        graph.add_role(start);

        while let Some(current) = queue.pop_front() {
            let granted = self.store.get_grants(&current).await?;
            for role in &granted {
                if !graph.contains_role(role) {
                    graph.add_role(role.clone());
                    queue.push_back(role.clone());
                }
            }
            graph.set_direct(&current, granted);
        }

        Ok(graph)
    }
}

#[async_trait]
impl<S: RoleStore> RoleManager for StandardRoleManager<S> {
    fn qualified_name(&self) -> &str {
        STANDARD_ROLE_MANAGER_NAME
    }

    fn protected_resources(&self) -> &ResourceSet {
        &self.protected
    }

    async fn start(&self) -> Result<()> {
        if self
            .lifecycle
            .compare_exchange(STATE_NEW, STATE_RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("role manager start called more than once; ignoring");
            return Ok(());
        }

        if let Err(e) = self.store.open().await {
            self.lifecycle.store(STATE_NEW, Ordering::SeqCst);
            return Err(e.into());
        }

        info!(name = STANDARD_ROLE_MANAGER_NAME, "role manager started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self
            .lifecycle
            .compare_exchange(STATE_RUNNING, STATE_STOPPED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("role manager stop called while not running; ignoring");
            return Ok(());
        }

        // Wait out any in-flight mutation before closing the store
        let _guard = self.writer.lock().await;
        self.store.close().await?;

        info!("role manager stopped");
        Ok(())
    }

    #[instrument(skip(self, config))]
    async fn create(&self, role_name: &str, config: &RoleConfig) -> Result<()> {
        let _guard = self.writer.lock().await;

        if self.store.role_exists(role_name).await? {
            warn!("create rejected: role already exists");
            return Err(RoleError::already_exists(role_name));
        }

        self.store.put_role(role_name, *config).await?;
        info!(
            superuser = config.is_superuser,
            login = config.can_login,
            "role created"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn drop(&self, role_name: &str) -> Result<()> {
        let _guard = self.writer.lock().await;

        self.require_exists(role_name).await?;

        // Edges go before the record so an interrupted drop never leaves a
        // dangling edge, and each removal can be retried on its own.
        let granted = self.store.get_grants(role_name).await?;
        for role in &granted {
            self.store.remove_grant(role_name, role).await?;
        }

        let grantees = self.store.get_grantees(role_name).await?;
        for grantee in &grantees {
            self.store.remove_grant(grantee, role_name).await?;
        }

        self.store.delete_role(role_name).await?;
        debug!(
            outgoing = granted.len(),
            incoming = grantees.len(),
            "cascaded grant removal"
        );
        info!("role dropped");
        Ok(())
    }

    #[instrument(skip(self, update))]
    async fn alter(&self, role_name: &str, update: &RoleConfigUpdate) -> Result<()> {
        let _guard = self.writer.lock().await;

        let mut config = self.get_config(role_name).await?;
        if update.is_empty() {
            return Ok(());
        }

        update.apply_to(&mut config);
        self.store.put_role(role_name, config).await?;
        info!(
            superuser = config.is_superuser,
            login = config.can_login,
            "role altered"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn grant(&self, grantee_name: &str, role_name: &str) -> Result<()> {
        let _guard = self.writer.lock().await;

        self.require_exists(grantee_name).await?;
        self.require_exists(role_name).await?;

        let reachable = self.load_reachable(role_name).await?;
        let direct = self.store.get_grants(grantee_name).await?;

        if direct.contains(role_name) || reachable.would_create_cycle(grantee_name, role_name) {
            warn!("grant rejected: redundant or cyclic");
            return Err(RoleError::already_included(grantee_name, role_name));
        }

        self.store.insert_grant(grantee_name, role_name).await?;
        info!("role granted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke(&self, revokee_name: &str, role_name: &str) -> Result<()> {
        let _guard = self.writer.lock().await;

        self.require_exists(revokee_name).await?;
        self.require_exists(role_name).await?;

        if !self.store.remove_grant(revokee_name, role_name).await? {
            warn!("revoke rejected: no direct grant");
            return Err(RoleError::revoke_ungranted(revokee_name, role_name));
        }

        info!("role revoked");
        Ok(())
    }

    async fn query_granted(&self, grantee: &str, mode: RecursiveRoleQuery) -> Result<RoleSet> {
        self.require_exists(grantee).await?;

        match mode {
            RecursiveRoleQuery::No => Ok(self.store.get_grants(grantee).await?),
            RecursiveRoleQuery::Yes => {
                let graph = self.load_reachable(grantee).await?;
                let closure = graph.reachable_from(grantee);
                debug!(grantee, size = closure.len(), "resolved granted roles");
                Ok(closure)
            }
        }
    }

    async fn query_all(&self) -> Result<RoleSet> {
        Ok(self.store.list_roles().await?)
    }

    async fn exists(&self, role_name: &str) -> Result<bool> {
        Ok(self.store.role_exists(role_name).await?)
    }

    async fn is_superuser(&self, role_name: &str) -> Result<bool> {
        Ok(self.get_config(role_name).await?.is_superuser)
    }

    async fn can_login(&self, role_name: &str) -> Result<bool> {
        Ok(self.get_config(role_name).await?.can_login)
    }
}
