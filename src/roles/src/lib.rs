//! # CretoAI Role Manager
//!
//! Maintains the role hierarchy behind authentication and authorization:
//! named roles with superuser/login capabilities, connected by grant edges.
//!
//! ## Features
//!
//! - **Role lifecycle**: create, drop (with cascading revoke), partial alter
//! - **Hierarchical grants** with redundancy and cycle prevention
//! - **Membership resolution**: direct grants or full transitive closure
//! - **Pluggable storage**: in-memory and sled-backed role stores
//! - **Async-first design** using Tokio
//!
//! Access control is not enforced here; callers consume `is_superuser`,
//! `can_login` and `query_granted` to make their own decisions.
//!
//! ## Example
//!
//! ```rust
//! use cretoai_roles::{InMemoryRoleStore, RecursiveRoleQuery, RoleConfig, RoleManager, StandardRoleManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = StandardRoleManager::new(InMemoryRoleStore::new());
//!     manager.start().await?;
//!
//!     for role in ["alice", "admin", "ops"] {
//!         manager.create(role, &RoleConfig::default()).await?;
//!     }
//!     manager.grant("alice", "admin").await?;
//!     manager.grant("admin", "ops").await?;
//!
//!     let roles = manager.query_granted("alice", RecursiveRoleQuery::Yes).await?;
//!     assert_eq!(roles.len(), 2);
//!
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod manager;
pub mod registry;
pub mod resource;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Result, RoleError, StoreError, StoreResult};
pub use graph::{GraphError, RoleGraph};
pub use manager::{RoleManager, StandardRoleManager, STANDARD_ROLE_MANAGER_NAME};
pub use registry::{RegistryError, RoleManagerRegistry};
pub use resource::{maybe_correct_resource, Resource, ResourceSet};
pub use store::{InMemoryRoleStore, RoleStore, WriteGate};
#[cfg(feature = "sled-backend")]
pub use store::SledRoleStore;
pub use types::{RecursiveRoleQuery, RoleConfig, RoleConfigUpdate, RoleSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
