//! Resource identifiers consumed by access control
//!
//! Resources are rendered as slash-separated paths:
//!
//! - `roles` / `roles/<name>`
//! - `data` / `data/<keyspace>` / `data/<keyspace>/<table>`
//!
//! # Example
//!
//! ```rust
//! use cretoai_roles::resource::{maybe_correct_resource, Resource};
//!
//! let mut resource = Resource::table("", "users");
//! maybe_correct_resource(&mut resource, Some("app")).unwrap();
//! assert_eq!(resource.to_string(), "data/app/users");
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ROLES_ROOT: &str = "roles";
const DATA_ROOT: &str = "data";

/// Resource parsing and correction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The string is not a recognized resource path
    #[error("Invalid resource: {0}")]
    InvalidFormat(String),

    /// A table was named without a keyspace and no keyspace is in use
    #[error("No keyspace has been specified for table {table}")]
    NoKeyspace { table: String },
}

/// A data resource: the root of all data, one keyspace, or one table
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataResource {
    pub keyspace: Option<String>,
    pub table: Option<String>,
}

/// Something access control can protect
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    /// The set of all roles
    Roles,
    /// A single role
    Role(String),
    /// Data: root, keyspace, or table
    Data(DataResource),
}

/// Ordered set of resources
pub type ResourceSet = BTreeSet<Resource>;

impl Resource {
    pub fn role(name: impl Into<String>) -> Self {
        Resource::Role(name.into())
    }

    pub fn data_root() -> Self {
        Resource::Data(DataResource::default())
    }

    pub fn keyspace(keyspace: impl Into<String>) -> Self {
        Resource::Data(DataResource {
            keyspace: Some(keyspace.into()),
            table: None,
        })
    }

    pub fn table(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Resource::Data(DataResource {
            keyspace: Some(keyspace.into()),
            table: Some(table.into()),
        })
    }

    /// The enclosing resource, or `None` for a root
    pub fn parent(&self) -> Option<Resource> {
        match self {
            Resource::Roles => None,
            Resource::Role(_) => Some(Resource::Roles),
            Resource::Data(data) => match (&data.keyspace, &data.table) {
                (Some(ks), Some(_)) => Some(Resource::keyspace(ks.clone())),
                (Some(_), None) => Some(Resource::data_root()),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Roles => write!(f, "{}", ROLES_ROOT),
            Resource::Role(name) => write!(f, "{}/{}", ROLES_ROOT, name),
            Resource::Data(data) => {
                write!(f, "{}", DATA_ROOT)?;
                if let Some(ks) = &data.keyspace {
                    write!(f, "/{}", ks)?;
                    if let Some(table) = &data.table {
                        write!(f, "/{}", table)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Resource {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();

        match parts.as_slice() {
            [ROLES_ROOT] => Ok(Resource::Roles),
            [ROLES_ROOT, name] if !name.is_empty() => Ok(Resource::role(*name)),
            [DATA_ROOT] => Ok(Resource::data_root()),
            [DATA_ROOT, ks] if !ks.is_empty() => Ok(Resource::keyspace(*ks)),
            [DATA_ROOT, ks, table] if !table.is_empty() => Ok(Resource::table(*ks, *table)),
            _ => Err(ResourceError::InvalidFormat(s.to_string())),
        }
    }
}

/// Fill in the keyspace of a table resource that was named without one.
///
/// Only data resources naming a table with an empty keyspace are rewritten,
/// using `current_keyspace`. Every other resource is left as-is.
pub fn maybe_correct_resource(
    resource: &mut Resource,
    current_keyspace: Option<&str>,
) -> Result<(), ResourceError> {
    let Resource::Data(data) = resource else {
        return Ok(());
    };

    let Some(table) = &data.table else {
        return Ok(());
    };

    if data.keyspace.as_deref().map_or(false, |ks| !ks.is_empty()) {
        return Ok(());
    }

    match current_keyspace {
        Some(ks) if !ks.is_empty() => {
            data.keyspace = Some(ks.to_string());
            Ok(())
        }
        _ => Err(ResourceError::NoKeyspace {
            table: table.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let cases = [
            (Resource::Roles, "roles"),
            (Resource::role("alice"), "roles/alice"),
            (Resource::data_root(), "data"),
            (Resource::keyspace("system_auth"), "data/system_auth"),
            (Resource::table("system_auth", "roles"), "data/system_auth/roles"),
        ];

        for (resource, rendered) in cases {
            assert_eq!(resource.to_string(), rendered);
            assert_eq!(rendered.parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Resource>().is_err());
        assert!("roles/".parse::<Resource>().is_err());
        assert!("functions/ks".parse::<Resource>().is_err());
        assert!("data/ks/t/extra".parse::<Resource>().is_err());
    }

    #[test]
    fn test_parent_chain() {
        let table = Resource::table("ks", "t");
        assert_eq!(table.parent(), Some(Resource::keyspace("ks")));
        assert_eq!(Resource::keyspace("ks").parent(), Some(Resource::data_root()));
        assert_eq!(Resource::data_root().parent(), None);
        assert_eq!(Resource::role("alice").parent(), Some(Resource::Roles));
        assert_eq!(Resource::Roles.parent(), None);
    }

    #[test]
    fn test_correct_table_without_keyspace() {
        let mut resource = Resource::table("", "users");
        maybe_correct_resource(&mut resource, Some("app")).unwrap();
        assert_eq!(resource, Resource::table("app", "users"));
    }

    #[test]
    fn test_correct_leaves_qualified_table() {
        let mut resource = Resource::table("other", "users");
        maybe_correct_resource(&mut resource, Some("app")).unwrap();
        assert_eq!(resource, Resource::table("other", "users"));
    }

    #[test]
    fn test_correct_ignores_non_tables() {
        for original in [Resource::Roles, Resource::role("x"), Resource::data_root(), Resource::keyspace("ks")] {
            let mut resource = original.clone();
            maybe_correct_resource(&mut resource, None).unwrap();
            assert_eq!(resource, original);
        }
    }

    #[test]
    fn test_correct_without_current_keyspace() {
        let mut resource = Resource::table("", "users");
        let err = maybe_correct_resource(&mut resource, None).unwrap_err();
        assert_eq!(
            err,
            ResourceError::NoKeyspace {
                table: "users".to_string()
            }
        );
    }
}
