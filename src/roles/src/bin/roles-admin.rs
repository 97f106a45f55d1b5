//! Role administration CLI
//!
//! Runs one role-management command against the configured store and prints
//! query results as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cretoai_roles::config::{RolesConfig, StoreBackend};
use cretoai_roles::{
    InMemoryRoleStore, RecursiveRoleQuery, RoleConfig, RoleConfigUpdate, RoleManager,
    RoleManagerRegistry, RoleSet, SledRoleStore,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

/// CretoAI role administration
#[derive(Parser)]
#[command(name = "roles-admin")]
#[command(about = "Manage roles and role grants")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "CRETOAI_ROLES_CONFIG")]
    config: Option<PathBuf>,

    /// Override the store data directory (implies the sled backend)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a role
    Create {
        name: String,
        #[arg(long)]
        superuser: bool,
        #[arg(long)]
        login: bool,
    },

    /// Drop a role and every grant touching it
    Drop { name: String },

    /// Change a role's capabilities
    Alter {
        name: String,
        #[arg(long)]
        superuser: Option<bool>,
        #[arg(long)]
        login: Option<bool>,
    },

    /// Grant a role to a grantee
    Grant {
        role: String,
        #[arg(long)]
        to: String,
    },

    /// Revoke a directly granted role
    Revoke {
        role: String,
        #[arg(long)]
        from: String,
    },

    /// List all roles, or the roles granted to one role
    List {
        #[arg(long)]
        of: Option<String>,
        #[arg(long)]
        recursive: bool,
    },

    /// Show a role's capabilities and grants
    Show { name: String },

    /// Check the stored grant graph for cycles and dangling grants
    Verify,
}

fn sorted(set: RoleSet) -> Vec<String> {
    let mut names: Vec<String> = set.into_iter().collect();
    names.sort();
    names
}

fn build_registry(config: &RolesConfig) -> Result<RoleManagerRegistry> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("using the in-memory store; changes are discarded on exit");
            Ok(RoleManagerRegistry::with_defaults(InMemoryRoleStore::new()))
        }
        StoreBackend::Sled => {
            let path = config
                .store
                .path
                .as_ref()
                .context("store.path is required for the sled backend")?;
            let store = SledRoleStore::open_path(path)
                .with_context(|| format!("Failed to open role store at {}", path.display()))?;
            Ok(RoleManagerRegistry::with_defaults(store))
        }
    }
}

/// Run one command. Queries return the JSON document to print.
async fn run(manager: &Arc<dyn RoleManager>, command: Command) -> Result<Option<Value>> {
    let output = match command {
        Command::Create {
            name,
            superuser,
            login,
        } => {
            let config = RoleConfig::new().with_superuser(superuser).with_login(login);
            manager.create(&name, &config).await?;
            None
        }
        Command::Drop { name } => {
            RoleManager::drop(&**manager, &name).await?;
            None
        }
        Command::Alter {
            name,
            superuser,
            login,
        } => {
            let update = RoleConfigUpdate {
                is_superuser: superuser,
                can_login: login,
            };
            manager.alter(&name, &update).await?;
            None
        }
        Command::Grant { role, to } => {
            manager.grant(&to, &role).await?;
            None
        }
        Command::Revoke { role, from } => {
            manager.revoke(&from, &role).await?;
            None
        }
        Command::List { of, recursive } => {
            let roles = match of {
                Some(grantee) => {
                    manager
                        .query_granted(&grantee, RecursiveRoleQuery::from(recursive))
                        .await?
                }
                None => manager.query_all().await?,
            };
            Some(json!(sorted(roles)))
        }
        Command::Show { name } => {
            let direct = manager.query_granted(&name, RecursiveRoleQuery::No).await?;
            let all = manager.query_granted(&name, RecursiveRoleQuery::Yes).await?;
            Some(json!({
                "name": name,
                "is_superuser": manager.is_superuser(&name).await?,
                "can_login": manager.can_login(&name).await?,
                "granted": sorted(direct),
                "granted_recursive": sorted(all),
            }))
        }
        Command::Verify => {
            let graph = manager.snapshot().await?;
            graph.verify()?;
            Some(json!({ "roles": graph.roles().len(), "grants": graph.edge_count(), "ok": true }))
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match RolesConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{:#}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RolesConfig::default(),
    };

    if let Some(dir) = cli.data_dir {
        config.store.backend = StoreBackend::Sled;
        config.store.path = Some(dir);
    }

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("warn,cretoai_roles={}", log_level).into()),
        )
        .with_target(config.logging.with_target)
        .with_writer(std::io::stderr)
        .init();

    let output = execute(&config, cli.command).await.and_then(|output| {
        if let Some(value) = output {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Ok(())
    });

    match output {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(config: &RolesConfig, command: Command) -> Result<Option<Value>> {
    let registry = build_registry(config)?;
    let manager = registry
        .create(&config.manager.name)
        .context("Failed to select role manager")?;

    manager.start().await?;
    let result = run(&manager, command).await;
    manager.stop().await?;
    result
}
