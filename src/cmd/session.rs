//! Sign-in and sign-out commands, plus the session file they share with
//! the scope commands.
//!
//! The session file records who signed in (id, role, assignment) so the
//! stateless CLI can re-run `load` on later invocations. It lives next
//! to the persisted selection but is a CLI artifact, not part of the
//! library's persistence contract.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use factory_scope::config::ScopeConfig;
use factory_scope::scope::persist;
use factory_scope::{RestFactorySource, ScopeHandle, SessionIdentity, UserRole};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionFile {
    pub identity: SessionIdentity,
    pub signed_in_at: DateTime<Utc>,
}

pub fn load_session(path: &Path) -> Result<Option<SessionFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    let session = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid session file {}", path.display()))?;
    Ok(Some(session))
}

fn save_session(path: &Path, session: &SessionFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
    }
    fs::write(path, serde_json::to_string_pretty(session)?)
        .with_context(|| format!("Failed to write session file {}", path.display()))?;
    Ok(())
}

/// Build the REST source, refusing to proceed without a configured
/// backend rather than issuing requests to nowhere.
pub fn backend_source(config: &ScopeConfig) -> Result<RestFactorySource> {
    if config.backend_url.is_empty() {
        bail!(
            "backend_url is not configured. Set it in factory-scope.toml or {}.",
            factory_scope::config::ENV_BACKEND_URL
        );
    }
    Ok(RestFactorySource::new(config))
}

/// Re-run the login-time load for the saved session, restoring the
/// persisted selection. Every scope mutation goes through this first so
/// the membership checks run against a fresh list.
pub async fn load_scope(config: &ScopeConfig, identity: &SessionIdentity) -> Result<ScopeHandle> {
    let source = backend_source(config)?;
    let restore = persist::load_selection(&config.selection_path())?;
    let handle = ScopeHandle::new();
    handle
        .load(identity, &source, restore.as_ref())
        .await
        .context("Failed to initialize factory scope")?;
    Ok(handle)
}

pub async fn cmd_login(
    config: &ScopeConfig,
    user: &str,
    role: &str,
    assigned_factory: Option<Uuid>,
) -> Result<()> {
    let role: UserRole = role
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    let identity = SessionIdentity {
        user_id: user.to_string(),
        assigned_factory_id: assigned_factory,
        role,
    };

    let handle = load_scope(config, &identity).await?;
    persist::save_selection(&config.selection_path(), &handle.selection().await)?;
    save_session(
        &config.session_path(),
        &SessionFile {
            identity,
            signed_in_at: Utc::now(),
        },
    )?;

    println!(
        "Signed in as {} ({})",
        console::style(user).bold(),
        role.as_str()
    );
    super::scope::print_scope(&handle.snapshot().await);
    Ok(())
}

pub fn cmd_reset(config: &ScopeConfig) -> Result<()> {
    persist::clear_selection(&config.selection_path())?;
    let session_path = config.session_path();
    if session_path.exists() {
        fs::remove_file(&session_path)
            .with_context(|| format!("Failed to remove session file {}", session_path.display()))?;
    }
    println!("Signed out; scope state cleared.");
    Ok(())
}
