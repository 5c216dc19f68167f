//! Scope inspection and mutation commands.

use anyhow::{Result, bail};
use uuid::Uuid;

use factory_scope::config::ScopeConfig;
use factory_scope::scope::persist;
use factory_scope::{Factory, FactorySource, ScopeHandle, ScopeSnapshot, SessionIdentity};

use super::session::{backend_source, load_scope, load_session};

pub fn print_scope(snapshot: &ScopeSnapshot) {
    let describe = |factory: &Option<Factory>| match factory {
        Some(f) => format!("{} ({})", f.factory_name, f.factory_code),
        None => "-".to_string(),
    };

    println!("Active factory:  {}", describe(&snapshot.active_factory));
    println!("Viewing factory: {}", describe(&snapshot.viewing_factory));
    if snapshot.observer_mode {
        println!(
            "{} data is read from the viewing factory",
            console::style("Observer mode:").yellow().bold()
        );
    }
    match snapshot.resolved_factory_id {
        Some(id) => println!("Scoped queries filter by factory {}", id),
        None => println!("No factory resolved; scoped queries are blocked."),
    }
}

/// Offline status: the persisted session and selection, nothing fetched.
pub fn cmd_status(config: &ScopeConfig) -> Result<()> {
    let Some(session) = load_session(&config.session_path())? else {
        println!("Not signed in.");
        return Ok(());
    };
    println!(
        "Signed in as {} ({}) since {}",
        console::style(&session.identity.user_id).bold(),
        session.identity.role.as_str(),
        session.signed_in_at.format("%Y-%m-%d %H:%M UTC")
    );

    let selection = persist::load_selection(&config.selection_path())?.unwrap_or_default();
    let show = |id: Option<Uuid>| {
        id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
    };
    println!("Active factory:  {}", show(selection.active_factory_id));
    println!("Viewing factory: {}", show(selection.viewing_factory_id));
    println!("Scope is re-initialized on the next login or scope command.");
    Ok(())
}

pub async fn cmd_factories(config: &ScopeConfig) -> Result<()> {
    let source = backend_source(config)?;
    let factories = source.fetch_active_factories().await?;
    if factories.is_empty() {
        println!("No active factories.");
        return Ok(());
    }
    println!("{:<8} {:<38} Name", "Code", "Id");
    for factory in &factories {
        println!(
            "{:<8} {:<38} {}",
            factory.factory_code, factory.factory_id, factory.factory_name
        );
    }
    Ok(())
}

pub async fn cmd_use(config: &ScopeConfig, factory: &str) -> Result<()> {
    let (identity, handle) = signed_in_scope(config).await?;
    if !identity.role.is_privileged_admin() {
        bail!(
            "Switching the active factory requires the system_admin role (signed in as {}).",
            identity.role.as_str()
        );
    }

    let target = find_factory(&handle, factory).await?;
    handle.set_active_factory(target.factory_id).await;
    persist::save_selection(&config.selection_path(), &handle.selection().await)?;
    print_scope(&handle.snapshot().await);
    Ok(())
}

pub async fn cmd_observe(config: &ScopeConfig, factory: Option<&str>, stop: bool) -> Result<()> {
    let (_, handle) = signed_in_scope(config).await?;

    match (factory, stop) {
        (_, true) | (None, false) => handle.set_viewing_factory(None).await,
        (Some(factory), false) => {
            let target = find_factory(&handle, factory).await?;
            handle.set_viewing_factory(Some(target.factory_id)).await;
        }
    }

    persist::save_selection(&config.selection_path(), &handle.selection().await)?;
    print_scope(&handle.snapshot().await);
    Ok(())
}

async fn signed_in_scope(config: &ScopeConfig) -> Result<(SessionIdentity, ScopeHandle)> {
    let Some(session) = load_session(&config.session_path())? else {
        bail!("Not signed in. Run 'factory-scope login' first.");
    };
    let handle = load_scope(config, &session.identity).await?;
    Ok((session.identity, handle))
}

/// Accept a factory id or a factory code.
async fn find_factory(handle: &ScopeHandle, needle: &str) -> Result<Factory> {
    let factories = handle.factories().await;
    let by_id = needle.parse::<Uuid>().ok();
    let found = factories.iter().find(|f| {
        by_id.is_some_and(|id| id == f.factory_id) || f.factory_code.eq_ignore_ascii_case(needle)
    });
    match found {
        Some(factory) => Ok(factory.clone()),
        None => bail!("No active factory matches '{}'.", needle),
    }
}
