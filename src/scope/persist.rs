//! Selection persistence.
//!
//! Only the selection ids survive a restart. The factory list and the
//! initialized gate are recomputed by the next `load`, which is also the
//! only place a restored selection is re-applied, so a stale file can
//! never open the fails-closed gate on its own.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted slice of the scope state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeSelection {
    pub active_factory_id: Option<Uuid>,
    pub viewing_factory_id: Option<Uuid>,
}

/// Write the selection atomically (temp file + rename).
pub fn save_selection(path: &Path, selection: &ScopeSelection) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(selection)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .with_context(|| format!("Failed to write selection to {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move selection into place at {}", path.display()))?;
    Ok(())
}

/// Read a previously saved selection. A missing file is `None`, not an
/// error; a corrupt file is an error the caller can choose to discard.
pub fn load_selection(path: &Path) -> Result<Option<ScopeSelection>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read selection from {}", path.display()))?;
    let selection = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid selection file at {}", path.display()))?;
    Ok(Some(selection))
}

/// Remove the persisted selection (sign-out).
pub fn clear_selection(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove selection at {}", path.display()))?;
    }
    Ok(())
}
