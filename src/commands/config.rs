//! Configuration file editor command.

use anyhow::{anyhow, Context};
use std::process::Command;

use crate::config::{config_path, VizConfig};

/// Opens the vocalviz configuration file in the user's preferred editor.
///
/// The file is created with defaults first if it does not exist. Editors are
/// tried in order: `$EDITOR`, nano, vi.
///
/// # Errors
/// - If the config file cannot be created
/// - If no editor can be found or executed
pub fn handle_config() -> anyhow::Result<()> {
    let path = config_path()?;
    VizConfig::load_or_default_from(&path).context("Existing config file is invalid")?;

    tracing::info!("Opening config file: {}", path.display());

    let editor = find_editor(std::env::var("EDITOR").ok(), is_editor_available)?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor).arg(&path).status().map_err(|e| {
        anyhow!("Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible.")
    })?;

    if !status.success() {
        return Err(anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    // Catch typos right away rather than on the next `play`.
    if let Err(e) = VizConfig::load_or_default_from(&path) {
        println!("Warning: {e:#}");
    }

    tracing::info!("Config file edited successfully");
    Ok(())
}

fn find_editor(env_editor: Option<String>, available: impl Fn(&str) -> bool) -> anyhow::Result<String> {
    if let Some(editor) = env_editor.filter(|e| !e.trim().is_empty()) {
        return Ok(editor);
    }

    ["nano", "vi"]
        .into_iter()
        .find(|editor| available(editor))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
