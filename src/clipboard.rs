//! Clipboard utilities for vocalviz.
//!
//! Copies the calibration report to the system clipboard using pbcopy (macOS),
//! wl-copy (Wayland), or xclip (X11).

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};

/// Clipboard helpers in the order they are tried.
///
/// Each one returns once it owns the text; wl-copy and xclip fork a
/// background process to serve the selection.
#[cfg(target_os = "macos")]
const TOOLS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(target_os = "macos"))]
const TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &["--type", "text/plain"]),
    ("xclip", &["-selection", "clipboard", "-in"]),
];

/// Copies text to the system clipboard.
///
/// Returns the name of the tool that took the text, or `None` if no
/// clipboard tool is available. A missing tool is not an error.
pub fn copy_to_clipboard(text: &str) -> anyhow::Result<Option<&'static str>> {
    for &(tool, args) in TOOLS {
        match pipe_to(tool, args, text) {
            Ok(status) if status.success() => {
                tracing::debug!("Calibration report copied to clipboard via {tool}");
                return Ok(Some(tool));
            }
            Ok(status) => tracing::warn!("{tool} exited with {status}"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{tool} not found or not executable");
            }
            Err(e) => tracing::warn!("Failed to run {tool}: {e}"),
        }
    }

    tracing::warn!(
        "No clipboard tool available (tried {})",
        TOOLS.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(", ")
    );
    Ok(None)
}

/// Writes `text` to the tool's stdin and reaps it.
fn pipe_to(tool: &str, args: &[&str], text: &str) -> io::Result<ExitStatus> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()?;

    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    // stdin is closed here, so the tool sees EOF before we wait on it.
    let status = child.wait()?;
    written.map(|()| status)
}
