//! Vocal filter calibration.
//!
//! Plays one file with the calibration panel open so the vocal chain can be
//! tuned by ear and eye. Adjusted values can be saved to the config file or
//! copied as a `[filters]` table.

use std::path::PathBuf;

/// Handles the `calibrate` command.
///
/// # Errors
/// - Same as [`super::handle_play`]
pub fn handle_calibrate(file: PathBuf) -> anyhow::Result<()> {
    tracing::info!("Calibrating vocal filter on {}", file.display());
    super::handle_play(vec![file], false, true)
}
