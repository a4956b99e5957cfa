//! Application command handlers for vocalviz.
//!
//! # Commands
//! - `play`: Play files with live waveform visualization (default)
//! - `calibrate`: Play one file with the vocal filter panel open
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio output devices
//! - `logs`: Display recent log entries

pub mod calibrate;
pub mod config;
pub mod list_devices;
pub mod logs;
pub mod play;

pub use calibrate::handle_calibrate;
pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
