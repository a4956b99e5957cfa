//! Configuration management for vocalviz.
//!
//! This module handles loading and saving application configuration from a
//! TOML file in the user's config directory.

pub mod file;

pub use file::{config_path, save_filters, AudioConfig, VisualizationConfig, VizConfig};
