//! vocalviz: a terminal audio player that draws the left, right and isolated
//! vocal waveforms of whatever is playing.

pub mod app;
pub mod calibration;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod playback;
pub mod ui;
pub mod visualization;
