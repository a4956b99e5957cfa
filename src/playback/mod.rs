//! Audio playback for vocalviz.
//!
//! Decodes tracks, plays them through a single long-lived media element and
//! keeps the play queue.

pub mod device;
pub mod element;
pub mod playlist;
pub mod track;

pub use element::{ElementEvent, FrameTap, MediaElement, OutputFormat, SourceId};
pub use playlist::Playlist;
pub use track::Track;
