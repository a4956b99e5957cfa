//! Terminal screens: the player and the error display.

pub mod error;
pub mod player;

pub use error::ErrorScreen;
pub use player::{PlayerCommand, PlayerLayout, PlayerStatus, PlayerTui};
