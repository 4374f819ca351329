//! Game entities.
//!
//! This module defines the player avatar and food pellet types.

mod food;
mod player;

pub use food::Food;
pub use player::Player;
