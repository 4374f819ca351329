//! Food pellet entity.

use protocol::{Color, Position};

/// A food pellet that can be eaten by players.
///
/// The mass doubles as the pellet's effective radius in overlap checks.
#[derive(Debug, Clone)]
pub struct Food {
    pub position: Position,
    pub mass: f64,
    pub color: Color,
}

impl Food {
    pub fn new(position: Position, mass: f64, color: Color) -> Self {
        Self {
            position,
            mass,
            color,
        }
    }
}
