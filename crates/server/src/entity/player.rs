//! Player avatar entity.

use protocol::{Color, Position};

/// A circular avatar controlled by one connection.
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique player ID (stringified on the wire).
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Render color.
    pub color: Color,
    /// Center position in map coordinates.
    pub position: Position,
    /// Radius; strictly positive while the avatar is active.
    pub radius: f64,
    /// Accumulated score.
    pub score: u32,
    /// Ticks remaining until respawn. `None` while active.
    pub respawn_ticks: Option<u32>,
}

impl Player {
    pub fn new(id: u32, name: String, color: Color, position: Position, radius: f64) -> Self {
        Self {
            id,
            name,
            color,
            position,
            radius,
            score: 0,
            respawn_ticks: None,
        }
    }

    /// Whether the avatar is live on the map (not waiting out a respawn).
    #[inline]
    pub fn is_active(&self) -> bool {
        self.respawn_ticks.is_none()
    }

    /// Grow after consuming a pellet or an opponent.
    #[inline]
    pub fn grow(&mut self, amount: f64) {
        self.radius += amount;
    }

    /// Award score points.
    #[inline]
    pub fn reward(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }
}
