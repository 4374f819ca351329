//! Server -> Client message building.

use crate::{Color, ProtocolError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Encode any server message as a JSON text frame.
pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Typed events addressed to a single connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once to the joining connection after the handshake.
    Init {
        player_id: String,
        map_width: f64,
        map_height: f64,
    },
    /// Elimination notice when respawn is enabled; the connection stays open
    /// through the countdown.
    Death { player_id: String },
    /// Join rejection and other terminal errors.
    Error { message: String },
}

/// Terminal elimination notice when respawn is disabled; the connection is
/// closed after this is sent.
#[derive(Debug, Clone, Serialize)]
pub struct Eliminated {
    pub eliminated: bool,
}

impl Eliminated {
    pub fn notice() -> Self {
        Self { eliminated: true }
    }
}

/// Full-state broadcast sent to every live connection after each processed
/// move. Untagged; players are keyed by stringified id.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub players: BTreeMap<String, PlayerView>,
    pub food: Vec<FoodView>,
    pub ranking: Vec<RankEntry>,
}

/// One avatar as rendered by clients.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub color: Color,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub score: u32,
}

/// One food pellet as rendered by clients.
#[derive(Debug, Clone, Serialize)]
pub struct FoodView {
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub color: Color,
}

/// One leaderboard entry, highest score first.
#[derive(Debug, Clone, Serialize)]
pub struct RankEntry {
    pub id: String,
    pub score: u32,
    pub radius: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_tagged() {
        let event = ServerEvent::Init {
            player_id: "7".into(),
            map_width: 1000.0,
            map_height: 1000.0,
        };
        let value: serde_json::Value = serde_json::from_str(&encode(&event).unwrap()).unwrap();
        assert_eq!(value["type"], "init");
        assert_eq!(value["player_id"], "7");
        assert_eq!(value["map_width"], 1000.0);
    }

    #[test]
    fn eliminated_notice_shape() {
        assert_eq!(encode(&Eliminated::notice()).unwrap(), r#"{"eliminated":true}"#);
    }

    #[test]
    fn snapshot_is_keyed_by_id() {
        let mut players = BTreeMap::new();
        players.insert(
            "3".to_string(),
            PlayerView {
                id: "3".into(),
                name: "alice".into(),
                color: Color::new(1, 2, 3),
                x: 10.0,
                y: 20.0,
                radius: 15.0,
                score: 40,
            },
        );
        let snapshot = StateSnapshot {
            players,
            food: vec![FoodView {
                x: 1.0,
                y: 2.0,
                mass: 5.0,
                color: Color::new(9, 9, 9),
            }],
            ranking: vec![RankEntry {
                id: "3".into(),
                score: 40,
                radius: 15.0,
            }],
        };

        let value: serde_json::Value = serde_json::from_str(&encode(&snapshot).unwrap()).unwrap();
        assert!(value.get("type").is_none());
        assert_eq!(value["players"]["3"]["name"], "alice");
        assert_eq!(value["players"]["3"]["color"], "rgb(1,2,3)");
        assert_eq!(value["food"][0]["mass"], 5.0);
        assert_eq!(value["ranking"][0]["score"], 40);
    }
}
