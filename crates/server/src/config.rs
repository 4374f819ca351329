//! Server configuration.

use serde::{Deserialize, Serialize};
use tracing::info;
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            map: MapConfig::default(),
            player: PlayerConfig::default(),
            food: FoodConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections; joins beyond this are rejected.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Server name shown in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Tick interval in milliseconds (respawn countdowns, food top-up).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            name: default_name(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_port() -> u16 {
    8765
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_ip_limit() -> usize {
    100
}
fn default_name() -> String {
    "Blob Arena".to_string()
}
fn default_tick_interval() -> u64 {
    16
}

/// Map dimensions. Positions live in `[0, width] x [0, height]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    #[serde(default = "default_map_size")]
    pub width: f64,
    #[serde(default = "default_map_size")]
    pub height: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_size(),
            height: default_map_size(),
        }
    }
}

fn default_map_size() -> f64 {
    1000.0
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Radius assigned at spawn.
    #[serde(default = "default_start_radius")]
    pub start_radius: f64,
    /// `k` in the movement rule `speed_factor = 1 / (radius * k)`.
    #[serde(default = "default_speed_coeff")]
    pub speed_coeff: f64,
    /// Fraction of the loser's radius the winner absorbs.
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
    #[serde(default = "default_max_nick_length")]
    pub max_nick_length: usize,
    /// Ticks an eliminated player waits before respawning.
    /// 0 disables respawn; eliminated players are removed outright.
    #[serde(default)]
    pub respawn_delay_ticks: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_radius: default_start_radius(),
            speed_coeff: default_speed_coeff(),
            growth_factor: default_growth_factor(),
            max_nick_length: default_max_nick_length(),
            respawn_delay_ticks: 0,
        }
    }
}

fn default_start_radius() -> f64 {
    15.0
}
fn default_speed_coeff() -> f64 {
    0.05
}
fn default_growth_factor() -> f64 {
    0.3
}
fn default_max_nick_length() -> usize {
    30
}

/// Food configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Pool size the world is kept topped up to.
    #[serde(default = "default_food_min_amount")]
    pub min_amount: usize,
    /// Pellet mass; doubles as its effective radius in overlap checks.
    #[serde(default = "default_food_mass")]
    pub mass: f64,
    /// Score awarded per consumed pellet.
    #[serde(default = "default_food_score_reward")]
    pub score_reward: u32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            min_amount: default_food_min_amount(),
            mass: default_food_mass(),
            score_reward: default_food_score_reward(),
        }
    }
}

fn default_food_min_amount() -> usize {
    50
}
fn default_food_mass() -> f64 {
    5.0
}
fn default_food_score_reward() -> u32 {
    10
}
