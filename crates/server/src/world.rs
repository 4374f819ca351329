//! Entity store.
//!
//! Owns the canonical player map and the food pool. No I/O; atomicity for
//! concurrent callers comes from the exclusive lock around `GameState`.

use crate::entity::{Food, Player};
use glam::DVec2;
use protocol::Color;
use rand::Rng;
use std::collections::HashMap;

/// Map bounds. Positions live in `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy)]
pub struct MapBounds {
    pub width: f64,
    pub height: f64,
}

impl MapBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp a center position so the full circle stays on the map.
    #[inline]
    pub fn clamp(&self, position: DVec2, radius: f64) -> DVec2 {
        DVec2::new(
            position.x.clamp(radius, self.width - radius),
            position.y.clamp(radius, self.height - radius),
        )
    }

    /// Get a random position anywhere on the map.
    #[inline]
    pub fn random_position(&self) -> DVec2 {
        let mut rng = rand::rng();
        DVec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }

    /// Get a random position at least `margin` away from every edge.
    #[inline]
    pub fn random_position_with_margin(&self, margin: f64) -> DVec2 {
        if margin * 2.0 >= self.width.min(self.height) {
            return DVec2::new(self.width / 2.0, self.height / 2.0);
        }
        let mut rng = rand::rng();
        DVec2::new(
            rng.random_range(margin..self.width - margin),
            rng.random_range(margin..self.height - margin),
        )
    }
}

/// The game world containing all players and food.
#[derive(Debug)]
pub struct World {
    /// Next player ID to assign.
    next_player_id: u32,

    /// All players by ID, including respawn-pending ones.
    players: HashMap<u32, Player>,

    /// Food pellet pool.
    food: Vec<Food>,

    /// Map bounds.
    pub bounds: MapBounds,
}

impl World {
    /// Create a new empty world with the given map size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            next_player_id: 1,
            players: HashMap::new(),
            food: Vec::new(),
            bounds: MapBounds::new(width, height),
        }
    }

    /// Generate a random color.
    #[inline]
    pub fn random_color() -> Color {
        let mut rng = rand::rng();
        Color::new(
            rng.random_range(50..=255),
            rng.random_range(50..=255),
            rng.random_range(50..=255),
        )
    }

    /// Spawn a new player and return its ID.
    ///
    /// The spawn point keeps a margin of twice the start radius from every
    /// edge and is biased away from existing avatars by bounded retry.
    pub fn spawn_player(&mut self, name: String, color: Color, start_radius: f64) -> u32 {
        let id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1);
        if self.next_player_id == 0 {
            self.next_player_id = 1; // Skip 0
        }

        let position = self.random_spawn_position(start_radius);
        self.players
            .insert(id, Player::new(id, name, color, position, start_radius));
        id
    }

    /// Pick a spawn point for an avatar of the given radius.
    pub fn random_spawn_position(&self, radius: f64) -> DVec2 {
        let margin = radius * 2.0;
        let mut position = self.bounds.random_position_with_margin(margin);
        for _ in 0..10 {
            let clear = self
                .players
                .values()
                .filter(|p| p.is_active())
                .all(|p| p.position.distance(position) >= p.radius + radius);
            if clear {
                break;
            }
            position = self.bounds.random_position_with_margin(margin);
        }
        position
    }

    /// Remove a player from the world.
    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Get a player by ID.
    #[inline]
    pub fn get_player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Get a mutable player by ID.
    #[inline]
    pub fn get_player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Iterate over all players.
    #[inline]
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Iterate over live avatars only.
    #[inline]
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_active())
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The current food pool.
    #[inline]
    pub fn food(&self) -> &[Food] {
        &self.food
    }

    /// Add a pellet to the pool.
    pub fn add_food(&mut self, food: Food) {
        self.food.push(food);
    }

    /// Ease a player a fraction of the way toward a target point.
    ///
    /// `speed_factor = 1 / (radius * k)`, capped at 1 so larger avatars move
    /// proportionally slower and small ones never overshoot the target. The
    /// result is clamped to `[radius, dim - radius]` per axis.
    /// Returns false if the player is missing or respawn-pending.
    pub fn move_player(&mut self, id: u32, target: DVec2, speed_coeff: f64) -> bool {
        let bounds = self.bounds;
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        if !player.is_active() {
            return false;
        }

        let speed_factor = (1.0 / (player.radius * speed_coeff)).min(1.0);
        player.position += (target - player.position) * speed_factor;
        player.position = bounds.clamp(player.position, player.radius);
        true
    }

    /// Remove and return every pellet overlapping the given player, growing
    /// the eater by each pellet's mass and awarding `reward` per pellet.
    ///
    /// A pellet overlaps when the center distance is below
    /// `player.radius + pellet.mass`.
    pub fn consume_food(&mut self, id: u32, reward: u32) -> Vec<Food> {
        let Some(player) = self.players.get_mut(&id) else {
            return Vec::new();
        };

        let mut eaten = Vec::new();
        let mut i = 0;
        while i < self.food.len() {
            let pellet = &self.food[i];
            if player.position.distance(pellet.position) < player.radius + pellet.mass {
                let pellet = self.food.swap_remove(i);
                player.grow(pellet.mass);
                player.reward(reward);
                eaten.push(pellet);
            } else {
                i += 1;
            }
        }
        eaten
    }

    /// Advance every respawn countdown by one tick and re-spawn players whose
    /// countdown elapsed: fresh position, radius and score fully reset.
    /// Returns the ids that came back.
    pub fn tick_respawns(&mut self, start_radius: f64) -> Vec<u32> {
        let mut due = Vec::new();
        for player in self.players.values_mut() {
            if let Some(ticks) = player.respawn_ticks.as_mut() {
                if *ticks > 0 {
                    *ticks -= 1;
                }
                if *ticks == 0 {
                    due.push(player.id);
                }
            }
        }

        for &id in &due {
            let position = self.random_spawn_position(start_radius);
            if let Some(player) = self.players.get_mut(&id) {
                player.position = position;
                player.radius = start_radius;
                player.score = 0;
                player.respawn_ticks = None;
            }
        }
        due
    }

    /// Top the food pool back up to the configured minimum.
    /// Returns the number of pellets spawned.
    pub fn replenish_food(&mut self, min_amount: usize, mass: f64) -> usize {
        let mut spawned = 0;
        while self.food.len() < min_amount {
            let position = self.bounds.random_position();
            self.food.push(Food::new(position, mass, Self::random_color()));
            spawned += 1;
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(1000.0, 1000.0)
    }

    #[test]
    fn spawn_assigns_unique_ids_and_margin() {
        let mut w = world();
        let a = w.spawn_player("a".into(), World::random_color(), 15.0);
        let b = w.spawn_player("b".into(), World::random_color(), 15.0);
        assert_ne!(a, b);

        for id in [a, b] {
            let p = w.get_player(id).unwrap();
            assert!(p.position.x >= 30.0 && p.position.x <= 970.0);
            assert!(p.position.y >= 30.0 && p.position.y <= 970.0);
            assert_eq!(p.score, 0);
            assert!(p.is_active());
        }
    }

    #[test]
    fn movement_is_a_fraction_of_remaining_distance() {
        let mut w = world();
        let id = w.spawn_player("a".into(), World::random_color(), 25.0);
        let p = w.get_player_mut(id).unwrap();
        p.position = DVec2::new(100.0, 100.0);

        // radius 25, k 0.05 -> speed factor 0.8
        assert!(w.move_player(id, DVec2::new(200.0, 100.0), 0.05));
        let p = w.get_player(id).unwrap();
        assert!((p.position.x - 180.0).abs() < 1e-9);
        assert!((p.position.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn small_avatars_never_overshoot() {
        let mut w = world();
        let id = w.spawn_player("a".into(), World::random_color(), 10.0);
        let p = w.get_player_mut(id).unwrap();
        p.position = DVec2::new(100.0, 100.0);

        // radius * k = 0.5 -> raw factor 2.0, capped at 1.0
        w.move_player(id, DVec2::new(300.0, 300.0), 0.05);
        let p = w.get_player(id).unwrap();
        assert!((p.position.x - 300.0).abs() < 1e-9);
        assert!((p.position.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn movement_clamps_to_bounds() {
        let mut w = world();
        let id = w.spawn_player("a".into(), World::random_color(), 20.0);

        w.move_player(id, DVec2::new(-5000.0, 5000.0), 0.05);
        for _ in 0..50 {
            w.move_player(id, DVec2::new(-5000.0, 5000.0), 0.05);
        }
        let p = w.get_player(id).unwrap();
        assert!(p.position.x >= p.radius);
        assert!(p.position.y <= 1000.0 - p.radius);
    }

    #[test]
    fn move_missing_or_pending_player_is_dropped() {
        let mut w = world();
        assert!(!w.move_player(99, DVec2::new(0.0, 0.0), 0.05));

        let id = w.spawn_player("a".into(), World::random_color(), 15.0);
        w.get_player_mut(id).unwrap().respawn_ticks = Some(10);
        assert!(!w.move_player(id, DVec2::new(0.0, 0.0), 0.05));
    }

    #[test]
    fn replenish_fills_pool_to_minimum() {
        let mut w = world();
        assert_eq!(w.replenish_food(50, 5.0), 50);
        assert_eq!(w.food().len(), 50);
        // Already at minimum: no-op
        assert_eq!(w.replenish_food(50, 5.0), 0);
    }

    #[test]
    fn respawn_countdown_resets_player() {
        let mut w = world();
        let id = w.spawn_player("a".into(), World::random_color(), 15.0);
        {
            let p = w.get_player_mut(id).unwrap();
            p.radius = 60.0;
            p.score = 120;
            p.respawn_ticks = Some(2);
        }

        assert!(w.tick_respawns(15.0).is_empty());
        assert_eq!(w.get_player(id).unwrap().respawn_ticks, Some(1));

        let due = w.tick_respawns(15.0);
        assert_eq!(due, vec![id]);

        let p = w.get_player(id).unwrap();
        assert!(p.is_active());
        assert_eq!(p.radius, 15.0);
        assert_eq!(p.score, 0);
        assert!(p.position.x >= 30.0 && p.position.x <= 970.0);
    }

    #[test]
    fn consume_food_grows_and_rewards() {
        let mut w = world();
        let id = w.spawn_player("a".into(), World::random_color(), 20.0);
        let position = w.get_player(id).unwrap().position;
        w.add_food(Food::new(position, 5.0, World::random_color()));
        w.add_food(Food::new(position + DVec2::new(500.0, 0.0), 5.0, World::random_color()));

        let eaten = w.consume_food(id, 10);
        assert_eq!(eaten.len(), 1);
        assert_eq!(w.food().len(), 1);

        let p = w.get_player(id).unwrap();
        assert!((p.radius - 25.0).abs() < 1e-9);
        assert_eq!(p.score, 10);
    }
}
