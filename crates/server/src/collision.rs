//! Collision detection and resolution.
//!
//! This module handles all overlaps involving one acting player per
//! invocation: food consumption and player-vs-player elimination. It mutates
//! the store and reports effects; it performs no I/O.

use crate::config::Config;
use crate::world::World;
use protocol::Position;

/// Two circles overlap when the distance between centers is less than the
/// sum of their radii.
#[inline]
pub fn circles_overlap(a: Position, a_radius: f64, b: Position, b_radius: f64) -> bool {
    a.distance(b) < a_radius + b_radius
}

/// One player-vs-player resolution: the strictly larger avatar wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elimination {
    pub winner: u32,
    pub loser: u32,
}

/// State-changing effects of one collision pass for a single mover.
#[derive(Debug, Default)]
pub struct CollisionEffects {
    /// Pellets the mover consumed this cycle.
    pub pellets_eaten: usize,
    /// Pellets regenerated to keep the pool at its minimum.
    pub pellets_spawned: usize,
    /// Elimination outcome, if any. The mover may be on either side.
    pub elimination: Option<Elimination>,
}

/// Resolve all overlaps involving the acting player.
///
/// Food first, then opponents in ascending-id order. Equal radii never
/// resolve and scanning continues past them; the first strict-size mismatch
/// decides the cycle's single elimination outcome. The winner absorbs
/// `loser.radius * growth_factor` and the loser's full score; the loser is
/// removed outright, or parked with a countdown when respawn is enabled.
pub fn resolve(world: &mut World, mover: u32, config: &Config) -> CollisionEffects {
    let mut effects = CollisionEffects::default();

    let eaten = world.consume_food(mover, config.food.score_reward);
    effects.pellets_eaten = eaten.len();
    if effects.pellets_eaten > 0 {
        effects.pellets_spawned = world.replenish_food(config.food.min_amount, config.food.mass);
    }

    match world.get_player(mover) {
        Some(player) if player.is_active() => {}
        _ => return effects,
    }

    let mut opponents: Vec<u32> = world
        .active_players()
        .map(|p| p.id)
        .filter(|&id| id != mover)
        .collect();
    opponents.sort_unstable();

    for opponent in opponents {
        // Re-read both sides from the live store each iteration.
        let Some(mover_player) = world.get_player(mover) else {
            break;
        };
        let Some(other) = world.get_player(opponent) else {
            continue;
        };
        if !other.is_active() {
            continue;
        }

        if !circles_overlap(
            mover_player.position,
            mover_player.radius,
            other.position,
            other.radius,
        ) {
            continue;
        }

        if mover_player.radius == other.radius {
            continue;
        }

        let (winner, loser) = if mover_player.radius > other.radius {
            (mover, opponent)
        } else {
            (opponent, mover)
        };
        eliminate(world, winner, loser, config);
        effects.elimination = Some(Elimination { winner, loser });
        break;
    }

    effects
}

/// Apply one elimination outcome to the store.
fn eliminate(world: &mut World, winner: u32, loser: u32, config: &Config) {
    let Some(loser_player) = world.get_player(loser) else {
        return;
    };
    let absorbed = loser_player.radius * config.player.growth_factor;
    let points = loser_player.score;

    if let Some(winner_player) = world.get_player_mut(winner) {
        winner_player.grow(absorbed);
        winner_player.reward(points);
    }

    if config.player.respawn_delay_ticks > 0 {
        if let Some(loser_player) = world.get_player_mut(loser) {
            loser_player.respawn_ticks = Some(config.player.respawn_delay_ticks);
        }
    } else {
        world.remove_player(loser);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Food;
    use crate::world::World;

    fn setup(respawn_delay_ticks: u32) -> (World, Config) {
        let mut config = Config::default();
        config.player.respawn_delay_ticks = respawn_delay_ticks;
        let world = World::new(config.map.width, config.map.height);
        (world, config)
    }

    fn spawn_at(world: &mut World, x: f64, y: f64, radius: f64) -> u32 {
        let id = world.spawn_player("p".into(), World::random_color(), radius);
        let player = world.get_player_mut(id).unwrap();
        player.position = Position::new(x, y);
        player.radius = radius;
        id
    }

    #[test]
    fn overlap_check() {
        let a = Position::new(0.0, 0.0);
        assert!(circles_overlap(a, 50.0, Position::new(30.0, 0.0), 20.0));
        assert!(!circles_overlap(a, 10.0, Position::new(100.0, 0.0), 10.0));
    }

    #[test]
    fn food_consumption_grows_scores_and_refills() {
        let (mut world, config) = setup(0);
        let mover = spawn_at(&mut world, 500.0, 500.0, 20.0);
        world.replenish_food(config.food.min_amount, config.food.mass);

        // Drop one pellet onto the mover; the pool is now min + 1.
        world.add_food(Food::new(
            Position::new(500.0, 510.0),
            config.food.mass,
            World::random_color(),
        ));

        let effects = resolve(&mut world, mover, &config);
        assert!(effects.pellets_eaten >= 1);
        assert!(world.food().len() >= config.food.min_amount);
        assert!(effects.elimination.is_none());

        let player = world.get_player(mover).unwrap();
        assert!(player.radius >= 25.0);
        assert!(player.score >= 10);
    }

    #[test]
    fn equal_radii_never_resolve() {
        let (mut world, config) = setup(0);
        let a = spawn_at(&mut world, 500.0, 500.0, 30.0);
        let b = spawn_at(&mut world, 510.0, 500.0, 30.0);

        let effects = resolve(&mut world, a, &config);
        assert!(effects.elimination.is_none());

        let a = world.get_player(a).unwrap();
        let b = world.get_player(b).unwrap();
        assert_eq!(a.radius, 30.0);
        assert_eq!(b.radius, 30.0);
        assert_eq!(a.score, 0);
        assert_eq!(b.score, 0);
    }

    #[test]
    fn larger_mover_absorbs_smaller() {
        let (mut world, config) = setup(0);
        let a = spawn_at(&mut world, 500.0, 500.0, 30.0);
        let b = spawn_at(&mut world, 520.0, 500.0, 20.0);
        world.get_player_mut(b).unwrap().score = 70;

        let effects = resolve(&mut world, a, &config);
        assert_eq!(effects.elimination, Some(Elimination { winner: a, loser: b }));
        assert!(world.get_player(b).is_none());

        let winner = world.get_player(a).unwrap();
        // 30 + 20 * 0.3 = 36, plus the loser's score
        assert!((winner.radius - 36.0).abs() < 1e-9);
        assert_eq!(winner.score, 70);
        assert!(world.active_players().all(|p| p.radius > 0.0));
    }

    #[test]
    fn smaller_mover_is_eliminated() {
        let (mut world, config) = setup(0);
        let a = spawn_at(&mut world, 500.0, 500.0, 20.0);
        let b = spawn_at(&mut world, 520.0, 500.0, 30.0);

        let effects = resolve(&mut world, a, &config);
        assert_eq!(effects.elimination, Some(Elimination { winner: b, loser: a }));
        assert!(world.get_player(a).is_none());
        assert!((world.get_player(b).unwrap().radius - 36.0).abs() < 1e-9);
    }

    #[test]
    fn at_most_one_elimination_per_cycle_lowest_id_first() {
        let (mut world, config) = setup(0);
        let mover = spawn_at(&mut world, 500.0, 500.0, 40.0);
        let first = spawn_at(&mut world, 510.0, 500.0, 20.0);
        let second = spawn_at(&mut world, 490.0, 500.0, 20.0);
        assert!(first < second);

        let effects = resolve(&mut world, mover, &config);
        assert_eq!(
            effects.elimination,
            Some(Elimination { winner: mover, loser: first })
        );
        // The second overlapping opponent survives this cycle.
        assert!(world.get_player(second).is_some());
    }

    #[test]
    fn tie_is_skipped_but_scanning_continues() {
        let (mut world, config) = setup(0);
        let mover = spawn_at(&mut world, 500.0, 500.0, 30.0);
        let equal = spawn_at(&mut world, 510.0, 500.0, 30.0);
        let smaller = spawn_at(&mut world, 490.0, 500.0, 20.0);

        let effects = resolve(&mut world, mover, &config);
        assert_eq!(
            effects.elimination,
            Some(Elimination { winner: mover, loser: smaller })
        );
        assert!(world.get_player(equal).is_some());
    }

    #[test]
    fn respawn_parks_loser_with_countdown() {
        let (mut world, config) = setup(120);
        let a = spawn_at(&mut world, 500.0, 500.0, 30.0);
        let b = spawn_at(&mut world, 520.0, 500.0, 20.0);

        let effects = resolve(&mut world, a, &config);
        assert_eq!(effects.elimination, Some(Elimination { winner: a, loser: b }));

        let loser = world.get_player(b).unwrap();
        assert_eq!(loser.respawn_ticks, Some(120));
        assert!(!loser.is_active());
    }
}
