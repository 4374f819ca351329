//! Leaderboard computation.

use crate::world::World;
use protocol::messages::RankEntry;

/// Number of entries the ranking is capped at.
pub const RANKING_SIZE: usize = 10;

/// Compute the leaderboard over live avatars: score descending, ties broken
/// by ascending player id. Recomputed in full each cycle; an empty world
/// yields an empty ranking.
pub fn compute_ranking(world: &World) -> Vec<RankEntry> {
    let mut entries: Vec<(u32, u32, f64)> = world
        .active_players()
        .map(|p| (p.id, p.score, p.radius))
        .collect();

    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.truncate(RANKING_SIZE);

    entries
        .into_iter()
        .map(|(id, score, radius)| RankEntry {
            id: id.to_string(),
            score,
            radius,
        })
        .collect()
}
