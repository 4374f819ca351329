//! Game state and simulation loop.
//!
//! All mutation of the world funnels through `GameState` while the caller
//! holds the exclusive lock; broadcast payloads are returned (or queued on
//! the targeted channel) and fanned out only after the lock is released.

use crate::collision::{self, Elimination};
use crate::config::Config;
use crate::error::ServerError;
use crate::ranking;
use crate::world::World;
use protocol::Position;
use protocol::messages::{self, ClientMessage, FoodView, Join, PlayerView, StateSnapshot};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use super::client::{Client, SessionState};
use super::{StateBroadcast, TargetedMessage, TargetedPayload};

/// Pending broadcasts to send after releasing the game state lock.
#[derive(Debug, Default)]
pub struct PendingBroadcasts {
    pub state: Option<StateBroadcast>,
}

/// Main game state: the entity store plus the connection registrations.
pub struct GameState {
    pub config: Config,
    pub tick_count: u64,

    // ID counter
    next_client_id: u32,

    // Connected clients
    pub clients: HashMap<u32, Client>,

    // Player id -> client id, populated at join and torn down at removal.
    player_clients: HashMap<u32, u32>,

    // Game world (entities)
    pub world: World,

    // State broadcast channel
    state_tx: broadcast::Sender<StateBroadcast>,

    // Targeted message channel (init, elimination and death notices)
    targeted_tx: broadcast::Sender<TargetedMessage>,
}

impl GameState {
    /// Create a new game state.
    pub fn new(
        config: &Config,
        state_tx: broadcast::Sender<StateBroadcast>,
        targeted_tx: broadcast::Sender<TargetedMessage>,
    ) -> Self {
        Self {
            config: config.clone(),
            tick_count: 0,
            next_client_id: 1,
            clients: HashMap::new(),
            player_clients: HashMap::new(),
            world: World::new(config.map.width, config.map.height),
            state_tx,
            targeted_tx,
        }
    }

    /// Add a new client.
    pub fn add_client(&mut self, addr: SocketAddr) -> u32 {
        let id = self.next_client_id;
        self.next_client_id += 1;
        self.clients.insert(id, Client::new(id, addr));
        info!("Client {} connected from {}", id, addr);
        id
    }

    /// Remove a client and its player.
    ///
    /// Returns a final broadcast when a live player was removed, so survivors
    /// see the departure immediately.
    pub fn remove_client(&mut self, id: u32) -> Option<StateBroadcast> {
        let client = self.clients.remove(&id)?;
        info!("Client {} ({}) disconnected", id, client.addr);

        let mut removed = false;
        if let Some(player_id) = client.player_id {
            self.player_clients.remove(&player_id);
            removed = self.world.remove_player(player_id).is_some();
        }
        if !removed {
            return None;
        }

        match self.make_state_broadcast() {
            Ok(broadcast) => Some(broadcast),
            Err(e) => {
                warn!("Failed to encode departure broadcast: {}", e);
                None
            }
        }
    }

    /// Handle one inbound text frame from a client.
    ///
    /// Decode errors propagate to the caller, which drops the message and
    /// keeps the connection open.
    pub fn handle_message(&mut self, client_id: u32, text: &str) -> anyhow::Result<PendingBroadcasts> {
        let client = self
            .clients
            .get_mut(&client_id)
            .ok_or(ServerError::UnknownClient(client_id))?;
        client.touch();
        let state = client.state;

        match state {
            SessionState::Connecting => {
                let join = Join::decode(text)?;
                self.handle_join(client_id, join)
            }
            SessionState::Active => match ClientMessage::decode(text)? {
                ClientMessage::Move { x, y } => self.handle_move(client_id, x, y),
            },
            SessionState::RespawnPending | SessionState::Eliminated => {
                debug!("Client {} message dropped in state {:?}", client_id, state);
                Ok(PendingBroadcasts::default())
            }
        }
    }

    /// Handle the join handshake: spawn the avatar and register the
    /// connection against it.
    fn handle_join(&mut self, client_id: u32, join: Join) -> anyhow::Result<PendingBroadcasts> {
        let trimmed = join.name.trim();
        let name: String = if trimmed.is_empty() {
            "Anonymous".to_string()
        } else {
            trimmed.chars().take(self.config.player.max_nick_length).collect()
        };
        let color = join.color.parse().unwrap_or_else(|_| World::random_color());

        let player_id = self
            .world
            .spawn_player(name.clone(), color, self.config.player.start_radius);

        let client = self
            .clients
            .get_mut(&client_id)
            .ok_or(ServerError::UnknownClient(client_id))?;
        client.state = SessionState::Active;
        client.player_id = Some(player_id);
        self.player_clients.insert(player_id, client_id);

        info!("Client {} joined as '{}' (player {})", client_id, name, player_id);

        let _ = self.targeted_tx.send(TargetedMessage {
            client_id,
            payload: TargetedPayload::Init {
                player_id,
                map_width: self.config.map.width,
                map_height: self.config.map.height,
            },
        });

        Ok(PendingBroadcasts {
            state: Some(self.make_state_broadcast()?),
        })
    }

    /// Handle an accepted move: integrate movement, resolve collisions and
    /// produce exactly one full-state broadcast.
    fn handle_move(&mut self, client_id: u32, x: f64, y: f64) -> anyhow::Result<PendingBroadcasts> {
        let Some(player_id) = self.clients.get(&client_id).and_then(|c| c.player_id) else {
            return Ok(PendingBroadcasts::default());
        };

        let target = Position::new(x, y);
        if !self
            .world
            .move_player(player_id, target, self.config.player.speed_coeff)
        {
            // Raced with an elimination; drop silently.
            debug!("Move for unknown player {} dropped", player_id);
            return Ok(PendingBroadcasts::default());
        }

        let effects = collision::resolve(&mut self.world, player_id, &self.config);
        if let Some(elimination) = effects.elimination {
            self.apply_elimination(elimination);
        }

        Ok(PendingBroadcasts {
            state: Some(self.make_state_broadcast()?),
        })
    }

    /// Transition the losing session and notify its connection.
    fn apply_elimination(&mut self, elimination: Elimination) {
        let Elimination { winner, loser } = elimination;
        info!("Player {} consumed player {}", winner, loser);

        let Some(&loser_client_id) = self.player_clients.get(&loser) else {
            return;
        };

        if self.config.player.respawn_delay_ticks > 0 {
            if let Some(client) = self.clients.get_mut(&loser_client_id) {
                client.state = SessionState::RespawnPending;
            }
            let _ = self.targeted_tx.send(TargetedMessage {
                client_id: loser_client_id,
                payload: TargetedPayload::Death { player_id: loser },
            });
        } else {
            if let Some(client) = self.clients.get_mut(&loser_client_id) {
                client.state = SessionState::Eliminated;
            }
            self.player_clients.remove(&loser);
            let _ = self.targeted_tx.send(TargetedMessage {
                client_id: loser_client_id,
                payload: TargetedPayload::Eliminated,
            });
        }
    }

    /// Run one periodic tick: respawn countdowns and food top-up.
    pub fn tick(&mut self) -> PendingBroadcasts {
        self.tick_count += 1;

        let respawned = self.world.tick_respawns(self.config.player.start_radius);
        for &player_id in &respawned {
            if let Some(&client_id) = self.player_clients.get(&player_id) {
                if let Some(client) = self.clients.get_mut(&client_id) {
                    client.state = SessionState::Active;
                }
            }
            info!("Player {} respawned", player_id);
        }

        let spawned = self
            .world
            .replenish_food(self.config.food.min_amount, self.config.food.mass);

        if self.tick_count % 1000 == 0 {
            debug!(
                "Tick #{}: {} clients, {} players, {} food",
                self.tick_count,
                self.clients.len(),
                self.world.player_count(),
                self.world.food().len()
            );
        }

        if respawned.is_empty() && spawned == 0 {
            return PendingBroadcasts::default();
        }
        match self.make_state_broadcast() {
            Ok(broadcast) => PendingBroadcasts { state: Some(broadcast) },
            Err(e) => {
                warn!("Failed to encode tick broadcast: {}", e);
                PendingBroadcasts::default()
            }
        }
    }

    /// Build the full-state snapshot: live avatars, food and ranking.
    pub fn snapshot(&self) -> StateSnapshot {
        let mut players = BTreeMap::new();
        for player in self.world.active_players() {
            players.insert(
                player.id.to_string(),
                PlayerView {
                    id: player.id.to_string(),
                    name: player.name.clone(),
                    color: player.color,
                    x: player.position.x,
                    y: player.position.y,
                    radius: player.radius,
                    score: player.score,
                },
            );
        }

        let food = self
            .world
            .food()
            .iter()
            .map(|pellet| FoodView {
                x: pellet.position.x,
                y: pellet.position.y,
                mass: pellet.mass,
                color: pellet.color,
            })
            .collect();

        StateSnapshot {
            players,
            food,
            ranking: ranking::compute_ranking(&self.world),
        }
    }

    /// Encode the snapshot once for fan-out to every connection.
    pub fn make_state_broadcast(&self) -> anyhow::Result<StateBroadcast> {
        let json = messages::encode(&self.snapshot())?;
        Ok(StateBroadcast {
            json: Arc::from(json),
        })
    }
}

/// Run the periodic tick loop.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_interval_ms: u64) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    // Use Skip to catch up on missed ticks - ensures consistent countdowns.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Initial food seed
    {
        let mut game = state.write().await;
        let min_amount = game.config.food.min_amount;
        let mass = game.config.food.mass;
        let spawned = game.world.replenish_food(min_amount, mass);
        info!("World initialized: {} food pellets", spawned);
    }

    loop {
        ticker.tick().await;

        // Hibernate when no users are connected to reduce CPU usage
        {
            let game = state.read().await;
            if game.clients.is_empty() {
                drop(game);
                sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
                continue;
            }
        }

        let (broadcasts, state_tx) = {
            let mut game = state.write().await;
            let broadcasts = game.tick();
            (broadcasts, game.state_tx.clone())
        }; // Write lock released here

        if let Some(broadcast) = broadcasts.state {
            let _ = state_tx.send(broadcast);
        }
    }
}
