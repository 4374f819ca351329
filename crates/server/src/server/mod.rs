//! Game server implementation.

use crate::config::Config;
use crate::error::ServerError;
use futures_util::{SinkExt, StreamExt};
use protocol::messages::{self, Eliminated, ServerEvent};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

pub mod client;
pub mod game;

pub use game::{GameState, run_game_loop};

/// Full-state snapshot fanned out to every live connection, encoded once.
#[derive(Debug, Clone)]
pub struct StateBroadcast {
    pub json: Arc<str>,
}

/// A message addressed to a single connection.
#[derive(Debug, Clone)]
pub struct TargetedMessage {
    /// Target client ID.
    pub client_id: u32,
    /// The message type.
    pub payload: TargetedPayload,
}

/// Types of targeted messages.
#[derive(Debug, Clone)]
pub enum TargetedPayload {
    /// Join reply with the assigned player id and map dimensions.
    Init {
        player_id: u32,
        map_width: f64,
        map_height: f64,
    },
    /// Terminal elimination notice; the connection closes after it is sent.
    Eliminated,
    /// Elimination notice with respawn enabled; the connection stays open
    /// through the countdown.
    Death { player_id: u32 },
}

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }

        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }

        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("{} listening on ws://{}", config.server.name, addr);

    // Connection tracking state
    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));

    // Broadcast channels for state snapshots and targeted messages
    let (state_tx, _state_rx) = broadcast::channel::<StateBroadcast>(16);
    let (targeted_tx, _targeted_rx) = broadcast::channel::<TargetedMessage>(100);

    // Shared game state
    let game_state = Arc::new(RwLock::new(GameState::new(
        &config,
        state_tx.clone(),
        targeted_tx.clone(),
    )));

    // Start the tick loop
    let game_loop_state = Arc::clone(&game_state);
    let tick_interval = config.server.tick_interval_ms;
    tokio::spawn(async move {
        game::run_game_loop(game_loop_state, tick_interval).await;
    });

    // Connection limits
    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        let admitted = {
            let mut state = conn_state.write().await;
            state.try_add_connection(ip, max_connections, ip_limit)
        };
        if !admitted {
            warn!("Connection rejected (limit reached): {}", addr);
            tokio::spawn(async move {
                if let Err(e) = reject_connection(stream).await {
                    warn!("Failed to reject {}: {}", addr, e);
                }
            });
            continue;
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);
        let state_rx = state_tx.subscribe();
        let targeted_rx = targeted_tx.subscribe();
        let state_tx = state_tx.clone();

        tokio::spawn(async move {
            let result =
                handle_connection(stream, addr, game_state, state_tx, state_rx, targeted_rx).await;

            // Always remove from connection tracking when done
            {
                let mut state = conn_state.write().await;
                state.remove_connection(addr.ip());
            }

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Reject an over-capacity connection with an explicit message, then close.
async fn reject_connection(stream: TcpStream) -> anyhow::Result<()> {
    let mut ws_stream = accept_async(stream).await?;
    let rejection = messages::encode(&ServerEvent::Error {
        message: ServerError::CapacityExhausted.to_string(),
    })?;
    ws_stream.send(Message::Text(rejection.into())).await?;
    ws_stream.close(None).await?;
    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    state_tx: broadcast::Sender<StateBroadcast>,
    mut state_rx: broadcast::Receiver<StateBroadcast>,
    mut targeted_rx: broadcast::Receiver<TargetedMessage>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();

    // Create client session
    let client_id = {
        let mut state = game_state.write().await;
        state.add_client(addr)
    };

    // Message loop - handle inbound frames and both broadcast channels.
    // Targeted messages drain first so an init precedes the first snapshot.
    loop {
        tokio::select! {
            biased;

            // Handle targeted messages (init, elimination, death)
            targeted_msg = targeted_rx.recv() => {
                match targeted_msg {
                    Ok(msg) if msg.client_id == client_id => {
                        match msg.payload {
                            TargetedPayload::Init { player_id, map_width, map_height } => {
                                let event = ServerEvent::Init {
                                    player_id: player_id.to_string(),
                                    map_width,
                                    map_height,
                                };
                                let Ok(text) = messages::encode(&event) else { break };
                                if let Err(e) = write.send(Message::Text(text.into())).await {
                                    warn!("Failed to send init to {}: {}", addr, e);
                                    break;
                                }
                            }
                            TargetedPayload::Eliminated => {
                                if let Ok(text) = messages::encode(&Eliminated::notice()) {
                                    if let Err(e) = write.send(Message::Text(text.into())).await {
                                        warn!("Failed to send elimination notice to {}: {}", addr, e);
                                    }
                                }
                                break;
                            }
                            TargetedPayload::Death { player_id } => {
                                let event = ServerEvent::Death { player_id: player_id.to_string() };
                                let Ok(text) = messages::encode(&event) else { break };
                                if let Err(e) = write.send(Message::Text(text.into())).await {
                                    warn!("Failed to send death notice to {}: {}", addr, e);
                                    break;
                                }
                            }
                        }
                    }
                    Ok(_) => {} // Addressed to another connection
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Connection {} lagged, skipped {} targeted messages", addr, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Handle state broadcasts; a lagged receiver skips straight to
            // the latest snapshot instead of buffering without bound.
            state_msg = state_rx.recv() => {
                match state_msg {
                    Ok(broadcast) => {
                        if let Err(e) = write.send(Message::Text(broadcast.json.to_string().into())).await {
                            warn!("Failed to send state to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Connection {} lagged, skipped {} snapshots", addr, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Handle incoming WebSocket messages
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let pending = {
                            let mut state = game_state.write().await;
                            state.handle_message(client_id, text.as_str())
                        };
                        match pending {
                            Ok(pending) => {
                                if let Some(broadcast) = pending.state {
                                    let _ = state_tx.send(broadcast);
                                }
                            }
                            // Decode/logic errors are contained to this
                            // connection; the message is dropped.
                            Err(e) => warn!("Message error from {}: {}", addr, e),
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore binary/ping/pong frames
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Remove the client and its player; survivors see the departure in the
    // final broadcast.
    let final_broadcast = {
        let mut state = game_state.write().await;
        state.remove_client(client_id)
    };
    if let Some(broadcast) = final_broadcast {
        let _ = state_tx.send(broadcast);
    }

    Ok(())
}
