//! Client session state.

use std::net::SocketAddr;

/// Join/lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Connected, join handshake not yet received.
    #[default]
    Connecting,
    /// Joined and controlling a live avatar.
    Active,
    /// Avatar consumed; waiting out the respawn countdown.
    RespawnPending,
    /// Avatar consumed with respawn disabled; the connection is closing.
    Eliminated,
}

/// A connected client session.
#[derive(Debug)]
pub struct Client {
    /// Unique client ID.
    pub id: u32,
    /// Remote address.
    pub addr: SocketAddr,
    /// Lifecycle state.
    pub state: SessionState,
    /// Player controlled by this connection, set at join.
    pub player_id: Option<u32>,
    /// Last activity timestamp.
    pub last_activity: std::time::Instant,
}

impl Client {
    /// Create a new client session.
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            state: SessionState::Connecting,
            player_id: None,
            last_activity: std::time::Instant::now(),
        }
    }

    /// Update activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = std::time::Instant::now();
    }
}
