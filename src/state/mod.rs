mod roster;
mod round;
mod submission;
mod view;

pub use roster::JoinError;
pub use round::{total_rounds_for, StartError};
pub use submission::SubmitOutcome;

use crate::protocol::ServerMessage;
use crate::types::*;

/// Authoritative state of one room. Owned exclusively by the session actor;
/// every method is synchronous and returns the side effects the actor must
/// carry out, so the game logic itself never touches a socket or a clock.
#[derive(Debug)]
pub struct GameSession {
    pub room_code: RoomCode,
    pub config: GameConfig,
    pub is_public: bool,
    /// 0 while the lobby is open; 1-based once the game has started
    pub round_index: u32,
    /// Fixed at game start from the roster size
    pub total_rounds: Option<u32>,
    pub game_over: bool,
    pub host: Option<ConnectionId>,
    /// Insertion-ordered. The drawing cycle and word assignment walk
    /// this list by position, so order must never be disturbed mid-game.
    pub players: Vec<Player>,
    pub timer_remaining: u32,
    /// False once the deadline has fired, even if the round is still
    /// waiting on connected stragglers
    pub timer_running: bool,
}

/// Side effects requested by a state transition, in execution order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send one message to one connection
    Send(ConnectionId, ServerMessage),
    /// Send one message to every connected player
    Broadcast(ServerMessage),
    /// Re-send per-client room snapshots and refresh the public directory
    Sync,
    /// Start the reconnection countdown for a dropped player
    OpenReconnectWindow {
        connection_id: ConnectionId,
        epoch: u64,
    },
    /// The session is finished; tear down the actor and forget the room
    Dispose,
}

impl GameSession {
    pub fn new(room_code: RoomCode, is_public: bool, config: GameConfig) -> Self {
        Self {
            room_code,
            config,
            is_public,
            round_index: 0,
            total_rounds: None,
            game_over: false,
            host: None,
            players: Vec::new(),
            timer_remaining: 0,
            timer_running: false,
        }
    }

    pub fn phase(&self) -> RoomPhase {
        if self.game_over {
            RoomPhase::Ended
        } else if self.round_index == 0 {
            RoomPhase::Lobby
        } else {
            RoomPhase::Playing
        }
    }

    pub fn round_active(&self) -> bool {
        self.round_index > 0 && !self.game_over
    }

    pub fn is_host(&self, connection_id: &str) -> bool {
        self.host.as_deref() == Some(connection_id)
    }

    pub fn player(&self, connection_id: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    pub fn player_mut(&mut self, connection_id: &str) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.connection_id == connection_id)
    }

    fn player_index(&self, connection_id: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.connection_id == connection_id)
    }

    /// True when nobody is attached and nobody can come back
    pub fn is_abandoned(&self) -> bool {
        self.players
            .iter()
            .all(|p| !p.connected && !p.can_reconnect)
    }
}
