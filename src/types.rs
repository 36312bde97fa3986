use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type RoomCode = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    Lobby,
    Playing,
    Ended,
}

/// Per-room game rules. Server-wide defaults come from the environment
/// (see `config::ServerConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub min_players: usize,
    pub max_players: usize,
    pub name_min_chars: usize,
    pub name_max_chars: usize,
    pub round_timer_secs: u32,
    pub reconnect_window_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 12,
            name_min_chars: 3,
            name_max_chars: 20,
            round_timer_secs: 120,
            reconnect_window_secs: 60,
        }
    }
}

/// A single line segment of a drawing, in draw order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stroke {
    pub from_x: f64,
    pub from_y: f64,
    pub to_x: f64,
    pub to_y: f64,
    /// Brush width in canvas pixels
    pub width: u8,
    pub color: String,
}

/// What a player hands in each round: their guess at the drawing they were
/// shown, plus their own drawing of that guess. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSubmission {
    pub round_index: u32,
    pub guess: String,
    pub strokes: Vec<Stroke>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub connection_id: ConnectionId,
    pub display_name: String,
    /// Assigned at game start; empty while in the lobby
    pub secret_word: String,
    pub connected: bool,
    /// Whether a dropped player may still reattach to this seat
    pub can_reconnect: bool,
    /// Bumped on every successful reconnect so stale window expirations
    /// can be told apart from the current one
    pub reconnect_epoch: u64,
    /// At most one submission per round index; first write wins
    pub submissions: HashMap<u32, RoundSubmission>,
}

impl Player {
    pub fn new(connection_id: ConnectionId, display_name: String) -> Self {
        Self {
            connection_id,
            display_name,
            secret_word: String::new(),
            connected: true,
            can_reconnect: false,
            reconnect_epoch: 0,
            submissions: HashMap::new(),
        }
    }

    pub fn has_submitted(&self, round_index: u32) -> bool {
        self.submissions.contains_key(&round_index)
    }
}
