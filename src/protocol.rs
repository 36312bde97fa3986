use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Rename yourself (lobby only)
    SetDisplayName {
        name: String,
    },
    /// Toggle the room on the public room list (host only)
    SetRoomVisibility {
        is_public: bool,
    },
    StartGame,
    SubmitRound {
        round_index: u32,
        guess: String,
        strokes: Vec<Stroke>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        /// The rejoin key: present this on reconnect to reclaim the seat
        connection_id: ConnectionId,
        room_code: RoomCode,
        server_now: String,
    },
    /// Snapshot of the room as this client is allowed to see it.
    /// Sent after every mutation that changes roster or phase.
    RoomState {
        room: RoomInfo,
        #[serde(skip_serializing_if = "Option::is_none")]
        your_secret_word: Option<String>,
    },
    /// Lightweight once-a-second countdown while a round runs
    Timer {
        seconds_remaining: u32,
    },
    /// The round timer hit zero; absent drawings were filled in
    RoundDeadline {
        round_index: u32,
    },
    RoundEnd {
        round_index: u32,
    },
    /// Per-player: the material to work from in the round that is starting.
    /// Round 1 carries the secret word; later rounds carry the drawing to
    /// guess from the previous player in the cycle.
    SendSubmissions {
        round_index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        word: Option<String>,
        strokes: Vec<Stroke>,
    },
    /// Terminal reveal: every chain in roster order, words and all
    GameOver {
        chains: Vec<PlayerChainInfo>,
    },
    Error {
        code: String,
        msg: String,
    },
}

/// Public view of the room, identical for every recipient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomInfo {
    pub room_code: RoomCode,
    pub phase: RoomPhase,
    /// 0 while waiting in the lobby, 1-based once playing
    pub round_index: u32,
    pub is_public: bool,
    pub max_players: usize,
    pub host: Option<ConnectionId>,
    /// Roster order matters: the drawing cycle walks this list
    pub players: Vec<PlayerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<u32>,
}

/// Public view of a single player (no secret word, no submission contents)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub connected: bool,
    /// Whether this player has handed in the current round
    pub has_submitted: bool,
}

impl PlayerInfo {
    pub fn for_round(player: &Player, round_index: u32) -> Self {
        Self {
            connection_id: player.connection_id.clone(),
            display_name: player.display_name.clone(),
            connected: player.connected,
            has_submitted: round_index > 0 && player.has_submitted(round_index),
        }
    }
}

/// One player's full chain, revealed at game over
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerChainInfo {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub secret_word: String,
    /// Submissions ordered by round index
    pub submissions: Vec<RoundSubmission>,
}

impl From<&Player> for PlayerChainInfo {
    fn from(p: &Player) -> Self {
        let mut submissions: Vec<RoundSubmission> = p.submissions.values().cloned().collect();
        submissions.sort_by_key(|s| s.round_index);
        Self {
            connection_id: p.connection_id.clone(),
            display_name: p.display_name.clone(),
            secret_word: p.secret_word.clone(),
            submissions,
        }
    }
}

/// A joinable room as shown on the public room list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListing {
    pub room_code: RoomCode,
    pub player_count: usize,
    pub max_players: usize,
}
