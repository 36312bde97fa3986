//! Per-client views of the session. Secret words stay private until the
//! terminal reveal.

use super::GameSession;
use crate::protocol::{PlayerChainInfo, PlayerInfo, RoomInfo, RoomListing, ServerMessage};
use crate::types::*;

impl GameSession {
    /// The recipient-independent public view
    pub fn room_info(&self) -> RoomInfo {
        RoomInfo {
            room_code: self.room_code.clone(),
            phase: self.phase(),
            round_index: self.round_index,
            is_public: self.is_public,
            max_players: self.config.max_players,
            host: self.host.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerInfo::for_round(p, self.round_index))
                .collect(),
            timer_remaining: if self.round_active() && self.timer_running {
                Some(self.timer_remaining)
            } else {
                None
            },
            total_rounds: self.total_rounds,
        }
    }

    /// Snapshot as one player is allowed to see it: the shared room view
    /// plus their own secret word and nobody else's
    pub fn snapshot_for(&self, connection_id: &str) -> ServerMessage {
        let your_secret_word = self
            .player(connection_id)
            .map(|p| p.secret_word.clone())
            .filter(|w| !w.is_empty());

        ServerMessage::RoomState {
            room: self.room_info(),
            your_secret_word,
        }
    }

    /// Snapshots for every connected player
    pub fn snapshots(&self) -> Vec<(ConnectionId, ServerMessage)> {
        self.players
            .iter()
            .filter(|p| p.connected)
            .map(|p| (p.connection_id.clone(), self.snapshot_for(&p.connection_id)))
            .collect()
    }

    /// The full chains in roster order, for the terminal reveal
    pub fn reveal_chains(&self) -> Vec<PlayerChainInfo> {
        self.players.iter().map(PlayerChainInfo::from).collect()
    }

    /// Entry for the public room list, or None while the room should
    /// not be listed (private, already playing, or full)
    pub fn directory_listing(&self) -> Option<RoomListing> {
        if self.is_public
            && self.phase() == RoomPhase::Lobby
            && self.players.len() < self.config.max_players
        {
            Some(RoomListing {
                room_code: self.room_code.clone(),
                player_count: self.players.len(),
                max_players: self.config.max_players,
            })
        } else {
            None
        }
    }
}
