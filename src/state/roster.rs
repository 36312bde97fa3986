//! Roster management: joining, leaving, reconnection windows, renames.

use super::{Effect, GameSession};
use crate::names;
use crate::protocol::ServerMessage;
use crate::types::*;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JoinError {
    #[error("Room is full")]
    RoomFull,

    #[error("Game is already in progress")]
    GameInProgress,

    #[error("No seat matches that connection id")]
    UnknownSeat,

    #[error("That seat is already connected")]
    SeatOccupied,

    #[error("The reconnection window has closed")]
    WindowClosed,
}

impl JoinError {
    pub fn code(&self) -> &'static str {
        match self {
            JoinError::RoomFull => "ROOM_FULL",
            JoinError::GameInProgress => "GAME_IN_PROGRESS",
            JoinError::UnknownSeat => "UNKNOWN_SEAT",
            JoinError::SeatOccupied => "SEAT_OCCUPIED",
            JoinError::WindowClosed => "RECONNECT_CLOSED",
        }
    }
}

impl GameSession {
    /// Admit a fresh player to the lobby. The first player in becomes host.
    pub fn join(&mut self, connection_id: ConnectionId) -> Result<Vec<Effect>, JoinError> {
        if self.phase() != RoomPhase::Lobby {
            return Err(JoinError::GameInProgress);
        }
        if self.players.len() >= self.config.max_players {
            return Err(JoinError::RoomFull);
        }

        let display_name = names::generate_display_name(&self.config);
        tracing::info!(
            "Player {} joined room {} as {:?}",
            connection_id,
            self.room_code,
            display_name
        );

        self.players
            .push(Player::new(connection_id.clone(), display_name));
        if self.host.is_none() {
            self.host = Some(connection_id.clone());
        }

        Ok(vec![
            Effect::Send(connection_id.clone(), self.welcome_message(&connection_id)),
            Effect::Sync,
        ])
    }

    /// Reattach a dropped player to their seat. Allowed while their
    /// reconnection window is open, and after game over for seats that
    /// still have one.
    pub fn rejoin(&mut self, connection_id: &str) -> Result<Vec<Effect>, JoinError> {
        let index = self
            .player_index(connection_id)
            .ok_or(JoinError::UnknownSeat)?;

        {
            let player = &mut self.players[index];
            if player.connected {
                return Err(JoinError::SeatOccupied);
            }
            if !player.can_reconnect {
                return Err(JoinError::WindowClosed);
            }

            player.connected = true;
            player.can_reconnect = false;
            // Any expiry still in flight for the old window is now stale
            player.reconnect_epoch += 1;
        }

        tracing::info!(
            "Player {} reconnected to room {}",
            connection_id,
            self.room_code
        );

        let mut effects = vec![
            Effect::Send(
                connection_id.to_string(),
                self.welcome_message(connection_id),
            ),
            Effect::Sync,
        ];

        // State recovery: hand back whatever they should be working on
        if self.game_over {
            effects.push(Effect::Send(
                connection_id.to_string(),
                ServerMessage::GameOver {
                    chains: self.reveal_chains(),
                },
            ));
        } else if self.round_active() && !self.players[index].has_submitted(self.round_index) {
            if let Some(prompt) = self.round_prompt(index) {
                effects.push(Effect::Send(connection_id.to_string(), prompt));
            }
        }

        Ok(effects)
    }

    /// Detach a player. `consented` distinguishes a deliberate exit from a
    /// dropped socket; only the latter opens a reconnection window.
    pub fn leave(&mut self, connection_id: &str, consented: bool) -> Vec<Effect> {
        match self.phase() {
            RoomPhase::Lobby => self.leave_lobby(connection_id),
            RoomPhase::Playing => self.leave_active(connection_id, consented),
            RoomPhase::Ended => self.leave_ended(connection_id),
        }
    }

    fn leave_lobby(&mut self, connection_id: &str) -> Vec<Effect> {
        let Some(index) = self.player_index(connection_id) else {
            return vec![];
        };

        let removed = self.players.remove(index);
        tracing::info!(
            "Player {} ({:?}) left room {} lobby",
            connection_id,
            removed.display_name,
            self.room_code
        );

        if self.players.is_empty() {
            return vec![Effect::Dispose];
        }

        // Host authority passes to the earliest remaining joiner
        if self.host.as_deref() == Some(connection_id) {
            self.host = self.players.first().map(|p| p.connection_id.clone());
            tracing::info!("Host of room {} is now {:?}", self.room_code, self.host);
        }

        vec![Effect::Sync]
    }

    fn leave_active(&mut self, connection_id: &str, consented: bool) -> Vec<Effect> {
        let Some(player) = self.player_mut(connection_id) else {
            return vec![];
        };
        if !player.connected {
            return vec![];
        }

        // The seat stays in the roster so the drawing cycle keeps its shape
        player.connected = false;
        player.can_reconnect = !consented;
        let epoch = player.reconnect_epoch;

        tracing::info!(
            "Player {} left room {} mid-game (consented: {})",
            connection_id,
            self.room_code,
            consented
        );

        let mut effects = vec![Effect::Sync];
        if !consented {
            effects.push(Effect::OpenReconnectWindow {
                connection_id: connection_id.to_string(),
                epoch,
            });
        }

        // Past the deadline the round only waits on connected players, so
        // a drop may be what the round was waiting for
        if !self.timer_running {
            effects.extend(self.settle_round());
        }

        if self.is_abandoned() {
            effects.push(Effect::Dispose);
        }
        effects
    }

    fn leave_ended(&mut self, connection_id: &str) -> Vec<Effect> {
        let Some(player) = self.player_mut(connection_id) else {
            return vec![];
        };
        if !player.connected {
            return vec![];
        }

        player.connected = false;
        player.can_reconnect = false;

        let mut effects = vec![Effect::Sync];
        if self.is_abandoned() {
            effects.push(Effect::Dispose);
        }
        effects
    }

    /// A reconnection window ran out. The epoch guards against a window
    /// that was already superseded by a successful rejoin.
    pub fn reconnect_window_expired(&mut self, connection_id: &str, epoch: u64) -> Vec<Effect> {
        let Some(player) = self.player_mut(connection_id) else {
            return vec![];
        };
        if player.connected || !player.can_reconnect || player.reconnect_epoch != epoch {
            tracing::debug!(
                "Ignoring stale reconnect expiry for {} (epoch {})",
                connection_id,
                epoch
            );
            return vec![];
        }

        player.can_reconnect = false;
        tracing::info!(
            "Reconnection window for {} in room {} expired",
            connection_id,
            self.room_code
        );

        let mut effects = vec![Effect::Sync];
        if self.round_active() && !self.timer_running {
            effects.extend(self.settle_round());
        }
        if self.is_abandoned() {
            effects.push(Effect::Dispose);
        }
        effects
    }

    /// Rename a player. Lobby only; the old name survives a failed attempt.
    pub fn set_display_name(&mut self, connection_id: &str, raw: &str) -> Vec<Effect> {
        if self.phase() != RoomPhase::Lobby {
            tracing::debug!("Ignoring rename outside lobby from {}", connection_id);
            return vec![];
        }

        let name = match names::normalize_display_name(raw, &self.config) {
            Ok(name) => name,
            Err(e) => {
                return vec![Effect::Send(
                    connection_id.to_string(),
                    ServerMessage::Error {
                        code: "NAME_INVALID".to_string(),
                        msg: e.to_string(),
                    },
                )];
            }
        };

        let Some(player) = self.player_mut(connection_id) else {
            return vec![];
        };
        let old = std::mem::replace(&mut player.display_name, name.clone());
        tracing::info!(
            "Player {} renamed from {:?} to {:?}",
            connection_id,
            old,
            name
        );

        vec![Effect::Sync]
    }

    /// Toggle public listing. The caller has already checked host authority.
    pub fn set_room_visibility(&mut self, is_public: bool) -> Vec<Effect> {
        self.is_public = is_public;
        tracing::info!("Room {} visibility set to public={}", self.room_code, is_public);
        vec![Effect::Sync]
    }

    fn welcome_message(&self, connection_id: &str) -> ServerMessage {
        ServerMessage::Welcome {
            protocol: "1.0".to_string(),
            connection_id: connection_id.to_string(),
            room_code: self.room_code.clone(),
            server_now: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::WordPool;

    fn session_with_players(n: usize) -> GameSession {
        let mut session = GameSession::new("ABCDE".to_string(), false, GameConfig::default());
        for i in 0..n {
            session.join(format!("conn-{}", i)).unwrap();
        }
        session
    }

    fn started_session(n: usize) -> GameSession {
        let mut session = session_with_players(n);
        session.start_game(&WordPool::builtin()).unwrap();
        session
    }

    #[test]
    fn test_first_joiner_becomes_host() {
        let session = session_with_players(3);
        assert_eq!(session.host.as_deref(), Some("conn-0"));
        assert_eq!(session.players.len(), 3);
        // Roster preserves join order
        assert_eq!(session.players[2].connection_id, "conn-2");
    }

    #[test]
    fn test_join_assigns_default_name() {
        let session = session_with_players(1);
        let name = &session.players[0].display_name;
        assert!(name.chars().count() >= 3);
    }

    #[test]
    fn test_join_refused_when_full() {
        let mut session = session_with_players(12);
        assert_eq!(
            session.join("conn-12".to_string()),
            Err(JoinError::RoomFull)
        );
        assert_eq!(session.players.len(), 12);
    }

    #[test]
    fn test_join_refused_once_started() {
        let mut session = started_session(3);
        assert_eq!(
            session.join("latecomer".to_string()),
            Err(JoinError::GameInProgress)
        );
    }

    #[test]
    fn test_lobby_leave_removes_and_migrates_host() {
        let mut session = session_with_players(3);
        let effects = session.leave("conn-0", true);

        assert_eq!(session.players.len(), 2);
        assert_eq!(session.host.as_deref(), Some("conn-1"));
        assert!(matches!(effects[0], Effect::Sync));
    }

    #[test]
    fn test_lobby_leave_of_last_player_disposes() {
        let mut session = session_with_players(1);
        let effects = session.leave("conn-0", false);
        assert!(matches!(effects[0], Effect::Dispose));
    }

    #[test]
    fn test_unconsented_drop_opens_window() {
        let mut session = started_session(3);
        let effects = session.leave("conn-1", false);

        let player = session.player("conn-1").unwrap();
        assert!(!player.connected);
        assert!(player.can_reconnect);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::OpenReconnectWindow { connection_id, epoch: 0 } if connection_id == "conn-1"
        )));
        // Seat survives, host unchanged
        assert_eq!(session.players.len(), 3);
        assert_eq!(session.host.as_deref(), Some("conn-0"));
    }

    #[test]
    fn test_consented_leave_closes_seat_without_window() {
        let mut session = started_session(3);
        let effects = session.leave("conn-1", true);

        let player = session.player("conn-1").unwrap();
        assert!(!player.connected);
        assert!(!player.can_reconnect);
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::OpenReconnectWindow { .. })));
    }

    #[test]
    fn test_host_drop_mid_game_keeps_host() {
        let mut session = started_session(3);
        session.leave("conn-0", false);
        assert_eq!(session.host.as_deref(), Some("conn-0"));
    }

    #[test]
    fn test_rejoin_reclaims_seat_and_bumps_epoch() {
        let mut session = started_session(3);
        session.leave("conn-1", false);

        let effects = session.rejoin("conn-1").unwrap();
        let player = session.player("conn-1").unwrap();
        assert!(player.connected);
        assert!(!player.can_reconnect);
        assert_eq!(player.reconnect_epoch, 1);
        // Welcome plus the current round's prompt for state recovery
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Send(_, ServerMessage::Welcome { .. }))));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Send(_, ServerMessage::SendSubmissions { .. }))));
    }

    #[test]
    fn test_rejoin_refused_after_window_expiry() {
        let mut session = started_session(3);
        session.leave("conn-1", false);
        session.reconnect_window_expired("conn-1", 0);

        assert_eq!(session.rejoin("conn-1"), Err(JoinError::WindowClosed));
    }

    #[test]
    fn test_rejoin_refused_for_connected_seat() {
        let mut session = started_session(3);
        assert_eq!(session.rejoin("conn-1"), Err(JoinError::SeatOccupied));
    }

    #[test]
    fn test_rejoin_refused_for_unknown_seat() {
        let mut session = started_session(3);
        assert_eq!(session.rejoin("stranger"), Err(JoinError::UnknownSeat));
    }

    #[test]
    fn test_stale_window_expiry_is_ignored() {
        let mut session = started_session(3);
        session.leave("conn-1", false);
        session.rejoin("conn-1").unwrap();

        // The expiry for the original window arrives after the rejoin
        let effects = session.reconnect_window_expired("conn-1", 0);
        assert!(effects.is_empty());
        assert!(session.player("conn-1").unwrap().connected);
    }

    #[test]
    fn test_all_windows_expired_disposes_abandoned_game() {
        let mut session = started_session(2);
        session.leave("conn-0", false);
        session.leave("conn-1", false);

        let effects = session.reconnect_window_expired("conn-0", 0);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Dispose)));

        let effects = session.reconnect_window_expired("conn-1", 0);
        assert!(effects.iter().any(|e| matches!(e, Effect::Dispose)));
    }

    #[test]
    fn test_set_display_name_normalizes() {
        let mut session = session_with_players(1);
        let effects = session.set_display_name("conn-0", "  Bob   Smith  ");

        assert_eq!(session.players[0].display_name, "Bob Smith");
        assert!(matches!(effects[0], Effect::Sync));
    }

    #[test]
    fn test_set_display_name_rejects_invalid() {
        let mut session = session_with_players(1);
        let before = session.players[0].display_name.clone();

        let effects = session.set_display_name("conn-0", "ab");
        assert_eq!(session.players[0].display_name, before);
        assert!(matches!(
            &effects[0],
            Effect::Send(_, ServerMessage::Error { code, .. }) if code == "NAME_INVALID"
        ));
    }

    #[test]
    fn test_set_display_name_ignored_mid_game() {
        let mut session = started_session(3);
        let before = session.players[0].display_name.clone();

        let effects = session.set_display_name("conn-0", "New Name");
        assert!(effects.is_empty());
        assert_eq!(session.players[0].display_name, before);
    }
}
