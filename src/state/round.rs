//! Round lifecycle: starting the game, the countdown, walking the cycle.

use super::{Effect, GameSession};
use crate::protocol::ServerMessage;
use crate::words::{WordPool, WordPoolError};

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("Need at least {need} players to start, only {have} joined")]
    NotEnoughPlayers { need: usize, have: usize },

    #[error("Game has already started")]
    AlreadyStarted,

    #[error(transparent)]
    WordPool(#[from] WordPoolError),
}

/// One round per player, rounded up to the next even count
pub fn total_rounds_for(player_count: usize) -> u32 {
    let n = player_count as u32;
    if n % 2 == 0 {
        n
    } else {
        n + 1
    }
}

impl GameSession {
    /// Start the game: assign a distinct secret word to every seat in
    /// roster order, fix the round count, lock the room, start the clock.
    /// Fails before touching any state, so the lobby survives a refusal.
    pub fn start_game(&mut self, words: &WordPool) -> Result<Vec<Effect>, StartError> {
        if self.round_index > 0 || self.game_over {
            return Err(StartError::AlreadyStarted);
        }
        let have = self.players.len();
        let need = self.config.min_players;
        if have < need {
            return Err(StartError::NotEnoughPlayers { need, have });
        }

        let secrets = words.draw(have)?;
        for (player, word) in self.players.iter_mut().zip(secrets) {
            player.secret_word = word;
        }

        let total = total_rounds_for(have);
        self.total_rounds = Some(total);
        self.round_index = 1;
        self.timer_remaining = self.config.round_timer_secs;
        self.timer_running = true;

        tracing::info!(
            "Room {} started: {} players, {} rounds",
            self.room_code,
            have,
            total
        );

        let mut effects = vec![Effect::Sync];
        effects.extend(self.round_prompts());
        Ok(effects)
    }

    /// One second of countdown. At zero the deadline fires: placeholders
    /// for disconnected non-submitters, a deadline notice, timer stopped.
    /// Connected stragglers keep the round open past the deadline.
    pub fn tick(&mut self) -> Vec<Effect> {
        if !self.round_active() || !self.timer_running {
            return vec![];
        }

        self.timer_remaining = self.timer_remaining.saturating_sub(1);
        let mut effects = vec![Effect::Broadcast(ServerMessage::Timer {
            seconds_remaining: self.timer_remaining,
        })];

        if self.timer_remaining == 0 {
            self.timer_running = false;
            tracing::info!(
                "Room {} round {} hit its deadline",
                self.room_code,
                self.round_index
            );
            effects.push(Effect::Broadcast(ServerMessage::RoundDeadline {
                round_index: self.round_index,
            }));
            effects.extend(self.settle_round());
        }

        effects
    }

    /// With the timer stopped, fill in placeholders for anyone who is both
    /// disconnected and missing, then finish the round if that completes it.
    pub(super) fn settle_round(&mut self) -> Vec<Effect> {
        if !self.round_active() || self.timer_running {
            return vec![];
        }

        let round = self.round_index;
        let filled = self.synthesize_missing(round);
        let mut effects = Vec::new();
        if filled > 0 {
            tracing::info!(
                "Room {} filled {} placeholder submissions for round {}",
                self.room_code,
                filled,
                round
            );
            effects.push(Effect::Sync);
        }
        effects.extend(self.try_finish_round());
        effects
    }

    pub(super) fn try_finish_round(&mut self) -> Vec<Effect> {
        if !self.round_active() || !self.all_submitted(self.round_index) {
            return vec![];
        }
        self.finish_round()
    }

    fn finish_round(&mut self) -> Vec<Effect> {
        let finished = self.round_index;
        let mut effects = vec![Effect::Broadcast(ServerMessage::RoundEnd {
            round_index: finished,
        })];

        if Some(finished) == self.total_rounds {
            self.game_over = true;
            self.timer_running = false;
            tracing::info!(
                "Room {} game over after {} rounds",
                self.room_code,
                finished
            );
            effects.push(Effect::Broadcast(ServerMessage::GameOver {
                chains: self.reveal_chains(),
            }));
            effects.push(Effect::Sync);
        } else {
            self.round_index += 1;
            self.timer_remaining = self.config.round_timer_secs;
            self.timer_running = true;
            tracing::info!(
                "Room {} advancing to round {}",
                self.room_code,
                self.round_index
            );
            effects.push(Effect::Sync);
            effects.extend(self.round_prompts());
        }

        effects
    }

    fn round_prompts(&self) -> Vec<Effect> {
        (0..self.players.len())
            .filter_map(|i| {
                self.round_prompt(i)
                    .map(|msg| Effect::Send(self.players[i].connection_id.clone(), msg))
            })
            .collect()
    }

    /// The material player `index` works from in the current round: their
    /// secret word in round 1, afterwards the previous round's drawing from
    /// the player one seat back in the cycle.
    pub(super) fn round_prompt(&self, index: usize) -> Option<ServerMessage> {
        if !self.round_active() {
            return None;
        }

        let round = self.round_index;
        if round == 1 {
            return Some(ServerMessage::SendSubmissions {
                round_index: 1,
                word: Some(self.players[index].secret_word.clone()),
                strokes: vec![],
            });
        }

        let n = self.players.len();
        let source = &self.players[(index + n - 1) % n];
        let previous = source.submissions.get(&(round - 1))?;
        Some(ServerMessage::SendSubmissions {
            round_index: round,
            word: None,
            strokes: previous.strokes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SubmitOutcome;
    use crate::types::*;
    use std::collections::HashSet;

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

    fn strokes_for(seed: u8) -> Vec<Stroke> {
        vec![Stroke {
            from_x: seed as f64,
            from_y: 0.0,
            to_x: 10.0,
            to_y: 10.0,
            width: seed,
            color: "#000000".to_string(),
        }]
    }

    fn submit(session: &mut GameSession, conn: &str, round: u32) {
        let (outcome, _) = session.record_submission(
            conn,
            round,
            format!("guess by {}", conn),
            strokes_for(round as u8),
        );
        assert_eq!(outcome, SubmitOutcome::Accepted);
    }

    #[test]
    fn test_total_rounds_rounds_up_to_even() {
        assert_eq!(total_rounds_for(2), 2);
        assert_eq!(total_rounds_for(3), 4);
        assert_eq!(total_rounds_for(4), 4);
        assert_eq!(total_rounds_for(5), 6);
        assert_eq!(total_rounds_for(12), 12);
    }

    #[test]
    fn test_start_assigns_distinct_words_and_locks_room() {
        let mut session = session_with_players(4);
        let effects = session.start_game(&WordPool::builtin()).unwrap();

        assert_eq!(session.round_index, 1);
        assert_eq!(session.total_rounds, Some(4));
        assert_eq!(session.timer_remaining, 120);
        assert!(session.timer_running);

        let words: HashSet<_> = session.players.iter().map(|p| &p.secret_word).collect();
        assert_eq!(words.len(), 4);
        assert!(session.players.iter().all(|p| !p.secret_word.is_empty()));

        // Every player is told their own word
        let prompts: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(conn, ServerMessage::SendSubmissions { word: Some(w), .. }) => {
                    Some((conn.clone(), w.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(prompts.len(), 4);
        for (conn, word) in prompts {
            assert_eq!(session.player(&conn).unwrap().secret_word, word);
        }
    }

    #[test]
    fn test_start_without_enough_players() {
        let mut session = session_with_players(1);
        match session.start_game(&WordPool::builtin()) {
            Err(StartError::NotEnoughPlayers { need: 2, have: 1 }) => {}
            other => panic!("expected NotEnoughPlayers, got {:?}", other),
        }
        assert_eq!(session.round_index, 0);
    }

    #[test]
    fn test_start_with_short_word_pool_leaves_lobby_untouched() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["one", "two", "three"]"#).unwrap();
        let pool = WordPool::load_from_file(file.path()).unwrap();

        let mut session = session_with_players(4);
        match session.start_game(&pool) {
            Err(StartError::WordPool(WordPoolError::InsufficientWords { need: 4, have: 3 })) => {}
            other => panic!("expected InsufficientWords, got {:?}", other),
        }

        // The failed start must not leak any partial state
        assert_eq!(session.round_index, 0);
        assert!(session.total_rounds.is_none());
        assert!(!session.timer_running);
        assert!(session.players.iter().all(|p| p.secret_word.is_empty()));
    }

    #[test]
    fn test_start_twice_fails() {
        let mut session = started_session(3);
        assert!(matches!(
            session.start_game(&WordPool::builtin()),
            Err(StartError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_tick_counts_down_and_broadcasts() {
        let mut session = started_session(2);
        let effects = session.tick();

        assert_eq!(session.timer_remaining, 119);
        assert!(matches!(
            effects[0],
            Effect::Broadcast(ServerMessage::Timer {
                seconds_remaining: 119
            })
        ));
    }

    #[test]
    fn test_tick_does_nothing_in_lobby() {
        let mut session = session_with_players(2);
        assert!(session.tick().is_empty());
    }

    #[test]
    fn test_deadline_fills_only_disconnected_non_submitters() {
        let mut session = started_session(3);
        submit(&mut session, "conn-0", 1);
        session.leave("conn-1", false); // Dropped without submitting
                                        // conn-2 stays connected without submitting

        session.timer_remaining = 1;
        let effects = session.tick();

        assert!(!session.timer_running);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Broadcast(ServerMessage::RoundDeadline { round_index: 1 })
        )));

        // Placeholder for the dropped player only
        let placeholder = session
            .player("conn-1")
            .unwrap()
            .submissions
            .get(&1)
            .unwrap();
        assert_eq!(placeholder.guess, "");
        assert!(placeholder.strokes.is_empty());
        assert!(!session.player("conn-2").unwrap().has_submitted(1));

        // Round still open: the connected straggler holds it
        assert_eq!(session.round_index, 1);
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::Broadcast(ServerMessage::RoundEnd { .. }))));

        // Timer is stopped now; further ticks are inert
        assert!(session.tick().is_empty());
    }

    #[test]
    fn test_late_submission_after_deadline_finishes_round() {
        let mut session = started_session(3);
        submit(&mut session, "conn-0", 1);
        session.leave("conn-1", false);
        session.timer_remaining = 1;
        session.tick();

        submit(&mut session, "conn-2", 1);
        assert_eq!(session.round_index, 2);
    }

    #[test]
    fn test_disconnect_after_deadline_unblocks_round() {
        let mut session = started_session(3);
        submit(&mut session, "conn-0", 1);
        submit(&mut session, "conn-1", 1);
        session.timer_remaining = 1;
        session.tick();

        // The last non-submitter drops after the deadline already fired
        let effects = session.leave("conn-2", false);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Broadcast(ServerMessage::RoundEnd { round_index: 1 })
        )));
        assert_eq!(session.round_index, 2);
        assert!(session.player("conn-2").unwrap().has_submitted(1));
    }

    #[test]
    fn test_all_submitted_ends_round_immediately() {
        let mut session = started_session(2);
        submit(&mut session, "conn-0", 1);
        assert_eq!(session.round_index, 1);

        submit(&mut session, "conn-1", 1);
        assert_eq!(session.round_index, 2);
        assert_eq!(session.timer_remaining, 120);
        assert!(session.timer_running);
    }

    #[test]
    fn test_round_prompt_walks_the_cycle() {
        let mut session = started_session(4);
        for i in 0..4 {
            submit(&mut session, &format!("conn-{}", i), 1);
        }
        assert_eq!(session.round_index, 2);

        // Player 1 now guesses player 0's round-1 drawing, player 0 gets player 3's
        match session.round_prompt(1) {
            Some(ServerMessage::SendSubmissions {
                round_index: 2,
                word: None,
                strokes,
            }) => {
                let expected = &session.players[0].submissions[&1].strokes;
                assert_eq!(&strokes, expected);
            }
            other => panic!("unexpected prompt: {:?}", other),
        }
        match session.round_prompt(0) {
            Some(ServerMessage::SendSubmissions { strokes, .. }) => {
                let expected = &session.players[3].submissions[&1].strokes;
                assert_eq!(&strokes, expected);
            }
            other => panic!("unexpected prompt: {:?}", other),
        }
    }

    #[test]
    fn test_full_game_reaches_game_over() {
        let mut session = started_session(2);

        for round in 1..=2 {
            submit(&mut session, "conn-0", round);
            let (outcome, effects) = session.record_submission(
                "conn-1",
                round,
                "final guess".to_string(),
                strokes_for(round as u8),
            );
            assert_eq!(outcome, SubmitOutcome::Accepted);
            if round == 2 {
                assert!(effects
                    .iter()
                    .any(|e| matches!(e, Effect::Broadcast(ServerMessage::GameOver { .. }))));
            }
        }

        assert!(session.game_over);
        assert_eq!(session.phase(), RoomPhase::Ended);
        assert!(!session.timer_running);

        // Terminal: nothing moves any more
        assert!(session.tick().is_empty());
        assert!(matches!(
            session.start_game(&WordPool::builtin()),
            Err(StartError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_game_over_reveal_contains_full_chains() {
        let mut session = started_session(2);
        submit(&mut session, "conn-0", 1);
        submit(&mut session, "conn-1", 1);
        submit(&mut session, "conn-0", 2);

        let (_, effects) =
            session.record_submission("conn-1", 2, "last".to_string(), strokes_for(9));

        let chains = effects
            .iter()
            .find_map(|e| match e {
                Effect::Broadcast(ServerMessage::GameOver { chains }) => Some(chains),
                _ => None,
            })
            .expect("game over broadcast");

        assert_eq!(chains.len(), 2);
        for chain in chains {
            assert!(!chain.secret_word.is_empty());
            assert_eq!(chain.submissions.len(), 2);
            assert_eq!(chain.submissions[0].round_index, 1);
            assert_eq!(chain.submissions[1].round_index, 2);
        }
        // Reveal preserves roster order
        assert_eq!(chains[0].connection_id, "conn-0");
        assert_eq!(chains[1].connection_id, "conn-1");
    }
}
