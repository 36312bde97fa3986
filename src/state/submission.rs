//! Submission collection: one immutable submission per player per round.

use super::{Effect, GameSession};
use crate::types::*;

/// Outcome of a submit attempt. `Duplicate` is success from the client's
/// point of view; the stored submission is never overwritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    Accepted,
    Duplicate,
    NoActiveRound,
    /// Round index in the message does not match the round in progress
    WrongRound,
}

impl GameSession {
    pub fn record_submission(
        &mut self,
        connection_id: &str,
        round_index: u32,
        guess: String,
        strokes: Vec<Stroke>,
    ) -> (SubmitOutcome, Vec<Effect>) {
        if !self.round_active() {
            return (SubmitOutcome::NoActiveRound, vec![]);
        }
        if round_index != self.round_index {
            return (SubmitOutcome::WrongRound, vec![]);
        }

        let current = self.round_index;
        let room_code = self.room_code.clone();
        let Some(player) = self.player_mut(connection_id) else {
            tracing::debug!("Submission from unknown connection {}", connection_id);
            return (SubmitOutcome::NoActiveRound, vec![]);
        };

        if player.has_submitted(current) {
            tracing::debug!(
                "Duplicate submission from {} for round {}",
                connection_id,
                current
            );
            return (SubmitOutcome::Duplicate, vec![]);
        }

        player.submissions.insert(
            current,
            RoundSubmission {
                round_index: current,
                guess,
                strokes,
            },
        );
        tracing::info!(
            "Player {} submitted round {} in room {}",
            connection_id,
            current,
            room_code
        );

        let mut effects = vec![Effect::Sync];
        effects.extend(self.try_finish_round());
        (SubmitOutcome::Accepted, effects)
    }

    /// True when every seat in the roster, connected or not, has handed in
    /// the given round
    pub fn all_submitted(&self, round_index: u32) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.has_submitted(round_index))
    }

    /// Insert empty submissions for disconnected players missing the round.
    /// Returns how many were created.
    pub(super) fn synthesize_missing(&mut self, round_index: u32) -> usize {
        let mut filled = 0;
        for player in &mut self.players {
            if !player.connected && !player.has_submitted(round_index) {
                player.submissions.insert(
                    round_index,
                    RoundSubmission {
                        round_index,
                        guess: String::new(),
                        strokes: Vec::new(),
                    },
                );
                filled += 1;
            }
        }
        filled
    }
}
