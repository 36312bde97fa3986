//! One task per room. The actor owns its `GameSession` outright; sockets,
//! timers, and reconnection windows all funnel through the same event queue,
//! so state transitions are strictly ordered without any locking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::manager::SessionManager;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{Effect, GameSession, SubmitOutcome};
use crate::types::*;

/// Rooms that never see a single player get torn down after this long
const EMPTY_ROOM_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub enum SessionEvent {
    /// A socket wants to attach: a fresh join, or a rejoin of an old seat
    Connect {
        connection_id: ConnectionId,
        rejoin: bool,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    Message {
        connection_id: ConnectionId,
        message: ClientMessage,
    },
    /// The socket went away. `consented` is true for a clean close. The
    /// sender identifies which attachment died, so a disconnect that races
    /// a fast rejoin cannot knock out the new socket.
    Disconnect {
        connection_id: ConnectionId,
        consented: bool,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    ReconnectWindowExpired {
        connection_id: ConnectionId,
        epoch: u64,
    },
}

pub struct SessionHandle {
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub task: JoinHandle<()>,
}

/// Drop privileged messages from non-hosts without a reply
macro_rules! require_host {
    ($session:expr, $conn:expr, $action:expr) => {
        if !$session.is_host($conn) {
            tracing::debug!("Ignoring {} from non-host {}", $action, $conn);
            return vec![];
        }
    };
}

pub fn spawn_session(
    manager: Arc<SessionManager>,
    room_code: RoomCode,
    is_public: bool,
    config: GameConfig,
) -> SessionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = SessionActor {
        session: GameSession::new(room_code, is_public, config),
        events: rx,
        event_tx: tx.clone(),
        connections: HashMap::new(),
        manager,
    };
    let task = tokio::spawn(actor.run());
    SessionHandle { events: tx, task }
}

struct SessionActor {
    session: GameSession,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Handed to scheduled tasks (reconnection windows) so their
    /// expirations join the same ordered queue
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Outbound channel per attached socket
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    manager: Arc<SessionManager>,
}

impl SessionActor {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let was_ticking = self.session.timer_running;

            let dispose = tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    let effects = self.handle_event(event);
                    self.apply(effects).await
                }
                _ = ticker.tick(), if self.session.timer_running => {
                    let effects = self.session.tick();
                    self.apply(effects).await
                }
                _ = tokio::time::sleep(EMPTY_ROOM_TTL), if self.session.players.is_empty() => {
                    tracing::info!("Room {} never got a player, closing", self.session.room_code);
                    true
                }
            };

            if dispose {
                break;
            }

            // A round just started: give it a full first second
            if !was_ticking && self.session.timer_running {
                ticker.reset();
            }
        }

        self.manager.remove_room(&self.session.room_code).await;
        tracing::info!("Room {} disposed", self.session.room_code);
    }

    fn handle_event(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Connect {
                connection_id,
                rejoin,
                sender,
            } => self.handle_connect(connection_id, rejoin, sender),

            SessionEvent::Message {
                connection_id,
                message,
            } => self.handle_message(&connection_id, message),

            SessionEvent::Disconnect {
                connection_id,
                consented,
                sender,
            } => {
                let attached = self
                    .connections
                    .get(&connection_id)
                    .is_some_and(|current| current.same_channel(&sender));
                if !attached {
                    // A refused socket, or one already replaced by a rejoin
                    return vec![];
                }
                self.connections.remove(&connection_id);
                self.session.leave(&connection_id, consented)
            }

            SessionEvent::ReconnectWindowExpired {
                connection_id,
                epoch,
            } => self.session.reconnect_window_expired(&connection_id, epoch),
        }
    }

    fn handle_connect(
        &mut self,
        connection_id: ConnectionId,
        rejoin: bool,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Vec<Effect> {
        let result = if rejoin {
            self.session.rejoin(&connection_id)
        } else {
            self.session.join(connection_id.clone())
        };

        match result {
            Ok(effects) => {
                self.connections.insert(connection_id, sender);
                effects
            }
            Err(e) => {
                tracing::info!(
                    "Refused connection {} to room {}: {}",
                    connection_id,
                    self.session.room_code,
                    e
                );
                let _ = sender.send(ServerMessage::Error {
                    code: e.code().to_string(),
                    msg: e.to_string(),
                });
                // Dropping the sender ends the socket's outbound pump
                vec![]
            }
        }
    }

    fn handle_message(&mut self, connection_id: &str, message: ClientMessage) -> Vec<Effect> {
        match message {
            ClientMessage::SetDisplayName { name } => {
                self.session.set_display_name(connection_id, &name)
            }

            ClientMessage::SetRoomVisibility { is_public } => {
                require_host!(self.session, connection_id, "visibility change");
                self.session.set_room_visibility(is_public)
            }

            ClientMessage::StartGame => {
                require_host!(self.session, connection_id, "game start");
                match self.session.start_game(self.manager.words()) {
                    Ok(effects) => effects,
                    Err(e) => {
                        tracing::warn!("Room {} failed to start: {}", self.session.room_code, e);
                        vec![Effect::Send(
                            connection_id.to_string(),
                            ServerMessage::Error {
                                code: "START_FAILED".to_string(),
                                msg: e.to_string(),
                            },
                        )]
                    }
                }
            }

            ClientMessage::SubmitRound {
                round_index,
                guess,
                strokes,
            } => {
                let (outcome, effects) =
                    self.session
                        .record_submission(connection_id, round_index, guess, strokes);
                match outcome {
                    SubmitOutcome::Accepted => effects,
                    // Idempotent success and out-of-round noise both end here
                    SubmitOutcome::Duplicate
                    | SubmitOutcome::NoActiveRound
                    | SubmitOutcome::WrongRound => vec![],
                }
            }
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) -> bool {
        let mut dispose = false;
        for effect in effects {
            match effect {
                Effect::Send(connection_id, message) => {
                    self.send_to(&connection_id, message);
                }
                Effect::Broadcast(message) => {
                    for sender in self.connections.values() {
                        let _ = sender.send(message.clone());
                    }
                }
                Effect::Sync => {
                    for (connection_id, snapshot) in self.session.snapshots() {
                        self.send_to(&connection_id, snapshot);
                    }
                    self.manager.update_listing(&self.session).await;
                }
                Effect::OpenReconnectWindow {
                    connection_id,
                    epoch,
                } => {
                    self.spawn_reconnect_window(connection_id, epoch);
                }
                Effect::Dispose => {
                    dispose = true;
                }
            }
        }
        dispose
    }

    fn send_to(&self, connection_id: &str, message: ServerMessage) {
        if let Some(sender) = self.connections.get(connection_id) {
            // A dead socket surfaces as a Disconnect event shortly; no
            // cleanup needed here
            let _ = sender.send(message);
        }
    }

    fn spawn_reconnect_window(&self, connection_id: ConnectionId, epoch: u64) {
        let events = self.event_tx.clone();
        let secs = self.session.config.reconnect_window_secs;
        tracing::info!(
            "Opened {}s reconnection window for {} in room {}",
            secs,
            connection_id,
            self.session.room_code
        );
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            let _ = events.send(SessionEvent::ReconnectWindowExpired {
                connection_id,
                epoch,
            });
        });
    }
}
