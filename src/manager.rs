//! Process-wide registry of live rooms plus the public room directory.
//! Room state itself lives inside each room's actor; the manager only
//! routes sockets to event queues and serves the browse list.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{mpsc, RwLock};

use crate::actor::{spawn_session, SessionEvent, SessionHandle};
use crate::protocol::RoomListing;
use crate::state::GameSession;
use crate::types::*;
use crate::words::WordPool;

/// Safe character set for room codes (no 0/O, 1/I/L confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

pub struct SessionManager {
    rooms: RwLock<HashMap<RoomCode, SessionHandle>>,
    /// Mirror of every listable room, refreshed by the actors
    directory: RwLock<HashMap<RoomCode, RoomListing>>,
    game_config: GameConfig,
    words: WordPool,
}

impl SessionManager {
    pub fn new(game_config: GameConfig, words: WordPool) -> Arc<Self> {
        Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            directory: RwLock::new(HashMap::new()),
            game_config,
            words,
        })
    }

    pub fn words(&self) -> &WordPool {
        &self.words
    }

    /// Create a room under a fresh collision-free code and spawn its actor
    pub async fn create_room(self: &Arc<Self>, is_public: bool) -> RoomCode {
        let mut rooms = self.rooms.write().await;
        let code = loop {
            let candidate = generate_room_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            // Collision, roll again
        };
        let handle = spawn_session(
            Arc::clone(self),
            code.clone(),
            is_public,
            self.game_config.clone(),
        );
        rooms.insert(code.clone(), handle);
        drop(rooms);

        if is_public {
            self.directory.write().await.insert(
                code.clone(),
                RoomListing {
                    room_code: code.clone(),
                    player_count: 0,
                    max_players: self.game_config.max_players,
                },
            );
        }

        tracing::info!("Created room {} (public: {})", code, is_public);
        code
    }

    /// Event queue of a live room, for attaching sockets
    pub async fn room_events(&self, code: &str) -> Option<mpsc::UnboundedSender<SessionEvent>> {
        self.rooms.read().await.get(code).map(|h| h.events.clone())
    }

    /// Called by an actor after every sync so the browse list stays current
    pub async fn update_listing(&self, session: &GameSession) {
        let mut directory = self.directory.write().await;
        match session.directory_listing() {
            Some(listing) => {
                directory.insert(session.room_code.clone(), listing);
            }
            None => {
                directory.remove(&session.room_code);
            }
        }
    }

    pub async fn public_rooms(&self) -> Vec<RoomListing> {
        let mut listings: Vec<_> = self.directory.read().await.values().cloned().collect();
        listings.sort_by(|a, b| a.room_code.cmp(&b.room_code));
        listings
    }

    /// Final cleanup when an actor winds down
    pub async fn remove_room(&self, code: &str) {
        self.rooms.write().await.remove(code);
        self.directory.write().await.remove(code);
        tracing::info!("Removed room {}", code);
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
