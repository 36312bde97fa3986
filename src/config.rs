//! Server configuration loaded from environment variables.

use crate::types::GameConfig;

/// Process-wide settings: network bind, word list location, and the
/// default game rules applied to every room.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Optional path to a JSON word list; the built-in list is used when unset
    pub words_file: Option<String>,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 2567,
            words_file: None,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = GameConfig::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2567);

        let words_file = std::env::var("GAME_WORDS_FILE").ok();

        let game = GameConfig {
            min_players: env_parse("GAME_MIN_PLAYERS", defaults.min_players),
            max_players: env_parse("GAME_MAX_PLAYERS", defaults.max_players),
            name_min_chars: env_parse("GAME_NAME_MIN", defaults.name_min_chars),
            name_max_chars: env_parse("GAME_NAME_MAX", defaults.name_max_chars),
            round_timer_secs: env_parse("GAME_ROUND_TIMER_SECS", defaults.round_timer_secs),
            reconnect_window_secs: env_parse(
                "GAME_RECONNECT_WINDOW_SECS",
                defaults.reconnect_window_secs,
            ),
        };

        tracing::info!(
            port,
            min_players = game.min_players,
            max_players = game.max_players,
            round_timer_secs = game.round_timer_secs,
            reconnect_window_secs = game.reconnect_window_secs,
            "Server config loaded"
        );

        Self {
            port,
            words_file,
            game,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
