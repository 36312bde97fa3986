//! The secret word pool players draw from at game start.
//!
//! Words come from a JSON file (an array of strings) when one is configured,
//! otherwise from the built-in list. Duplicates in the source are collapsed
//! so a draw can always return distinct words.

use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum WordPoolError {
    #[error("Need {need} distinct words but the pool only has {have}")]
    InsufficientWords { need: usize, have: usize },

    #[error("Failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse word list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Word list contains no usable words")]
    EmptyList,
}

/// Words players might plausibly draw. Kept small on purpose; operators
/// with bigger ambitions point GAME_WORDS_FILE at their own list.
const BUILTIN_WORDS: &[&str] = &[
    "airplane",
    "anchor",
    "banana",
    "bicycle",
    "butterfly",
    "cactus",
    "camera",
    "campfire",
    "castle",
    "caterpillar",
    "cloud",
    "compass",
    "crayon",
    "dinosaur",
    "dolphin",
    "dragon",
    "drum",
    "elephant",
    "envelope",
    "flashlight",
    "flamingo",
    "fountain",
    "giraffe",
    "guitar",
    "hammock",
    "hedgehog",
    "helicopter",
    "igloo",
    "jellyfish",
    "kangaroo",
    "kite",
    "ladder",
    "lighthouse",
    "mermaid",
    "microscope",
    "mountain",
    "mushroom",
    "octopus",
    "parachute",
    "peacock",
    "penguin",
    "pineapple",
    "pirate",
    "pretzel",
    "pyramid",
    "rainbow",
    "robot",
    "rocket",
    "sandcastle",
    "scarecrow",
    "scissors",
    "snowman",
    "spider",
    "submarine",
    "telescope",
    "tornado",
    "tractor",
    "treehouse",
    "umbrella",
    "unicorn",
    "volcano",
    "waterfall",
    "windmill",
    "zeppelin",
];

#[derive(Debug, Clone)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    /// Pool backed by the compiled-in word list
    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Load a pool from a JSON file containing an array of strings.
    /// Blank entries are skipped and duplicates collapsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, WordPoolError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: Vec<String> = serde_json::from_str(&raw)?;

        let mut seen = HashSet::new();
        let words: Vec<String> = parsed
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.to_lowercase()))
            .collect();

        if words.is_empty() {
            return Err(WordPoolError::EmptyList);
        }

        Ok(Self { words })
    }

    /// Build the pool from the configured file, falling back to the
    /// built-in list when the file is missing or unreadable.
    pub fn from_config(words_file: Option<&str>) -> Self {
        match words_file {
            Some(path) => match Self::load_from_file(path) {
                Ok(pool) => {
                    tracing::info!("Loaded {} words from {}", pool.len(), path);
                    pool
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load word list from {}: {}. Using built-in list.",
                        path,
                        e
                    );
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Draw `count` distinct words at random. Fails without drawing anything
    /// if the pool cannot supply that many.
    pub fn draw(&self, count: usize) -> Result<Vec<String>, WordPoolError> {
        if count > self.words.len() {
            return Err(WordPoolError::InsufficientWords {
                need: count,
                have: self.words.len(),
            });
        }

        let mut rng = rand::rng();
        Ok(self
            .words
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect())
    }
}
