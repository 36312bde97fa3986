//! Display name validation and default name generation.

use crate::types::GameConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NameError {
    #[error("Display name must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Display name must be at most {max} characters")]
    TooLong { max: usize },
}

/// Normalize a requested display name: trim the ends, collapse internal
/// whitespace runs to single spaces, then enforce the configured length
/// bounds. Returns the cleaned name; the caller keeps the old name on error.
pub fn normalize_display_name(raw: &str, config: &GameConfig) -> Result<String, NameError> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let len = cleaned.chars().count();
    if len < config.name_min_chars {
        return Err(NameError::TooShort {
            min: config.name_min_chars,
        });
    }
    if len > config.name_max_chars {
        return Err(NameError::TooLong {
            max: config.name_max_chars,
        });
    }

    Ok(cleaned)
}

/// Generate a friendly default name for a freshly joined player, like
/// "Merry Crab". Falls back to a fixed name if generation can't produce
/// something within the length bounds.
pub fn generate_display_name(config: &GameConfig) -> String {
    for _ in 0..8 {
        let Some(name) = petname::petname(2, " ") else {
            break;
        };
        let name = title_case(&name);
        let len = name.chars().count();
        if len >= config.name_min_chars && len <= config.name_max_chars {
            return name;
        }
    }
    "Unnamed Player".to_string()
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
