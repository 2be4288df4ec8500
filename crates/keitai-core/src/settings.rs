//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`
//!
//! A [`crate::TokenizerBuilder`] can also carry its own `Settings`, which
//! takes precedence over the singleton for that tokenizer.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    pub tokenizer: TokenizerSettings,
    pub unknown: UnknownSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenizerSettings {
    /// Single-character sentence terminators.
    pub sentence_delimiters: Vec<String>,
}

impl TokenizerSettings {
    pub fn is_delimiter(&self, c: char) -> bool {
        self.sentence_delimiters
            .iter()
            .any(|d| d.chars().eq(std::iter::once(c)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnknownSettings {
    pub cap_group_at_max_length: bool,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_single_chars {
        ($section:ident . $field:ident) => {
            for (i, d) in s.$section.$field.iter().enumerate() {
                if d.chars().count() != 1 {
                    return Err(SettingsError::InvalidValue {
                        field: format!(
                            "{}[{i}]",
                            concat!(stringify!($section), ".", stringify!($field))
                        ),
                        reason: format!("must be exactly one character, got {d:?}"),
                    });
                }
            }
        };
    }

    check_single_chars!(tokenizer.sentence_delimiters);

    Ok(())
}
