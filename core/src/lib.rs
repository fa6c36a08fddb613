// Chuuni Core Library
// Character voice assets for Claude Code hook events

pub mod character;
pub mod config;
pub mod cooldown;
pub mod event;
pub mod hooks;
pub mod resolver;
pub(crate) mod utils;

// Export core types
pub use character::{Character, CharacterManager};
pub use config::{ChuuniConfig, ConfigPaths};
pub use cooldown::CooldownStore;
pub use event::HookEvent;
pub use hooks::{InjectReport, RemoveReport};
pub use resolver::{validate_character_name, AssetResolver, AudioFormat, ResolveError};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChuuniError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Settings error: {0}")]
    SettingsError(String),

    #[error("Home directory could not be determined")]
    HomeDirUnavailable,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),
}
pub type Result<T> = std::result::Result<T, ChuuniError>;
