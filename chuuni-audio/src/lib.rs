// Chuuni audio playback

pub mod player;

pub use player::{
    select_player, AudioSink, CommandPlayer, PlaybackMode, PlaybackOutcome, PlayerConfig,
    PlayerKind, SelectedPlayer,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported audio format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to launch {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{player} exited with {status}")]
    PlayerFailed { player: String, status: String },

    #[error("Playback timed out after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AudioResult<T> = std::result::Result<T, AudioError>;
