//! Asset directory resolver
//!
//! Maps `(character, event)` to an audio file laid out as
//! `<characters-root>/<character>/<event>.<ext>`.
//!
//! Matching rules:
//! - the file stem equals the event identifier, ignoring ASCII case
//! - the extension is one of `mp3`, `wav`, `ogg`, `aiff`, ignoring ASCII case
//! - only files directly inside the character directory are considered
//!
//! When several files match, the format priority `mp3 > wav > ogg > aiff`
//! decides, then the file name (byte order) among same-format files that
//! differ only in case.

use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::event::HookEvent;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    #[error("No {event} asset for character {character}")]
    AssetNotFound { character: String, event: HookEvent },

    #[error("Invalid character name: {0:?}")]
    InvalidCharacterName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResolveError::CharacterNotFound(_) | ResolveError::AssetNotFound { .. }
        )
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Supported audio formats, declared in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Aiff,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 4] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::Ogg,
        AudioFormat::Aiff,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Aiff => "aiff",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        AudioFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension)
    }
}

/// Read-only lookup of character assets under a characters root.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `character`, which must exist.
    pub fn character_dir(&self, character: &str) -> ResolveResult<PathBuf> {
        validate_character_name(character)?;
        let dir = self.root.join(character);
        if !dir.is_dir() {
            return Err(ResolveError::CharacterNotFound(character.to_string()));
        }
        Ok(dir)
    }

    pub fn resolve(&self, character: &str, event: HookEvent) -> ResolveResult<PathBuf> {
        let dir = self.character_dir(character)?;
        find_asset(&dir, event)?.ok_or_else(|| ResolveError::AssetNotFound {
            character: character.to_string(),
            event,
        })
    }

    /// Like [`resolve`](Self::resolve), but retries with `fallback` when
    /// `character` itself does not exist. A missing asset in an existing
    /// character does not trigger the fallback.
    pub fn resolve_with_fallback(
        &self,
        character: &str,
        fallback: &str,
        event: HookEvent,
    ) -> ResolveResult<PathBuf> {
        match self.resolve(character, event) {
            Err(ResolveError::CharacterNotFound(_)) if character != fallback => {
                debug!(target = "resolver", character, fallback, "Character missing, trying fallback");
                self.resolve(fallback, event)
            }
            other => other,
        }
    }

    /// Asset (if any) for every event of `character`, in event order.
    pub fn resolve_all(&self, character: &str) -> ResolveResult<Vec<(HookEvent, Option<PathBuf>)>> {
        let dir = self.character_dir(character)?;
        HookEvent::ALL
            .into_iter()
            .map(|event| Ok((event, find_asset(&dir, event)?)))
            .collect()
    }
}

/// A character name must be exactly one plain path component.
pub fn validate_character_name(name: &str) -> ResolveResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(()),
        _ => Err(ResolveError::InvalidCharacterName(name.to_string())),
    }
}

fn find_asset(dir: &Path, event: HookEvent) -> ResolveResult<Option<PathBuf>> {
    let mut best: Option<(AudioFormat, String, PathBuf)> = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // is_file follows symlinks
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some((stem, ext)) = file_name.rsplit_once('.') else {
            continue;
        };
        if !stem.eq_ignore_ascii_case(event.as_str()) {
            continue;
        }
        let Some(format) = AudioFormat::from_extension(ext) else {
            continue;
        };

        let better = match &best {
            None => true,
            Some((f, name, _)) => (format, file_name.as_str()) < (*f, name.as_str()),
        };
        if better {
            best = Some((format, file_name, path));
        }
    }

    if let Some((_, name, _)) = &best {
        debug!(target = "resolver", event = %event, file = %name, "Resolved asset");
    }
    Ok(best.map(|(_, _, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_priority_order() {
        assert!(AudioFormat::Mp3 < AudioFormat::Wav);
        assert!(AudioFormat::Wav < AudioFormat::Ogg);
        assert!(AudioFormat::Ogg < AudioFormat::Aiff);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(AudioFormat::from_extension("MP3"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_extension("aiff"), Some(AudioFormat::Aiff));
        assert_eq!(AudioFormat::from_extension("aif"), None);
        assert_eq!(AudioFormat::from_extension("flac"), None);
        assert_eq!(
            AudioFormat::from_path(Path::new("/x/stop.Ogg")),
            Some(AudioFormat::Ogg)
        );
    }

    #[test]
    fn test_character_name_validation() {
        assert!(validate_character_name("default").is_ok());
        assert!(validate_character_name("genki-girl").is_ok());
        assert!(validate_character_name("").is_err());
        assert!(validate_character_name(".").is_err());
        assert!(validate_character_name("..").is_err());
        assert!(validate_character_name("a/b").is_err());
        assert!(validate_character_name("/abs").is_err());
        assert!(validate_character_name("name/").is_err());
    }
}
