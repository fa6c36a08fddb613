//! Playback of resolved assets through system player binaries
//!
//! Players are tried in platform order and filtered by what they can decode:
//! - macOS: afplay, ffplay
//! - elsewhere: paplay, aplay, mpg123, ffplay
//!
//! A preferred player (config or `CHUUNI_PLAYER`) is tried first. When no
//! suitable binary is on PATH, playback degrades to a logged no-op.
//!
//! Env overrides:
//! - CHUUNI_PLAYER
//! - CHUUNI_PLAYER_TIMEOUT_MS

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chuuni_core::AudioFormat;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::{AudioError, AudioResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerKind {
    Afplay,
    Paplay,
    Aplay,
    Mpg123,
    Ffplay,
}

impl PlayerKind {
    pub const ALL: [PlayerKind; 5] = [
        PlayerKind::Afplay,
        PlayerKind::Paplay,
        PlayerKind::Aplay,
        PlayerKind::Mpg123,
        PlayerKind::Ffplay,
    ];

    pub fn binary(&self) -> &'static str {
        match self {
            PlayerKind::Afplay => "afplay",
            PlayerKind::Paplay => "paplay",
            PlayerKind::Aplay => "aplay",
            PlayerKind::Mpg123 => "mpg123",
            PlayerKind::Ffplay => "ffplay",
        }
    }

    /// Accepts a bare name or a path to the binary.
    pub fn from_name(name: &str) -> Option<Self> {
        let file = Path::new(name).file_stem()?.to_str()?;
        PlayerKind::ALL
            .into_iter()
            .find(|k| k.binary().eq_ignore_ascii_case(file))
    }

    pub fn supports(&self, format: AudioFormat) -> bool {
        use AudioFormat::*;
        match self {
            PlayerKind::Afplay => matches!(format, Mp3 | Wav | Aiff),
            // libsndfile formats
            PlayerKind::Paplay => matches!(format, Wav | Ogg | Aiff),
            PlayerKind::Aplay => matches!(format, Wav),
            PlayerKind::Mpg123 => matches!(format, Mp3),
            PlayerKind::Ffplay => true,
        }
    }

    /// Arguments for playing `path` at `volume` (0.0..=1.0, clamped).
    pub fn args(&self, path: &Path, volume: f32) -> Vec<OsString> {
        let v = if volume.is_nan() { 1.0 } else { volume.clamp(0.0, 1.0) };
        let mut args: Vec<OsString> = match self {
            PlayerKind::Afplay => vec!["-v".into(), format!("{v:.2}").into()],
            // PA_VOLUME_NORM = 65536, no amplification
            PlayerKind::Paplay => vec![format!("--volume={}", (v * 65536.0).round() as u32).into()],
            // no volume flag; system mixer applies
            PlayerKind::Aplay => vec!["-q".into()],
            PlayerKind::Mpg123 => vec![
                "-q".into(),
                "-f".into(),
                ((v * 32768.0).round() as u32).to_string().into(),
            ],
            PlayerKind::Ffplay => vec![
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
                "-volume".into(),
                ((v * 100.0).round() as u32).to_string().into(),
            ],
        };
        args.push(path.as_os_str().to_owned());
        args
    }

    /// Fallback order on the current platform
    pub fn platform_chain() -> &'static [PlayerKind] {
        if cfg!(target_os = "macos") {
            MACOS_CHAIN
        } else {
            DEFAULT_CHAIN
        }
    }
}

const MACOS_CHAIN: &[PlayerKind] = &[PlayerKind::Afplay, PlayerKind::Ffplay];
const DEFAULT_CHAIN: &[PlayerKind] = &[
    PlayerKind::Paplay,
    PlayerKind::Aplay,
    PlayerKind::Mpg123,
    PlayerKind::Ffplay,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Wait for the player to exit (bounded by the timeout)
    #[default]
    Wait,
    /// Return as soon as the player is running
    Detach,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub preference: Option<String>,
    pub timeout_ms: u64,
    pub mode: PlaybackMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let preference = std::env::var("CHUUNI_PLAYER").ok().filter(|s| !s.is_empty());
        let timeout_ms = std::env::var("CHUUNI_PLAYER_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30_000);
        Self {
            preference,
            timeout_ms,
            mode: PlaybackMode::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedPlayer {
    pub kind: PlayerKind,
    pub bin: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Player ran to completion
    Played { player: PlayerKind },
    /// Player was started and left running
    Spawned { player: PlayerKind, pid: Option<u32> },
    /// No installed player can handle the file
    NoPlayer,
}

pub type BinLookup = fn(&str) -> Option<PathBuf>;

/// Anything that can play a resolved asset.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, path: &Path, volume: f32) -> AudioResult<PlaybackOutcome>;
}

/// Pick a player for `format`: the preference when it is installed and
/// supports the format, else the first suitable one in the platform chain.
pub fn select_player(preference: Option<&str>, format: AudioFormat) -> Option<SelectedPlayer> {
    select_player_with(preference, format, get_from_path)
}

pub fn select_player_with(
    preference: Option<&str>,
    format: AudioFormat,
    lookup: BinLookup,
) -> Option<SelectedPlayer> {
    if let Some(pref) = preference {
        match PlayerKind::from_name(pref) {
            Some(kind) if kind.supports(format) => {
                if let Some(bin) = lookup(pref) {
                    return Some(SelectedPlayer { kind, bin });
                }
                debug!(target = "player", player = pref, "Preferred player not installed");
            }
            Some(_) => {
                debug!(target = "player", player = pref, ext = format.extension(), "Preferred player cannot play format");
            }
            None => {
                warn!(target = "player", player = pref, "Unknown player preference ignored");
            }
        }
    }

    PlayerKind::platform_chain()
        .iter()
        .filter(|k| k.supports(format))
        .find_map(|&kind| lookup(kind.binary()).map(|bin| SelectedPlayer { kind, bin }))
}

/// Looks up a binary by name on PATH; path-like names are checked directly.
pub fn get_from_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) || bin.contains('/') {
        let p = PathBuf::from(bin);
        return if p.is_file() { Some(p) } else { None };
    }

    let paths_os = std::env::var_os("PATH")?;
    std::env::split_paths(&paths_os).find_map(|dir| {
        let candidate = dir.join(bin);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{bin}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// Plays files by launching a system player binary.
pub struct CommandPlayer {
    cfg: PlayerConfig,
    lookup: BinLookup,
}

impl CommandPlayer {
    pub fn new(cfg: PlayerConfig) -> Self {
        Self::with_lookup(cfg, get_from_path)
    }

    pub fn with_lookup(cfg: PlayerConfig, lookup: BinLookup) -> Self {
        Self { cfg, lookup }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.cfg
    }
}

#[async_trait]
impl AudioSink for CommandPlayer {
    async fn play(&self, path: &Path, volume: f32) -> AudioResult<PlaybackOutcome> {
        if !path.is_file() {
            return Err(AudioError::NotFound(path.to_path_buf()));
        }
        let format =
            AudioFormat::from_path(path).ok_or_else(|| AudioError::UnsupportedFormat(path.to_path_buf()))?;

        let Some(selected) = select_player_with(self.cfg.preference.as_deref(), format, self.lookup)
        else {
            info!(target = "player", path = %path.display(), "No audio player found; skipping playback");
            return Ok(PlaybackOutcome::NoPlayer);
        };
        let kind = selected.kind;

        let mut cmd = Command::new(&selected.bin);
        cmd.args(kind.args(path, volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        debug!(target = "player", command = ?cmd, "Launching player");

        let mut child = cmd.spawn().map_err(|source| AudioError::Spawn {
            player: kind.binary().to_string(),
            source,
        })?;

        if self.cfg.mode == PlaybackMode::Detach {
            return Ok(PlaybackOutcome::Spawned {
                player: kind,
                pid: child.id(),
            });
        }

        let waited = timeout(Duration::from_millis(self.cfg.timeout_ms), child.wait()).await;
        match waited {
            Ok(status) => {
                let status = status?;
                if status.success() {
                    Ok(PlaybackOutcome::Played { player: kind })
                } else {
                    Err(AudioError::PlayerFailed {
                        player: kind.binary().to_string(),
                        status: status.to_string(),
                    })
                }
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(target = "player", error = %e, "Failed to stop timed-out player");
                }
                Err(AudioError::Timeout(self.cfg.timeout_ms))
            }
        }
    }
}
