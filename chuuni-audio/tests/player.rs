//! Player selection and command playback
//!
//! Lookups are swapped for fakes so the tests never depend on which audio
//! players happen to be installed.

use std::fs;
use std::path::{Path, PathBuf};

use chuuni_audio::player::{get_from_path, select_player_with};
use chuuni_audio::{
    AudioError, AudioSink, CommandPlayer, PlaybackMode, PlaybackOutcome, PlayerConfig, PlayerKind,
};
use chuuni_core::AudioFormat;
use tempfile::TempDir;

fn no_players(_: &str) -> Option<PathBuf> {
    None
}

fn all_players(bin: &str) -> Option<PathBuf> {
    Some(Path::new("/fake/bin").join(bin))
}

fn only_ffplay(bin: &str) -> Option<PathBuf> {
    (bin == "ffplay").then(|| PathBuf::from("/fake/bin/ffplay"))
}

// every player resolves to `true` / `false`, which ignore their arguments
fn true_players(_: &str) -> Option<PathBuf> {
    get_from_path("true")
}

fn false_players(_: &str) -> Option<PathBuf> {
    get_from_path("false")
}

fn config(mode: PlaybackMode) -> PlayerConfig {
    PlayerConfig {
        preference: None,
        timeout_ms: 5_000,
        mode,
    }
}

fn create_asset(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    fs::write(&path, b"audio").unwrap();
    (dir, path)
}

#[test]
fn args_map_volume_per_player() {
    let path = Path::new("/a/stop.wav");
    let strs = |kind: PlayerKind, v: f32| -> Vec<String> {
        kind.args(path, v)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    };

    assert_eq!(strs(PlayerKind::Afplay, 0.5), vec!["-v", "0.50", "/a/stop.wav"]);
    assert_eq!(strs(PlayerKind::Paplay, 1.0), vec!["--volume=65536", "/a/stop.wav"]);
    assert_eq!(strs(PlayerKind::Paplay, 3.0), vec!["--volume=65536", "/a/stop.wav"]);
    assert_eq!(strs(PlayerKind::Aplay, 0.2), vec!["-q", "/a/stop.wav"]);
    assert_eq!(strs(PlayerKind::Mpg123, 0.5), vec!["-q", "-f", "16384", "/a/stop.wav"]);
    assert_eq!(
        strs(PlayerKind::Ffplay, -1.0),
        vec!["-nodisp", "-autoexit", "-loglevel", "quiet", "-volume", "0", "/a/stop.wav"]
    );
}

#[test]
fn player_names_parse_from_paths() {
    assert_eq!(PlayerKind::from_name("ffplay"), Some(PlayerKind::Ffplay));
    assert_eq!(PlayerKind::from_name("/usr/bin/mpg123"), Some(PlayerKind::Mpg123));
    assert_eq!(PlayerKind::from_name("vlc"), None);
    assert_eq!(PlayerKind::from_name(""), None);
}

#[test]
fn format_support() {
    assert!(PlayerKind::Ffplay.supports(AudioFormat::Ogg));
    assert!(PlayerKind::Mpg123.supports(AudioFormat::Mp3));
    assert!(!PlayerKind::Mpg123.supports(AudioFormat::Wav));
    assert!(!PlayerKind::Aplay.supports(AudioFormat::Mp3));
    assert!(!PlayerKind::Afplay.supports(AudioFormat::Ogg));
}

#[test]
fn every_chain_can_play_every_format() {
    for format in AudioFormat::ALL {
        assert!(PlayerKind::platform_chain().iter().any(|k| k.supports(format)));
    }
}

#[cfg(not(target_os = "macos"))]
#[test]
fn chain_picks_first_capable_player() {
    let pick = |f| select_player_with(None, f, all_players).map(|s| s.kind);
    assert_eq!(pick(AudioFormat::Wav), Some(PlayerKind::Paplay));
    assert_eq!(pick(AudioFormat::Ogg), Some(PlayerKind::Paplay));
    assert_eq!(pick(AudioFormat::Mp3), Some(PlayerKind::Mpg123));
}

#[test]
fn preference_wins_when_installed_and_capable() {
    let s = select_player_with(Some("ffplay"), AudioFormat::Wav, all_players).unwrap();
    assert_eq!(s.kind, PlayerKind::Ffplay);
    assert_eq!(s.bin, PathBuf::from("/fake/bin/ffplay"));

    // aplay cannot play mp3, so the preference is skipped
    let s = select_player_with(Some("aplay"), AudioFormat::Mp3, all_players).unwrap();
    assert_ne!(s.kind, PlayerKind::Aplay);

    let s = select_player_with(Some("vlc"), AudioFormat::Mp3, only_ffplay).unwrap();
    assert_eq!(s.kind, PlayerKind::Ffplay);
}

#[test]
fn nothing_installed_selects_nothing() {
    for format in AudioFormat::ALL {
        assert!(select_player_with(Some("ffplay"), format, no_players).is_none());
    }
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let player = CommandPlayer::with_lookup(config(PlaybackMode::Wait), all_players);
    let err = player.play(Path::new("/no/such/stop.mp3"), 0.8).await.unwrap_err();
    assert!(matches!(err, AudioError::NotFound(_)));
}

#[tokio::test]
async fn unsupported_format_is_an_error() {
    let (_dir, path) = create_asset("stop.flac");
    let player = CommandPlayer::with_lookup(config(PlaybackMode::Wait), all_players);
    let err = player.play(&path, 0.8).await.unwrap_err();
    assert!(matches!(err, AudioError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn no_player_degrades_gracefully() {
    let (_dir, path) = create_asset("stop.mp3");
    let player = CommandPlayer::with_lookup(config(PlaybackMode::Wait), no_players);
    assert_eq!(player.play(&path, 0.8).await.unwrap(), PlaybackOutcome::NoPlayer);
}

#[cfg(unix)]
#[tokio::test]
async fn successful_player_reports_played() {
    if get_from_path("true").is_none() {
        return;
    }
    let (_dir, path) = create_asset("stop.wav");
    let player = CommandPlayer::with_lookup(config(PlaybackMode::Wait), true_players);
    let outcome = player.play(&path, 0.8).await.unwrap();
    assert!(matches!(outcome, PlaybackOutcome::Played { .. }), "{outcome:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_player_is_an_error() {
    if get_from_path("false").is_none() {
        return;
    }
    let (_dir, path) = create_asset("stop.wav");
    let player = CommandPlayer::with_lookup(config(PlaybackMode::Wait), false_players);
    let err = player.play(&path, 0.8).await.unwrap_err();
    assert!(matches!(err, AudioError::PlayerFailed { .. }), "{err:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn detached_player_returns_after_spawn() {
    if get_from_path("true").is_none() {
        return;
    }
    let (_dir, path) = create_asset("notification.wav");
    let player = CommandPlayer::with_lookup(config(PlaybackMode::Detach), true_players);
    let outcome = player.play(&path, 0.8).await.unwrap();
    assert!(matches!(outcome, PlaybackOutcome::Spawned { .. }), "{outcome:?}");
}
