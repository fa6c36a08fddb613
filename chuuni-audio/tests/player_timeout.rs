//! Wait-mode timeout against a player that never finishes
//!
//! Kept in its own test binary: the fake player is a freshly written script,
//! and no other test may be spawning processes while it is written.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use chuuni_audio::player::get_from_path;
use chuuni_audio::{AudioError, AudioSink, CommandPlayer, PlaybackMode, PlayerConfig};

static STUCK_PLAYER: OnceLock<PathBuf> = OnceLock::new();

fn stuck_player(_: &str) -> Option<PathBuf> {
    STUCK_PLAYER.get().cloned()
}

#[tokio::test]
async fn wait_mode_kills_player_after_timeout() {
    if get_from_path("sh").is_none() || get_from_path("sleep").is_none() {
        return;
    }
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script = dir.path().join("stuck-player");
    fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    STUCK_PLAYER.set(script).unwrap();

    let asset = dir.path().join("stop.wav");
    fs::write(&asset, b"audio").unwrap();

    let player = CommandPlayer::with_lookup(
        PlayerConfig {
            preference: None,
            timeout_ms: 200,
            mode: PlaybackMode::Wait,
        },
        stuck_player,
    );

    let started = Instant::now();
    let err = player.play(&asset, 0.8).await.unwrap_err();
    assert!(matches!(err, AudioError::Timeout(200)), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}
