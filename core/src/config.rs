use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::HookEvent;
use crate::{ChuuniError, Result};

pub const DEFAULT_CHARACTER: &str = "default";

/// Well-known files under the chuuni config directory
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub characters_dir: PathBuf,
    pub cooldown_file: PathBuf,
}

impl ConfigPaths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            config_file: config_dir.join("config.toml"),
            characters_dir: config_dir.join("characters"),
            cooldown_file: config_dir.join("cooldown.json"),
            config_dir,
        }
    }

    /// `CHUUNI_CONFIG_DIR`, else `~/.config/chuuni` on every platform.
    pub fn discover() -> Result<Self> {
        if let Some(dir) = std::env::var_os("CHUUNI_CONFIG_DIR").filter(|s| !s.is_empty()) {
            return Ok(Self::new(dir));
        }
        let home = dirs::home_dir().ok_or(ChuuniError::HomeDirUnavailable)?;
        Ok(Self::new(home.join(".config").join("chuuni")))
    }
}

/// User configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ChuuniConfig {
    pub active_character: String,
    pub characters_dir: PathBuf,
    /// Playback volume in [0.0, 1.0]
    pub volume: f64,
    pub enabled: bool,
    pub cooldown_seconds: f64,
    /// Per-event cooldown overrides, in seconds
    pub cooldowns: BTreeMap<HookEvent, f64>,
    /// Preferred player binary (e.g. "ffplay")
    pub player: Option<String>,
}

impl ChuuniConfig {
    pub fn defaults(paths: &ConfigPaths) -> Self {
        Self {
            active_character: DEFAULT_CHARACTER.to_string(),
            characters_dir: paths.characters_dir.clone(),
            volume: 0.8,
            enabled: true,
            cooldown_seconds: 3.0,
            cooldowns: BTreeMap::new(),
            player: None,
        }
    }

    /// Load configuration from `paths.config_file`, overlaying values onto
    /// defaults. `CHUUNI_CHARACTER` overrides the active character.
    pub fn load(paths: &ConfigPaths) -> Self {
        let mut cfg = Self::load_file(paths);
        if let Ok(c) = std::env::var("CHUUNI_CHARACTER") {
            if !c.is_empty() {
                cfg.active_character = c;
            }
        }
        cfg
    }

    /// File overlay only; unreadable or malformed files yield defaults.
    pub fn load_file(paths: &ConfigPaths) -> Self {
        let default = Self::defaults(paths);
        let p = &paths.config_file;
        if !p.exists() {
            tracing::debug!(target = "config", path = %p.display(), "No TOML config found; using defaults");
            return default;
        }
        match Self::try_load_file(p) {
            Ok(t) => t.overlay(default),
            Err(e) => {
                tracing::warn!(target = "config", path = %p.display(), error = %e, "Failed to load TOML config; using defaults");
                default
            }
        }
    }

    fn try_load_file(p: &Path) -> Result<ChuuniToml> {
        let s = fs::read_to_string(p)?;
        Ok(toml::from_str::<ChuuniToml>(&s)?)
    }

    pub fn save(&self, paths: &ConfigPaths) -> Result<()> {
        fs::create_dir_all(&paths.config_dir)?;
        let body = toml::to_string_pretty(&ChuuniToml::from_config(self, paths))?;
        fs::write(&paths.config_file, body)?;
        tracing::debug!(target = "config", path = %paths.config_file.display(), "Config saved");
        Ok(())
    }

    pub fn cooldown_for(&self, event: HookEvent) -> Duration {
        let secs = self
            .cooldowns
            .get(&event)
            .copied()
            .unwrap_or(self.cooldown_seconds);
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn active_character_dir(&self) -> PathBuf {
        self.characters_dir.join(&self.active_character)
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChuuniToml {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_character: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    // tables last so toml can serialize them
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cooldowns: BTreeMap<String, f64>,
}

impl ChuuniToml {
    fn overlay(self, mut base: ChuuniConfig) -> ChuuniConfig {
        if let Some(x) = self.active_character.filter(|s| !s.is_empty()) {
            base.active_character = x;
        }
        if let Some(x) = self.characters_dir {
            base.characters_dir = expand_home(&x);
        }
        if let Some(x) = self.volume {
            base.volume = if x.is_nan() { base.volume } else { x.clamp(0.0, 1.0) };
        }
        if let Some(x) = self.enabled {
            base.enabled = x;
        }
        if let Some(x) = self.cooldown_seconds {
            base.cooldown_seconds = x.max(0.0);
        }
        if let Some(x) = self.player.filter(|s| !s.is_empty()) {
            base.player = Some(x);
        }
        for (key, secs) in self.cooldowns {
            match key.parse::<HookEvent>() {
                Ok(event) => {
                    base.cooldowns.insert(event, secs.max(0.0));
                }
                Err(_) => {
                    tracing::warn!(target = "config", key = %key, "Ignoring cooldown for unknown event");
                }
            }
        }
        base
    }

    fn from_config(cfg: &ChuuniConfig, paths: &ConfigPaths) -> Self {
        Self {
            active_character: Some(cfg.active_character.clone()),
            // keep the file portable when the default location is in use
            characters_dir: (cfg.characters_dir != paths.characters_dir)
                .then(|| cfg.characters_dir.clone()),
            volume: Some(cfg.volume),
            enabled: Some(cfg.enabled),
            cooldown_seconds: Some(cfg.cooldown_seconds),
            player: cfg.player.clone(),
            cooldowns: cfg
                .cooldowns
                .iter()
                .map(|(e, s)| (e.as_str().to_string(), *s))
                .collect(),
        }
    }
}

/// Expand a leading `~/` against the home directory.
fn expand_home(p: &Path) -> PathBuf {
    if let Ok(rest) = p.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    p.to_path_buf()
}
