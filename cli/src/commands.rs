use std::path::PathBuf;
use std::process::ExitCode;

use chuuni_audio::player::get_from_path;
use chuuni_audio::{AudioSink, CommandPlayer, PlaybackMode, PlaybackOutcome, PlayerConfig, PlayerKind};
use chuuni_core::config::DEFAULT_CHARACTER;
use chuuni_core::hooks::{default_settings_path, inject_hooks, remove_hooks};
use chuuni_core::{
    validate_character_name, AssetResolver, AudioFormat, CharacterManager, ChuuniConfig, ConfigPaths,
    CooldownStore, HookEvent, ResolveError,
};
use tracing::{debug, info, warn};

type CmdResult = Result<ExitCode, Box<dyn std::error::Error>>;

pub fn init(paths: &ConfigPaths, character: &str, volume: Option<f64>, disable: bool) -> CmdResult {
    validate_character_name(character)?;

    let mut cfg = ChuuniConfig::load_file(paths);
    cfg.active_character = character.to_string();
    if let Some(v) = volume {
        cfg.volume = v.clamp(0.0, 1.0);
    }
    cfg.enabled = !disable;
    cfg.save(paths)?;

    let dir = CharacterManager::scaffold(&cfg.characters_dir, character)?;
    println!("Config written to {}", paths.config_file.display());
    println!("Character directory: {}", dir.display());
    println!();
    println!("Drop audio files named after events into that directory:");
    for event in HookEvent::ALL {
        println!("  {}.mp3", event.as_str());
    }
    println!();
    println!("Then run `chuuni hook` to connect Claude Code.");
    Ok(ExitCode::SUCCESS)
}

pub fn resolve(paths: &ConfigPaths, event: HookEvent, character: Option<String>) -> CmdResult {
    let cfg = ChuuniConfig::load(paths);
    let name = character.unwrap_or(cfg.active_character);
    let resolver = AssetResolver::new(&cfg.characters_dir);

    match resolver.resolve(&name, event) {
        Ok(path) => {
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_not_found() => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

/// Entry point for hook commands. Everything past argument parsing is
/// best effort: a missing asset or player never fails the hook.
pub async fn play(
    paths: &ConfigPaths,
    event: HookEvent,
    character: Option<String>,
    wait: bool,
    no_cooldown: bool,
) -> CmdResult {
    let cfg = ChuuniConfig::load(paths);

    let mut player_cfg = PlayerConfig::default();
    if player_cfg.preference.is_none() {
        player_cfg.preference = cfg.player.clone();
    }
    player_cfg.mode = if wait { PlaybackMode::Wait } else { PlaybackMode::Detach };
    let player = CommandPlayer::new(player_cfg);

    let outcome = run_play(paths, &cfg, event, character, no_cooldown, &player).await?;
    if let PlayOutcome::Spoke {
        line,
        asset,
        character_dir,
    } = outcome
    {
        println!("[{}] {line}", event.hook_name());
        if asset.is_none() {
            println!(
                "  (no audio: add {}.mp3 to {})",
                event.as_str(),
                character_dir.display()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, PartialEq)]
pub enum PlayOutcome {
    Disabled,
    CoolingDown,
    Spoke {
        line: String,
        asset: Option<PathBuf>,
        /// Character the line was taken from
        character_dir: PathBuf,
    },
}

pub async fn run_play(
    paths: &ConfigPaths,
    cfg: &ChuuniConfig,
    event: HookEvent,
    character: Option<String>,
    no_cooldown: bool,
    sink: &dyn AudioSink,
) -> Result<PlayOutcome, Box<dyn std::error::Error>> {
    if !cfg.enabled {
        info!(target = "chuuni", "Playback disabled in config");
        return Ok(PlayOutcome::Disabled);
    }

    if !no_cooldown {
        let store = CooldownStore::new(&paths.cooldown_file);
        match store.check_and_claim_now(event, cfg.cooldown_for(event)) {
            Ok(true) => {}
            Ok(false) => {
                debug!(target = "chuuni", event = %event, "Cooling down; skipping");
                return Ok(PlayOutcome::CoolingDown);
            }
            Err(e) => warn!(target = "chuuni", error = %e, "Cooldown state unavailable; playing anyway"),
        }
    }

    let mut name = character.unwrap_or_else(|| cfg.active_character.clone());
    if let Err(e) = validate_character_name(&name) {
        warn!(target = "chuuni", error = %e, fallback = DEFAULT_CHARACTER, "Invalid character name; using fallback");
        name = DEFAULT_CHARACTER.to_string();
    }
    let resolver = AssetResolver::new(&cfg.characters_dir);

    let asset = match resolver.resolve_with_fallback(&name, DEFAULT_CHARACTER, event) {
        Ok(path) => Some(path),
        Err(ResolveError::Io(e)) => {
            warn!(target = "chuuni", character = %name, error = %e, "Failed to scan character directory");
            None
        }
        Err(e) => {
            debug!(target = "chuuni", error = %e, "No asset to play");
            None
        }
    };

    // Line comes from whichever character supplied the audio
    let character_dir = asset
        .as_deref()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.characters_dir.join(&name));
    let line = CharacterManager::load_or_bare(&character_dir).line_for(event);

    if let Some(path) = &asset {
        match sink.play(path, cfg.volume as f32).await {
            Ok(PlaybackOutcome::NoPlayer) => {
                warn!(target = "chuuni", "No audio player found (install ffplay, mpg123 or paplay)");
            }
            Ok(outcome) => debug!(target = "chuuni", outcome = ?outcome, "Playback finished"),
            Err(e) => warn!(target = "chuuni", path = %path.display(), error = %e, "Playback failed"),
        }
    }

    Ok(PlayOutcome::Spoke {
        line,
        asset,
        character_dir,
    })
}

pub fn character_list(paths: &ConfigPaths) -> CmdResult {
    let cfg = ChuuniConfig::load(paths);
    let characters = CharacterManager::list_characters(&cfg.characters_dir);
    if characters.is_empty() {
        println!("No characters in {}", cfg.characters_dir.display());
        println!("Create one with `chuuni character new <name>`.");
        return Ok(ExitCode::SUCCESS);
    }

    let resolver = AssetResolver::new(&cfg.characters_dir);
    for c in characters {
        let dir_name = c
            .audio_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let marker = if dir_name == cfg.active_character { "*" } else { " " };
        let covered = resolver
            .resolve_all(&dir_name)
            .map(|all| all.iter().filter(|(_, p)| p.is_some()).count())
            .unwrap_or(0);
        println!(
            "{marker} {:<16} {:<20} audio {covered}/{}  {}",
            dir_name,
            c.display_name,
            HookEvent::ALL.len(),
            c.description
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub fn character_use(paths: &ConfigPaths, name: &str) -> CmdResult {
    validate_character_name(name)?;
    let mut cfg = ChuuniConfig::load_file(paths);
    if !cfg.characters_dir.join(name).is_dir() {
        eprintln!(
            "Character {name:?} not found in {}",
            cfg.characters_dir.display()
        );
        return Ok(ExitCode::FAILURE);
    }
    cfg.active_character = name.to_string();
    cfg.save(paths)?;
    println!("Active character: {name}");
    Ok(ExitCode::SUCCESS)
}

pub fn character_new(paths: &ConfigPaths, name: &str) -> CmdResult {
    let cfg = ChuuniConfig::load(paths);
    let dir = CharacterManager::scaffold(&cfg.characters_dir, name)?;
    println!("Created {}", dir.display());
    println!("Edit character.toml and add <event>.mp3 files, then `chuuni character use {name}`.");
    Ok(ExitCode::SUCCESS)
}

pub fn status(paths: &ConfigPaths) -> CmdResult {
    let cfg = ChuuniConfig::load(paths);

    println!("Config");
    println!("  file        {}", paths.config_file.display());
    println!("  enabled     {}", cfg.enabled);
    println!("  volume      {:.2}", cfg.volume);
    println!("  cooldown    {}s", cfg.cooldown_seconds);
    for (event, secs) in &cfg.cooldowns {
        println!("    {:<12} {secs}s", event.as_str());
    }
    println!("  characters  {}", cfg.characters_dir.display());

    println!();
    println!("Character: {}", cfg.active_character);
    let resolver = AssetResolver::new(&cfg.characters_dir);
    match resolver.resolve_all(&cfg.active_character) {
        Ok(assets) => {
            let character = CharacterManager::load_or_bare(&cfg.active_character_dir());
            if character.display_name != cfg.active_character {
                println!("  name        {}", character.display_name);
            }
            for (event, path) in assets {
                match path {
                    Some(p) => println!("  {:<12} {}", event.as_str(), p.display()),
                    None => println!("  {:<12} (missing)", event.as_str()),
                }
            }
        }
        Err(e) if e.is_not_found() => println!("  {e}"),
        Err(e) => return Err(e.into()),
    }

    println!();
    println!("Players");
    for kind in PlayerKind::platform_chain() {
        let formats: Vec<&str> = AudioFormat::ALL
            .into_iter()
            .filter(|f| kind.supports(*f))
            .map(|f| f.extension())
            .collect();
        match get_from_path(kind.binary()) {
            Some(bin) => println!("  {:<8} {}  [{}]", kind.binary(), bin.display(), formats.join(" ")),
            None => println!("  {:<8} (not installed)", kind.binary()),
        }
    }
    if let Some(p) = &cfg.player {
        println!("  preferred  {p}");
    }
    Ok(ExitCode::SUCCESS)
}

pub fn hook(remove: bool, settings: Option<PathBuf>) -> CmdResult {
    let settings_path = match settings {
        Some(p) => p,
        None => default_settings_path()?,
    };

    if remove {
        let report = remove_hooks(&settings_path)?;
        if report.removed == 0 {
            println!("No chuuni hooks in {}", report.settings_path.display());
        } else {
            println!(
                "Removed {} chuuni hook(s) from {}",
                report.removed,
                report.settings_path.display()
            );
        }
        if let Some(b) = report.backup {
            println!("Backup: {}", b.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let bin = std::env::current_exe()?;
    let report = inject_hooks(&settings_path, &bin.to_string_lossy())?;
    println!("Hooks written to {}", report.settings_path.display());
    for (hook, command) in &report.injected {
        println!("  {hook:<12} {command}");
    }
    if let Some(b) = report.backup {
        println!("Backup: {}", b.display());
    }
    Ok(ExitCode::SUCCESS)
}
