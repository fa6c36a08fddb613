//! Claude Code hook wiring: generate, inject, and remove.
//!
//! Hook name → event
//! - `PreToolUse`   → `pretooluse`
//! - `PostToolUse`  → `posttooluse`
//! - `Notification` → `notification`
//! - `Stop`         → `stop`
//!
//! Every injected entry runs `<bin> play <event>`. Entries are recognised as
//! ours when each of their commands starts with a program named `chuuni`, so
//! re-injection never duplicates them and removal never touches user hooks.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::event::HookEvent;
use crate::{ChuuniError, Result};

const PROGRAM_NAMES: [&str; 2] = ["chuuni", "chuuni.exe"];

#[derive(Debug, Clone, PartialEq)]
pub struct InjectReport {
    pub settings_path: PathBuf,
    /// Backup of the previous file, absent when the file was created
    pub backup: Option<PathBuf>,
    /// Injected `(hook name, command)` pairs
    pub injected: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveReport {
    pub settings_path: PathBuf,
    pub backup: Option<PathBuf>,
    pub removed: usize,
}

/// `~/.claude/settings.json`
pub fn default_settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ChuuniError::HomeDirUnavailable)?;
    Ok(home.join(".claude").join("settings.json"))
}

/// The `hooks` object chuuni contributes, keyed by hook name.
pub fn generate_hooks_config(bin: &str) -> Map<String, Value> {
    HookEvent::ALL
        .into_iter()
        .map(|event| {
            let entry = json!({
                "matcher": "",
                "hooks": [{ "type": "command", "command": play_command(bin, event) }],
            });
            (event.hook_name().to_string(), Value::Array(vec![entry]))
        })
        .collect()
}

fn play_command(bin: &str, event: HookEvent) -> String {
    if bin.contains(char::is_whitespace) {
        format!("\"{bin}\" play {event}")
    } else {
        format!("{bin} play {event}")
    }
}

/// Inject chuuni hooks into the settings file at `settings_path`.
///
/// The previous file is copied to `settings.json.bak` first. Stale chuuni
/// entries are dropped before fresh ones are appended, so repeated runs are
/// idempotent. A file that is not a JSON object is left untouched and
/// reported as an error.
pub fn inject_hooks(settings_path: &Path, bin: &str) -> Result<InjectReport> {
    let existing = read_settings(settings_path)?;
    let backup = match existing {
        Some(_) => Some(backup(settings_path)?),
        None => None,
    };
    let mut settings = existing.unwrap_or_default();

    let mut hooks = take_hooks(&mut settings)?;
    strip_chuuni_entries(&mut hooks);

    let fresh = generate_hooks_config(bin);
    let mut injected = Vec::new();
    for (name, entries) in fresh {
        let Value::Array(entries) = entries else {
            continue;
        };
        for entry in &entries {
            for cmd in commands(entry) {
                injected.push((name.clone(), cmd.to_string()));
            }
        }
        match hooks.entry(name).or_insert_with(|| Value::Array(Vec::new())) {
            Value::Array(list) => list.extend(entries),
            other => *other = Value::Array(entries),
        }
    }

    drop_empty_lists(&mut hooks);
    settings.insert("hooks".to_string(), Value::Object(hooks));
    write_settings(settings_path, &settings)?;

    info!(target = "hooks", path = %settings_path.display(), entries = injected.len(), "Injected hooks");
    Ok(InjectReport {
        settings_path: settings_path.to_path_buf(),
        backup,
        injected,
    })
}

/// Remove every chuuni entry from the settings file, leaving user hooks alone.
pub fn remove_hooks(settings_path: &Path) -> Result<RemoveReport> {
    let Some(mut settings) = read_settings(settings_path)? else {
        debug!(target = "hooks", path = %settings_path.display(), "Settings file missing; nothing to remove");
        return Ok(RemoveReport {
            settings_path: settings_path.to_path_buf(),
            backup: None,
            removed: 0,
        });
    };

    let mut hooks = take_hooks(&mut settings)?;
    let removed = strip_chuuni_entries(&mut hooks);
    drop_empty_lists(&mut hooks);
    if !hooks.is_empty() {
        settings.insert("hooks".to_string(), Value::Object(hooks));
    }

    let backup = backup(settings_path)?;
    write_settings(settings_path, &settings)?;

    info!(target = "hooks", path = %settings_path.display(), removed, "Removed hooks");
    Ok(RemoveReport {
        settings_path: settings_path.to_path_buf(),
        backup: Some(backup),
        removed,
    })
}

/// True when the entry has commands and every one of them runs chuuni.
pub fn is_chuuni_entry(entry: &Value) -> bool {
    let cmds: Vec<&str> = commands(entry).collect();
    !cmds.is_empty() && cmds.iter().all(|c| program_name(c).is_some_and(|p| PROGRAM_NAMES.contains(&p)))
}

fn commands(entry: &Value) -> impl Iterator<Item = &str> {
    entry
        .get("hooks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|h| h.get("command").and_then(Value::as_str))
        .filter(|c| !c.trim().is_empty())
}

/// File name of the program a command line starts with (quotes allowed).
fn program_name(command: &str) -> Option<&str> {
    let command = command.trim_start();
    let program = match command.strip_prefix('"') {
        Some(rest) => rest.split('"').next()?,
        None => command.split_whitespace().next()?,
    };
    program.rsplit(['/', '\\']).next()
}

fn read_settings(path: &Path) -> Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Some(Map::new()));
    }
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ChuuniError::SettingsError(format!(
            "{} is not a JSON object",
            path.display()
        ))),
    }
}

fn take_hooks(settings: &mut Map<String, Value>) -> Result<Map<String, Value>> {
    match settings.remove("hooks") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(ChuuniError::SettingsError(
            "\"hooks\" is not a JSON object".to_string(),
        )),
    }
}

/// Returns the number of entries removed.
fn strip_chuuni_entries(hooks: &mut Map<String, Value>) -> usize {
    let mut removed = 0;
    for list in hooks.values_mut() {
        if let Value::Array(entries) = list {
            let before = entries.len();
            entries.retain(|e| !is_chuuni_entry(e));
            removed += before - entries.len();
        }
    }
    removed
}

fn drop_empty_lists(hooks: &mut Map<String, Value>) {
    hooks.retain(|_, v| !matches!(v, Value::Array(a) if a.is_empty()));
}

fn backup(path: &Path) -> Result<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    let backup = PathBuf::from(name);
    fs::copy(path, &backup)?;
    debug!(target = "hooks", path = %backup.display(), "Backed up settings");
    Ok(backup)
}

fn write_settings(path: &Path, settings: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = serde_json::to_string_pretty(settings)?;
    body.push('\n');
    fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_name() {
        assert_eq!(program_name("chuuni play stop"), Some("chuuni"));
        assert_eq!(program_name("/home/u/.cargo/bin/chuuni play stop"), Some("chuuni"));
        assert_eq!(program_name("\"C:\\Program Files\\chuuni.exe\" play stop"), Some("chuuni.exe"));
        assert_eq!(program_name("  "), None);
    }

    #[test]
    fn test_is_chuuni_entry() {
        let ours = json!({"matcher": "", "hooks": [{"type": "command", "command": "/bin/chuuni play stop"}]});
        let theirs = json!({"matcher": "Bash", "hooks": [{"type": "command", "command": "notify-send done"}]});
        let mixed = json!({"hooks": [
            {"type": "command", "command": "chuuni play stop"},
            {"type": "command", "command": "say hi"},
        ]});
        let empty = json!({"matcher": "", "hooks": []});
        assert!(is_chuuni_entry(&ours));
        assert!(!is_chuuni_entry(&theirs));
        assert!(!is_chuuni_entry(&mixed));
        assert!(!is_chuuni_entry(&empty));
    }

    #[test]
    fn test_generate_covers_every_event() {
        let cfg = generate_hooks_config("/usr/local/bin/chuuni");
        assert_eq!(cfg.len(), HookEvent::ALL.len());
        let stop = &cfg["Stop"][0];
        assert_eq!(stop["hooks"][0]["command"], "/usr/local/bin/chuuni play stop");
        assert!(is_chuuni_entry(stop));

        let quoted = generate_hooks_config("/opt/my tools/chuuni");
        assert_eq!(
            quoted["PreToolUse"][0]["hooks"][0]["command"],
            "\"/opt/my tools/chuuni\" play pretooluse"
        );
        assert!(is_chuuni_entry(&quoted["PreToolUse"][0]));
    }
}
