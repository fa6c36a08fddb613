//! Installed characters.
//!
//! Each immediate subdirectory of the characters root is a character. An
//! optional `character.toml` inside it carries display metadata and custom
//! lines:
//!
//! ```toml
//! [character]
//! name         = "default"
//! display_name = "Default"
//! description  = ""
//!
//! [lines]
//! pretooluse = ["参る！", "いくぞ、全力で！"]
//! stop       = ["任務完了。世界は救われた"]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::HookEvent;
use crate::Result;

pub const CHARACTER_FILE: &str = "character.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub audio_dir: PathBuf,
    /// Custom lines keyed by event identifier
    pub lines: HashMap<String, Vec<String>>,
}

impl Character {
    /// Character with no metadata, named after its directory.
    pub fn bare(audio_dir: &Path) -> Self {
        let name = dir_name(audio_dir);
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            audio_dir: audio_dir.to_path_buf(),
            lines: HashMap::new(),
        }
    }

    /// A custom line for `event` when the character has one, else a built-in line.
    pub fn line_for(&self, event: HookEvent) -> String {
        self.lines
            .get(event.as_str())
            .and_then(|lines| lines.choose(&mut rand::rng()))
            .cloned()
            .unwrap_or_else(|| event.default_line().to_string())
    }

    /// Number of events with at least one custom line.
    pub fn custom_line_count(&self) -> usize {
        HookEvent::ALL
            .iter()
            .filter(|e| self.lines.get(e.as_str()).is_some_and(|l| !l.is_empty()))
            .count()
    }
}

// =========================
// character.toml
// =========================

#[derive(Debug, Default, Deserialize)]
struct CharacterToml {
    #[serde(default)]
    character: CharacterMetaToml,
    #[serde(default)]
    lines: HashMap<String, toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CharacterMetaToml {
    name: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
}

impl CharacterToml {
    fn apply(self, mut base: Character) -> Character {
        if let Some(x) = self.character.name {
            base.name = x;
        }
        if let Some(x) = self.character.display_name {
            base.display_name = x;
        }
        if let Some(x) = self.character.description {
            base.description = x;
        }
        // Only arrays made entirely of strings count
        for (key, value) in self.lines {
            let Some(items) = value.as_array() else {
                continue;
            };
            let lines: Option<Vec<String>> = items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect();
            if let Some(lines) = lines {
                base.lines.insert(key, lines);
            }
        }
        base
    }
}

pub struct CharacterManager;

impl CharacterManager {
    /// Load a character from `path`, reading `character.toml` when present.
    pub fn load_from_dir(path: &Path) -> Result<Character> {
        let base = Character::bare(path);
        let toml_file = path.join(CHARACTER_FILE);
        if !toml_file.exists() {
            return Ok(base);
        }
        let raw = fs::read_to_string(&toml_file)?;
        let parsed: CharacterToml = toml::from_str(&raw)?;
        Ok(parsed.apply(base))
    }

    /// Load a character, falling back to a bare one if `character.toml` is unreadable.
    pub fn load_or_bare(path: &Path) -> Character {
        Self::load_from_dir(path).unwrap_or_else(|e| {
            warn!(target = "character", path = %path.display(), error = %e, "Failed to load character.toml; using bare character");
            Character::bare(path)
        })
    }

    /// Every character under `base_dir`, sorted by directory name.
    pub fn list_characters(base_dir: &Path) -> Vec<Character> {
        let entries = match fs::read_dir(base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(target = "character", path = %base_dir.display(), error = %e, "Characters root not readable");
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        dirs.iter()
            .filter_map(|dir| match Self::load_from_dir(dir) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(target = "character", path = %dir.display(), error = %e, "Skipping unreadable character");
                    None
                }
            })
            .collect()
    }

    /// Create `<base_dir>/<name>/` with a template `character.toml`.
    /// Existing files are left untouched.
    pub fn scaffold(base_dir: &Path, name: &str) -> Result<PathBuf> {
        crate::resolver::validate_character_name(name)?;
        let dir = base_dir.join(name);
        fs::create_dir_all(&dir)?;
        let toml_file = dir.join(CHARACTER_FILE);
        if !toml_file.exists() {
            fs::write(&toml_file, character_template(name)?)?;
            debug!(target = "character", path = %toml_file.display(), "Wrote character template");
        }
        Ok(dir)
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct TemplateToml<'a> {
    character: TemplateMetaToml<'a>,
    lines: BTreeMap<&'static str, &'static [&'static str]>,
}

#[derive(Serialize)]
struct TemplateMetaToml<'a> {
    name: &'a str,
    display_name: &'a str,
    description: &'a str,
}

fn character_template(name: &str) -> Result<String> {
    let template = TemplateToml {
        character: TemplateMetaToml {
            name,
            display_name: name,
            description: "",
        },
        lines: HookEvent::ALL
            .into_iter()
            .map(|e| (e.as_str(), e.default_lines()))
            .collect(),
    };
    Ok(toml::to_string_pretty(&template)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_back() {
        let parsed: CharacterToml = toml::from_str(&character_template("hero").unwrap()).unwrap();
        let c = parsed.apply(Character::bare(Path::new("/tmp/hero")));
        assert_eq!(c.name, "hero");
        assert_eq!(c.custom_line_count(), HookEvent::ALL.len());
    }

    #[test]
    fn test_template_escapes_name() {
        let raw = character_template("say \"hi\" \\o/").unwrap();
        let parsed: CharacterToml = toml::from_str(&raw).unwrap();
        let c = parsed.apply(Character::bare(Path::new("/tmp/x")));
        assert_eq!(c.name, "say \"hi\" \\o/");
        assert_eq!(c.display_name, c.name);
    }

    #[test]
    fn test_line_for_falls_back_to_defaults() {
        let mut c = Character::bare(Path::new("/tmp/plain"));
        assert!(HookEvent::Stop.default_lines().contains(&c.line_for(HookEvent::Stop).as_str()));

        c.lines.insert("stop".into(), vec!["done.".into()]);
        assert_eq!(c.line_for(HookEvent::Stop), "done.");

        c.lines.insert("stop".into(), vec![]);
        assert!(HookEvent::Stop.default_lines().contains(&c.line_for(HookEvent::Stop).as_str()));
    }
}
