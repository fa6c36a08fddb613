// Hook events
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ChuuniError;

/// Hook events a character can voice. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Notification,
    Stop,
}

impl HookEvent {
    pub const ALL: [HookEvent; 4] = [
        HookEvent::PreToolUse,
        HookEvent::PostToolUse,
        HookEvent::Notification,
        HookEvent::Stop,
    ];

    /// Lowercase identifier, also the asset file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "pretooluse",
            HookEvent::PostToolUse => "posttooluse",
            HookEvent::Notification => "notification",
            HookEvent::Stop => "stop",
        }
    }

    /// Name of the matching key under `hooks` in Claude Code's settings.json
    pub fn hook_name(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::Notification => "Notification",
            HookEvent::Stop => "Stop",
        }
    }

    /// Built-in lines used when a character has none of its own.
    pub fn default_lines(&self) -> &'static [&'static str] {
        match self {
            HookEvent::PreToolUse => &[
                "参る！",
                "いくぞ、全力で！",
                "我が力、解放する時が来た…",
            ],
            HookEvent::PostToolUse => &[
                "完璧だ…！全てが意図通りに…！",
                "フハハ！この力…本物だった",
                "ふっ、造作もない",
            ],
            HookEvent::Notification => &[
                "待機中…",
                "指示を待っている…",
                "我が主よ、命令を…",
            ],
            HookEvent::Stop => &[
                "任務完了。世界は救われた",
                "フハハ！完璧だ！",
                "これが…俺の全力だ",
            ],
        }
    }

    pub fn default_line(&self) -> &'static str {
        self.default_lines()
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = ChuuniError;

    /// Case-insensitive, so both `pretooluse` and `PreToolUse` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        HookEvent::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChuuniError::UnknownEvent(s.to_string()))
    }
}
