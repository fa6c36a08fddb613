mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chuuni_core::{ConfigPaths, HookEvent};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chuuni", version, about = "Anime character voices for Claude Code hooks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write config.toml and create the active character directory
    Init {
        #[arg(long, default_value = "default")]
        character: String,
        /// Playback volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f64>,
        /// Start with playback disabled
        #[arg(long)]
        disable: bool,
    },
    /// Print the audio file a character uses for EVENT
    Resolve {
        #[arg(value_parser = parse_event)]
        event: HookEvent,
        #[arg(short, long)]
        character: Option<String>,
    },
    /// Print the character line for EVENT and play its audio
    Play {
        #[arg(value_parser = parse_event)]
        event: HookEvent,
        #[arg(short, long)]
        character: Option<String>,
        /// Block until the player exits
        #[arg(long)]
        wait: bool,
        /// Ignore the per-event cooldown
        #[arg(long)]
        no_cooldown: bool,
    },
    /// Manage characters
    Character {
        #[command(subcommand)]
        action: CharacterCommand,
    },
    /// Show configuration, audio coverage and available players
    Status,
    /// Install (or remove) chuuni hooks in Claude Code settings
    Hook {
        #[arg(long)]
        remove: bool,
        /// Settings file (default: ~/.claude/settings.json)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CharacterCommand {
    /// List installed characters
    List,
    /// Switch the active character
    Use { name: String },
    /// Create a character directory with a template character.toml
    New { name: String },
}

fn parse_event(s: &str) -> Result<HookEvent, String> {
    s.parse().map_err(|_| {
        let valid: Vec<&str> = HookEvent::ALL.iter().map(|e| e.as_str()).collect();
        format!("unknown event {s:?} (expected one of: {})", valid.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Logging / tracing (stderr)
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = ConfigPaths::discover()?;

    let code = match cli.command {
        Command::Init {
            character,
            volume,
            disable,
        } => commands::init(&paths, &character, volume, disable)?,
        Command::Resolve { event, character } => commands::resolve(&paths, event, character)?,
        Command::Play {
            event,
            character,
            wait,
            no_cooldown,
        } => commands::play(&paths, event, character, wait, no_cooldown).await?,
        Command::Character { action } => match action {
            CharacterCommand::List => commands::character_list(&paths)?,
            CharacterCommand::Use { name } => commands::character_use(&paths, &name)?,
            CharacterCommand::New { name } => commands::character_new(&paths, &name)?,
        },
        Command::Status => commands::status(&paths)?,
        Command::Hook { remove, settings } => commands::hook(remove, settings)?,
    };
    Ok(code)
}
