//! `deck` command-line interface.
//!
//! Inspects a slide deck described by `deck.toml`: scaffolds a new deck,
//! prints the ordered slide sequence, validates it, and shows the navigation
//! state the server would compute for a slide id. With `multi_deck = true`,
//! `--deck` picks which subdirectory deck to inspect.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck::core::navigation::resolve;
use deck::exit_codes;
use deck::io::config::load_config;
use deck::io::init::{CONFIG_FILE, InitOptions, init_deck};
use deck::io::library::{DeckLibrary, discover_decks};
use deck::io::registry::SlideRegistry;
use deck::logging;
use tracing::debug;

#[derive(Parser)]
#[command(name = "deck", version, about = "Slide deck discovery and navigation")]
struct Cli {
    /// Path to the deck configuration file.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Deck to inspect when the config enables `multi_deck`.
    #[arg(long, global = true)]
    deck: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `deck.toml` and sample slides into the config's directory.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Print deck names found under the slides directory (multi-deck configs).
    Decks,
    /// Print slides in presentation order.
    List,
    /// Check that the slide source is readable and ids are unique.
    Validate,
    /// Print the navigation state for a slide id as JSON.
    Nav {
        /// Slide id; empty or unknown ids resolve to the first slide.
        #[arg(default_value = "")]
        slide_id: String,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let base_dir = config_dir(&cli.config);
    debug!(config = %cli.config.display(), "deck command");
    let target = Target {
        config: &cli.config,
        base_dir: &base_dir,
        deck: cli.deck.as_deref(),
    };
    match cli.command {
        Command::Init { force } => cmd_init(&base_dir, force),
        Command::Decks => cmd_decks(&target),
        Command::List => cmd_list(&target),
        Command::Validate => cmd_validate(&target),
        Command::Nav { slide_id } => cmd_nav(&target, &slide_id),
    }
}

/// Directory relative paths in the config are resolved against.
fn config_dir(config: &Path) -> PathBuf {
    match config.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Config location plus the `--deck` selection.
struct Target<'a> {
    config: &'a Path,
    base_dir: &'a Path,
    deck: Option<&'a str>,
}

impl Target<'_> {
    fn registry(&self) -> Result<Arc<SlideRegistry>> {
        let config = load_config(self.config)?;
        let library = DeckLibrary::from_config(&config, self.base_dir);
        let deck = library.select(self.deck)?;
        Ok(Arc::clone(deck.registry()))
    }
}

fn cmd_init(base_dir: &Path, force: bool) -> Result<i32> {
    let paths = init_deck(base_dir, &InitOptions { force })?;
    println!("wrote {}", paths.config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_decks(target: &Target<'_>) -> Result<i32> {
    let config = load_config(target.config)?;
    if !config.multi_deck {
        eprintln!("multi_deck is not enabled; the config describes a single deck");
        return Ok(exit_codes::INVALID);
    }
    let root = config.resolve_slides_dir(target.base_dir);
    let names = discover_decks(&root)?;
    if names.is_empty() {
        eprintln!("no decks found in {}", root.display());
        return Ok(exit_codes::EMPTY);
    }
    for name in names {
        println!("{}", name);
    }
    Ok(exit_codes::OK)
}

fn cmd_list(target: &Target<'_>) -> Result<i32> {
    let sequence = target.registry()?.try_list()?;
    for (index, slide) in sequence.iter().enumerate() {
        println!("{}\t{}\t{}\t{}", index, slide.id, slide.order, slide.title);
    }
    Ok(exit_codes::OK)
}

fn cmd_validate(target: &Target<'_>) -> Result<i32> {
    let sequence = target
        .registry()?
        .try_list()
        .context("invalid slide deck")?;
    if sequence.is_empty() {
        eprintln!("no slides found");
        return Ok(exit_codes::EMPTY);
    }
    println!("ok: {} slides", sequence.len());
    Ok(exit_codes::OK)
}

fn cmd_nav(target: &Target<'_>, slide_id: &str) -> Result<i32> {
    let sequence = target.registry()?.try_list()?;
    let navigation = resolve(&sequence, slide_id);
    let json = serde_json::to_string_pretty(&navigation).context("serialize navigation")?;
    println!("{}", json);
    Ok(exit_codes::OK)
}
