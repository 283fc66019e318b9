//! Scaffolding for a new deck: `deck.toml` plus a few sample slides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{DeckConfig, write_config};

pub const CONFIG_FILE: &str = "deck.toml";

const SAMPLE_SLIDES: &[(&str, &str)] = &[
    (
        "01-intro.md",
        "---\ntitle: Introduction\n---\n<h1>Welcome</h1>\n<p>Use the arrow keys to move between slides.</p>\n",
    ),
    (
        "02-details.md",
        "---\ntitle: Details\n---\n<h1>Details</h1>\n<p>Slides are ordered by their <code>order</code> metadata or filename prefix.</p>\n",
    ),
    (
        "03-end.md",
        "---\ntitle: Conclusion\n---\n<h1>Thanks!</h1>\n",
    ),
];

/// Canonical paths of a deck rooted at a directory.
#[derive(Debug, Clone)]
pub struct DeckPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub slides_dir: PathBuf,
}

impl DeckPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let slides_dir = DeckConfig::default().resolve_slides_dir(&root);
        Self {
            config_path: root.join(CONFIG_FILE),
            slides_dir,
            root,
        }
    }
}

/// Options for `init_deck`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config and sample slides.
    pub force: bool,
}

/// Write a default `deck.toml` and sample slides into `root`.
///
/// Fails if `deck.toml` already exists unless `options.force` is set.
pub fn init_deck(root: &Path, options: &InitOptions) -> Result<DeckPaths> {
    let paths = DeckPaths::new(root);
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "deck init: {} already exists (use --force to overwrite)",
            CONFIG_FILE
        ));
    }

    write_config(&paths.config_path, &DeckConfig::default())?;
    fs::create_dir_all(&paths.slides_dir)
        .with_context(|| format!("create directory {}", paths.slides_dir.display()))?;
    for (filename, contents) in SAMPLE_SLIDES {
        let path = paths.slides_dir.join(filename);
        if path.exists() && !options.force {
            continue;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    }

    Ok(paths)
}
