// SPDX-License-Identifier: MIT
//
// Config file.
//
// Resolution order for the file itself:
//   1. --config PATH
//   2. $RECITAL_HOME/config.toml
//   3. ~/.config/recital/config.toml
//
// A missing file in the default locations means defaults. A path given on
// the command line has to exist. Command-line flags override whatever the
// file says; see cli.rs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use recital_stage::Settings;
use serde::Deserialize;

/// Everything `config.toml` can set.
///
/// ```toml
/// theme = "paper"
/// line_numbers = false
///
/// [settings]
/// wpm = 80
/// movie_mode = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub theme: Option<String>,
    pub line_numbers: bool,
    /// Lexer for files whose type can't be guessed.
    pub lexer: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            theme: None,
            line_numbers: true,
            lexer: None,
        }
    }
}

/// `$RECITAL_HOME`, else `~/.config/recital`.
pub fn recital_home() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("RECITAL_HOME") {
        return Some(PathBuf::from(home));
    }
    dirs::home_dir().map(|h| h.join(".config").join("recital"))
}

impl Config {
    /// Load from `explicit` if given, else the default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::load_from(path);
        }
        match recital_home() {
            Some(home) => Self::load_from(&home.join("config.toml")),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. Defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}
