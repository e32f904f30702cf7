// SPDX-License-Identifier: MIT
//
// Command-line entry and dispatch.
//
//   recital play FILE [--split FILE] [--highlight 3-5] [--wpm 90] ...
//   recital export FILE --format html -o out.html
//   recital lexers
//   recital themes
//
// Flags win over config.toml, which wins over built-in defaults.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use recital_stage::engine::Engine;
use recital_stage::export::{TextRenderer, formatter};
use recital_stage::{Content, LexerRegistry, Settings, ViewportId};
use recital_term::event_loop::{EventLoop, LoopConfig};
use recital_term::terminal::{self, Size};
use recital_theme::{Theme, builtin_names, builtin_theme};
use tracing::info;

use crate::config::Config;
use crate::player::{self, Player};
use crate::script::{self, SourceOptions};

#[derive(Parser)]
#[command(name = "recital")]
#[command(version)]
#[command(about = "Play source code as an animated presentation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/recital/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Present a file in the terminal
    Play(PlayArgs),

    /// Write a file out highlighted, without animation
    Export(ExportArgs),

    /// List the available lexers
    Lexers,

    /// List the built-in themes
    Themes,
}

/// What to show and how it looks.
#[derive(clap::Args, Debug, Clone)]
struct SourceArgs {
    /// The source file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Lexer to use instead of guessing
    #[arg(short, long)]
    lexer: Option<String>,

    /// Number the first line N
    #[arg(long, value_name = "N")]
    start_line: Option<usize>,

    /// Show only the named function, class or method (e.g. `Parser.parse`)
    #[arg(long, value_name = "NAME")]
    subset: Option<String>,

    /// Highlight these lines at the end (e.g. `3`, `2-4`, `1,5,7-9`)
    #[arg(long, value_name = "ROWS")]
    highlight: Option<String>,

    /// Hide line numbers
    #[arg(long)]
    no_numbers: bool,

    /// Colour theme
    #[arg(short, long)]
    theme: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
struct PlayArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// A second file, played below the first
    #[arg(long, value_name = "FILE")]
    split: Option<PathBuf>,

    /// Typing speed in words per minute
    #[arg(long, conflicts_with = "delay")]
    wpm: Option<u64>,

    /// Milliseconds between typed characters
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Random extra delay per character, up to this many milliseconds
    #[arg(long, value_name = "MS")]
    variance: Option<u64>,

    /// Play hands-free: waits become timed pauses
    #[arg(long)]
    movie: bool,

    /// Seed for the typing rhythm
    #[arg(long)]
    seed: Option<u64>,

    /// Print frames as plain text instead of taking over the terminal
    #[arg(long)]
    plain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Ansi,
    Html,
    Rtf,
}

impl Format {
    const fn name(self) -> &'static str {
        match self {
            Self::Ansi => "ansi",
            Self::Html => "html",
            Self::Rtf => "rtf",
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "ansi")]
    format: Format,

    /// Write here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let registry = LexerRegistry::with_builtins();

    match cli.command {
        Commands::Play(args) => play(&args, &config, &registry),
        Commands::Export(args) => export(&args, &config, &registry),
        Commands::Lexers => {
            let mut out = io::stdout().lock();
            for name in registry.names() {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
        Commands::Themes => {
            let mut out = io::stdout().lock();
            for name in builtin_names() {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

fn resolve_theme(flag: Option<&str>, config: &Config) -> Result<Theme> {
    let name = flag.or(config.theme.as_deref()).unwrap_or("monokai");
    match builtin_theme(name) {
        Some(theme) => Ok(theme),
        None => bail!(
            "unknown theme `{name}` (available: {})",
            builtin_names().join(", ")
        ),
    }
}

fn source_options(args: &SourceArgs, config: &Config) -> SourceOptions {
    SourceOptions {
        lexer: args.lexer.clone().or_else(|| config.lexer.clone()),
        start_line: args.start_line,
        subset: args.subset.clone(),
    }
}

/// The second file of a split is loaded whole with its own numbering. The
/// source flags describe the first file only.
fn split_options(config: &Config) -> SourceOptions {
    SourceOptions {
        lexer: config.lexer.clone(),
        ..SourceOptions::default()
    }
}

fn load(path: &Path, opts: &SourceOptions, registry: &LexerRegistry) -> Result<Content> {
    let content = script::load(path, opts, registry)?;
    info!(
        path = %path.display(),
        lexer = content.lexer().name(),
        lines = content.len(),
        "source loaded"
    );
    Ok(content)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

fn play_settings(args: &PlayArgs, config: &Config) -> Settings {
    let mut settings = config.settings.clone();
    if let Some(wpm) = args.wpm {
        settings.wpm = Some(wpm);
    }
    if let Some(delay) = args.delay {
        settings.delay_ms = delay;
        settings.wpm = None;
    }
    if let Some(variance) = args.variance {
        settings.variance_ms = variance;
    }
    if args.movie {
        settings.movie_mode = true;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    settings
}

fn play(args: &PlayArgs, config: &Config, registry: &LexerRegistry) -> Result<()> {
    let theme = resolve_theme(args.source.theme.as_deref(), config)?;
    let opts = source_options(&args.source, config);
    let primary = load(&args.source.file, &opts, registry)?;
    let split = match &args.split {
        Some(path) => Some(load(path, &split_options(config), registry)?),
        None => None,
    };
    let numbers = config.line_numbers && !args.source.no_numbers;
    let settings = play_settings(args, config);
    let size = terminal::get_size().unwrap_or(Size::FALLBACK);
    let height = usize::from(size.rows.saturating_sub(1).max(1));
    let script = script::build(
        &primary,
        split.as_ref(),
        args.source.highlight.as_deref(),
        height,
        numbers,
    )?;

    if args.plain || !terminal::is_tty() {
        info!("playing without a terminal");
        return player::play_plain(script, settings, io::stdout()).map_err(Into::into);
    }

    let depth = settings.depth();
    let mut show = Player::new(script, settings, theme, file_label(&args.source.file))?;
    let event_loop = EventLoop::new(LoopConfig {
        depth,
        ..LoopConfig::default()
    })
    .context("failed to take over the terminal")?;
    event_loop.run(&mut show)?;
    info!("presentation closed");
    Ok(())
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

fn export(args: &ExportArgs, config: &Config, registry: &LexerRegistry) -> Result<()> {
    let theme = resolve_theme(args.source.theme.as_deref(), config)?;
    let content = load(&args.source.file, &source_options(&args.source, config), registry)?;
    let numbers = config.line_numbers && !args.source.no_numbers;
    let script = script::build_static(&content, args.source.highlight.as_deref(), numbers)?;

    let mut engine = Engine::new(
        script.stage,
        script.actions,
        config.settings.clone(),
        Box::new(TextRenderer::new(io::sink())),
    )?;
    engine.skip_to_end()?;

    let depth = config.settings.depth();
    let Some(fmt) = formatter(args.format.name(), depth) else {
        bail!("no formatter for {}", args.format.name());
    };
    let Some(main) = engine.stage().get(ViewportId(0)) else {
        bail!("nothing to export");
    };
    let rendered = fmt.format(main, &theme);

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout().lock().write_all(rendered.as_bytes())?,
    }
    info!(format = args.format.name(), "exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("recital").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn play_flags_override_config() {
        let Commands::Play(args) = parse(&["play", "demo.py", "--delay", "20", "--movie"]).command
        else {
            unreachable!()
        };
        let mut config = Config::default();
        config.settings.wpm = Some(80);
        let settings = play_settings(&args, &config);
        assert_eq!(settings.wpm, None);
        assert_eq!(settings.delay_ms, 20);
        assert!(settings.movie_mode);
    }

    #[test]
    fn wpm_and_delay_conflict() {
        let parsed = Cli::try_parse_from(["recital", "play", "a.py", "--wpm", "60", "--delay", "5"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn export_parses_format() {
        let cli = parse(&["--config", "c.toml", "export", "a.rs", "-f", "html", "-o", "out.html"]);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        let Commands::Export(args) = cli.command else {
            unreachable!()
        };
        assert_eq!(args.format, Format::Html);
        assert_eq!(args.output, Some(PathBuf::from("out.html")));
    }

    #[test]
    fn theme_flag_then_config_then_default() {
        let mut config = Config::default();
        assert_eq!(resolve_theme(None, &config).unwrap().name, "monokai");
        config.theme = Some("paper".into());
        assert_eq!(resolve_theme(None, &config).unwrap().name, "paper");
        assert_eq!(resolve_theme(Some("terminal"), &config).unwrap().name, "terminal");
        let err = resolve_theme(Some("neon"), &config).unwrap_err();
        assert!(err.to_string().contains("monokai, paper, terminal"));
    }

    #[test]
    fn split_file_ignores_primary_source_flags() {
        let Commands::Play(args) = parse(&[
            "play", "a.py", "--subset", "foo", "--start-line", "40", "--lexer", "py3", "--split",
            "b.sh",
        ])
        .command
        else {
            unreachable!()
        };
        let config = Config::default();
        let primary = source_options(&args.source, &config);
        assert_eq!(primary.subset.as_deref(), Some("foo"));
        let split = split_options(&config);
        assert_eq!(split.subset, None);
        assert_eq!(split.start_line, None);
        assert_eq!(split.lexer, None);
    }

    #[test]
    fn file_label_is_the_file_name() {
        assert_eq!(file_label(Path::new("/tmp/talk/demo.py")), "demo.py");
    }
}
