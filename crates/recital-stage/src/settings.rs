//! Run settings.
//!
//! Read by the engine while it expands typewriter actions. They are moved
//! into the [`Engine`](crate::engine::Engine) when it is built, so nothing
//! can change them mid-run.

use std::time::Duration;

use rand::Rng;
use recital_term::color::ColorDepth;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base delay between typed characters.
    pub delay_ms: u64,
    /// Each character's delay is the base plus or minus up to this much.
    pub variance_ms: u64,
    /// Typing speed in words per minute; overrides `delay_ms`.
    pub wpm: Option<u64>,
    /// `truecolor`, `ansi256`, `ansi16` or `mono`. Detected when unset.
    #[serde(deserialize_with = "depth_by_name")]
    pub color_depth: Option<ColorDepth>,
    /// Run typewriter actions instantly.
    pub deactivated: bool,
    /// Waits become timed pauses, so the whole thing plays unattended.
    pub movie_mode: bool,
    pub movie_pause_ms: u64,
    /// Seed for the typing variance, for reproducible runs.
    pub seed: Option<u64>,
}

fn depth_by_name<'de, D: Deserializer<'de>>(de: D) -> Result<Option<ColorDepth>, D::Error> {
    let name = String::deserialize(de)?;
    ColorDepth::from_name(&name).map(Some).ok_or_else(|| {
        de::Error::invalid_value(
            Unexpected::Str(&name),
            &"truecolor, ansi256, ansi16 or mono",
        )
    })
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_ms: 130,
            variance_ms: 30,
            wpm: None,
            color_depth: None,
            deactivated: false,
            movie_mode: false,
            movie_pause_ms: 1500,
            seed: None,
        }
    }
}

impl Settings {
    /// Base per-character delay in milliseconds. Words are five letters.
    #[must_use]
    pub fn base_delay_ms(&self) -> u64 {
        match self.wpm {
            Some(wpm) if wpm > 0 => 60_000 / (wpm * 5),
            _ => self.delay_ms,
        }
    }

    /// Delay before the next typed character: base plus a uniform integer
    /// variance, never below zero.
    pub fn char_delay(&self, rng: &mut impl Rng) -> Duration {
        let base = i64::try_from(self.base_delay_ms()).unwrap_or(i64::MAX);
        let variance = i64::try_from(self.variance_ms).unwrap_or(0);
        let offset = if variance == 0 {
            0
        } else {
            rng.gen_range(-variance..=variance)
        };
        Duration::from_millis(u64::try_from(base.saturating_add(offset)).unwrap_or(0))
    }

    #[must_use]
    pub const fn movie_pause(&self) -> Duration {
        Duration::from_millis(self.movie_pause_ms)
    }

    /// The configured colour depth, or the terminal's.
    #[must_use]
    pub fn depth(&self) -> ColorDepth {
        self.color_depth.unwrap_or_else(ColorDepth::detect)
    }
}
