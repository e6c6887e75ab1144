//! Loadable configuration for embedding a [`crate::jitter::JitterBuffer`] in
//! a host application.
//!
//! Mirrors this codebase's `AppConfig`/`toml`/`directories` pattern: a
//! serializable settings struct loaded from a TOML file under the OS's
//! standard config directory, with defaults usable out of the box.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::jitter::{DiscardAlgo, JitterBuffer};

/// Prefetch mode selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchMode {
    /// Fixed depth, discard disabled.
    Fixed { prefetch: u32 },
    /// Adaptive within `[min, max]`, seeded at `init`.
    Adaptive { init: u32, min: u32, max: u32 },
}

impl Default for PrefetchMode {
    fn default() -> Self {
        PrefetchMode::Adaptive { init: 15, min: 0, max: 100 }
    }
}

fn default_discard_algo() -> DiscardAlgoConfig {
    DiscardAlgoConfig::Progressive
}

/// Serializable mirror of [`DiscardAlgo`] (kept separate so the wire/TOML
/// shape doesn't change if the runtime enum ever grows non-serde variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardAlgoConfig {
    None,
    Static,
    Progressive,
}

impl From<DiscardAlgoConfig> for DiscardAlgo {
    fn from(cfg: DiscardAlgoConfig) -> Self {
        match cfg {
            DiscardAlgoConfig::None => DiscardAlgo::None,
            DiscardAlgoConfig::Static => DiscardAlgo::Static,
            DiscardAlgoConfig::Progressive => DiscardAlgo::Progressive,
        }
    }
}

/// Top-level jitter buffer configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitterBufferConfig {
    pub frame_size: usize,
    pub ptime_ms: u32,
    pub max_count: usize,
    #[serde(default)]
    pub prefetch_mode: PrefetchMode,
    #[serde(default = "default_discard_algo")]
    pub discard_algo: DiscardAlgoConfig,
}

impl Default for JitterBufferConfig {
    fn default() -> Self {
        Self {
            frame_size: 640,
            ptime_ms: 20,
            max_count: 128,
            prefetch_mode: PrefetchMode::default(),
            discard_algo: default_discard_algo(),
        }
    }
}

impl JitterBufferConfig {
    /// Load from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::ConfigurationInvalid(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| Error::ConfigurationInvalid(format!("parsing {}: {e}", path.display())))
    }

    /// Load from this application's standard config directory
    /// (`<qualifier>.<organization>.<application>/config.toml`), falling
    /// back to defaults if the file doesn't exist.
    pub fn load_or_default(qualifier: &str, organization: &str, application: &str) -> Result<Self> {
        let Some(dirs) = ProjectDirs::from(qualifier, organization, application) else {
            return Ok(Self::default());
        };
        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Standard config file path for this application, whether or not it
    /// currently exists.
    pub fn standard_path(qualifier: &str, organization: &str, application: &str) -> Option<PathBuf> {
        ProjectDirs::from(qualifier, organization, application)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build a [`JitterBuffer`] from this configuration, applying the
    /// configured prefetch mode and discard algorithm.
    pub fn build(&self) -> Result<JitterBuffer> {
        let jb = JitterBuffer::new(self.frame_size, self.ptime_ms, self.max_count)?;

        match self.prefetch_mode {
            PrefetchMode::Fixed { prefetch } => jb.set_fixed(prefetch)?,
            PrefetchMode::Adaptive { init, min, max } => {
                jb.set_adaptive(init, min, max)?;
                jb.set_discard(self.discard_algo.into())?;
            }
        }

        Ok(jb)
    }
}
