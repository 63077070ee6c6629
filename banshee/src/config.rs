//! The runner's configuration. Everything can be set from `banshee.toml` and most of it can be
//! overridden on the command line.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use wraith::{Button, Buttons, Model};

/// Looked for in the working directory when no config path is given.
pub const DEFAULT_CONFIG: &str = "banshee.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many frames to run before stopping.
    pub frames: u32,
    pub model: Model,
    /// Where to write the last frame as a PNG, if anywhere.
    pub screenshot: Option<PathBuf>,
    /// Echo whatever the game sends over the serial port to stdout. Test ROMs report through it.
    pub print_serial: bool,
    /// One of `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    pub inputs: Vec<ScriptedInput>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames: 600,
            model: Model::Auto,
            screenshot: None,
            print_serial: false,
            log_level: "warn".to_owned(),
            inputs: Vec::new(),
        }
    }
}

/// Buttons held down for `hold` frames starting at `frame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedInput {
    pub frame: u32,
    pub buttons: Vec<Button>,
    #[serde(default = "default_hold")]
    pub hold: u32,
}

fn default_hold() -> u32 {
    1
}

impl ScriptedInput {
    fn active(&self, frame: u32) -> bool {
        (self.frame..self.frame.saturating_add(self.hold)).contains(&frame)
    }
}

impl Config {
    pub fn parse(src: &str) -> anyhow::Result<Self> {
        toml::from_str(src).context("Malformed config")
    }

    /// Reads the config at `path`. Without a path, `banshee.toml` in the working directory is used
    /// if it exists and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
            None => return Ok(Self::default()),
        };
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config at {}", path.display()))?;
        Self::parse(&src).with_context(|| format!("In {}", path.display()))
    }

    pub fn log_level(&self) -> anyhow::Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level '{}'", self.log_level))
    }
}

/// Every button the script holds down during the given frame.
pub fn buttons_at(inputs: &[ScriptedInput], frame: u32) -> Buttons {
    inputs
        .iter()
        .filter(|input| input.active(frame))
        .flat_map(|input| input.buttons.iter().copied())
        .collect()
}
