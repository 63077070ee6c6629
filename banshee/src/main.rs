//! Banshee runs a cartridge without a window. It is meant for test ROMs and for scripted runs that
//! end in a screenshot.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use wraith::{Gameboy, Model};

mod config;
mod host;

use config::Config;
use host::{write_png, ScriptedHost};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The cartridge image to run.
    rom: PathBuf,
    /// Defaults to `banshee.toml` in the working directory, if there is one.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    frames: Option<u32>,
    /// Save the last frame here as a PNG.
    #[arg(long)]
    screenshot: Option<PathBuf>,
    #[arg(long, value_enum)]
    model: Option<ModelArg>,
    /// Print serial output to stdout.
    #[arg(long)]
    serial: bool,
    /// More logging. Repeat for more still.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelArg {
    Auto,
    Dmg,
    Cgb,
}

impl From<ModelArg> for Model {
    fn from(value: ModelArg) -> Self {
        match value {
            ModelArg::Auto => Model::Auto,
            ModelArg::Dmg => Model::Dmg,
            ModelArg::Cgb => Model::Cgb,
        }
    }
}

impl Args {
    /// Flags given on the command line win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(path) = &self.screenshot {
            config.screenshot = Some(path.clone());
        }
        if let Some(model) = self.model {
            config.model = model.into();
        }
        config.print_serial |= self.serial;
        match self.verbose {
            0 => {}
            1 => config.log_level = "info".to_owned(),
            2 => config.log_level = "debug".to_owned(),
            _ => config.log_level = "trace".to_owned(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_writer(std::io::stderr)
        .init();

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("Could not read {}", args.rom.display()))?;
    let mut gb = Gameboy::with_model(rom, config.model)
        .with_context(|| format!("Could not load {}", args.rom.display()))?;
    let mut host = ScriptedHost::new(config.inputs.clone());

    let mut stdout = std::io::stdout().lock();
    let mut cycles = 0u64;
    for _ in 0..config.frames {
        let result = gb.run_frame(&mut host);
        if config.print_serial {
            stdout.write_all(&gb.take_serial_output())?;
            stdout.flush()?;
        }
        cycles += result.with_context(|| {
            format!(
                "Emulation stopped at PC 0x{:0>4X} ({})",
                gb.cpu().pc,
                gb.disassemble(gb.cpu().pc)
            )
        })? as u64;
    }
    info!("Ran {} frames in {cycles} cycles", host.frames());

    if let Some(path) = &config.screenshot {
        match host.last_frame() {
            Some(frame) => {
                write_png(path, frame)?;
                info!("Saved screenshot to {}", path.display());
            }
            None => warn!("No frame was presented, so there is nothing to save"),
        }
    }
    Ok(())
}
