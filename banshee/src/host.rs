use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use tracing::debug;
use wraith::{Buttons, Frame, Host};

use crate::config::{buttons_at, ScriptedInput};

/// A host with no window. Button state comes from a script keyed by frame number and the most
/// recent frame is kept around so it can be saved at the end of the run.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    script: Vec<ScriptedInput>,
    frame: u32,
    last: Option<Frame>,
}

impl ScriptedHost {
    pub fn new(script: Vec<ScriptedInput>) -> Self {
        Self {
            script,
            frame: 0,
            last: None,
        }
    }

    /// The number of frames presented so far.
    pub fn frames(&self) -> u32 {
        self.frame
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }
}

impl Host for ScriptedHost {
    fn present(&mut self, frame: &Frame) {
        self.frame += 1;
        match self.last.as_mut() {
            Some(last) => last.clone_from(frame),
            None => self.last = Some(frame.clone()),
        }
    }

    fn poll_buttons(&mut self) -> Buttons {
        let buttons = buttons_at(&self.script, self.frame);
        if buttons != Buttons::NONE {
            debug!("Frame {}: holding {buttons:?}", self.frame);
        }
        buttons
    }
}

/// Writes the frame as an 8-bit RGBA PNG.
pub fn write_png(path: &Path, frame: &Frame) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Could not create screenshot at {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        wraith::ppu::SCREEN_WIDTH as u32,
        wraith::ppu::SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame.to_rgba())?;
    writer.finish()?;
    Ok(())
}
