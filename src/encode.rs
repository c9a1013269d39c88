use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use gif::{Encoder, Frame, Repeat};
use tracing::{debug, info};

/// Black at index 0, white at index 1.
pub const PALETTE: [u8; 6] = [0x00, 0x00, 0x00, 0xff, 0xff, 0xff];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AnimationParameters {
    pub delay_ms: u32,
    /// 0 loops forever.
    pub loop_count: u16,
}

impl Default for AnimationParameters {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            loop_count: 0,
        }
    }
}

impl AnimationParameters {
    /// Frame delay in the gif's units of 10 ms.
    pub fn delay_cs(&self) -> u16 {
        u16::try_from(self.delay_ms / 10).unwrap_or(u16::MAX)
    }

    pub fn repeat(&self) -> Repeat {
        match self.loop_count {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        }
    }
}

/// Writes a complete animated gif to `out` and hands the writer back.
#[tracing::instrument(level = "debug", skip(out, frames))]
pub fn encode_frames<W: Write>(
    out: W,
    width: u16,
    height: u16,
    params: AnimationParameters,
    frames: impl IntoIterator<Item = Result<Frame<'static>>>,
) -> Result<W> {
    let mut encoder =
        Encoder::new(out, width, height, &PALETTE).context("could not create encoder")?;
    encoder
        .set_repeat(params.repeat())
        .context("could not set gif repeat")?;
    let mut written = 0usize;
    for frame in frames {
        let frame = frame.context("could not draw frame")?;
        encoder
            .write_frame(&frame)
            .with_context(|| format!("could not write frame #{written}"))?;
        written += 1;
    }
    debug!(written, "all frames encoded");
    encoder.into_inner().context("could not finish gif")
}

/// Encodes into `path`, replacing whatever was there.
#[tracing::instrument(level = "debug", skip(frames))]
pub fn save(
    path: &Path,
    width: u16,
    height: u16,
    params: AnimationParameters,
    frames: impl IntoIterator<Item = Result<Frame<'static>>>,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create {}", path.display()))?;
    let mut out = encode_frames(BufWriter::new(file), width, height, params, frames)?;
    out.flush()
        .with_context(|| format!("could not flush {}", path.display()))?;
    info!(path = %path.display(), "gif written");
    Ok(())
}
