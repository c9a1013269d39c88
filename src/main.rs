mod draw;
mod encode;

use std::path::Path;

use anyhow::{Context, Result};
use draw::{Drawer, MovingBlock};
use encode::AnimationParameters;
use tracing::info;

const WIDTH: usize = 96;
const HEIGHT: usize = 24;
const FRAME_COUNT: usize = 8;
const BLOCK_SIZE: usize = 12;
/// in milliseconds
const FRAME_DELAY_MS: u32 = 500;
/// 0 = forever
const LOOP_COUNT: u16 = 0;
const OUTPUT_PATH: &str = "test_animation.gif";

/// Draws `frame_count` frames of a block sliding right and writes them to `output_path` as one gif.
#[tracing::instrument(level = "debug")]
fn generate_and_save(
    width: usize,
    height: usize,
    frame_count: usize,
    block_size: usize,
    params: AnimationParameters,
    output_path: &Path,
) -> Result<()> {
    let drawer = Drawer::new(
        width,
        height,
        MovingBlock {
            block_size,
            frame_count,
        },
    )?;
    let (w, h) = (drawer.width(), drawer.height());
    info!(frame_count, w, h, "generating frames");
    let frames = draw::animate_gif(drawer, frame_count, params);
    encode::save(output_path, w, h, params, frames)
        .with_context(|| format!("could not save {}", output_path.display()))
}

fn setup_logging() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("could not set up logging")?;
    Ok(())
}

fn main() -> Result<()> {
    setup_logging()?;
    let params = AnimationParameters {
        delay_ms: FRAME_DELAY_MS,
        loop_count: LOOP_COUNT,
    };
    generate_and_save(
        WIDTH,
        HEIGHT,
        FRAME_COUNT,
        BLOCK_SIZE,
        params,
        Path::new(OUTPUT_PATH),
    )?;
    println!("Generated {OUTPUT_PATH}");
    Ok(())
}
