use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use linescan_core::consts::DEFAULT_OVERLAY_HALF_WIDTH;
use linescan_core::frame::Frame;
use linescan_core::geometry::{line_overlay, parse_three_points, LineFamily};
use linescan_core::io::{read_stack, save_image};

use crate::summary::print_family;

#[derive(Args)]
pub struct LinesArgs {
    /// Three points "x,y;x,y;x,y": two on one line, the third some lines away
    #[arg(long)]
    pub points: String,

    /// Line spacings between the first line and the third point
    #[arg(long, default_value = "10")]
    pub lines_per_interval: u32,

    /// Image stack to draw the lines over
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Frame of the stack to draw over
    #[arg(long, default_value = "0")]
    pub frame: usize,

    /// Half-width of the drawn lines in pixels
    #[arg(long, default_value_t = DEFAULT_OVERLAY_HALF_WIDTH)]
    pub half_width: f64,

    /// Output overlay image (PNG preview or float TIFF)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &LinesArgs) -> Result<()> {
    let [p1, p2, p3] = parse_three_points(&args.points)?;
    let family = LineFamily::from_three_points(p1, p2, p3, args.lines_per_interval)?;
    print_family(&family);

    if let Some(ref output) = args.output {
        let Some(ref image) = args.image else {
            bail!("--output needs --image to size the overlay");
        };
        let frame = select_frame(image, args.frame)?;
        let overlay = draw_overlay(&family, &frame, args.half_width);
        save_image(&overlay, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Overlay saved to {}", output.display());
    }
    Ok(())
}

pub(super) fn select_frame(path: &std::path::Path, index: usize) -> Result<Frame> {
    let mut frames =
        read_stack(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if index >= frames.len() {
        bail!(
            "frame {index} out of range: {} holds {} frames",
            path.display(),
            frames.len()
        );
    }
    Ok(frames.swap_remove(index))
}

/// Frame with every pixel near a line raised to the frame maximum.
pub(super) fn draw_overlay(family: &LineFamily, frame: &Frame, half_width: f64) -> Frame {
    let overlay = line_overlay(family, frame.dim(), half_width);
    let max = frame.data.iter().cloned().fold(1.0f32, f32::max);
    let mut out = frame.clone();
    out.data.zip_mut_with(&overlay, |v, &line| {
        if line > 0.0 {
            *v = max;
        }
    });
    out
}
