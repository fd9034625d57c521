use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tracing::debug;

use crate::error::{LinescanError, Result};
use crate::frame::Frame;

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Read every page of an image stack.
///
/// TIFF files may hold any number of single-channel pages; other formats
/// load as a one-frame stack. Pixel values keep their raw sensor scale.
pub fn read_stack(path: &Path) -> Result<Vec<Frame>> {
    match extension(path).as_deref() {
        Some("tif" | "tiff") => read_tiff_stack(path),
        _ => Ok(vec![load_image(path)?]),
    }
}

fn read_tiff_stack(path: &Path) -> Result<Vec<Frame>> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    let mut frames = Vec::new();

    loop {
        let (w, h) = decoder.dimensions()?;
        let (data, bit_depth) = decode_page(decoder.read_image()?, w as usize, h as usize)?;
        frames.push(Frame::new(data, bit_depth).with_index(frames.len()));
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    debug!(path = %path.display(), pages = frames.len(), "Read TIFF stack");
    Ok(frames)
}

fn decode_page(page: DecodingResult, w: usize, h: usize) -> Result<(Array2<f32>, u8)> {
    let (values, bit_depth): (Vec<f32>, u8) = match page {
        DecodingResult::U8(v) => (v.into_iter().map(f32::from).collect(), 8),
        DecodingResult::U16(v) => (v.into_iter().map(f32::from).collect(), 16),
        DecodingResult::U32(v) => (v.into_iter().map(|x| x as f32).collect(), 32),
        DecodingResult::F32(v) => (v, 32),
        DecodingResult::F64(v) => (v.into_iter().map(|x| x as f32).collect(), 64),
        _ => {
            return Err(LinescanError::InvalidInput(
                "unsupported TIFF sample format".into(),
            ))
        }
    };
    if values.len() != w * h {
        return Err(LinescanError::InvalidInput(format!(
            "TIFF page holds {} samples for {w}x{h} pixels; only single-channel pages are supported",
            values.len()
        )));
    }
    let data = Array2::from_shape_vec((h, w), values)
        .map_err(|e| LinescanError::InvalidInput(e.to_string()))?;
    Ok((data, bit_depth))
}

/// Write frames as a multi-page 32-bit float TIFF.
pub fn write_stack(path: &Path, frames: &[Frame]) -> Result<()> {
    if frames.is_empty() {
        return Err(LinescanError::EmptySequence);
    }
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    for frame in frames {
        let pixels: Vec<f32> = frame.data.iter().copied().collect();
        encoder.write_image::<colortype::Gray32Float>(
            frame.width() as u32,
            frame.height() as u32,
            &pixels,
        )?;
    }
    debug!(path = %path.display(), pages = frames.len(), "Wrote TIFF stack");
    Ok(())
}

/// Save a frame as an 8-bit PNG preview, scaled so the maximum maps to white.
pub fn save_png_preview(frame: &Frame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();
    let max = frame.data.iter().cloned().fold(0.0f32, f32::max);
    let scale = if max > 0.0 { 255.0 / max } else { 0.0 };

    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let val = (frame.data[[row, col]] * scale).clamp(0.0, 255.0) as u8;
            img.put_pixel(col as u32, row as u32, Luma([val]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a single frame, choosing the format from the file extension.
///
/// PNG output is a scaled preview; anything else is written as float TIFF.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match extension(path).as_deref() {
        Some("png") => save_png_preview(frame, path),
        _ => write_stack(path, std::slice::from_ref(frame)),
    }
}

/// Load a grayscale image file into a Frame, keeping raw sample values.
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let color = img.color();
    let bits_per_channel = color.bits_per_pixel() / u16::from(color.channel_count());

    let (w, h, values, bit_depth) = if bits_per_channel <= 8 {
        let gray = img.to_luma8();
        let (w, h) = gray.dimensions();
        let values: Vec<f32> = gray.into_raw().into_iter().map(f32::from).collect();
        (w, h, values, 8)
    } else {
        let gray = img.to_luma16();
        let (w, h) = gray.dimensions();
        let values: Vec<f32> = gray.into_raw().into_iter().map(f32::from).collect();
        (w, h, values, 16)
    };

    let data = Array2::from_shape_vec((h as usize, w as usize), values)
        .map_err(|e| LinescanError::InvalidInput(e.to_string()))?;
    Ok(Frame::new(data, bit_depth))
}
