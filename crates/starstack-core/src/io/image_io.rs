use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use ndarray::Array3;
use tracing::debug;

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{Result, StarstackError};
use crate::frame::Frame;

/// Turns an input file into a 16-bit RGB [`Frame`].
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Frame>;
}

/// Receives the final combined frame.
pub trait OutputSink: Send + Sync {
    fn write(&self, frame: &Frame, path: &Path) -> Result<()>;
}

/// [`FrameDecoder`] backed by the `image` crate. Any format it can open is
/// promoted to 16-bit RGB.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl FrameDecoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<Frame> {
        load_image(path)
    }
}

/// [`OutputSink`] that picks the format from the file extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageSink;

impl OutputSink for ImageSink {
    fn write(&self, frame: &Frame, path: &Path) -> Result<()> {
        save_image(frame, path)
    }
}

/// Load an image file into a freshly loaded [`Frame`].
pub fn load_image(path: &Path) -> Result<Frame> {
    if !path.is_file() {
        return Err(StarstackError::FileUnreadable {
            path: path.to_path_buf(),
            reason: "no such file".into(),
        });
    }

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => StarstackError::FileUnreadable {
            path: path.to_path_buf(),
            reason: io.to_string(),
        },
        other => StarstackError::DecodeFailure {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    let rgb = img.to_rgb16();
    let (w, h) = rgb.dimensions();
    let data = Array3::from_shape_vec(
        (h as usize, w as usize, COLOR_CHANNEL_COUNT),
        rgb.into_raw(),
    )
    .map_err(|e| StarstackError::DecodeFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(path = %path.display(), width = w, height = h, "Decoded frame");
    Ok(Frame::new(data))
}

fn interleaved(frame: &Frame) -> Vec<u16> {
    // Standard layout iterates row, col, channel: exactly RGB interleaving.
    frame.data.iter().copied().collect()
}

/// Save a frame as 16-bit RGB TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let (h, w, c) = frame.shape();
    let img = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, interleaved(frame))
        .ok_or(StarstackError::ShapeMismatch {
            expected: (h, w, COLOR_CHANNEL_COUNT),
            found: (h, w, c),
        })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as 8-bit RGB PNG, keeping the high byte of each sample.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let (h, w, _) = frame.shape();
    let mut img = RgbImage::new(w as u32, h as u32);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let (r, c) = (y as usize, x as usize);
        *px = Rgb([
            (frame.data[[r, c, 0]] >> 8) as u8,
            (frame.data[[r, c, 1]] >> 8) as u8,
            (frame.data[[r, c, 2]] >> 8) as u8,
        ]);
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a frame, choosing format from file extension. Unknown extensions get TIFF.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => save_png(frame, path),
        _ => save_tiff(frame, path),
    }
}
