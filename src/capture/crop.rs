//! Maps a selection onto screenshot pixels and crops it out.
//!
//! The pixel/CSS ratio is measured from the returned screenshot rather than
//! taken from the device pixel ratio: capture backends may rescale.

use image::{RgbaImage, imageops};

use crate::capture::protocol::{CaptureRequest, decode_screenshot};
use crate::capture::service::CaptureClient;
use crate::error::{AppResult, CaptureError};
use crate::log;
use crate::selection::coords::{ScreenRect, Viewport};

/// Screenshot pixels per CSS pixel on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureRatio {
    pub x: f64,
    pub y: f64,
}

impl CaptureRatio {
    /// `img_width / inner_width`, `img_height / inner_height`.
    pub fn measure(img_width: u32, img_height: u32, viewport: Viewport) -> Result<Self, CaptureError> {
        if !viewport.has_area() {
            return Err(CaptureError::InvalidViewport {
                width: viewport.inner_width,
                height: viewport.inner_height,
            });
        }
        Ok(Self {
            x: img_width as f64 / viewport.inner_width,
            y: img_height as f64 / viewport.inner_height,
        })
    }
}

/// A rectangle in screenshot pixels. Always at least 1x1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    /// Scales and rounds each component, clamping the origin to `>= 0` and
    /// the size to `>= 1`.
    pub fn from_screen(rect: ScreenRect, ratio: CaptureRatio) -> Self {
        Self {
            x: (rect.x * ratio.x).round().max(0.0) as u32,
            y: (rect.y * ratio.y).round().max(0.0) as u32,
            w: (rect.w * ratio.x).round().max(1.0) as u32,
            h: (rect.h * ratio.y).round().max(1.0) as u32,
        }
    }
}

/// The selected region, ready for upload.
#[derive(Clone, Debug)]
pub struct CroppedImage {
    pub image: RgbaImage,
    /// Where in the screenshot it was cut from.
    pub source: PixelRect,
}

impl CroppedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Cuts `rect` out of `img`.
///
/// The result is always exactly `rect.w x rect.h`; any part of `rect`
/// outside the screenshot stays transparent.
pub fn crop_to(img: &RgbaImage, rect: PixelRect) -> RgbaImage {
    let (width, height) = img.dimensions();
    let mut output = RgbaImage::new(rect.w, rect.h);

    if rect.x < width && rect.y < height {
        let cw = rect.w.min(width - rect.x);
        let ch = rect.h.min(height - rect.y);
        let visible = imageops::crop_imm(img, rect.x, rect.y, cw, ch).to_image();
        imageops::replace(&mut output, &visible, 0, 0);
    }

    output
}

/// Screenshot → decode → map → crop.
///
/// Fails with a capture error if the host refuses or returns nothing, and
/// with a decode error if the payload is not an image. Never returns a
/// partial crop.
pub fn capture_and_crop<C: CaptureClient + ?Sized>(
    capture: &C,
    viewport: Viewport,
    rect: ScreenRect,
    quality: f64,
) -> AppResult<CroppedImage> {
    if !viewport.has_area() {
        return Err(CaptureError::InvalidViewport {
            width: viewport.inner_width,
            height: viewport.inner_height,
        }
        .into());
    }

    let data_url = capture.capture(CaptureRequest::visible_tab(quality))?.into_data_url()?;
    let screenshot = decode_screenshot(&data_url)?;
    let (img_width, img_height) = screenshot.dimensions();

    let ratio = CaptureRatio::measure(img_width, img_height, viewport)?;
    let source = PixelRect::from_screen(rect, ratio);
    log(&format!(
        "Screenshot {}x{}, ratio {:.3}x{:.3}, cropping ({}, {}) size {}x{}",
        img_width, img_height, ratio.x, ratio.y, source.x, source.y, source.w, source.h
    ));

    Ok(CroppedImage {
        image: crop_to(&screenshot, source),
        source,
    })
}
