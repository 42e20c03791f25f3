//! Coordinate types and the viewport correction transform.
//!
//! All on-screen values are CSS pixels. The correction transform maps a
//! point in the interaction layer's own coordinate space to the space the
//! page renders it in, so that after correction the layer coincides with
//! the visual viewport.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// A point in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the visual viewport (`innerWidth` x `innerHeight`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub inner_width: f64,
    pub inner_height: f64,
}

impl Viewport {
    pub fn new(inner_width: f64, inner_height: f64) -> Self {
        Self {
            inner_width,
            inner_height,
        }
    }

    /// True if both dimensions are positive and finite.
    pub fn has_area(&self) -> bool {
        self.inner_width.is_finite()
            && self.inner_height.is_finite()
            && self.inner_width > 0.0
            && self.inner_height > 0.0
    }
}

/// A rendered bounding box as reported by the page's geometry query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A selection rectangle in corrected on-screen coordinates.
///
/// Width and height are never negative; the selector only grows the
/// rectangle toward larger x/y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    /// Bounding box from `anchor` to `current`, clamped so it only extends
    /// right and down from the anchor.
    pub fn from_drag(anchor: Point, current: Point) -> Self {
        let cx = current.x.max(anchor.x);
        let cy = current.y.max(anchor.y);
        Self {
            x: anchor.x,
            y: anchor.y,
            w: cx - anchor.x,
            h: cy - anchor.y,
        }
    }

    /// Label shown next to the selection box while dragging.
    pub fn size_label(&self) -> String {
        format!("{} × {}", self.w, self.h)
    }
}

/// Compensating transform for the interaction layer.
///
/// Applied to a layer-local point `p` it yields
/// `(scale_x * (p.x - offset_x), scale_y * (p.y - offset_y))`: translate by
/// the negated measured offset first, then scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrectionTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CorrectionTransform {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Derives the correction from the layer's measured box.
    ///
    /// `measured` must come from the layer laid out at `(0, 0)` with size
    /// `100vw x 100vh` and no transform of its own. A zero or non-finite
    /// measured size is reported, not papered over with a default scale.
    pub fn from_measurement(viewport: Viewport, measured: LayoutRect) -> Result<Self, LayoutError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(measured.width)
            || !usable(measured.height)
            || !measured.left.is_finite()
            || !measured.top.is_finite()
        {
            return Err(LayoutError::DegenerateMeasurement {
                width: measured.width,
                height: measured.height,
            });
        }

        Ok(Self {
            scale_x: viewport.inner_width / measured.width,
            scale_y: viewport.inner_height / measured.height,
            offset_x: measured.left,
            offset_y: measured.top,
        })
    }

    /// Maps a layer-local point through the correction.
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.scale_x * (p.x - self.offset_x),
            y: self.scale_y * (p.y - self.offset_y),
        }
    }

    /// Inverse of [`apply`](Self::apply).
    pub fn invert(&self, p: Point) -> Point {
        Point {
            x: p.x / self.scale_x + self.offset_x,
            y: p.y / self.scale_y + self.offset_y,
        }
    }

    /// CSS `transform` value (with `transform-origin: 0 0`).
    ///
    /// CSS applies the rightmost function to the point first, so the
    /// translate is listed last.
    pub fn css(&self) -> String {
        format!(
            "scale({}, {}) translate({}px, {}px)",
            self.scale_x, self.scale_y, -self.offset_x, -self.offset_y
        )
    }

    #[cfg(test)]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for CorrectionTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
