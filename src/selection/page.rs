//! The page the selection overlay is attached to.
//!
//! `Page` is the seam between the selection logic and whatever renders the
//! interaction layer. `SimulatedPage` renders the layer under an ambient
//! transform (a zoom/scale wrapper or a translated root) so the correction
//! can be exercised without a browser.

use crate::selection::coords::{CorrectionTransform, LayoutRect, Point, ScreenRect, Viewport};
use crate::selection::state::{PointerEvent, PointerKind};

/// Visual feedback drawn on the interaction layer while selecting.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionDecor {
    /// Crosshair position (follows the pointer).
    pub crosshair: Option<Point>,
    /// Current selection box.
    pub rect: Option<ScreenRect>,
    /// Dimming panes around the box: top, left, right, bottom.
    pub dims: Option<[LayoutRect; 4]>,
    /// Size tag and where to place it.
    pub tag: Option<(Point, String)>,
}

/// Operations the overlay needs from the host page.
pub trait Page {
    /// Current visual viewport size.
    fn viewport(&self) -> Viewport;

    /// Attaches the interaction layer to the document root: fixed at
    /// `(0, 0)`, sized `100vw x 100vh`, no transform, origin `0 0`, hidden.
    fn attach_layer(&mut self);

    /// Inserts the 1x1 fixed probe at `(0, 0)` inside the layer.
    fn insert_probe(&mut self);

    /// Rendered bounding box of the layer. Zero-sized if no layer is attached.
    fn measure_layer(&self) -> LayoutRect;

    fn set_layer_transform(&mut self, transform: CorrectionTransform);

    fn set_layer_visible(&mut self, visible: bool);

    /// Removes the layer and everything inside it.
    fn remove_layer(&mut self);

    /// Current `user-select` value of the document body.
    fn user_select(&self) -> String;

    fn set_user_select(&mut self, value: &str);

    /// Redraws the selection feedback. Pages without visual output ignore it.
    fn draw_decor(&mut self, _decor: &SelectionDecor) {}
}

/// Transform applied by an ancestor of everything on the page.
///
/// Maps a point `p` to `(scale_x * p.x + translate_x, scale_y * p.y + translate_y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl AmbientTransform {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn scale(s: f64) -> Self {
        Self { scale_x: s, scale_y: s, ..Self::IDENTITY }
    }

    #[cfg(test)]
    pub fn translate(x: f64, y: f64) -> Self {
        Self { translate_x: x, translate_y: y, ..Self::IDENTITY }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.scale_x * p.x + self.translate_x,
            y: self.scale_y * p.y + self.translate_y,
        }
    }

    pub fn invert(&self, p: Point) -> Point {
        Point {
            x: (p.x - self.translate_x) / self.scale_x,
            y: (p.y - self.translate_y) / self.scale_y,
        }
    }
}

impl Default for AmbientTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Debug)]
struct SimulatedLayer {
    transform: CorrectionTransform,
    visible: bool,
    #[cfg_attr(not(test), allow(dead_code))]
    has_probe: bool,
}

/// In-memory page whose layer is rendered through an [`AmbientTransform`].
#[derive(Clone, Debug)]
pub struct SimulatedPage {
    viewport: Viewport,
    ambient: AmbientTransform,
    layer: Option<SimulatedLayer>,
    user_select: String,
    #[cfg_attr(not(test), allow(dead_code))]
    last_decor: Option<SelectionDecor>,
}

impl SimulatedPage {
    pub fn new(viewport: Viewport, ambient: AmbientTransform) -> Self {
        Self {
            viewport,
            ambient,
            layer: None,
            user_select: String::new(),
            last_decor: None,
        }
    }

    /// Sets the body's `user-select` as the page author left it.
    pub fn with_user_select(mut self, value: &str) -> Self {
        self.user_select = value.to_string();
        self
    }

    #[cfg(test)]
    pub fn has_layer(&self) -> bool {
        self.layer.is_some()
    }

    pub fn layer_visible(&self) -> bool {
        self.layer.as_ref().is_some_and(|l| l.visible)
    }

    #[cfg(test)]
    pub fn layer_has_probe(&self) -> bool {
        self.layer.as_ref().is_some_and(|l| l.has_probe)
    }

    #[cfg(test)]
    pub fn last_decor(&self) -> Option<&SelectionDecor> {
        self.last_decor.as_ref()
    }

    /// Where a layer-local point ends up on screen.
    pub fn layer_to_screen(&self, p: Point) -> Option<Point> {
        let layer = self.layer.as_ref()?;
        Some(self.ambient.apply(layer.transform.apply(p)))
    }

    /// Layer-local coordinates of a screen point, i.e. what an event
    /// dispatched to the layer reports.
    pub fn screen_to_layer(&self, q: Point) -> Option<Point> {
        let layer = self.layer.as_ref()?;
        Some(layer.transform.invert(self.ambient.invert(q)))
    }

    /// Builds the pointer event the layer would receive for a pointer at
    /// screen position `(x, y)`. `None` when no visible layer is attached.
    pub fn pointer(&self, kind: PointerKind, x: f64, y: f64) -> Option<PointerEvent> {
        if !self.layer_visible() {
            return None;
        }
        let p = self.screen_to_layer(Point::new(x, y))?;
        Some(PointerEvent { kind, x: p.x, y: p.y })
    }
}

impl Page for SimulatedPage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn attach_layer(&mut self) {
        self.layer = Some(SimulatedLayer {
            transform: CorrectionTransform::IDENTITY,
            visible: false,
            has_probe: false,
        });
    }

    fn insert_probe(&mut self) {
        if let Some(layer) = self.layer.as_mut() {
            layer.has_probe = true;
        }
    }

    fn measure_layer(&self) -> LayoutRect {
        let zero = LayoutRect { left: 0.0, top: 0.0, width: 0.0, height: 0.0 };
        let (Some(top_left), Some(bottom_right)) = (
            self.layer_to_screen(Point::new(0.0, 0.0)),
            self.layer_to_screen(Point::new(self.viewport.inner_width, self.viewport.inner_height)),
        ) else {
            return zero;
        };

        let left = top_left.x.min(bottom_right.x);
        let top = top_left.y.min(bottom_right.y);
        LayoutRect {
            left,
            top,
            width: (bottom_right.x - top_left.x).abs(),
            height: (bottom_right.y - top_left.y).abs(),
        }
    }

    fn set_layer_transform(&mut self, transform: CorrectionTransform) {
        if let Some(layer) = self.layer.as_mut() {
            layer.transform = transform;
        }
    }

    fn set_layer_visible(&mut self, visible: bool) {
        if let Some(layer) = self.layer.as_mut() {
            layer.visible = visible;
        }
    }

    fn remove_layer(&mut self) {
        self.layer = None;
        self.last_decor = None;
    }

    fn user_select(&self) -> String {
        self.user_select.clone()
    }

    fn set_user_select(&mut self, value: &str) {
        self.user_select = value.to_string();
    }

    fn draw_decor(&mut self, decor: &SelectionDecor) {
        self.last_decor = Some(decor.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_without_layer_is_zero() {
        let page = SimulatedPage::new(Viewport::new(800.0, 600.0), AmbientTransform::IDENTITY);
        assert_eq!(page.measure_layer().width, 0.0);
        assert_eq!(page.measure_layer().height, 0.0);
    }

    #[test]
    fn test_measure_reflects_ambient_transform() {
        let ambient = AmbientTransform { scale_x: 1.5, scale_y: 0.5, translate_x: 30.0, translate_y: -10.0 };
        let mut page = SimulatedPage::new(Viewport::new(800.0, 600.0), ambient);
        page.attach_layer();

        let r = page.measure_layer();
        assert_eq!(r, LayoutRect { left: 30.0, top: -10.0, width: 1200.0, height: 300.0 });
    }

    #[test]
    fn test_pointer_requires_visible_layer() {
        let mut page = SimulatedPage::new(Viewport::new(800.0, 600.0), AmbientTransform::IDENTITY);
        assert!(page.pointer(PointerKind::Down, 1.0, 1.0).is_none());
        page.attach_layer();
        assert!(page.pointer(PointerKind::Down, 1.0, 1.0).is_none());
        page.set_layer_visible(true);
        let ev = page.pointer(PointerKind::Down, 10.0, 20.0).unwrap();
        assert_eq!((ev.x, ev.y), (10.0, 20.0));
    }

    #[test]
    fn test_remove_layer_clears_decor() {
        let mut page = SimulatedPage::new(Viewport::new(800.0, 600.0), AmbientTransform::IDENTITY);
        page.attach_layer();
        page.draw_decor(&SelectionDecor::default());
        assert!(page.last_decor().is_some());
        page.remove_layer();
        assert!(page.last_decor().is_none());
        assert!(!page.has_layer());
    }
}
