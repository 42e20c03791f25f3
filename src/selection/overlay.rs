//! Interaction layer lifecycle.
//!
//! Installs the full-viewport layer, measures it, applies the viewport
//! correction, and owns the page-level text-selection flag for as long as
//! the layer is up.

use crate::error::LayoutError;
use crate::log;
use crate::selection::coords::{CorrectionTransform, LayoutRect, Point, ScreenRect, Viewport};
use crate::selection::page::{Page, SelectionDecor};

/// Distance of the size tag from the selection's bottom-right corner.
const TAG_OFFSET: f64 = 8.0;

/// An installed, corrected interaction layer.
///
/// Must be finished with [`teardown`](Self::teardown) on every exit path so
/// the page's `user-select` value is restored.
#[derive(Debug)]
pub struct OverlayLayer {
    #[cfg_attr(not(test), allow(dead_code))]
    correction: CorrectionTransform,
    viewport: Viewport,
    prior_user_select: String,
    layer_attached: bool,
}

impl OverlayLayer {
    /// Attaches the layer, derives and applies the correction, shows the
    /// layer, and disables text selection on the page.
    ///
    /// On a degenerate measurement the layer is removed again and the page
    /// is left untouched.
    pub fn install<P: Page + ?Sized>(page: &mut P) -> Result<Self, LayoutError> {
        let viewport = page.viewport();

        page.attach_layer();
        page.insert_probe();

        let measured = page.measure_layer();
        let correction = match CorrectionTransform::from_measurement(viewport, measured) {
            Ok(t) => t,
            Err(e) => {
                page.remove_layer();
                return Err(e);
            }
        };

        log(&format!(
            "Layer measured at ({:.2}, {:.2}) {:.2}x{:.2}, viewport {}x{}, correction: {}",
            measured.left,
            measured.top,
            measured.width,
            measured.height,
            viewport.inner_width,
            viewport.inner_height,
            correction.css()
        ));

        page.set_layer_transform(correction);
        page.set_layer_visible(true);

        let prior_user_select = page.user_select();
        page.set_user_select("none");

        Ok(Self {
            correction,
            viewport,
            prior_user_select,
            layer_attached: true,
        })
    }

    #[cfg(test)]
    pub fn correction(&self) -> CorrectionTransform {
        self.correction
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[cfg(test)]
    pub fn is_attached(&self) -> bool {
        self.layer_attached
    }

    /// Redraws crosshair, selection box, dimming and size tag.
    pub fn draw<P: Page + ?Sized>(&self, page: &mut P, pointer: Option<Point>, rect: Option<ScreenRect>) {
        if !self.layer_attached {
            return;
        }
        let decor = SelectionDecor {
            crosshair: pointer,
            rect,
            dims: rect.map(|r| dim_panes(self.viewport, r)),
            tag: rect.map(|r| {
                (
                    Point::new(r.x + r.w + TAG_OFFSET, r.y + r.h + TAG_OFFSET),
                    r.size_label(),
                )
            }),
        };
        page.draw_decor(&decor);
    }

    /// Removes the layer but keeps text selection disabled. Used right
    /// before capture so the screenshot does not contain the layer.
    pub fn detach<P: Page + ?Sized>(&mut self, page: &mut P) {
        if self.layer_attached {
            page.remove_layer();
            self.layer_attached = false;
        }
    }

    /// Removes the layer if still attached and restores `user-select`.
    pub fn teardown<P: Page + ?Sized>(mut self, page: &mut P) {
        self.detach(page);
        page.set_user_select(&self.prior_user_select);
    }
}

/// The four panes dimming everything outside `r`: top, left, right, bottom.
pub fn dim_panes(viewport: Viewport, r: ScreenRect) -> [LayoutRect; 4] {
    let right_edge = r.x + r.w;
    let bottom_edge = r.y + r.h;
    [
        LayoutRect { left: 0.0, top: 0.0, width: viewport.inner_width, height: r.y },
        LayoutRect { left: 0.0, top: r.y, width: r.x, height: r.h },
        LayoutRect {
            left: right_edge,
            top: r.y,
            width: (viewport.inner_width - right_edge).max(0.0),
            height: r.h,
        },
        LayoutRect {
            left: 0.0,
            top: bottom_edge,
            width: viewport.inner_width,
            height: (viewport.inner_height - bottom_edge).max(0.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::page::{AmbientTransform, SimulatedPage};
    use crate::selection::state::PointerKind;

    const TOLERANCE: f64 = 1e-6;

    fn assert_pointer_identity(ambient: AmbientTransform) {
        let mut page = SimulatedPage::new(Viewport::new(1280.0, 800.0), ambient);
        let layer = OverlayLayer::install(&mut page).unwrap();

        for &(x, y) in &[(0.0, 0.0), (100.0, 50.0), (640.5, 399.25), (1279.0, 799.0)] {
            let ev = page.pointer(PointerKind::Move, x, y).unwrap();
            assert!(
                (ev.x - x).abs() < TOLERANCE && (ev.y - y).abs() < TOLERANCE,
                "ambient {:?}: ({}, {}) read as ({}, {})",
                ambient,
                x,
                y,
                ev.x,
                ev.y
            );
        }

        // The corrected layer covers exactly the viewport.
        let r = page.measure_layer();
        assert!(r.left.abs() < TOLERANCE && r.top.abs() < TOLERANCE);
        assert!((r.width - 1280.0).abs() < TOLERANCE);
        assert!((r.height - 800.0).abs() < TOLERANCE);

        layer.teardown(&mut page);
    }

    #[test]
    fn test_correction_identity_ambient() {
        assert_pointer_identity(AmbientTransform::IDENTITY);
    }

    #[test]
    fn test_correction_pure_scale() {
        assert_pointer_identity(AmbientTransform::scale(1.25));
        assert_pointer_identity(AmbientTransform::scale(0.8));
    }

    #[test]
    fn test_correction_pure_translate() {
        assert_pointer_identity(AmbientTransform::translate(37.0, -12.5));
    }

    #[test]
    fn test_correction_combined() {
        assert_pointer_identity(AmbientTransform {
            scale_x: 1.5,
            scale_y: 0.75,
            translate_x: 40.0,
            translate_y: 18.0,
        });
    }

    #[test]
    fn test_install_shows_layer_and_disables_selection() {
        let mut page = SimulatedPage::new(Viewport::new(800.0, 600.0), AmbientTransform::scale(2.0))
            .with_user_select("text");
        let layer = OverlayLayer::install(&mut page).unwrap();

        assert!(page.layer_visible());
        assert!(page.layer_has_probe());
        assert_eq!(page.user_select(), "none");
        assert!((layer.correction().scale_x - 0.5).abs() < TOLERANCE);

        layer.teardown(&mut page);
        assert!(!page.has_layer());
        assert_eq!(page.user_select(), "text");
    }

    #[test]
    fn test_detach_keeps_selection_disabled_until_teardown() {
        let mut page = SimulatedPage::new(Viewport::new(800.0, 600.0), AmbientTransform::IDENTITY);
        let mut layer = OverlayLayer::install(&mut page).unwrap();

        layer.detach(&mut page);
        assert!(!page.has_layer());
        assert!(!layer.is_attached());
        assert_eq!(page.user_select(), "none");

        layer.teardown(&mut page);
        assert_eq!(page.user_select(), "");
    }

    #[test]
    fn test_degenerate_measurement_leaves_page_untouched() {
        let ambient = AmbientTransform { scale_x: 0.0, ..AmbientTransform::IDENTITY };
        let mut page = SimulatedPage::new(Viewport::new(800.0, 600.0), ambient).with_user_select("auto");

        let err = OverlayLayer::install(&mut page).unwrap_err();
        assert!(matches!(err, LayoutError::DegenerateMeasurement { .. }));
        assert!(!page.has_layer());
        assert_eq!(page.user_select(), "auto");
    }

    #[test]
    fn test_draw_places_dims_and_tag() {
        let mut page = SimulatedPage::new(Viewport::new(1000.0, 500.0), AmbientTransform::IDENTITY);
        let layer = OverlayLayer::install(&mut page).unwrap();
        let rect = ScreenRect::new(100.0, 50.0, 200.0, 100.0);
        layer.draw(&mut page, Some(Point::new(300.0, 150.0)), Some(rect));

        let decor = page.last_decor().unwrap();
        let dims = decor.dims.unwrap();
        assert_eq!(dims[0], LayoutRect { left: 0.0, top: 0.0, width: 1000.0, height: 50.0 });
        assert_eq!(dims[2], LayoutRect { left: 300.0, top: 50.0, width: 700.0, height: 100.0 });
        assert_eq!(dims[3], LayoutRect { left: 0.0, top: 150.0, width: 1000.0, height: 350.0 });
        let (pos, label) = decor.tag.clone().unwrap();
        assert_eq!(pos, Point::new(308.0, 158.0));
        assert_eq!(label, "200 × 100");

        layer.teardown(&mut page);
    }
}
