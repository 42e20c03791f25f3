//! Session runner - drives one selection from hotkey to result panel.
//!
//! Sequences: hotkey → health check → overlay + selector → capture and crop
//! → upload → result panel. Every exit path tears the overlay down and
//! restores the page's text-selection setting.

use chrono::Local;
use std::path::PathBuf;

use crate::capture::crop::{CroppedImage, capture_and_crop};
use crate::capture::service::CaptureClient;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::log;
use crate::ocr::client::OcrTransport;
use crate::ocr::{OcrOutcome, dispatch};
use crate::selection::coords::{ScreenRect, Viewport};
use crate::selection::overlay::OverlayLayer;
use crate::selection::page::{Page, SimulatedPage};
use crate::selection::state::{PointerKind, SelectionOutcome, Selector, Step};
use crate::session::input::{InputEvent, KeyEvent};
use crate::session::present::{Notifier, ResultPanel, ToastKind};

/// Where the runner is between events.
#[derive(Debug, Default)]
enum SessionState {
    /// No selection active; waiting for the hotkey.
    #[default]
    Waiting,
    /// Overlay installed, selector tracking the pointer.
    Selecting {
        overlay: OverlayLayer,
        selector: Selector,
    },
}

/// What handling one event led to.
#[derive(Debug)]
pub enum SessionReport {
    /// Event had no effect in the current state.
    Ignored,
    /// Hotkey accepted, overlay up.
    Started,
    /// Selection in progress.
    Selecting(Option<ScreenRect>),
    /// Escape during selection.
    Cancelled,
    /// Selection too small; nothing captured.
    Discarded,
    /// Text recognized and shown.
    Recognized(OcrOutcome),
    /// Session ended with an error (already logged and toasted).
    Failed(AppError),
    /// Result panel closed.
    PanelClosed,
}

/// Drives selection sessions on one page.
pub struct SessionRunner<'a, P: Page> {
    config: &'a AppConfig,
    page: P,
    capture: &'a dyn CaptureClient,
    transport: &'a dyn OcrTransport,
    notifier: &'a mut dyn Notifier,
    panel: &'a mut dyn ResultPanel,
    crop_dir: Option<PathBuf>,
    state: SessionState,
}

impl<'a, P: Page> SessionRunner<'a, P> {
    pub fn new(
        config: &'a AppConfig,
        page: P,
        capture: &'a dyn CaptureClient,
        transport: &'a dyn OcrTransport,
        notifier: &'a mut dyn Notifier,
        panel: &'a mut dyn ResultPanel,
    ) -> Self {
        Self {
            config,
            page,
            capture,
            transport,
            notifier,
            panel,
            crop_dir: None,
            state: SessionState::Waiting,
        }
    }

    /// Saves every crop as a PNG in `dir` before upload.
    pub fn with_crop_dir(mut self, dir: PathBuf) -> Self {
        self.crop_dir = Some(dir);
        self
    }

    #[cfg(test)]
    pub fn page(&self) -> &P {
        &self.page
    }

    #[cfg(test)]
    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SessionState::Selecting { .. })
    }

    /// Feeds one event through the session.
    pub fn handle_event(&mut self, event: InputEvent) -> SessionReport {
        match std::mem::take(&mut self.state) {
            SessionState::Waiting => match event {
                InputEvent::Key(key) => self.on_key_waiting(&key),
                InputEvent::Pointer(_) => SessionReport::Ignored,
            },
            SessionState::Selecting { overlay, selector } => self.on_event_selecting(overlay, selector, event),
        }
    }

    fn on_key_waiting(&mut self, key: &KeyEvent) -> SessionReport {
        if self.config.hotkey.matches(key) {
            return self.activate();
        }
        if key.is_escape() && self.panel.is_open() {
            self.panel.close();
            return SessionReport::PanelClosed;
        }
        SessionReport::Ignored
    }

    /// Health check, then install the overlay.
    fn activate(&mut self) -> SessionReport {
        log(&format!("Hotkey {} pressed, starting selection", self.config.hotkey));

        if let Err(e) = self.transport.health_check() {
            log(&format!("Health check failed: {}", e));
            self.notifier.toast(
                "OCR backend unreachable. Start the service or check its address.",
                ToastKind::Failure,
            );
            return SessionReport::Failed(e.into());
        }

        let overlay = match OverlayLayer::install(&mut self.page) {
            Ok(overlay) => overlay,
            Err(e) => {
                log(&format!("Failed to install selection layer: {}", e));
                self.notifier.toast("Cannot start selection on this page.", ToastKind::Failure);
                return SessionReport::Failed(e.into());
            }
        };

        self.notifier.toast(
            "Press to set the top-left corner, drag to the bottom-right. Esc cancels.",
            ToastKind::Info,
        );
        self.state = SessionState::Selecting {
            overlay,
            selector: Selector::new(),
        };
        SessionReport::Started
    }

    fn on_event_selecting(&mut self, overlay: OverlayLayer, mut selector: Selector, event: InputEvent) -> SessionReport {
        let (step, pointer) = match event {
            InputEvent::Key(key) if key.is_escape() => (selector.cancel(), None),
            InputEvent::Key(_) => {
                // One session at a time; the hotkey is ignored while selecting.
                self.state = SessionState::Selecting { overlay, selector };
                return SessionReport::Ignored;
            }
            InputEvent::Pointer(ev) => (selector.handle(ev), Some(ev.point())),
        };

        match step {
            Step::Continue(rect) => {
                overlay.draw(&mut self.page, pointer, rect);
                self.state = SessionState::Selecting { overlay, selector };
                SessionReport::Selecting(rect)
            }
            Step::Cancelled => {
                log("Selection cancelled");
                overlay.teardown(&mut self.page);
                // The same Escape also dismisses a result still on screen.
                if self.panel.is_open() {
                    self.panel.close();
                }
                SessionReport::Cancelled
            }
            Step::Done(SelectionOutcome::Discarded) => {
                log("Selection too small, discarded");
                overlay.teardown(&mut self.page);
                SessionReport::Discarded
            }
            Step::Done(SelectionOutcome::Selected(rect)) => {
                log(&format!(
                    "Selected ({}, {}) {}",
                    rect.x,
                    rect.y,
                    rect.size_label()
                ));
                self.finish(overlay, rect)
            }
        }
    }

    /// Capture, crop, upload. The layer is removed first so the screenshot
    /// does not contain it; text selection is restored once done.
    fn finish(&mut self, mut overlay: OverlayLayer, rect: ScreenRect) -> SessionReport {
        overlay.detach(&mut self.page);
        let viewport = overlay.viewport();
        let report = match self.capture_and_recognize(viewport, rect) {
            Ok(outcome) => {
                self.panel.show(&outcome.text);
                self.notifier.toast(
                    &format!("Recognition finished ({} ms)", outcome.elapsed.as_millis()),
                    ToastKind::Success,
                );
                SessionReport::Recognized(outcome)
            }
            Err(e) => {
                let message = match &e {
                    AppError::Capture(_) | AppError::Decode(_) => "Screenshot failed (captureVisibleTab).",
                    _ => "OCR request failed (see log).",
                };
                log(&format!("[OCR] session failed: {}", e));
                self.notifier.toast(message, ToastKind::Failure);
                SessionReport::Failed(e)
            }
        };
        overlay.teardown(&mut self.page);
        report
    }

    fn capture_and_recognize(&mut self, viewport: Viewport, rect: ScreenRect) -> AppResult<OcrOutcome> {
        let cropped = capture_and_crop(self.capture, viewport, rect, self.config.jpeg_quality)?;
        self.save_crop(&cropped);

        self.notifier.toast("Uploading for recognition…", ToastKind::Info);
        Ok(dispatch(self.transport, &cropped, self.config)?)
    }

    fn save_crop(&self, cropped: &CroppedImage) {
        let Some(dir) = &self.crop_dir else {
            return;
        };
        let timestamp = Local::now().format("%Y%m%d_%H%M%S%.3f");
        let path = dir.join(format!("crop_{}.png", timestamp));
        match cropped.image.save(&path) {
            Ok(()) => log(&format!("Crop saved to {}", path.display())),
            Err(e) => log(&format!("Failed to save crop to {}: {}", path.display(), e)),
        }
    }
}

impl<'a> SessionRunner<'a, SimulatedPage> {
    /// Dispatches a pointer at screen position `(x, y)` to the layer, if one
    /// is up.
    pub fn pointer_at(&mut self, kind: PointerKind, x: f64, y: f64) -> SessionReport {
        match self.page.pointer(kind, x, y) {
            Some(event) => self.handle_event(InputEvent::Pointer(event)),
            None => SessionReport::Ignored,
        }
    }
}
