//! Privileged capture host.
//!
//! Runs in a separate thread, receiving capture requests over a channel and
//! answering each with a JPEG data URL of the current screen. Callers block
//! on the reply, which is the capture round-trip suspend point.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use crate::capture::protocol::{CaptureRequest, CaptureResponse, encode_data_url, encode_jpeg};
use crate::error::CaptureError;
use crate::log;

/// Sends capture requests across the privilege boundary.
pub trait CaptureClient {
    fn capture(&self, request: CaptureRequest) -> Result<CaptureResponse, CaptureError>;
}

/// Produces the pixels of the visible viewport.
pub trait ScreenSource: Send {
    fn grab(&mut self) -> Result<RgbaImage>;
}

/// Reads the "screen" from an image file on every grab.
#[derive(Clone, Debug)]
pub struct FileScreenSource {
    path: PathBuf,
}

impl FileScreenSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ScreenSource for FileScreenSource {
    fn grab(&mut self) -> Result<RgbaImage> {
        let img = image::open(&self.path)
            .with_context(|| format!("Failed to read screenshot {}", self.path.display()))?;
        Ok(img.to_rgba8())
    }
}

/// A capture request paired with where to send the answer.
struct CaptureJob {
    request: CaptureRequest,
    reply: Sender<CaptureResponse>,
}

/// Answers one request: grab, encode as JPEG at the requested quality,
/// wrap as a data URL. Failures become `{ok: false, error}`.
pub fn handle_request<S: ScreenSource + ?Sized>(source: &mut S, request: &CaptureRequest) -> CaptureResponse {
    let img = match source.grab() {
        Ok(img) => img,
        Err(e) => {
            log(&format!("Capture host: grab failed: {:#}", e));
            return CaptureResponse::failure(format!("{:#}", e));
        }
    };

    let quality = request.jpeg_quality();
    match encode_jpeg(&img, quality) {
        Ok(bytes) => {
            log(&format!(
                "Capture host: {}x{} screenshot, JPEG q{} ({} bytes)",
                img.width(),
                img.height(),
                quality,
                bytes.len()
            ));
            CaptureResponse::success(encode_data_url("image/jpeg", &bytes))
        }
        Err(e) => {
            log(&format!("Capture host: JPEG encode failed: {}", e));
            CaptureResponse::failure(e.to_string())
        }
    }
}

/// Runs the capture loop until every sender is dropped.
fn run_capture_service<S: ScreenSource>(receiver: Receiver<CaptureJob>, mut source: S) {
    log("Capture host started");

    while let Ok(job) = receiver.recv() {
        let response = handle_request(&mut source, &job.request);
        if job.reply.send(response).is_err() {
            log("Capture host: requester went away before the reply");
        }
    }

    log("Capture host: channel closed, exiting");
}

/// Handle to the capture host thread.
pub struct CaptureHost {
    sender: Option<Sender<CaptureJob>>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureHost {
    /// Spawns the host thread around `source`.
    pub fn spawn<S: ScreenSource + 'static>(source: S) -> Result<Self> {
        let (sender, receiver) = channel();
        let handle = thread::Builder::new()
            .name("capture-host".to_string())
            .spawn(move || run_capture_service(receiver, source))
            .context("Failed to spawn capture host thread")?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Closes the channel and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log("Capture host thread panicked");
            }
        }
    }
}

impl CaptureClient for CaptureHost {
    fn capture(&self, request: CaptureRequest) -> Result<CaptureResponse, CaptureError> {
        let sender = self.sender.as_ref().ok_or(CaptureError::Unavailable)?;
        let (reply, response) = channel();
        sender
            .send(CaptureJob { request, reply })
            .map_err(|_| CaptureError::Unavailable)?;
        response.recv().map_err(|_| CaptureError::Unavailable)
    }
}

impl Drop for CaptureHost {
    fn drop(&mut self) {
        self.stop();
    }
}
