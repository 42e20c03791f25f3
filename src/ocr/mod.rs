pub mod client;
pub mod params;
pub mod result;

pub use client::{HttpTransport, OcrTransport};
pub use params::OcrLang;

use serde_json::Value;
use std::time::{Duration, Instant};

use crate::capture::crop::CroppedImage;
use crate::config::AppConfig;
use crate::error::TransportError;
use client::encode_upload;
use result::{boxes, display_text};

/// A successful recognition.
#[derive(Clone, Debug)]
pub struct OcrOutcome {
    /// What the result panel shows.
    pub text: String,
    /// Upload-to-response time.
    pub elapsed: Duration,
    pub body: Value,
}

/// High-level function: crop → upload → display text.
///
/// Encodes the crop in the configured format, sends it once with the
/// configured OCR parameters, and extracts the text to display. No retries.
pub fn dispatch<T: OcrTransport + ?Sized>(
    transport: &T,
    cropped: &CroppedImage,
    config: &AppConfig,
) -> Result<OcrOutcome, TransportError> {
    let upload = encode_upload(&cropped.image, config.upload_format, config.upload_quality())?;
    let (width, height) = cropped.dimensions();
    crate::log(&format!(
        "Uploading {}x{} crop as {} ({} bytes)",
        width,
        height,
        upload.mime,
        upload.bytes.len()
    ));

    let started = Instant::now();
    let body = transport.recognize(upload, &config.ocr)?;
    let elapsed = started.elapsed();

    crate::log(&format!(
        "OCR complete in {} ms ({} boxes)",
        elapsed.as_millis(),
        boxes(&body).len()
    ));

    Ok(OcrOutcome {
        text: display_text(&body),
        elapsed,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::crop::PixelRect;
    use crate::error::ReachabilityError;
    use client::Upload;
    use params::OcrParams;
    use image::{Rgba, RgbaImage};
    use serde_json::json;
    use std::cell::RefCell;

    struct FakeTransport {
        reply: Result<Value, u16>,
        uploads: RefCell<Vec<(&'static str, &'static str, OcrParams)>>,
    }

    impl OcrTransport for FakeTransport {
        fn health_check(&self) -> Result<(), ReachabilityError> {
            Ok(())
        }

        fn recognize(&self, upload: Upload, params: &OcrParams) -> Result<Value, TransportError> {
            self.uploads
                .borrow_mut()
                .push((upload.mime, upload.file_name, params.clone()));
            self.reply.clone().map_err(TransportError::Status)
        }
    }

    fn crop() -> CroppedImage {
        CroppedImage {
            image: RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 255])),
            source: PixelRect { x: 0, y: 0, w: 8, h: 4 },
        }
    }

    #[test]
    fn test_dispatch_returns_text() {
        let transport = FakeTransport {
            reply: Ok(json!({"text": "Hello"})),
            uploads: RefCell::new(Vec::new()),
        };
        let outcome = dispatch(&transport, &crop(), &AppConfig::default()).unwrap();
        assert_eq!(outcome.text, "Hello");

        let uploads = transport.uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "image/jpeg");
        assert_eq!(uploads[0].1, "sel.jpg");
        assert_eq!(uploads[0].2, OcrParams::default());
    }

    #[test]
    fn test_dispatch_error_status_is_not_retried() {
        let transport = FakeTransport {
            reply: Err(500),
            uploads: RefCell::new(Vec::new()),
        };
        let err = dispatch(&transport, &crop(), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, TransportError::Status(500)));
        assert_eq!(transport.uploads.borrow().len(), 1);
    }
}
