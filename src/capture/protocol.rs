//! Messages exchanged with the privileged capture host.
//!
//! Wire shapes:
//! - request  `{"type": "captureVisibleTab", "quality": 0.92}`
//! - response `{"ok": true, "dataUrl": "data:image/jpeg;base64,..."}`
//!   or       `{"ok": false, "error": "..."}`
//!
//! The screenshot itself always travels as a base64 JPEG data URL.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, DecodeError};

/// Quality used when a request carries no usable value.
pub const DEFAULT_CAPTURE_QUALITY: f64 = 0.92;

/// Error text the host reports when the capture backend gives no detail.
pub const GENERIC_CAPTURE_FAILURE: &str = "captureVisibleTab failed";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaptureRequest {
    /// Screenshot of the visible viewport, JPEG at `quality` (0..1).
    #[serde(rename = "captureVisibleTab")]
    CaptureVisibleTab { quality: f64 },
}

impl CaptureRequest {
    pub fn visible_tab(quality: f64) -> Self {
        Self::CaptureVisibleTab { quality }
    }

    /// JPEG compression level the host encodes with: `round(quality * 100)`,
    /// clamped to 1..=100.
    pub fn jpeg_quality(&self) -> u8 {
        let Self::CaptureVisibleTab { quality } = self;
        let q = if quality.is_finite() { *quality } else { DEFAULT_CAPTURE_QUALITY };
        (q * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResponse {
    pub fn success(data_url: String) -> Self {
        Self {
            ok: true,
            data_url: Some(data_url),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data_url: None,
            error: Some(error.into()),
        }
    }

    /// Extracts the data URL or the reason there is none.
    pub fn into_data_url(self) -> Result<String, CaptureError> {
        if !self.ok {
            let reason = self
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| GENERIC_CAPTURE_FAILURE.to_string());
            return Err(CaptureError::Denied(reason));
        }
        match self.data_url {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(CaptureError::NoImageData),
        }
    }
}

/// Builds `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Splits a base64 data URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), DecodeError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| DecodeError::MalformedDataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| DecodeError::MalformedDataUrl("missing ',' separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| DecodeError::MalformedDataUrl(format!("not base64 encoded: {}", header)))?;

    let bytes = BASE64.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(DecodeError::MalformedDataUrl("empty payload".to_string()));
    }
    Ok((mime.to_string(), bytes))
}

/// Decodes a screenshot data URL into an RGBA pixel buffer.
pub fn decode_screenshot(url: &str) -> Result<RgbaImage, DecodeError> {
    let (_, bytes) = decode_data_url(url)?;
    let img = image::load_from_memory(&bytes)?;
    Ok(img.to_rgba8())
}

/// Encodes as JPEG. Alpha is dropped.
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> ImageResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(rgb).write_with_encoder(encoder)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(CaptureRequest::visible_tab(0.92)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "captureVisibleTab", "quality": 0.92}));

        let parsed: CaptureRequest =
            serde_json::from_str(r#"{"type":"captureVisibleTab","quality":0.5}"#).unwrap();
        assert_eq!(parsed, CaptureRequest::visible_tab(0.5));
    }

    #[test]
    fn test_jpeg_quality_rounds_and_clamps() {
        assert_eq!(CaptureRequest::visible_tab(0.92).jpeg_quality(), 92);
        assert_eq!(CaptureRequest::visible_tab(0.5).jpeg_quality(), 50);
        assert_eq!(CaptureRequest::visible_tab(0.0).jpeg_quality(), 1);
        assert_eq!(CaptureRequest::visible_tab(3.0).jpeg_quality(), 100);
        assert_eq!(CaptureRequest::visible_tab(f64::NAN).jpeg_quality(), 92);
    }

    #[test]
    fn test_response_wire_shapes() {
        let ok: CaptureResponse =
            serde_json::from_str(r#"{"ok":true,"dataUrl":"data:image/jpeg;base64,AAAA"}"#).unwrap();
        assert_eq!(ok.into_data_url().unwrap(), "data:image/jpeg;base64,AAAA");

        let denied: CaptureResponse = serde_json::from_str(r#"{"ok":false,"error":"denied"}"#).unwrap();
        match denied.into_data_url() {
            Err(CaptureError::Denied(msg)) => assert_eq!(msg, "denied"),
            other => panic!("unexpected {:?}", other),
        }

        let json = serde_json::to_value(CaptureResponse::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "nope"}));
    }

    #[test]
    fn test_ok_without_data_is_no_image_data() {
        let resp: CaptureResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(matches!(resp.into_data_url(), Err(CaptureError::NoImageData)));

        let resp = CaptureResponse::success(String::new());
        assert!(matches!(resp.into_data_url(), Err(CaptureError::NoImageData)));
    }

    #[test]
    fn test_failure_without_message_uses_generic_text() {
        let resp: CaptureResponse = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        match resp.into_data_url() {
            Err(CaptureError::Denied(msg)) => assert_eq!(msg, GENERIC_CAPTURE_FAILURE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_data_url_rejects_malformed() {
        assert!(matches!(decode_data_url("image/png;base64,AAAA"), Err(DecodeError::MalformedDataUrl(_))));
        assert!(matches!(decode_data_url("data:image/png;base64"), Err(DecodeError::MalformedDataUrl(_))));
        assert!(matches!(decode_data_url("data:text/plain,hello"), Err(DecodeError::MalformedDataUrl(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,@@@"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn test_decode_screenshot_from_jpeg_data_url() {
        let img = RgbaImage::from_pixel(16, 8, Rgba([200, 40, 40, 255]));
        let url = encode_data_url("image/jpeg", &encode_jpeg(&img, 92).unwrap());
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let decoded = decode_screenshot(&url).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
    }

    #[test]
    fn test_decode_screenshot_garbage_payload() {
        let url = encode_data_url("image/jpeg", b"definitely not a jpeg");
        assert!(matches!(decode_screenshot(&url), Err(DecodeError::Image(_))));
    }
}
