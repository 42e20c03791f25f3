//! Error types for the capture, crop and dispatch pipeline.
//!
//! Every error is recovered at the boundary where it occurs: the session
//! runner logs it, shows a failure toast and tears the session down.

use thiserror::Error;

/// Umbrella error for one selection session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Reachability error: {0}")]
    Reachability(#[from] ReachabilityError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// The privileged capture call was unavailable, denied, or returned nothing.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture denied: {0}")]
    Denied(String),

    #[error("capture returned no image data")]
    NoImageData,

    #[error("capture service unavailable")]
    Unavailable,

    #[error("viewport has no area ({width}x{height})")]
    InvalidViewport { width: f64, height: f64 },
}

/// The screenshot payload could not be turned into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Failure reaching or talking to the OCR endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("failed to encode upload: {0}")]
    Encode(#[from] image::ImageError),
}

/// Pre-flight health check failed.
#[derive(Debug, Error)]
#[error("OCR backend unreachable at {url}: {reason}")]
pub struct ReachabilityError {
    pub url: String,
    pub reason: String,
}

/// The interaction layer could not be measured.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layer measured as {width}x{height}, cannot derive a correction")]
    DegenerateMeasurement { width: f64, height: f64 },
}

/// Result type alias for session operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_converts_into_app_error() {
        let err: AppError = CaptureError::Denied("denied".to_string()).into();
        assert!(matches!(err, AppError::Capture(CaptureError::Denied(_))));
        assert_eq!(err.to_string(), "Capture error: capture denied: denied");
    }

    #[test]
    fn test_reachability_message_names_url() {
        let err = ReachabilityError {
            url: "http://localhost:8000/healthz".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("http://localhost:8000/healthz"));
    }
}
