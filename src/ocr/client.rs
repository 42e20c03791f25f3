//! HTTP transport to the OCR backend.

use image::{DynamicImage, ImageFormat, RgbaImage};
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use std::io::Cursor;
use std::time::Duration;

use crate::capture::protocol::encode_jpeg;
use crate::config::{AppConfig, UploadFormat};
use crate::error::{ReachabilityError, TransportError};
use crate::ocr::params::OcrParams;

/// An encoded image ready to go into the multipart body.
#[derive(Clone, Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub file_name: &'static str,
}

/// Encodes the crop in the upload format. `quality` only affects JPEG.
pub fn encode_upload(image: &RgbaImage, format: UploadFormat, quality: u8) -> Result<Upload, TransportError> {
    let bytes = match format {
        UploadFormat::Jpeg => encode_jpeg(image, quality)?,
        UploadFormat::Png => {
            let mut bytes = Vec::new();
            DynamicImage::ImageRgba8(image.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
            bytes
        }
    };

    Ok(Upload {
        bytes,
        mime: format.mime(),
        file_name: format.file_name(),
    })
}

/// Talks to the OCR service.
pub trait OcrTransport {
    /// Pre-flight reachability probe.
    fn health_check(&self) -> Result<(), ReachabilityError>;

    /// Uploads one image and returns the parsed JSON body.
    fn recognize(&self, upload: Upload, params: &OcrParams) -> Result<Value, TransportError>;
}

/// `OcrTransport` over blocking reqwest.
pub struct HttpTransport {
    client: Client,
    ocr_url: String,
    health_url: String,
}

impl HttpTransport {
    pub fn new(config: &AppConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            ocr_url: config.ocr_url(),
            health_url: config.health_url(),
        }
    }
}

impl OcrTransport for HttpTransport {
    fn health_check(&self) -> Result<(), ReachabilityError> {
        let unreachable = |reason: String| ReachabilityError {
            url: self.health_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.health_url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status().as_u16())));
        }
        Ok(())
    }

    fn recognize(&self, upload: Upload, params: &OcrParams) -> Result<Value, TransportError> {
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(upload.mime)?;
        let form = Form::new().part("file", part);

        crate::log(&format!("POST {} ({})", self.ocr_url, upload.file_name));
        let response = self
            .client
            .post(&self.ocr_url)
            .query(&params.query_pairs())
            .header(CACHE_CONTROL, "no-store")
            .multipart(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| TransportError::MalformedBody(e.to_string()))
    }
}
