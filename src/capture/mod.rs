//! Screenshot capture and cropping.
//!
//! This module provides:
//! - The capture boundary wire format and data URL codec (`protocol`)
//! - The capture host thread and screen sources (`service`)
//! - Selection-to-pixel mapping and cropping (`crop`)

pub mod crop;
pub mod protocol;
pub mod service;

pub use crop::capture_and_crop;
pub use service::{CaptureHost, FileScreenSource};
