//! Selection sessions: input, presentation and the runner tying them
//! to selection, capture and OCR.

pub mod input;
pub mod present;
pub mod runner;

pub use input::InputEvent;
pub use present::{ConsolePanel, LogNotifier};
pub use runner::{SessionReport, SessionRunner};
