//! Result panel and toast notifications.

use anyhow::{Context, Result};

/// How a toast is styled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Failure,
}

/// Short-lived, non-blocking messages.
pub trait Notifier {
    fn toast(&mut self, message: &str, kind: ToastKind);
}

/// Writes toasts to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&mut self, message: &str, kind: ToastKind) {
        let tag = match kind {
            ToastKind::Info => "info",
            ToastKind::Success => "ok",
            ToastKind::Failure => "FAILED",
        };
        crate::log(&format!("[{}] {}", tag, message));
    }
}

/// Shows recognized text until closed.
pub trait ResultPanel {
    fn show(&mut self, text: &str);
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Prints the result to stdout.
#[derive(Debug, Default)]
pub struct ConsolePanel {
    text: Option<String>,
}

impl ConsolePanel {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Copies the shown text to the system clipboard.
    pub fn copy_to_clipboard(&self) -> Result<()> {
        let Some(text) = self.text.as_deref() else {
            return Ok(());
        };
        let mut clipboard = arboard::Clipboard::new().context("Failed to open clipboard")?;
        clipboard
            .set_text(text.to_string())
            .context("Failed to copy OCR text")?;
        crate::log("OCR text copied to clipboard");
        Ok(())
    }
}

impl ResultPanel for ConsolePanel {
    fn show(&mut self, text: &str) {
        println!("──────── OCR result (Esc closes) ────────");
        println!("{}", text);
        println!("─────────────────────────────────────────");
        self.text = Some(text.to_string());
    }

    fn close(&mut self) {
        self.text = None;
    }

    fn is_open(&self) -> bool {
        self.text.is_some()
    }
}
