//! Interactive region selection.
//!
//! This module provides:
//! - Viewport correction for the interaction layer (`coords`, `overlay`)
//! - The host page abstraction and a simulated page (`page`)
//! - The drag state machine (`state`)

pub mod coords;
pub mod overlay;
pub mod page;
pub mod state;

pub use coords::{ScreenRect, Viewport};
pub use page::{AmbientTransform, SimulatedPage};
pub use state::PointerKind;
