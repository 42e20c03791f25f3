//! Selector state machine.
//!
//! Sequences: Idle → Dragging → Finalized, with Cancelled reachable from
//! any state. Pointer coordinates are read from events dispatched to the
//! corrected interaction layer, so they are viewport CSS pixels.

use crate::selection::coords::{Point, ScreenRect};

/// Selections narrower or shorter than this are discarded.
pub const MIN_SELECTION_SIZE: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer event in layer coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    #[cfg(test)]
    pub fn down(x: f64, y: f64) -> Self {
        Self { kind: PointerKind::Down, x, y }
    }

    #[cfg(test)]
    pub fn moved(x: f64, y: f64) -> Self {
        Self { kind: PointerKind::Move, x, y }
    }

    #[cfg(test)]
    pub fn up(x: f64, y: f64) -> Self {
        Self { kind: PointerKind::Up, x, y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Selector states.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectorState {
    /// Layer is up, waiting for the first pointer-down.
    Idle,
    /// Pointer is held; `rect` follows the pointer.
    Dragging { anchor: Point, rect: ScreenRect },
    /// Pointer released.
    Finalized(SelectionOutcome),
    /// Escape pressed.
    Cancelled,
}

impl std::fmt::Display for SelectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorState::Idle => write!(f, "Idle"),
            SelectorState::Dragging { rect, .. } => write!(f, "Dragging ({})", rect.size_label()),
            SelectorState::Finalized(SelectionOutcome::Selected(_)) => write!(f, "Selected"),
            SelectorState::Finalized(SelectionOutcome::Discarded) => write!(f, "Discarded"),
            SelectorState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// What a finished drag produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionOutcome {
    /// A rectangle large enough to capture.
    Selected(ScreenRect),
    /// Too small; silently dropped.
    Discarded,
}

/// Result of feeding one event to the selector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Still selecting. Carries the current rectangle while dragging.
    Continue(Option<ScreenRect>),
    /// The selection finished with the given outcome.
    Done(SelectionOutcome),
    /// The selection was cancelled.
    Cancelled,
}

/// Tracks one drag from pointer-down to pointer-up.
#[derive(Clone, Debug)]
pub struct Selector {
    state: SelectorState,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    pub fn new() -> Self {
        Self {
            state: SelectorState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    /// True once the selector reached Finalized or Cancelled.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SelectorState::Finalized(_) | SelectorState::Cancelled)
    }

    #[cfg(test)]
    /// Rectangle being dragged, if any.
    pub fn current_rect(&self) -> Option<ScreenRect> {
        match self.state {
            SelectorState::Dragging { rect, .. } => Some(rect),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> Step {
        match event.kind {
            PointerKind::Down => self.pointer_down(event.point()),
            PointerKind::Move => self.pointer_move(event.point()),
            PointerKind::Up => self.pointer_up(),
        }
    }

    /// Records the anchor. A second pointer-down while dragging restarts
    /// the drag from the new point.
    pub fn pointer_down(&mut self, p: Point) -> Step {
        if self.is_finished() {
            return self.finished_step();
        }
        let rect = ScreenRect::new(p.x, p.y, 0.0, 0.0);
        self.state = SelectorState::Dragging { anchor: p, rect };
        Step::Continue(Some(rect))
    }

    pub fn pointer_move(&mut self, p: Point) -> Step {
        if let SelectorState::Dragging { anchor, rect } = &mut self.state {
            *rect = ScreenRect::from_drag(*anchor, p);
            return Step::Continue(Some(*rect));
        }
        self.finished_step()
    }

    /// Finalizes the drag. Ignored unless dragging.
    pub fn pointer_up(&mut self) -> Step {
        let rect = match &self.state {
            SelectorState::Dragging { rect, .. } => *rect,
            SelectorState::Idle => return Step::Continue(None),
            _ => return self.finished_step(),
        };

        let outcome = if rect.w < MIN_SELECTION_SIZE || rect.h < MIN_SELECTION_SIZE {
            SelectionOutcome::Discarded
        } else {
            SelectionOutcome::Selected(rect)
        };
        self.state = SelectorState::Finalized(outcome);
        Step::Done(outcome)
    }

    /// Cancels from any state. Cancelling a finished selection is a no-op.
    pub fn cancel(&mut self) -> Step {
        if !matches!(self.state, SelectorState::Finalized(_)) {
            self.state = SelectorState::Cancelled;
        }
        self.finished_step()
    }

    fn finished_step(&self) -> Step {
        match self.state {
            SelectorState::Finalized(outcome) => Step::Done(outcome),
            SelectorState::Cancelled => Step::Cancelled,
            SelectorState::Dragging { rect, .. } => Step::Continue(Some(rect)),
            SelectorState::Idle => Step::Continue(None),
        }
    }
}
