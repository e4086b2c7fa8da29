//! Stroke history: the committed and undone stacks.
//!
//! `committed` is the rendered board, back to front. `undone` holds strokes
//! removed by undo, most recent last. Strokes are never deleted, only moved
//! between the two stacks.
//!
//! The history mirrors the *global* board, sequenced by the relay. Local
//! strokes are drawn immediately but stay in flight until the relay echoes
//! them back. Anything delivered before that echo was ordered ahead of them,
//! so foreign strokes are slotted in below the in-flight ones and the echo
//! confirms a stroke where it already sits. Undo/redo ship full snapshots;
//! the last one delivered wins.

use std::collections::HashSet;

use crate::protocol::HistorySnapshot;
use crate::render::{Scene, Surface, redraw};
use crate::stroke::{Stroke, StrokeId};

/// Applying a remote history state.
///
/// Undo/redo currently ship the entire committed sequence. Keeping this
/// behind a trait lets a delta-based protocol replace it without touching
/// the gesture handling.
pub trait HistorySync {
    /// Replace the committed sequence with a remote one. The undone stack is
    /// left alone, even if it no longer lines up with the new baseline.
    fn apply_history_snapshot(&mut self, strokes: Vec<Stroke>);
}

/// The local view of what is drawn, plus the surface it is drawn on.
#[derive(Debug)]
pub struct StrokeHistory<S: Surface = Scene> {
    committed: Vec<Stroke>,
    undone: Vec<Stroke>,
    /// Every stroke id this history has ever held.
    seen: HashSet<StrokeId>,
    /// Local strokes sent to the relay and not yet echoed, oldest first.
    in_flight: Vec<StrokeId>,
    surface: S,
}

impl Default for StrokeHistory<Scene> {
    fn default() -> Self {
        Self::new(Scene::new())
    }
}

impl<S: Surface> StrokeHistory<S> {
    /// Create an empty history rendering to `surface`.
    pub fn new(surface: S) -> Self {
        let mut history = Self {
            committed: Vec::new(),
            undone: Vec::new(),
            seen: HashSet::new(),
            in_flight: Vec::new(),
            surface,
        };
        history.redraw();
        history
    }

    /// Push a stroke onto the committed stack and redraw.
    ///
    /// The undone stack is kept; redo after a new commit stacks the redone
    /// stroke on top.
    pub fn commit(&mut self, stroke: Stroke) {
        self.seen.insert(stroke.id());
        self.committed.push(stroke);
        self.redraw();
    }

    /// Mark a committed stroke as sent and awaiting its echo.
    pub fn mark_in_flight(&mut self, id: StrokeId) {
        if self.committed.iter().any(|s| s.id() == id) && !self.in_flight.contains(&id) {
            self.in_flight.push(id);
        }
    }

    /// Local strokes still waiting for the relay, oldest first.
    pub fn in_flight(&self) -> &[StrokeId] {
        &self.in_flight
    }

    /// Apply a stroke received from the relay.
    ///
    /// The echo of an in-flight stroke confirms it in place. Other ids already
    /// seen (duplicate deliveries, strokes since undone) are ignored. A new
    /// stroke is placed below any in-flight strokes, matching the relay's
    /// order. Returns true if the stroke was added. Never touches the undone
    /// stack.
    pub fn apply_remote_stroke(&mut self, stroke: Stroke) -> bool {
        let id = stroke.id();
        if let Some(pos) = self.in_flight.iter().position(|&pending| pending == id) {
            self.in_flight.remove(pos);
            return false;
        }
        if self.seen.contains(&id) {
            log::debug!("Ignoring already-seen stroke {}", id);
            return false;
        }

        self.seen.insert(id);
        let at = self
            .committed
            .iter()
            .position(|s| self.in_flight.contains(&s.id()))
            .unwrap_or(self.committed.len());
        self.committed.insert(at, stroke);
        self.redraw();
        true
    }

    /// Undo the most recent committed stroke.
    /// Returns the new committed sequence to broadcast, or None if there was
    /// nothing to undo.
    pub fn undo(&mut self) -> Option<HistorySnapshot> {
        let stroke = self.committed.pop()?;
        self.undone.push(stroke);
        self.redraw();
        Some(self.snapshot())
    }

    /// Redo the most recently undone stroke.
    /// Returns the new committed sequence to broadcast, or None if there was
    /// nothing to redo.
    ///
    /// Undone strokes that a remote snapshot has already put back on the
    /// board are discarded instead of being stacked a second time.
    pub fn redo(&mut self) -> Option<HistorySnapshot> {
        while let Some(stroke) = self.undone.pop() {
            if self.committed.iter().any(|s| s.id() == stroke.id()) {
                log::debug!("Discarding redo of {}, already committed", stroke.id());
                continue;
            }
            self.committed.push(stroke);
            self.redraw();
            return Some(self.snapshot());
        }
        None
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.committed.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Committed strokes, back to front.
    pub fn committed(&self) -> &[Stroke] {
        &self.committed
    }

    /// Undone strokes, most recently undone last.
    pub fn undone(&self) -> &[Stroke] {
        &self.undone
    }

    /// A copy of the committed sequence.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::new(self.committed.clone())
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Whether a stroke id has ever been held by this history.
    pub fn has_seen(&self, id: StrokeId) -> bool {
        self.seen.contains(&id)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Clear the surface and draw the committed sequence.
    pub fn redraw(&mut self) {
        redraw(&mut self.surface, &self.committed);
    }
}

impl<S: Surface> HistorySync for StrokeHistory<S> {
    /// In-flight strokes missing from the snapshot were ordered after it and
    /// stay on top.
    fn apply_history_snapshot(&mut self, mut strokes: Vec<Stroke>) {
        self.seen.extend(strokes.iter().map(Stroke::id));
        let pending: Vec<Stroke> = self
            .committed
            .drain(..)
            .filter(|s| self.in_flight.contains(&s.id()) && !strokes.iter().any(|t| t.id() == s.id()))
            .collect();
        strokes.extend(pending);
        self.committed = strokes;
        self.redraw();
    }
}
