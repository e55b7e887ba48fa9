//! Debounce and merge bookkeeping for text input.
//!
//! Each tracked element has at most one pending entry: observing a new
//! input cancels the outstanding timer, records the latest value and
//! bumps the generation. A fired timer may only claim its own
//! generation, so a late fire after a re-arm or flush is a no-op.
//! Timer scheduling itself lives with the session (it needs the shared
//! state handle); this module owns the bookkeeping and the merge rule.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::dom::{Document, NodeId};

use super::step::{CapturedStep, Coords, StepKind};

/// Identity of a tracked element: owning document plus node.
pub type ElementKey = (Uuid, NodeId);

/// A typed-but-not-yet-finalized input.
pub struct PendingInput {
    pub doc: Arc<Document>,
    pub node: NodeId,
    pub value: String,
    pub coords: Option<Coords>,
    pub generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl PendingInput {
    fn cancel_timer(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[derive(Default)]
pub struct StepAccumulator {
    pending: HashMap<ElementKey, PendingInput>,
    next_generation: u64,
}

impl StepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest value for an element, canceling any outstanding
    /// timer. Returns the generation the caller must arm its replacement
    /// timer with.
    pub fn observe(
        &mut self,
        key: ElementKey,
        doc: Arc<Document>,
        node: NodeId,
        value: String,
        coords: Option<Coords>,
    ) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(existing) = self.pending.get_mut(&key) {
            existing.cancel_timer();
            existing.value = value;
            existing.coords = coords.or(existing.coords);
            existing.generation = generation;
        } else {
            self.pending.insert(
                key,
                PendingInput {
                    doc,
                    node,
                    value,
                    coords,
                    generation,
                    handle: None,
                },
            );
        }
        generation
    }

    /// Attach the armed timer handle, unless the entry was re-armed or
    /// flushed in the meantime.
    pub fn attach_timer(&mut self, key: ElementKey, generation: u64, handle: JoinHandle<()>) {
        match self.pending.get_mut(&key) {
            Some(entry) if entry.generation == generation => entry.handle = Some(handle),
            _ => handle.abort(),
        }
    }

    /// Timer-fire path: take the entry iff the firing timer is still the
    /// current one.
    pub fn claim(&mut self, key: ElementKey, generation: u64) -> Option<PendingInput> {
        if self.pending.get(&key)?.generation != generation {
            return None;
        }
        self.pending.remove(&key)
    }

    /// Flush path (blur / Enter): take the entry unconditionally and
    /// cancel its timer.
    pub fn flush(&mut self, key: ElementKey) -> Option<PendingInput> {
        let mut entry = self.pending.remove(&key)?;
        entry.cancel_timer();
        Some(entry)
    }

    /// Stop path: take every entry in arm order, canceling all timers.
    pub fn drain(&mut self) -> Vec<PendingInput> {
        let mut entries: Vec<PendingInput> = self
            .pending
            .drain()
            .map(|(_, mut entry)| {
                entry.cancel_timer();
                entry
            })
            .collect();
        entries.sort_by_key(|e| e.generation);
        entries
    }

    pub fn has_pending(&self, key: &ElementKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Append a finalized step, folding consecutive inputs on the same
    /// element together: if the immediately preceding step is an input
    /// with the same bundle identity, its value and timestamp are
    /// overwritten in place. Returns the step's index and whether it was
    /// merged.
    pub fn merge_or_append(steps: &mut Vec<CapturedStep>, step: CapturedStep) -> (usize, bool) {
        if step.kind == StepKind::Input {
            if let Some(last) = steps.last_mut() {
                if last.kind == StepKind::Input && last.bundle.same_identity(&step.bundle) {
                    last.value = step.value;
                    last.timestamp = step.timestamp;
                    last.merged = true;
                    return (steps.len() - 1, true);
                }
            }
        }
        steps.push(step);
        (steps.len() - 1, false)
    }
}
