//! The authoritative ordered collection of a field's attached items.
//!
//! Transforms for sibling files complete in any order, each one computed from
//! the collection as it was before any of them finished. Writing a rebuilt
//! copy of an observed snapshot back would let the last writer clobber every
//! other completion. Instead every mutation is an index-addressed update
//! against the one list the [`Reconciler`] owns, performed under its lock, and
//! readers only ever get copies via [`Reconciler::snapshot`].
//!
//! ## Generations
//!
//! Attaching a new selection or clearing the field starts a new
//! [`Generation`]. Work started for an older generation carries its ticket,
//! and [`Reconciler::replace`] rejects it with
//! [`ReconcileError::Superseded`] instead of reinserting a file the user
//! already discarded.
//!
//! ```text
//! attach([a, b, c])   → gen 1: [Slot0 a, Slot1 b, Slot2 c]
//! replace(1, Slot1, b') → gen 1: [Slot0 a, Slot1 b', Slot2 c]
//! clear()             → gen 2: []
//! replace(1, Slot0, a') → Err(Superseded { stale: 1, current: 2 })
//! ```

use crate::files::{Payload, SourceFile};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Attachment epoch of a field. Monotonically increasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable key of an attached item.
///
/// Slots are assigned in attachment order, so two files with the same display
/// name are still distinct items. Captured frames always use the single
/// [`Identity::Capture`] slot so repeated captures replace each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Slot(u32),
    Capture,
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slot(n) => write!(f, "#{n}"),
            Self::Capture => f.write_str("capture"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachedItem {
    pub identity: Identity,
    pub payload: Payload,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("completion for generation {stale} discarded, field is at generation {current}")]
    Superseded {
        stale: Generation,
        current: Generation,
    },
}

/// How a successful [`Reconciler::replace`] landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// An existing item at this index got the new payload.
    Replaced(usize),
    /// No item had the identity; it was appended at this index.
    Appended(usize),
}

#[derive(Debug, Default)]
struct State {
    generation: Generation,
    items: Vec<AttachedItem>,
}

/// Owner of one field's attached items.
///
/// Cloning is cheap and every clone refers to the same collection, so
/// in-flight transforms can hold one without borrowing the field. The lock is
/// never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    state: Arc<Mutex<State>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic mid-update cannot leave the Vec half-written, so keep going
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self) -> Generation {
        self.lock().generation
    }

    /// Replace the whole collection with a fresh selection.
    ///
    /// Starts a new generation, so completions still in flight for the
    /// previous selection are discarded. Returns the new generation and the
    /// identity assigned to each file, in attachment order.
    pub fn attach(&self, files: Vec<SourceFile>) -> (Generation, Vec<(Identity, SourceFile)>) {
        let mut state = self.lock();
        state.generation = state.generation.next();

        let assigned: Vec<(Identity, SourceFile)> = files
            .into_iter()
            .enumerate()
            .map(|(slot, file)| (Identity::Slot(slot as u32), file))
            .collect();
        state.items = assigned
            .iter()
            .map(|(identity, file)| AttachedItem {
                identity: *identity,
                payload: Payload::Original(file.clone()),
            })
            .collect();

        (state.generation, assigned)
    }

    /// Put `payload` into the item with `identity`, or append a new item.
    ///
    /// The lookup and the write happen under one lock, against the
    /// authoritative list, so concurrent replaces for distinct identities
    /// never lose each other's updates and never disturb the order of other
    /// items.
    pub fn replace(
        &self,
        generation: Generation,
        identity: Identity,
        payload: impl Into<Payload>,
    ) -> Result<ReplaceOutcome, ReconcileError> {
        let mut state = self.lock();
        if generation != state.generation {
            return Err(ReconcileError::Superseded {
                stale: generation,
                current: state.generation,
            });
        }

        let payload = payload.into();
        match state.items.iter().position(|item| item.identity == identity) {
            Some(index) => {
                state.items[index].payload = payload;
                Ok(ReplaceOutcome::Replaced(index))
            }
            None => {
                state.items.push(AttachedItem { identity, payload });
                Ok(ReplaceOutcome::Appended(state.items.len() - 1))
            }
        }
    }

    /// Copy of the current items, in attachment order.
    pub fn snapshot(&self) -> Vec<AttachedItem> {
        self.lock().items.clone()
    }

    /// Discard every item and start a new generation.
    pub fn clear(&self) -> Generation {
        let mut state = self.lock();
        state.items.clear();
        state.generation = state.generation.next();
        state.generation
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}
