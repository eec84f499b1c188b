// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending-change slots and their reducer.
//!
//! Every position that can change on its own (the root, and each state cell
//! of a component) owns an [`UpdateQueue`]. The queue is reference counted
//! ([`SharedQueue`]) so that both buffers of a position see the same pending
//! update, no matter which one a setter was created against.
//!
//! The queue holds a single pending slot: enqueuing twice before the next
//! render keeps only the last update.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

/// A requested change to a piece of state.
pub enum Update<S> {
    /// Replace the state with a value.
    Replace(S),
    /// Compute the next state from the previous one.
    Apply(Rc<dyn Fn(&S) -> S>),
}

impl<S: Clone> Clone for Update<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Replace(v) => Self::Replace(v.clone()),
            Self::Apply(f) => Self::Apply(Rc::clone(f)),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Update<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(v) => f.debug_tuple("Replace").field(v).finish(),
            Self::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// Holding area for the pending update of one position.
#[derive(Debug)]
pub struct UpdateQueue<S> {
    pending: Option<Update<S>>,
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<S> UpdateQueue<S> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `update` as the pending update, replacing any previous one.
    pub fn enqueue(&mut self, update: Update<S>) {
        self.pending = Some(update);
    }

    /// Returns whether an update is pending.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Removes and returns the pending update.
    pub fn take(&mut self) -> Option<Update<S>> {
        self.pending.take()
    }

    /// Puts a drained update back, unless a newer one arrived meanwhile.
    pub(crate) fn restore(&mut self, update: Update<S>) {
        if self.pending.is_none() {
            self.pending = Some(update);
        }
    }
}

/// An [`UpdateQueue`] shared by both buffers of a position.
pub type SharedQueue<S> = Rc<RefCell<UpdateQueue<S>>>;

/// Creates an empty [`SharedQueue`].
#[must_use]
pub fn shared_queue<S>() -> SharedQueue<S> {
    Rc::new(RefCell::new(UpdateQueue::new()))
}

/// Folds a pending update into `base`.
///
/// Without a pending update the base state is returned unchanged.
#[must_use]
pub fn process<S: Clone>(base: &S, pending: Option<&Update<S>>) -> S {
    match pending {
        None => base.clone(),
        Some(Update::Replace(value)) => value.clone(),
        Some(Update::Apply(f)) => f(base),
    }
}
