// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component-local state cells and update scheduling.
//!
//! A component receives a [`RenderContext`] for the duration of one
//! invocation. The context binds [`use_state`](RenderContext::use_state)
//! calls to the component's position and walks its state cells in call
//! order. Because the context is an argument rather than ambient state, a
//! state cell cannot be read outside a component, and nothing about the
//! rendering component outlives the call.
//!
//! Setters ([`StateSetter`]) never render. They enqueue an [`Update`] on the
//! cell's [`SharedQueue`] and mark the position on the root's
//! [`UpdateScheduler`]; the owner of the [`Root`](crate::root::Root) decides
//! when to [`flush`](crate::root::Root::flush).

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::dirty;
use crate::element::Markup;
use crate::error::RenderError;
use crate::node::PositionId;
use crate::update::{SharedQueue, Update, process, shared_queue};

/// Type-erased value of a state cell.
pub type StateValue = Rc<dyn Any>;

/// One state cell of a component: its committed value and pending update.
#[derive(Clone)]
pub(crate) struct StateCell {
    pub(crate) value: StateValue,
    pub(crate) queue: SharedQueue<StateValue>,
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("pending", &self.queue.borrow().has_pending())
            .finish_non_exhaustive()
    }
}

/// An update taken out of a queue during a pass, kept so that an aborted
/// pass can put it back.
#[derive(Debug)]
pub(crate) enum Drained {
    Root(SharedQueue<Markup>, Update<Markup>),
    Cell(SharedQueue<StateValue>, Update<StateValue>),
}

impl Drained {
    pub(crate) fn restore(self) {
        match self {
            Self::Root(queue, update) => queue.borrow_mut().restore(update),
            Self::Cell(queue, update) => queue.borrow_mut().restore(update),
        }
    }
}

#[derive(Debug)]
struct SchedulerInner {
    dirty: DirtyTracker<u32>,
    generations: BTreeMap<u32, u32>,
    pending: bool,
}

/// Records which positions have pending updates.
///
/// Cloning is cheap; all clones share the same record.
#[derive(Clone)]
pub struct UpdateScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl fmt::Debug for UpdateScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("pending", &self.has_pending())
            .finish_non_exhaustive()
    }
}

impl UpdateScheduler {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
                generations: BTreeMap::new(),
                pending: false,
            })),
        }
    }

    /// Marks `position` as having a pending update.
    pub fn schedule_update(&self, position: PositionId) {
        let mut inner = self.inner.borrow_mut();
        inner.dirty.mark(position.idx, dirty::UPDATE);
        // Generations only grow per slot; a stale setter must not hide a
        // live one that reuses the slot.
        let generation = inner
            .generations
            .entry(position.idx)
            .or_insert(position.generation);
        *generation = (*generation).max(position.generation);
        inner.pending = true;
    }

    /// Returns whether any update was scheduled since the last drain.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.borrow().pending
    }

    /// Takes all scheduled positions, in slot order.
    pub(crate) fn drain(&self) -> Vec<PositionId> {
        let mut inner = self.inner.borrow_mut();
        inner.pending = false;
        let marked: Vec<u32> = inner
            .dirty
            .drain(dirty::UPDATE)
            .deterministic()
            .run()
            .collect();
        let mut drained = Vec::with_capacity(marked.len());
        for idx in marked {
            if let Some(generation) = inner.generations.remove(&idx) {
                drained.push(PositionId { idx, generation });
            }
        }
        drained
    }

    /// Drops any mark left for a released position slot.
    pub(crate) fn forget(&self, idx: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.dirty.remove_key(idx);
        inner.generations.remove(&idx);
    }
}

/// Enqueues updates on one state cell.
pub struct StateSetter<T> {
    queue: SharedQueue<StateValue>,
    position: PositionId,
    scheduler: UpdateScheduler,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            position: self.position,
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> StateSetter<T> {
    /// Replaces the cell's value on the next render.
    pub fn set(&self, value: T) {
        let value: StateValue = Rc::new(value);
        self.dispatch(Update::Replace(value));
    }

    /// Computes the cell's next value from its value at the next render.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.dispatch(Update::Apply(Rc::new(move |prev: &StateValue| {
            match prev.downcast_ref::<T>() {
                Some(prev) => {
                    let next: StateValue = Rc::new(f(prev));
                    next
                }
                None => Rc::clone(prev),
            }
        })));
    }

    /// Returns the position this setter schedules.
    #[must_use]
    pub fn position(&self) -> PositionId {
        self.position
    }

    fn dispatch(&self, update: Update<StateValue>) {
        self.queue.borrow_mut().enqueue(update);
        self.scheduler.schedule_update(self.position);
    }
}

/// Everything a component may touch while it renders.
pub struct RenderContext<'a> {
    component: &'static str,
    position: PositionId,
    cells: &'a mut Vec<StateCell>,
    cursor: usize,
    mounting: bool,
    scheduler: &'a UpdateScheduler,
    drained: &'a mut Vec<Drained>,
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("component", &self.component)
            .field("position", &self.position)
            .field("cursor", &self.cursor)
            .field("mounting", &self.mounting)
            .finish_non_exhaustive()
    }
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        component: &'static str,
        position: PositionId,
        cells: &'a mut Vec<StateCell>,
        mounting: bool,
        scheduler: &'a UpdateScheduler,
        drained: &'a mut Vec<Drained>,
    ) -> Self {
        Self {
            component,
            position,
            cells,
            cursor: 0,
            mounting,
            scheduler,
            drained,
        }
    }

    /// Returns the next state cell in call order.
    ///
    /// On the first render the cell is created from `init`; afterwards any
    /// pending update is folded into the committed value and `init` is not
    /// called.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::StateCellType`] if the cell holds a different
    /// type, and [`RenderError::StateCellCount`] if the component uses more
    /// cells than it did on its first render.
    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<(T, StateSetter<T>), RenderError> {
        let index = self.cursor;
        self.cursor += 1;

        if self.mounting {
            self.cells.push(StateCell {
                value: Rc::new(init()),
                queue: shared_queue(),
            });
        } else {
            let expected = self.cells.len();
            let Some(cell) = self.cells.get_mut(index) else {
                return Err(RenderError::StateCellCount {
                    component: self.component,
                    expected,
                    used: index + 1,
                });
            };
            let pending = cell.queue.borrow_mut().take();
            if let Some(update) = pending {
                cell.value = process(&cell.value, Some(&update));
                self.drained
                    .push(Drained::Cell(Rc::clone(&cell.queue), update));
            }
        }

        let cell = &self.cells[index];
        let value = cell
            .value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(RenderError::StateCellType {
                component: self.component,
                index,
            })?;
        let setter = StateSetter {
            queue: Rc::clone(&cell.queue),
            position: self.position,
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        };
        Ok((value, setter))
    }

    /// Returns the position of the component being rendered.
    #[must_use]
    pub fn position(&self) -> PositionId {
        self.position
    }

    /// Checks that an update render used every committed cell.
    pub(crate) fn finish(self) -> Result<(), RenderError> {
        if !self.mounting && self.cursor != self.cells.len() {
            return Err(RenderError::StateCellCount {
                component: self.component,
                expected: self.cells.len(),
                used: self.cursor,
            });
        }
        Ok(())
    }
}
