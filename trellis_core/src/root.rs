// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root handle and work loop entry points.
//!
//! A [`Root`] owns one retained tree rendered into one host container. Every
//! pass runs synchronously to completion:
//!
//! 1. the root's current buffer is cloned into a work-in-progress root;
//! 2. the begin/complete traversal rebuilds the tree below it;
//! 3. on success the commit applies the recorded effects and the
//!    work-in-progress root becomes the current one;
//! 4. on failure everything the pass created is released, drained updates
//!    are put back, and the current tree is left untouched.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;

use crate::commit::Commit;
use crate::element::{Markup, Props};
use crate::error::RenderError;
use crate::host::{HostAdapter, HostRef};
use crate::node::{NodeId, NodeStore, Payload, PositionId};
use crate::state::UpdateScheduler;
use crate::trace::{
    CommitSummary, PassBeginEvent, PassEndEvent, PassOutcome, PassTrigger, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, Tracer,
};
use crate::update::Update;
use crate::work::Pass;

/// A retained tree rendered into one host container.
#[derive(Debug)]
pub struct Root {
    store: NodeStore,
    container: HostRef,
    current: u32,
    scheduler: UpdateScheduler,
    attached: BTreeMap<HostRef, Rc<Props>>,
    pass_index: u64,
}

impl Root {
    /// Creates an empty root rendering into `container`.
    #[must_use]
    pub fn new(container: HostRef) -> Self {
        let mut store = NodeStore::new();
        let current = store.create_root(container);
        Self {
            store,
            container,
            current,
            scheduler: UpdateScheduler::new(),
            attached: BTreeMap::new(),
            pass_index: 0,
        }
    }

    /// Returns the host container.
    #[must_use]
    pub fn container(&self) -> HostRef {
        self.container
    }

    /// Renders `markup` as the container's content and commits the result.
    ///
    /// State updates scheduled before the call are processed in the same
    /// pass.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed component render; the previously
    /// committed tree stays in place and `markup` stays pending for the next
    /// flush.
    pub fn render<H: HostAdapter + ?Sized>(
        &mut self,
        markup: impl Into<Markup>,
        host: &mut H,
    ) -> Result<CommitSummary, RenderError> {
        self.render_with(markup, host, &mut Tracer::none())
    }

    /// Like [`render`](Self::render), reporting the pass to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub fn render_with<H: HostAdapter + ?Sized>(
        &mut self,
        markup: impl Into<Markup>,
        host: &mut H,
        tracer: &mut Tracer<'_>,
    ) -> Result<CommitSummary, RenderError> {
        if let Some(queue) = &self.store.nodes[self.current as usize].queue {
            queue.borrow_mut().enqueue(Update::Replace(markup.into()));
        }
        let _ = self.scheduler.drain();
        self.perform_pass(host, PassTrigger::Render, tracer)
    }

    /// Marks `position` as having a pending update.
    pub fn schedule_update(&self, position: PositionId) {
        self.scheduler.schedule_update(position);
    }

    /// Returns the scheduler that state setters report to.
    #[must_use]
    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// Returns whether an update is waiting for [`flush`](Self::flush).
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Runs one pass if any mounted position has a scheduled update.
    ///
    /// Returns `Ok(None)` when there was nothing to do.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed component render; the previously
    /// committed tree stays in place and the updates stay pending.
    pub fn flush<H: HostAdapter + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<Option<CommitSummary>, RenderError> {
        self.flush_with(host, &mut Tracer::none())
    }

    /// Like [`flush`](Self::flush), reporting the pass to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`flush`](Self::flush).
    pub fn flush_with<H: HostAdapter + ?Sized>(
        &mut self,
        host: &mut H,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<CommitSummary>, RenderError> {
        let scheduled = self.scheduler.drain();
        // One store per root: a live position is always part of this tree.
        let mounted = scheduled
            .iter()
            .filter(|&&position| self.store.is_position_alive(position))
            .count();
        if mounted == 0 {
            if !scheduled.is_empty() {
                tracing::debug!(
                    stale = scheduled.len(),
                    "ignoring updates for unmounted positions"
                );
            }
            return Ok(None);
        }
        self.perform_pass(host, PassTrigger::StateUpdate, tracer)
            .map(Some)
    }

    /// Returns the props last committed for a host element instance.
    ///
    /// This is the side channel an event layer uses to find the handlers of
    /// the element an event targets. Entries are added when an instance is
    /// committed, refreshed on update, and dropped when it is deleted.
    #[must_use]
    pub fn read_attached_props(&self, instance: HostRef) -> Option<Rc<Props>> {
        self.attached.get(&instance).cloned()
    }

    /// Returns the node store, for inspection.
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Returns the root buffer of the committed tree.
    #[must_use]
    pub fn current_root(&self) -> NodeId {
        self.store.node_id(self.current)
    }

    fn perform_pass<H: HostAdapter + ?Sized>(
        &mut self,
        host: &mut H,
        trigger: PassTrigger,
        tracer: &mut Tracer<'_>,
    ) -> Result<CommitSummary, RenderError> {
        self.pass_index += 1;
        let pass_index = self.pass_index;
        tracer.pass_begin(&PassBeginEvent {
            pass_index,
            trigger,
        });
        tracing::debug!(pass_index, ?trigger, "render pass begin");

        tracer.phase_begin(&PhaseBeginEvent {
            pass_index,
            phase: PhaseKind::Render,
        });
        self.store.begin_pass();
        let wip_root = self.store.clone_for_work(self.current, Payload::None);
        let mut pass = Pass::new(&mut self.store, &self.scheduler);
        let result = pass.run(host, wip_root);
        let Pass {
            drained,
            staged_props,
            visited,
            ..
        } = pass;
        tracer.phase_end(&PhaseEndEvent {
            pass_index,
            phase: PhaseKind::Render,
        });

        if let Err(err) = result {
            let released = self.store.rollback_pass();
            let restored = drained.len();
            for update in drained {
                update.restore();
            }
            if restored > 0 {
                let root_position = self.store.position(self.current_root());
                self.scheduler.schedule_update(root_position);
            }
            tracing::warn!(pass_index, %err, released, restored, "render pass aborted");
            tracer.pass_end(&PassEndEvent {
                pass_index,
                outcome: PassOutcome::Aborted,
                nodes_visited: visited,
            });
            return Err(err);
        }
        self.store.finish_pass();
        self.attached.extend(staged_props);

        tracer.phase_begin(&PhaseBeginEvent {
            pass_index,
            phase: PhaseKind::Commit,
        });
        let summary = Commit::new(
            &mut self.store,
            host,
            &mut self.attached,
            &self.scheduler,
            pass_index,
        )
        .run(wip_root, tracer);
        self.current = wip_root;
        tracer.phase_end(&PhaseEndEvent {
            pass_index,
            phase: PhaseKind::Commit,
        });

        tracing::debug!(
            pass_index,
            visited = summary.visited,
            placements = summary.placements,
            updates = summary.updates,
            deletions = summary.deletions,
            "commit finished"
        );
        tracer.commit_summary(&summary);
        tracer.pass_end(&PassEndEvent {
            pass_index,
            outcome: PassOutcome::Committed,
            nodes_visited: visited,
        });
        Ok(summary)
    }
}
