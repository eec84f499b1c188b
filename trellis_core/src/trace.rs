// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! work loop calls at each stage of a pass. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Free-form diagnostics (aborted passes, skipped elements, missing host
//! parents) go through the `tracing` crate instead; the events here are the
//! structured, per-pass record.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`EffectRecord`] events plus the
//!   corresponding `TraceSink` method.

#[cfg(feature = "trace-rich")]
use crate::node::NodeKind;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What started a render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassTrigger {
    /// [`Root::render`](crate::root::Root::render) was called.
    Render,
    /// A flush found scheduled state updates.
    StateUpdate,
}

/// Which phase of a pass is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Begin/complete traversal building the work-in-progress tree.
    Render,
    /// Host mutations and buffer swap.
    Commit,
}

/// How a pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassOutcome {
    /// The work-in-progress tree was committed.
    Committed,
    /// A render error discarded the work-in-progress tree.
    Aborted,
}

/// Which host mutation a commit performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// The node's host instances were inserted or moved.
    Placement,
    /// The node's host instance was patched.
    Update,
    /// The node's subtree was removed.
    Deletion,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a pass starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// What started the pass.
    pub trigger: PassTrigger,
}

/// Emitted when a pass ends, whether committed or aborted.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// How the pass ended.
    pub outcome: PassOutcome,
    /// Number of nodes the begin phase visited.
    pub nodes_visited: u32,
}

/// Marks the beginning of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// What a commit did.
///
/// Returned by [`Root::render`](crate::root::Root::render) and
/// [`Root::flush`](crate::root::Root::flush), and emitted to the trace sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Pass counter.
    pub pass_index: u64,
    /// Nodes the commit examined for effects.
    pub visited: u32,
    /// Placement effects applied.
    pub placements: u32,
    /// Update effects applied.
    pub updates: u32,
    /// Subtrees deleted.
    pub deletions: u32,
    /// Positions released by deletions.
    pub released: u32,
}

impl CommitSummary {
    /// Returns whether the commit performed no host mutation.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.placements == 0 && self.updates == 0 && self.deletions == 0
    }
}

/// A per-node effect record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectRecord {
    /// Raw position index of the affected node.
    pub position: u32,
    /// Kind of the affected node.
    pub node_kind: NodeKind,
    /// Which effect was applied.
    pub effect: EffectKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from render passes.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a pass ends.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called at the beginning of a pass phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called with the summary of a commit.
    fn on_commit_summary(&mut self, s: &CommitSummary) {
        _ = s;
    }

    /// Called with the effects applied by a commit (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_effects(&mut self, pass_index: u64, effects: &[EffectRecord]) {
        _ = (pass_index, effects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitSummary`].
    #[inline]
    pub fn commit_summary(&mut self, s: &CommitSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_commit_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits applied effects (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn effects(&mut self, pass_index: u64, effects: &[EffectRecord]) {
        if let Some(s) = &mut self.sink {
            s.on_effects(pass_index, effects);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_empty_without_mutations() {
        let summary = CommitSummary {
            pass_index: 3,
            visited: 12,
            ..CommitSummary::default()
        };
        assert!(summary.is_empty());
        assert!(
            !CommitSummary {
                updates: 1,
                ..summary
            }
            .is_empty()
        );
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 0,
            trigger: PassTrigger::Render,
        });
        sink.on_commit_summary(&CommitSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: 1,
            phase: PhaseKind::Render,
        });
        tracer.commit_summary(&CommitSummary::default());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            passes: Vec<(u64, PassOutcome)>,
        }
        impl TraceSink for RecordingSink {
            fn on_pass_end(&mut self, e: &PassEndEvent) {
                self.passes.push((e.pass_index, e.outcome));
            }
        }

        let mut sink = RecordingSink { passes: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.pass_end(&PassEndEvent {
            pass_index: 4,
            outcome: PassOutcome::Aborted,
            nodes_visited: 2,
        });
        drop(tracer);
        assert_eq!(sink.passes, &[(4, PassOutcome::Aborted)]);
    }
}
