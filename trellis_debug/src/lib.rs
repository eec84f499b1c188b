// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for trellis diagnostics.
//!
//! This crate provides [`TraceSink`](trellis_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`json::export`]: writes recorded bytes as a JSON event log.
//! - [`Fanout`]: forwards every event to two sinks.

pub mod json;
pub mod pretty;
pub mod recorder;

use trellis_core::trace::{
    CommitSummary, EffectRecord, PassBeginEvent, PassEndEvent, PhaseBeginEvent, PhaseEndEvent,
    TraceSink,
};

/// A [`TraceSink`] that forwards every event to two sinks, in order.
#[derive(Debug)]
pub struct Fanout<A, B> {
    /// Receives each event first.
    pub first: A,
    /// Receives each event second.
    pub second: B,
}

impl<A: TraceSink, B: TraceSink> Fanout<A, B> {
    /// Combines two sinks.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: TraceSink, B: TraceSink> TraceSink for Fanout<A, B> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.first.on_pass_begin(e);
        self.second.on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.first.on_pass_end(e);
        self.second.on_pass_end(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.first.on_phase_begin(e);
        self.second.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.first.on_phase_end(e);
        self.second.on_phase_end(e);
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.first.on_commit_summary(s);
        self.second.on_commit_summary(s);
    }

    fn on_effects(&mut self, pass_index: u64, effects: &[EffectRecord]) {
        self.first.on_effects(pass_index, effects);
        self.second.on_effects(pass_index, effects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecordedEvent, RecorderSink, decode};
    use trellis_core::trace::PassTrigger;

    #[test]
    fn fanout_reaches_both_sinks() {
        let mut sink = Fanout::new(RecorderSink::new(), RecorderSink::new());
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 2,
            trigger: PassTrigger::StateUpdate,
        });
        for rec in [&sink.first, &sink.second] {
            let events: Vec<_> = decode(rec.as_bytes()).collect();
            assert!(
                matches!(events.as_slice(), [RecordedEvent::PassBegin(e)] if e.pass_index == 2),
                "got: {events:?}"
            );
        }
    }
}
