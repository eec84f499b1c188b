// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use trellis_core::node::NodeKind;
use trellis_core::trace::{
    CommitSummary, EffectKind, EffectRecord, PassBeginEvent, PassEndEvent, PassOutcome,
    PassTrigger, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Print one line per effect record instead of a count.
    verbose_effects: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose_effects", &self.verbose_effects)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose_effects: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose_effects: false,
        }
    }

    /// Prints every effect record on its own line.
    #[must_use]
    pub fn verbose_effects(mut self, verbose: bool) -> Self {
        self.verbose_effects = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn trigger_name(trigger: PassTrigger) -> &'static str {
    match trigger {
        PassTrigger::Render => "render",
        PassTrigger::StateUpdate => "state",
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Render => "render",
        PhaseKind::Commit => "commit",
    }
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root => "root",
        NodeKind::HostElement => "element",
        NodeKind::HostText => "text",
        NodeKind::Component => "component",
    }
}

fn effect_name(effect: EffectKind) -> &'static str {
    match effect {
        EffectKind::Placement => "place",
        EffectKind::Update => "update",
        EffectKind::Deletion => "delete",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} trigger={}",
            e.pass_index,
            trigger_name(e.trigger),
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let outcome = match e.outcome {
            PassOutcome::Committed => "committed",
            PassOutcome::Aborted => "ABORTED",
        };
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} {outcome} visited={}",
            e.pass_index, e.nodes_visited,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] pass={} {}",
            e.pass_index,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] pass={} {}",
            e.pass_index,
            phase_name(e.phase),
        );
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] pass={} visited={} placements={} updates={} deletions={} released={}",
            s.pass_index, s.visited, s.placements, s.updates, s.deletions, s.released,
        );
    }

    fn on_effects(&mut self, pass_index: u64, effects: &[EffectRecord]) {
        let _ = writeln!(
            self.writer,
            "[effects] pass={pass_index} count={}",
            effects.len(),
        );
        if self.verbose_effects {
            for r in effects {
                let _ = writeln!(
                    self.writer,
                    "  {} {}@{}",
                    effect_name(r.effect),
                    kind_name(r.node_kind),
                    r.position,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_pass_begin() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 1,
            trigger: PassTrigger::Render,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[pass:begin]"), "got: {output}");
        assert!(output.contains("pass=1"), "got: {output}");
        assert!(output.contains("trigger=render"), "got: {output}");
    }

    #[test]
    fn aborted_pass_stands_out() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_pass_end(&PassEndEvent {
            pass_index: 3,
            outcome: PassOutcome::Aborted,
            nodes_visited: 4,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[pass:end] pass=3 ABORTED visited=4\n");
    }

    #[test]
    fn verbose_effects_lists_each_record() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).verbose_effects(true);
        sink.on_effects(
            2,
            &[
                EffectRecord {
                    position: 5,
                    node_kind: NodeKind::HostElement,
                    effect: EffectKind::Placement,
                },
                EffectRecord {
                    position: 7,
                    node_kind: NodeKind::HostText,
                    effect: EffectKind::Update,
                },
            ],
        );
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            ["[effects] pass=2 count=2", "  place element@5", "  update text@7"],
            "got: {output}"
        );
    }
}
