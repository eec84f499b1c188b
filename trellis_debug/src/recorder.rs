// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each introduced by a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! Effect batches are variable length: a count followed by one six-byte
//! record per effect.

use trellis_core::node::NodeKind;
use trellis_core::trace::{
    CommitSummary, EffectKind, EffectRecord, PassBeginEvent, PassEndEvent, PassOutcome,
    PassTrigger, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_COMMIT_SUMMARY: u8 = 5;
const TAG_EFFECTS: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Render => 0,
            PhaseKind::Commit => 1,
        });
    }

    fn write_node_kind(&mut self, k: NodeKind) {
        self.write_u8(match k {
            NodeKind::Root => 0,
            NodeKind::HostElement => 1,
            NodeKind::HostText => 2,
            NodeKind::Component => 3,
        });
    }

    fn write_effect(&mut self, e: EffectKind) {
        self.write_u8(match e {
            EffectKind::Placement => 0,
            EffectKind::Update => 1,
            EffectKind::Deletion => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_u8(match e.trigger {
            PassTrigger::Render => 0,
            PassTrigger::StateUpdate => 1,
        });
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.pass_index);
        self.write_u8(match e.outcome {
            PassOutcome::Committed => 0,
            PassOutcome::Aborted => 1,
        });
        self.write_u32(e.nodes_visited);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.pass_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.pass_index);
        self.write_phase(e.phase);
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.write_u8(TAG_COMMIT_SUMMARY);
        self.write_u64(s.pass_index);
        self.write_u32(s.visited);
        self.write_u32(s.placements);
        self.write_u32(s.updates);
        self.write_u32(s.deletions);
        self.write_u32(s.released);
    }

    fn on_effects(&mut self, pass_index: u64, effects: &[EffectRecord]) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "effect count capped at u32::MAX for recording"
        )]
        let count = effects.len().min(u32::MAX as usize) as u32;
        self.write_u8(TAG_EFFECTS);
        self.write_u64(pass_index);
        self.write_u32(count);
        for r in effects.iter().take(count as usize) {
            self.write_u32(r.position);
            self.write_node_kind(r.node_kind);
            self.write_effect(r.effect);
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CommitSummary`].
    CommitSummary(CommitSummary),
    /// The effects a commit applied.
    Effects {
        /// Pass counter.
        pass_index: u64,
        /// Effects in commit order.
        effects: Vec<EffectRecord>,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Render,
            _ => PhaseKind::Commit,
        })
    }

    fn read_node_kind(&mut self) -> Option<NodeKind> {
        Some(match self.read_u8()? {
            0 => NodeKind::Root,
            1 => NodeKind::HostElement,
            2 => NodeKind::HostText,
            _ => NodeKind::Component,
        })
    }

    fn read_effect(&mut self) -> Option<EffectKind> {
        Some(match self.read_u8()? {
            0 => EffectKind::Placement,
            1 => EffectKind::Update,
            _ => EffectKind::Deletion,
        })
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            trigger: match self.read_u8()? {
                0 => PassTrigger::Render,
                _ => PassTrigger::StateUpdate,
            },
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            pass_index: self.read_u64()?,
            outcome: match self.read_u8()? {
                0 => PassOutcome::Committed,
                _ => PassOutcome::Aborted,
            },
            nodes_visited: self.read_u32()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            pass_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            pass_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_commit_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CommitSummary(CommitSummary {
            pass_index: self.read_u64()?,
            visited: self.read_u32()?,
            placements: self.read_u32()?,
            updates: self.read_u32()?,
            deletions: self.read_u32()?,
            released: self.read_u32()?,
        }))
    }

    fn decode_effects(&mut self) -> Option<RecordedEvent> {
        let pass_index = self.read_u64()?;
        let count = self.read_u32()? as usize;
        // Six bytes per record; refuse counts the buffer cannot hold.
        if self.remaining() < count.saturating_mul(6) {
            return None;
        }
        let mut effects = Vec::with_capacity(count);
        for _ in 0..count {
            effects.push(EffectRecord {
                position: self.read_u32()?,
                node_kind: self.read_node_kind()?,
                effect: self.read_effect()?,
            });
        }
        Some(RecordedEvent::Effects {
            pass_index,
            effects,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COMMIT_SUMMARY => self.decode_commit_summary(),
            TAG_EFFECTS => self.decode_effects(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> CommitSummary {
        CommitSummary {
            pass_index: 7,
            visited: 9,
            placements: 2,
            updates: 1,
            deletions: 1,
            released: 3,
        }
    }

    #[test]
    fn pass_events_keep_their_fields() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 5,
            trigger: PassTrigger::StateUpdate,
        });
        rec.on_pass_end(&PassEndEvent {
            pass_index: 5,
            outcome: PassOutcome::Aborted,
            nodes_visited: 12,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::PassBegin(e) => {
                assert_eq!(e.pass_index, 5);
                assert_eq!(e.trigger, PassTrigger::StateUpdate);
            }
            other => panic!("expected PassBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::PassEnd(e) => {
                assert_eq!(e.pass_index, 5);
                assert_eq!(e.outcome, PassOutcome::Aborted);
                assert_eq!(e.nodes_visited, 12);
            }
            other => panic!("expected PassEnd, got {other:?}"),
        }
    }

    #[test]
    fn commit_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_commit_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::CommitSummary(s)] => assert_eq!(*s, sample_summary()),
            other => panic!("expected one CommitSummary, got {other:?}"),
        }
    }

    #[test]
    fn effects_are_recorded_in_order() {
        let mut rec = RecorderSink::new();
        let effects = [
            EffectRecord {
                position: 4,
                node_kind: NodeKind::HostElement,
                effect: EffectKind::Placement,
            },
            EffectRecord {
                position: 9,
                node_kind: NodeKind::Component,
                effect: EffectKind::Deletion,
            },
        ];
        rec.on_effects(42, &effects);
        rec.on_phase_end(&PhaseEndEvent {
            pass_index: 42,
            phase: PhaseKind::Commit,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::Effects {
                pass_index,
                effects: decoded,
            } => {
                assert_eq!(*pass_index, 42);
                assert_eq!(decoded.as_slice(), &effects);
            }
            other => panic!("expected Effects, got {other:?}"),
        }
        assert!(matches!(
            events[1],
            RecordedEvent::PhaseEnd(PhaseEndEvent {
                phase: PhaseKind::Commit,
                ..
            })
        ));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            pass_index: 1,
            phase: PhaseKind::Render,
        });
        rec.on_commit_summary(&sample_summary());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1, "only the complete record decodes");
        assert!(matches!(events[0], RecordedEvent::PhaseBegin(_)));
    }
}
