// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON event log exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes a JSON array
//! with one object per event. Each object carries an `"event"` name and the
//! event's fields; enum values are written as their variant names.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Converts recorded events into JSON values.
#[must_use]
pub fn to_values(bytes: &[u8]) -> Vec<Value> {
    decode(bytes)
        .map(|recorded| match recorded {
            RecordedEvent::PassBegin(e) => json!({
                "event": "PassBegin",
                "pass_index": e.pass_index,
                "trigger": format!("{:?}", e.trigger),
            }),
            RecordedEvent::PassEnd(e) => json!({
                "event": "PassEnd",
                "pass_index": e.pass_index,
                "outcome": format!("{:?}", e.outcome),
                "nodes_visited": e.nodes_visited,
            }),
            RecordedEvent::PhaseBegin(e) => json!({
                "event": "PhaseBegin",
                "pass_index": e.pass_index,
                "phase": format!("{:?}", e.phase),
            }),
            RecordedEvent::PhaseEnd(e) => json!({
                "event": "PhaseEnd",
                "pass_index": e.pass_index,
                "phase": format!("{:?}", e.phase),
            }),
            RecordedEvent::CommitSummary(s) => json!({
                "event": "CommitSummary",
                "pass_index": s.pass_index,
                "visited": s.visited,
                "placements": s.placements,
                "updates": s.updates,
                "deletions": s.deletions,
                "released": s.released,
            }),
            RecordedEvent::Effects {
                pass_index,
                effects,
            } => json!({
                "event": "Effects",
                "pass_index": pass_index,
                "effects": effects
                    .iter()
                    .map(|r| json!({
                        "position": r.position,
                        "node_kind": format!("{:?}", r.node_kind),
                        "effect": format!("{:?}", r.effect),
                    }))
                    .collect::<Vec<_>>(),
            }),
        })
        .collect()
}

/// Exports recorded events as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns any error raised by `writer`.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &to_values(bytes))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use trellis_core::node::NodeKind;
    use trellis_core::trace::{
        CommitSummary, EffectKind, EffectRecord, PassBeginEvent, PassTrigger, PhaseBeginEvent,
        PhaseKind, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 1,
            trigger: PassTrigger::Render,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            pass_index: 1,
            phase: PhaseKind::Commit,
        });
        rec.on_commit_summary(&CommitSummary {
            pass_index: 1,
            placements: 1,
            ..CommitSummary::default()
        });
        rec.on_effects(
            1,
            &[EffectRecord {
                position: 3,
                node_kind: NodeKind::HostText,
                effect: EffectKind::Update,
            }],
        );

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["event"], "PassBegin");
        assert_eq!(parsed[0]["trigger"], "Render");
        assert_eq!(parsed[1]["phase"], "Commit");
        assert_eq!(parsed[2]["placements"], 1);
        assert_eq!(parsed[3]["effects"][0]["node_kind"], "HostText");
        assert_eq!(parsed[3]["effects"][0]["effect"], "Update");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
