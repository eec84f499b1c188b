// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace events emitted by render passes.

use trellis_core::element::{Component, Element, Markup, Props};
use trellis_core::error::RenderError;
use trellis_core::node::NodeKind;
use trellis_core::root::Root;
use trellis_core::state::RenderContext;
use trellis_core::trace::{EffectKind, PassOutcome, PassTrigger, PhaseKind, Tracer};
use trellis_debug::recorder::{RecordedEvent, RecorderSink, decode};
use trellis_harness::MemoryHost;

fn list(keys: &[&str]) -> Markup {
    Element::host("ul")
        .children(
            keys.iter()
                .map(|&k| Element::host("li").key(k).child(k).into())
                .collect::<Vec<Markup>>(),
        )
        .into()
}

fn broken(_: &Props, _: &mut RenderContext<'_>) -> Result<Markup, RenderError> {
    Err(RenderError::component("Broken", "always fails"))
}

#[test]
fn committed_pass_emits_events_in_order() {
    let mut host = MemoryHost::new();
    let mut root = Root::new(host.container());
    root.render(list(&["a", "b"]), &mut host).unwrap();

    let mut rec = RecorderSink::new();
    let summary = root
        .render_with(list(&["b", "a"]), &mut host, &mut Tracer::new(&mut rec))
        .unwrap();

    let events: Vec<_> = decode(rec.as_bytes()).collect();
    assert_eq!(events.len(), 8, "got {events:?}");
    assert!(matches!(
        &events[0],
        RecordedEvent::PassBegin(e) if e.pass_index == 2 && e.trigger == PassTrigger::Render
    ));
    assert!(matches!(&events[1], RecordedEvent::PhaseBegin(e) if e.phase == PhaseKind::Render));
    assert!(matches!(&events[2], RecordedEvent::PhaseEnd(e) if e.phase == PhaseKind::Render));
    assert!(matches!(&events[3], RecordedEvent::PhaseBegin(e) if e.phase == PhaseKind::Commit));
    match &events[4] {
        RecordedEvent::Effects {
            pass_index,
            effects,
        } => {
            assert_eq!(*pass_index, 2);
            assert_eq!(effects.len(), 1);
            assert_eq!(effects[0].node_kind, NodeKind::HostElement);
            assert_eq!(effects[0].effect, EffectKind::Placement);
        }
        other => panic!("expected Effects, got {other:?}"),
    }
    assert!(matches!(&events[5], RecordedEvent::PhaseEnd(e) if e.phase == PhaseKind::Commit));
    assert!(matches!(&events[6], RecordedEvent::CommitSummary(s) if *s == summary));
    assert!(matches!(
        &events[7],
        RecordedEvent::PassEnd(e) if e.outcome == PassOutcome::Committed && e.nodes_visited == 6
    ));
}

#[test]
fn aborted_pass_skips_the_commit_phase() {
    let mut host = MemoryHost::new();
    let mut root = Root::new(host.container());
    let mut rec = RecorderSink::new();
    let result = root.render_with(
        Element::component(Component::new("Broken", broken)),
        &mut host,
        &mut Tracer::new(&mut rec),
    );
    assert!(result.is_err());

    let events: Vec<_> = decode(rec.as_bytes()).collect();
    assert_eq!(events.len(), 4, "got {events:?}");
    assert!(events.iter().all(|e| !matches!(
        e,
        RecordedEvent::PhaseBegin(p) if p.phase == PhaseKind::Commit
    )));
    assert!(matches!(
        &events[3],
        RecordedEvent::PassEnd(e) if e.outcome == PassOutcome::Aborted
    ));
}

#[test]
fn pretty_sink_writes_a_line_per_event() {
    let mut host = MemoryHost::new();
    let mut root = Root::new(host.container());
    let mut sink = trellis_debug::pretty::PrettyPrintSink::with_writer(Vec::<u8>::new());
    root.render_with(list(&["a"]), &mut host, &mut Tracer::new(&mut sink))
        .unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(output.lines().count(), 8, "got: {output}");
    assert!(output.contains("[summary] pass=1"), "got: {output}");
}
