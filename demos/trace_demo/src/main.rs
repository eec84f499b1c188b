// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render passes over a keyed list, traced end to end.
//!
//! Mounts a list of stateful rows on a [`MemoryHost`], reorders it, removes a
//! row, and clicks a row's button so a state update is flushed. Every pass is
//! recorded to both a [`PrettyPrintSink`] (stdout) and a [`RecorderSink`];
//! the recording is then exported as a JSON event log.
//!
//! Set `RUST_LOG=trellis_core=debug` to see the reconciler's own logging.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use tracing_subscriber::EnvFilter;
use trellis_core::element::{Component, Element, Markup, PropValue, Props};
use trellis_core::error::RenderError;
use trellis_core::root::Root;
use trellis_core::state::RenderContext;
use trellis_core::trace::Tracer;
use trellis_debug::Fanout;
use trellis_debug::pretty::PrettyPrintSink;
use trellis_debug::recorder::RecorderSink;
use trellis_harness::MemoryHost;

fn row(props: &Props, cx: &mut RenderContext<'_>) -> Result<Markup, RenderError> {
    let (clicks, set) = cx.use_state(|| 0_u32)?;
    let label = props.str("label").unwrap_or("?");
    Ok(Element::host("li")
        .child(format!("{label}: {clicks}"))
        .child(
            Element::host("button")
                .attr("id", label)
                .on("onClick", move |_| set.update(|c| c + 1))
                .child("+"),
        )
        .into())
}

const ROW: Component = Component::new("Row", row);

fn list(labels: &[&str]) -> Markup {
    Element::host("ul")
        .children(
            labels
                .iter()
                .map(|&l| Element::component(ROW).key(l).attr("label", l).into())
                .collect::<Vec<Markup>>(),
        )
        .into()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout())).verbose_effects(true);
    let mut sinks = Fanout::new(pretty, RecorderSink::new());

    let mut host = MemoryHost::new();
    let mut root = Root::new(host.container());

    // -- passes ------------------------------------------------------------
    let frames: [&[&str]; 3] = [&["a", "b", "c"], &["c", "a", "b"], &["c", "b"]];
    for labels in frames {
        let mut tracer = Tracer::new(&mut sinks);
        root.render_with(list(labels), &mut host, &mut tracer)?;
        println!("  host: {}", host.to_markup());
    }

    let button = host
        .find_by_attr("id", "b")
        .ok_or("row b has no button")?;
    let handler = root
        .read_attached_props(button)
        .and_then(|props| props.get("onClick").and_then(PropValue::as_callback).cloned())
        .ok_or("row b has no onClick handler")?;
    handler.call(&());
    root.flush_with(&mut host, &mut Tracer::new(&mut sinks))?;
    println!("  host: {}", host.to_markup());

    // -- export ------------------------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    trellis_debug::json::export(sinks.second.as_bytes(), &mut writer)?;
    println!("Wrote {path}");
    Ok(())
}
