//! Diagram initializer run on page load
//!
//! Configures the renderer, discovers placeholders, dispatches every render
//! and joins all of them before returning. The caller signals readiness only
//! after this returns, so the host never captures a half-rendered page.

use crate::dispatch::{self, DiagramOutcome};
use crate::document::Document;
use crate::placeholder::{self, DiagramPlaceholder};
use crate::renderer::DiagramRenderer;
use crate::{Error, GateConfig};
use futures::stream::{FuturesUnordered, StreamExt};
use std::panic::{catch_unwind, AssertUnwindSafe};

pub(crate) async fn run(
    doc: &mut Document,
    renderer: &dyn DiagramRenderer,
    config: &GateConfig,
) -> Vec<DiagramOutcome> {
    let options = config.renderer_options();
    let init = catch_unwind(AssertUnwindSafe(|| renderer.initialize(&options))).unwrap_or_else(
        |_| {
            Err(Error::InitializationError(
                "renderer panicked during initialize".to_string(),
            ))
        },
    );
    let placeholders = placeholder::discover(doc, &config.marker);
    log::debug!("found {} diagram placeholder(s)", placeholders.len());

    if let Err(err) = init {
        log::warn!("diagram renderer failed to initialize: {}", err);
        return placeholders
            .iter()
            .map(|p| dispatch::apply(doc, p, Err(err.clone()), config))
            .collect();
    }

    join_renders(doc, renderer, &placeholders, config).await
}

// Every future below only talks to the renderer; the document is touched in
// this task as each completion arrives.
async fn join_renders(
    doc: &mut Document,
    renderer: &dyn DiagramRenderer,
    placeholders: &[DiagramPlaceholder],
    config: &GateConfig,
) -> Vec<DiagramOutcome> {
    let total = placeholders.len();
    let mut pending: FuturesUnordered<_> = placeholders
        .iter()
        .enumerate()
        .map(|(idx, p)| async move { (idx, dispatch::render_one(renderer, p, config).await) })
        .collect();

    let mut outcomes: Vec<Option<DiagramOutcome>> = vec![None; total];
    let mut completed = 0usize;
    while let Some((idx, result)) = pending.next().await {
        outcomes[idx] = Some(dispatch::apply(doc, &placeholders[idx], result, config));
        completed += 1;
        log::debug!("{}/{} diagram(s) settled", completed, total);
    }

    outcomes.into_iter().flatten().collect()
}
