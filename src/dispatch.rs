//! Per-placeholder render dispatch
//!
//! [`render_one`] issues the render request and waits for its completion
//! callback; [`apply`] writes the result into the document. The two are
//! split so that many renders can be in flight while document mutation stays
//! in the single task that joins them.

use crate::document::Document;
use crate::placeholder::DiagramPlaceholder;
use crate::renderer::{ContainerMut, DiagramRenderer, RenderContext, RenderOutput, RenderRequest};
use crate::{Error, GateConfig, Result};
use quick_xml::escape::{escape, partial_escape};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio::sync::oneshot;

/// Final state of one placeholder after load
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    Rendered,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramOutcome {
    pub id: String,
    pub output_id: String,
    pub status: RenderStatus,
}

impl DiagramOutcome {
    pub fn is_rendered(&self) -> bool {
        self.status == RenderStatus::Rendered
    }
}

/// Ask the renderer for one diagram and wait for the callback.
pub(crate) async fn render_one(
    renderer: &dyn DiagramRenderer,
    placeholder: &DiagramPlaceholder,
    config: &GateConfig,
) -> Result<RenderOutput> {
    let container = placeholder
        .container
        .ok_or_else(|| Error::MissingContainer(placeholder.id.clone()))?;

    let request = RenderRequest {
        output_id: placeholder.output_id(&config.output_suffix),
        source: placeholder.source.clone(),
        context: RenderContext {
            container,
            selector: placeholder.selector.clone(),
        },
    };

    let (tx, rx) = oneshot::channel::<Result<RenderOutput>>();
    log::debug!("rendering {} as {}", placeholder.id, request.output_id);

    // A panicking renderer counts as a failed render of this diagram only.
    let dispatched = catch_unwind(AssertUnwindSafe(|| {
        renderer.render(
            request,
            Box::new(move |res: Result<RenderOutput>| {
                let _ = tx.send(res);
            }),
        )
    }));
    if dispatched.is_err() {
        return Err(Error::RenderError(format!(
            "renderer panicked while rendering {}",
            placeholder.id
        )));
    }

    let received = match config.render_timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), rx)
            .await
            .map_err(|_| Error::Timeout(ms))?,
        None => rx.await,
    };
    received.map_err(|_| Error::CallbackDropped(placeholder.id.clone()))?
}

/// Write a render result into the placeholder's container.
///
/// Content is replaced before the bind function runs. Any failure, including
/// one from the bind function, leaves an error marker in the container.
pub(crate) fn apply(
    doc: &mut Document,
    placeholder: &DiagramPlaceholder,
    result: Result<RenderOutput>,
    config: &GateConfig,
) -> DiagramOutcome {
    let output_id = placeholder.output_id(&config.output_suffix);
    let status = match result.and_then(|output| insert(doc, placeholder, output)) {
        Ok(()) => {
            log::debug!("rendered {}", placeholder.id);
            RenderStatus::Rendered
        }
        Err(err) => {
            log::warn!("diagram {} failed: {}", placeholder.id, err);
            if let Some(container) = placeholder.container {
                let marker = error_marker(&placeholder.id, &err, &config.error_class);
                if let Err(e) = doc.set_inner_html(container, &marker) {
                    log::warn!("could not mark {} as failed: {}", placeholder.id, e);
                }
            }
            RenderStatus::Failed {
                reason: err.to_string(),
            }
        }
    };

    DiagramOutcome {
        id: placeholder.id.clone(),
        output_id,
        status,
    }
}

fn insert(doc: &mut Document, placeholder: &DiagramPlaceholder, output: RenderOutput) -> Result<()> {
    let container = placeholder
        .container
        .ok_or_else(|| Error::MissingContainer(placeholder.id.clone()))?;
    doc.set_inner_html(container, &output.markup)?;
    let bind = match output.bind {
        Some(bind) => bind,
        None => return Ok(()),
    };
    catch_unwind(AssertUnwindSafe(|| bind(ContainerMut::new(doc, container)))).unwrap_or_else(
        |_| {
            Err(Error::RenderError(format!(
                "bind function panicked for {}",
                placeholder.id
            )))
        },
    )
}

/// Visible marker left in a container whose diagram failed
pub fn error_marker(id: &str, err: &Error, class: &str) -> String {
    format!(
        "<div class=\"{}\" data-diagram-id=\"{}\">{}</div>",
        escape(class),
        escape(id),
        partial_escape(err.to_string().as_str())
    )
}
