//! A loaded page and its readiness protocol

use crate::dispatch::DiagramOutcome;
use crate::document::Document;
use crate::ready::{ReadinessLatch, ReadySignal};
use crate::renderer::DiagramRenderer;
use crate::{initializer, Error, GateConfig, Result};
use std::sync::Arc;

/// Summary of one page load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Whether a diagram renderer was available
    pub renderer_present: bool,
    /// One entry per placeholder, in document order
    pub diagrams: Vec<DiagramOutcome>,
    /// Times the host was actually signalled (1 after a load)
    pub signals_delivered: usize,
    /// Times a code path asked to signal, including suppressed duplicates
    pub signal_attempts: usize,
    /// Digest of the document at the moment the host was signalled
    pub digest: String,
}

impl LoadReport {
    pub fn rendered(&self) -> usize {
        self.diagrams.iter().filter(|d| d.is_rendered()).count()
    }

    pub fn failed(&self) -> usize {
        self.diagrams.len() - self.rendered()
    }
}

// Unconditional completion listener. Fires when it goes out of scope, so the
// host is signalled even if the initializer unwinds.
struct CompletionListener<'a>(&'a ReadinessLatch);

impl Drop for CompletionListener<'_> {
    fn drop(&mut self) {
        self.0.fire();
    }
}

/// A page whose diagrams must settle before the host may capture it
pub struct Page {
    document: Document,
    config: GateConfig,
    renderer: Option<Arc<dyn DiagramRenderer>>,
    loaded: bool,
}

impl Page {
    /// Create a page from an already parsed document
    pub fn new(document: Document, config: GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            document,
            config,
            renderer: None,
            loaded: false,
        })
    }

    /// Parse `html` and create a page from it
    pub fn from_html(html: &str, config: GateConfig) -> Result<Self> {
        Self::new(Document::parse(html), config)
    }

    /// Make a diagram renderer available to the page
    pub fn with_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the load handlers and signal `host` exactly once.
    ///
    /// With a renderer present every diagram is rendered (or marked failed)
    /// before the signal. Without one the document is left untouched and the
    /// host is signalled right away. A page can only be loaded once.
    pub async fn load(&mut self, host: Arc<dyn ReadySignal>) -> Result<LoadReport> {
        if self.loaded {
            return Err(Error::Other("page already loaded".to_string()));
        }
        self.loaded = true;

        let latch = ReadinessLatch::new(host);
        let listener = CompletionListener(&latch);
        let mut digest = None;

        let diagrams = match &self.renderer {
            Some(renderer) => {
                let outcomes =
                    initializer::run(&mut self.document, renderer.as_ref(), &self.config).await;
                digest = Some(self.document.digest());
                latch.fire();
                outcomes
            }
            None => {
                log::debug!("no diagram renderer on page; skipping diagrams");
                Vec::new()
            }
        };

        let digest = digest.unwrap_or_else(|| self.document.digest());
        drop(listener);

        Ok(LoadReport {
            renderer_present: self.renderer.is_some(),
            diagrams,
            signals_delivered: usize::from(latch.has_fired()),
            signal_attempts: latch.attempts(),
            digest,
        })
    }
}
