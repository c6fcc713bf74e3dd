//! RFox Ready
//!
//! A completion gate for pages that render diagrams before being captured by
//! a headless snapshot host. On load the page configures the diagram
//! renderer, renders every diagram placeholder, waits for all of them to
//! settle and only then tells the host that the page may be captured.
//!
//! # Features
//!
//! - **Explicit join**: the readiness signal fires after every render has
//!   completed, failed or timed out
//! - **Exactly once**: duplicate readiness calls are suppressed by a latch
//! - **Isolated failures**: a broken diagram leaves an error marker in its
//!   container and never blocks the others
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rfready::{FnRenderer, GateConfig, Page, RenderOutput, RenderRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let html = r#"<body><div id="d1"><pre class="mermaid_src">graph TD; A-->B</pre></div></body>"#;
//! let renderer = FnRenderer::new(|req: &RenderRequest| {
//!     Ok(RenderOutput::markup(format!("<svg id=\"{}\"></svg>", req.output_id)))
//! });
//!
//! let (signal, ready) = rfready::ready::channel();
//! let mut page = Page::from_html(html, GateConfig::default())?.with_renderer(Arc::new(renderer));
//! let report = page.load(Arc::new(signal)).await?;
//! ready.wait().await?;
//!
//! assert_eq!(report.rendered(), 1);
//! assert!(page.document().to_html().contains("<svg id=\"d1_svg\"></svg>"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod error;
pub use error::{Error, Result};

// Owned, mutable page document
pub mod document;

// Placeholder discovery
pub mod placeholder;

// Renderer capability and the host readiness signal
pub mod ready;
pub mod renderer;

// Load-time protocol: dispatch, join, signal
pub mod dispatch;
mod initializer;
pub mod page;

pub use dispatch::{DiagramOutcome, RenderStatus};
pub use document::{Document, ElementId};
pub use page::{LoadReport, Page};
pub use placeholder::{DiagramPlaceholder, Marker};
pub use ready::{ReadinessLatch, ReadySignal};
pub use renderer::{
    ContainerMut, DiagramRenderer, FnRenderer, LogLevel, RenderCallback, RenderContext,
    RenderOutput, RenderRequest, RendererOptions,
};

/// Configuration for the readiness gate
///
/// The defaults match the in-page mermaid setup used by the PDF theme:
/// placeholders are elements with class `mermaid_src`, rendered markup gets
/// ids ending in `_svg`, and renderer diagnostics are off.
///
/// # Examples
///
/// ```
/// let cfg = rfready::GateConfig::default();
/// assert_eq!(cfg.output_suffix, "_svg");
/// assert_eq!(cfg.render_timeout_ms, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// How diagram source placeholders are recognised
    pub marker: Marker,
    /// Appended to a placeholder id to form the rendered markup id
    pub output_suffix: String,
    /// Class of the marker left in containers whose diagram failed
    pub error_class: String,
    /// Per-diagram render deadline in milliseconds; `None` (the default)
    /// waits forever. Setting it needs a tokio runtime with the time driver
    /// enabled.
    pub render_timeout_ms: Option<u64>,
    /// Renderer diagnostics; `None` keeps them suppressed
    pub log_level: Option<LogLevel>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            marker: Marker::default(),
            output_suffix: "_svg".to_string(),
            error_class: "diagram-error".to_string(),
            render_timeout_ms: None,
            log_level: None,
        }
    }
}

impl GateConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: GateConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_suffix.is_empty() {
            return Err(Error::ConfigError(
                "output_suffix must not be empty".to_string(),
            ));
        }
        if self.error_class.is_empty() || self.error_class.contains(char::is_whitespace) {
            return Err(Error::ConfigError(format!(
                "error_class must be a single class name, got {:?}",
                self.error_class
            )));
        }
        match &self.marker {
            Marker::Class(c) if c.is_empty() => {
                return Err(Error::ConfigError("marker class must not be empty".to_string()))
            }
            Marker::Attribute { name, .. } if name.is_empty() => {
                return Err(Error::ConfigError(
                    "marker attribute must not be empty".to_string(),
                ))
            }
            _ => {}
        }
        if self.render_timeout_ms == Some(0) {
            return Err(Error::ConfigError(
                "render_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Options handed to the renderer at initialization
    pub fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            start_on_load: false,
            clone_css_styles: false,
            log_level: self.log_level,
        }
    }
}

/// Load `html`, render its diagrams with `renderer` if there is one, and
/// signal `host` once everything settled.
///
/// Returns the final document together with the load report.
pub async fn load_page(
    html: &str,
    renderer: Option<Arc<dyn DiagramRenderer>>,
    host: Arc<dyn ReadySignal>,
    config: GateConfig,
) -> Result<(Document, LoadReport)> {
    let mut page = Page::from_html(html, config)?;
    if let Some(r) = renderer {
        page = page.with_renderer(r);
    }
    let report = page.load(host).await?;
    Ok((page.into_document(), report))
}
