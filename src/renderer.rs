//! The diagram rendering capability
//!
//! A renderer is an external engine (for example mermaid running in the
//! page) that turns diagram source into markup. It is configured once with
//! [`RendererOptions`] and then asked to render each placeholder through
//! [`DiagramRenderer::render`]. Completion is reported through a callback
//! which may run synchronously inside `render` or later from any thread.

use crate::document::{Document, ElementId, Listener};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Engine log verbosity, numbered the way mermaid numbers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_number(self) -> u8 {
        match self {
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
            LogLevel::Fatal => 5,
        }
    }
}

/// Options passed to [`DiagramRenderer::initialize`]
///
/// Serializes to the option names the engine expects:
///
/// ```
/// let opts = rfready::RendererOptions::default();
/// let json = serde_json::to_string(&opts).unwrap();
/// assert_eq!(json, r#"{"startOnLoad":false,"cloneCssStyles":false}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererOptions {
    /// Let the engine render on its own when the page loads
    pub start_on_load: bool,
    /// Copy page-level styles into rendered output
    pub clone_css_styles: bool,
    /// Engine diagnostics; `None` keeps them suppressed
    #[serde(skip_serializing_if = "Option::is_none", with = "log_level_number")]
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            start_on_load: false,
            clone_css_styles: false,
            log_level: None,
        }
    }
}

mod log_level_number {
    use super::LogLevel;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &Option<LogLevel>, s: S) -> Result<S::Ok, S::Error> {
        match level {
            Some(l) => s.serialize_u8(l.as_number()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LogLevel>, D::Error> {
        let n = Option::<u8>::deserialize(d)?;
        Ok(match n {
            None => None,
            Some(1) => Some(LogLevel::Debug),
            Some(2) => Some(LogLevel::Info),
            Some(3) => Some(LogLevel::Warn),
            Some(4) => Some(LogLevel::Error),
            Some(_) => Some(LogLevel::Fatal),
        })
    }
}

/// Where the renderer may measure and lay out before producing markup
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub container: ElementId,
    /// CSS selector for the container, e.g. `#d1`
    pub selector: String,
}

/// A single render request
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Identifier the produced markup should carry, e.g. `d1_svg`
    pub output_id: String,
    /// Raw diagram source
    pub source: String,
    pub context: RenderContext,
}

/// Mutable view of a container handed to a bind function
pub struct ContainerMut<'a> {
    document: &'a mut Document,
    id: ElementId,
}

impl<'a> ContainerMut<'a> {
    pub(crate) fn new(document: &'a mut Document, id: ElementId) -> Self {
        Self { document, id }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Current content of the container
    pub fn inner_html(&self) -> Result<String> {
        self.document.inner_html(self.id)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.document.attribute(self.id, name)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.document.set_attribute(self.id, name, value)
    }

    pub fn add_listener(&mut self, event: &str, handler: &str) -> Result<()> {
        self.document.add_listener(self.id, event, handler)
    }

    pub fn listeners(&self) -> &[Listener] {
        self.document.listeners(self.id)
    }

    /// Element with the given `id` attribute inside the container
    pub fn find_by_id(&self, dom_id: &str) -> Option<ElementId> {
        self.document
            .subtree(self.id)
            .into_iter()
            .skip(1)
            .find(|e| self.document.attribute(*e, "id") == Some(dom_id))
    }

    /// Elements inside the container for which `pred` holds, in document order
    pub fn select<F>(&self, pred: F) -> Vec<ElementId>
    where
        F: Fn(&Document, ElementId) -> bool,
    {
        self.document
            .subtree(self.id)
            .into_iter()
            .skip(1)
            .filter(|e| pred(&*self.document, *e))
            .collect()
    }

    pub fn attribute_of(&self, target: ElementId, name: &str) -> Option<&str> {
        self.document.attribute(target, name)
    }

    /// Set an attribute on a node inside the container
    pub fn set_attribute_on(&mut self, target: ElementId, name: &str, value: &str) -> Result<()> {
        self.check_inside(target)?;
        self.document.set_attribute(target, name, value)
    }

    /// Wire a listener onto a node inside the container
    pub fn add_listener_on(&mut self, target: ElementId, event: &str, handler: &str) -> Result<()> {
        self.check_inside(target)?;
        self.document.add_listener(target, event, handler)
    }

    fn check_inside(&self, target: ElementId) -> Result<()> {
        if self.document.is_attached(target) && self.document.is_within(target, self.id) {
            Ok(())
        } else {
            Err(Error::DocumentError(format!(
                "{} is outside container {}",
                target, self.id
            )))
        }
    }
}

/// Wires interactive behaviour into freshly inserted markup
pub type BindFn = Box<dyn for<'a> FnOnce(ContainerMut<'a>) -> Result<()> + Send>;

/// Markup produced for one placeholder
pub struct RenderOutput {
    pub markup: String,
    pub bind: Option<BindFn>,
}

impl RenderOutput {
    /// Output without interactive bindings
    pub fn markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            bind: None,
        }
    }

    pub fn with_bind<F>(mut self, bind: F) -> Self
    where
        F: for<'a> FnOnce(ContainerMut<'a>) -> Result<()> + Send + 'static,
    {
        self.bind = Some(Box::new(bind));
        self
    }
}

impl std::fmt::Debug for RenderOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOutput")
            .field("markup", &self.markup)
            .field("bind", &self.bind.is_some())
            .finish()
    }
}

/// Completion callback handed to [`DiagramRenderer::render`]
pub type RenderCallback = Box<dyn FnOnce(Result<RenderOutput>) + Send>;

/// Core trait for diagram rendering engines
pub trait DiagramRenderer: Send + Sync {
    /// Configure the engine. Called once per page load, before any render.
    fn initialize(&self, options: &RendererOptions) -> Result<()>;

    /// Start rendering `request` and report through `on_complete`.
    ///
    /// The callback should be called exactly once. Dropping it without a
    /// call is reported as a failed render for this placeholder.
    fn render(&self, request: RenderRequest, on_complete: RenderCallback);
}

/// Adapter turning a synchronous render function into a [`DiagramRenderer`].
///
/// The callback fires before `render` returns, which is also how many
/// in-page engines behave.
pub struct FnRenderer<F> {
    render_fn: F,
}

impl<F> FnRenderer<F>
where
    F: Fn(&RenderRequest) -> Result<RenderOutput> + Send + Sync,
{
    pub fn new(render_fn: F) -> Self {
        Self { render_fn }
    }
}

impl<F> DiagramRenderer for FnRenderer<F>
where
    F: Fn(&RenderRequest) -> Result<RenderOutput> + Send + Sync,
{
    fn initialize(&self, _options: &RendererOptions) -> Result<()> {
        Ok(())
    }

    fn render(&self, request: RenderRequest, on_complete: RenderCallback) {
        on_complete((self.render_fn)(&request));
    }
}
