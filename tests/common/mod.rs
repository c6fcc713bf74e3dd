//! Shared fixtures for the integration tests

#![allow(dead_code)]

use rfready::{
    ContainerMut, DiagramRenderer, Error, RenderCallback, RenderOutput, RenderRequest,
    RendererOptions, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const THREE_DIAGRAMS: &str = r#"<!DOCTYPE html>
<html>
<head><title>Report</title></head>
<body>
<h1>Architecture</h1>
<div id="d1" class="diagram"><pre class="mermaid_src">graph TD; A--&gt;B</pre></div>
<div id="d2" class="diagram"><pre class="mermaid_src">sequenceDiagram; A-&gt;&gt;B: hi</pre></div>
<div id="d3" class="diagram"><pre class="mermaid_src">pie; "a": 1</pre></div>
<p>end of report</p>
</body>
</html>"#;

/// Shared, ordered event log
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

/// What the test renderer does for a given output id
#[derive(Clone)]
pub enum Behaviour {
    Render { delay_ms: u64 },
    Fail,
    Panic,
    Hang,
    /// Completes successfully but the bind function panics
    PanicInBind,
}

/// What the test renderer does when configured
#[derive(Clone, Copy, PartialEq)]
pub enum InitBehaviour {
    Ok,
    Fail,
    Panic,
}

/// Renderer that completes from spawned tasks after a delay, logging every
/// step and binding a click handler on success.
pub struct ScriptedRenderer {
    pub log: EventLog,
    behaviours: HashMap<String, Behaviour>,
    init: InitBehaviour,
    pub requests: Mutex<Vec<RenderRequest>>,
    pub options: Mutex<Option<RendererOptions>>,
}

impl ScriptedRenderer {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            behaviours: HashMap::new(),
            init: InitBehaviour::Ok,
            requests: Mutex::new(Vec::new()),
            options: Mutex::new(None),
        }
    }

    pub fn with(mut self, output_id: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(output_id.to_string(), behaviour);
        self
    }

    pub fn with_init(mut self, init: InitBehaviour) -> Self {
        self.init = init;
        self
    }

    pub fn output_ids(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.output_id.clone())
            .collect()
    }
}

pub fn markup_for(request: &RenderRequest) -> String {
    format!(
        "<svg id=\"{}\"><text>{}</text></svg>",
        request.output_id,
        request.source.len()
    )
}

impl DiagramRenderer for ScriptedRenderer {
    fn initialize(&self, options: &RendererOptions) -> Result<()> {
        *self.options.lock().unwrap() = Some(options.clone());
        self.log.push("initialize");
        match self.init {
            InitBehaviour::Ok => Ok(()),
            InitBehaviour::Fail => Err(Error::InitializationError("engine script missing".into())),
            InitBehaviour::Panic => panic!("engine script threw during initialize"),
        }
    }

    fn render(&self, request: RenderRequest, on_complete: RenderCallback) {
        let id = request.output_id.clone();
        self.log.push(format!("render:{}", id));
        self.requests.lock().unwrap().push(request.clone());

        let behaviour = self
            .behaviours
            .get(&id)
            .cloned()
            .unwrap_or(Behaviour::Render { delay_ms: 5 });
        let log = self.log.clone();

        match behaviour {
            Behaviour::Panic => panic!("renderer exploded on {}", id),
            Behaviour::Hang => std::mem::forget(on_complete),
            Behaviour::PanicInBind => {
                tokio::spawn(async move {
                    let output = RenderOutput::markup(markup_for(&request)).with_bind(
                        |_container: ContainerMut<'_>| panic!("tooltip library missing"),
                    );
                    log.push(format!("complete:{}", id));
                    on_complete(Ok(output));
                });
            }
            Behaviour::Fail => {
                tokio::spawn(async move {
                    log.push(format!("complete:{}", id));
                    on_complete(Err(Error::RenderError(format!("parse error in {}", id))));
                });
            }
            Behaviour::Render { delay_ms } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    let markup = markup_for(&request);
                    let bind_log = log.clone();
                    let expected = markup.clone();
                    let output = RenderOutput::markup(markup).with_bind(
                        move |mut container: ContainerMut<'_>| {
                            let current = container.inner_html()?;
                            assert_eq!(current, expected, "bind ran before content replaced");
                            container.add_listener("click", "showTooltip")?;
                            let svg = container
                                .find_by_id(&request.output_id)
                                .ok_or_else(|| Error::DocumentError("svg not inserted".into()))?;
                            container.add_listener_on(svg, "mouseover", "highlight")?;
                            bind_log.push(format!("bind:{}", request.output_id));
                            Ok(())
                        },
                    );
                    log.push(format!("complete:{}", id));
                    on_complete(Ok(output));
                });
            }
        }
    }
}

/// Host readiness entry point that records into the log
pub fn host(log: &EventLog) -> Arc<dyn rfready::ReadySignal> {
    let log = log.clone();
    Arc::new(move || log.push("ready"))
}
