//! Readiness protocol: the host is signalled once, after every diagram settled

mod common;

use common::{host, Behaviour, EventLog, ScriptedRenderer, THREE_DIAGRAMS};
use rfready::{DiagramRenderer, Document, FnRenderer, GateConfig, Page, RenderOutput, RenderRequest};
use std::sync::Arc;

#[tokio::test]
async fn three_diagrams_signal_once_after_last_callback() {
    let log = EventLog::default();
    // d1 finishes last so completion order differs from dispatch order
    let renderer = Arc::new(
        ScriptedRenderer::new(log.clone())
            .with("d1_svg", Behaviour::Render { delay_ms: 60 })
            .with("d2_svg", Behaviour::Render { delay_ms: 10 })
            .with("d3_svg", Behaviour::Render { delay_ms: 30 }),
    );

    let mut page = Page::from_html(THREE_DIAGRAMS, GateConfig::default())
        .unwrap()
        .with_renderer(renderer.clone());
    let report = page.load(host(&log)).await.unwrap();

    let mut ids = renderer.output_ids();
    ids.sort();
    assert_eq!(ids, vec!["d1_svg", "d2_svg", "d3_svg"]);
    assert_eq!(report.rendered(), 3);
    assert_eq!(report.signals_delivered, 1);
    assert_eq!(log.count("ready"), 1);

    let ready_at = log.position("ready").unwrap();
    for id in ["d1_svg", "d2_svg", "d3_svg"] {
        assert!(log.position(&format!("complete:{}", id)).unwrap() < ready_at);
        assert!(log.position(&format!("bind:{}", id)).unwrap() < ready_at);
    }
    assert_eq!(log.events().last().map(String::as_str), Some("ready"));
}

#[tokio::test]
async fn renders_are_all_dispatched_before_any_completes() {
    let log = EventLog::default();
    let renderer = Arc::new(ScriptedRenderer::new(log.clone()));
    let mut page = Page::from_html(THREE_DIAGRAMS, GateConfig::default())
        .unwrap()
        .with_renderer(renderer);
    page.load(host(&log)).await.unwrap();

    let events = log.events();
    assert_eq!(events[0], "initialize");
    let mut dispatched = events[1..4].to_vec();
    dispatched.sort();
    assert_eq!(dispatched, vec!["render:d1_svg", "render:d2_svg", "render:d3_svg"]);
}

#[tokio::test]
async fn each_container_holds_its_own_markup() {
    let log = EventLog::default();
    let renderer = Arc::new(
        ScriptedRenderer::new(log.clone())
            .with("d1_svg", Behaviour::Render { delay_ms: 20 })
            .with("d3_svg", Behaviour::Render { delay_ms: 1 }),
    );
    let mut page = Page::from_html(THREE_DIAGRAMS, GateConfig::default())
        .unwrap()
        .with_renderer(renderer.clone());
    page.load(host(&log)).await.unwrap();

    let doc = page.document();
    let requests = renderer.requests.lock().unwrap().clone();
    for request in &requests {
        let container = doc.find_by_id(request.context.selector.trim_start_matches('#')).unwrap();
        assert_eq!(container, request.context.container);
        assert_eq!(doc.inner_html(container).unwrap(), common::markup_for(request));
        assert_eq!(doc.listeners(container).len(), 1);
        assert_eq!(doc.listeners(container)[0].event, "click");
    }
    assert!(doc.select(|d, id| d.has_class(id, "mermaid_src")).is_empty());
}

#[tokio::test]
async fn renderer_receives_fixed_configuration() {
    let log = EventLog::default();
    let renderer = Arc::new(ScriptedRenderer::new(log.clone()));
    let mut page = Page::from_html(THREE_DIAGRAMS, GateConfig::default())
        .unwrap()
        .with_renderer(renderer.clone());
    page.load(host(&log)).await.unwrap();

    let opts = renderer.options.lock().unwrap().clone().unwrap();
    assert_eq!(
        serde_json::to_string(&opts).unwrap(),
        r#"{"startOnLoad":false,"cloneCssStyles":false}"#
    );
}

#[tokio::test]
async fn absent_renderer_still_signals_and_leaves_document_alone() {
    let log = EventLog::default();
    let before = Document::parse(THREE_DIAGRAMS);

    let mut page = Page::from_html(THREE_DIAGRAMS, GateConfig::default()).unwrap();
    let report = page.load(host(&log)).await.unwrap();

    assert!(!report.renderer_present);
    assert!(report.diagrams.is_empty());
    assert_eq!(log.events(), vec!["ready"]);
    assert_eq!(page.document().to_html(), before.to_html());
    assert_eq!(report.digest, before.digest());
}

#[tokio::test]
async fn empty_page_without_renderer_signals_once() {
    let log = EventLog::default();
    let html = "<html><body><p>no diagrams here</p></body></html>";
    let (doc, report) = rfready::load_page(html, None, host(&log), GateConfig::default())
        .await
        .unwrap();

    assert_eq!(log.count("ready"), 1);
    assert_eq!(report.signal_attempts, 1);
    assert_eq!(doc.digest(), Document::parse(html).digest());
}

#[tokio::test]
async fn renderer_without_placeholders_signals_once() -> anyhow::Result<()> {
    let log = EventLog::default();
    let renderer: Arc<dyn DiagramRenderer> = Arc::new(ScriptedRenderer::new(log.clone()));
    let html = "<html><body><p>prose only</p></body></html>";

    let (doc, report) =
        rfready::load_page(html, Some(renderer), host(&log), GateConfig::default()).await?;

    assert!(report.renderer_present);
    assert!(report.diagrams.is_empty());
    assert_eq!(log.events(), vec!["initialize", "ready"]);
    assert_eq!(doc.to_html(), Document::parse(html).to_html());
    Ok(())
}

#[tokio::test]
async fn host_can_await_the_channel_signal() -> anyhow::Result<()> {
    let log = EventLog::default();
    let renderer: Arc<dyn DiagramRenderer> = Arc::new(ScriptedRenderer::new(log.clone()));
    let (signal, ready) = rfready::ready::channel();

    let capture = tokio::spawn(async move { ready.wait().await });
    let (doc, _) = rfready::load_page(
        THREE_DIAGRAMS,
        Some(renderer),
        Arc::new(signal),
        GateConfig::default(),
    )
    .await?;

    capture.await??;
    assert!(doc.to_html().contains("<svg id=\"d2_svg\">"));
    Ok(())
}

#[tokio::test]
async fn inserted_svg_is_live_for_bind_and_after_load() {
    let log = EventLog::default();
    let renderer = Arc::new(ScriptedRenderer::new(log.clone()));
    let mut page = Page::from_html(THREE_DIAGRAMS, GateConfig::default())
        .unwrap()
        .with_renderer(renderer);
    page.load(host(&log)).await.unwrap();

    let doc = page.document();
    for id in ["d1", "d2", "d3"] {
        let svg = doc.find_by_id(&format!("{}_svg", id)).unwrap();
        assert_eq!(doc.parent(svg), doc.find_by_id(id));
        assert_eq!(doc.listeners(svg).len(), 1);
        assert_eq!(doc.listeners(svg)[0].event, "mouseover");
    }
}

const SHARED_CONTAINER: &str = r#"<html><body>
<div id="flow"><pre class="mermaid_src">graph TD; A</pre><pre class="mermaid_src">graph TD; B--&gt;C</pre></div>
<div id="solo"><pre class="mermaid_src">pie</pre></div>
<section><pre id="src" class="mermaid_src">graph LR; X</pre></section>
</body></html>"#;

#[tokio::test]
async fn shared_container_renders_every_diagram_in_its_own_slot() {
    let log = EventLog::default();
    let renderer = Arc::new(ScriptedRenderer::new(log.clone()));
    let mut page = Page::from_html(SHARED_CONTAINER, GateConfig::default())
        .unwrap()
        .with_renderer(renderer.clone());
    let report = page.load(host(&log)).await.unwrap();

    assert_eq!(report.rendered(), 4);
    assert_eq!(log.count("ready"), 1);

    let ids: Vec<_> = report.diagrams.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["flow-1", "flow-2", "solo", "diagram-1"]);

    let doc = page.document();
    let flow = doc.find_by_id("flow").unwrap();
    let flow_html = doc.inner_html(flow).unwrap();
    assert!(flow_html.contains("<svg id=\"flow-1_svg\">"));
    assert!(flow_html.contains("<svg id=\"flow-2_svg\">"));

    // every selector handed to the renderer names the container it wrote into
    let requests = renderer.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        let target = doc.find_by_id(request.context.selector.trim_start_matches('#'));
        assert_eq!(target, Some(request.context.container));
        assert_eq!(
            doc.inner_html(request.context.container).unwrap(),
            common::markup_for(request)
        );
    }
}

// A runtime built without `enable_time` has no timer; the default
// configuration must not need one.
#[test]
fn default_config_loads_without_a_timer() {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let renderer: Arc<dyn DiagramRenderer> = Arc::new(FnRenderer::new(|req: &RenderRequest| {
        Ok(RenderOutput::markup(format!("<svg id=\"{}\"></svg>", req.output_id)))
    }));
    let log = EventLog::default();

    let (doc, report) = rt
        .block_on(rfready::load_page(
            THREE_DIAGRAMS,
            Some(renderer),
            host(&log),
            GateConfig::default(),
        ))
        .unwrap();

    assert_eq!(report.rendered(), 3);
    assert_eq!(log.count("ready"), 1);
    assert!(doc.find_by_id("d3_svg").is_some());
}
