use super::{Child, Document, ElementId};
use scraper::{ElementRef, Html};

pub(super) fn parse_document(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::default();

    doc.doctype = parsed
        .tree
        .root()
        .children()
        .find_map(|n| n.value().as_doctype().map(|d| d.name().to_string()));

    let root = import(&mut doc, parsed.root_element(), None);
    doc.root = Some(root);
    doc
}

/// Parse `markup` as a body fragment and append its nodes to `parent`.
pub(super) fn import_fragment(doc: &mut Document, parent: ElementId, markup: &str) {
    let fragment = Html::parse_fragment(markup);
    // the fragment's nodes hang off a synthetic <html> element
    import_children(doc, fragment.root_element(), parent);
}

// Copy a scraper element (and its subtree) into the arena. Comments and
// processing instructions are dropped.
fn import(doc: &mut Document, el: ElementRef<'_>, parent: Option<ElementId>) -> ElementId {
    let attrs = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let id = doc.alloc(el.value().name(), attrs, parent);
    import_children(doc, el, id);
    id
}

fn import_children(doc: &mut Document, el: ElementRef<'_>, id: ElementId) {
    for node in el.children() {
        let child = if let Some(child_el) = ElementRef::wrap(node) {
            Child::Element(import(doc, child_el, Some(id)))
        } else if let Some(text) = node.value().as_text() {
            Child::Text((**text).to_string())
        } else {
            continue;
        };
        // `id` is a live arena slot, so this cannot fail
        let _ = doc.push_child(id, child);
    }
}
