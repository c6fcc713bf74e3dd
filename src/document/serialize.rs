use super::{Child, Document, ElementData};
use quick_xml::escape::{escape, partial_escape};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

// Text inside these is written verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = &doc.doctype {
        out.push_str("<!DOCTYPE ");
        out.push_str(doctype);
        out.push('>');
    }
    if let Some(root) = doc.root.and_then(|r| doc.get(r).ok()) {
        write_element(doc, root, &mut out);
    }
    out
}

fn write_element(doc: &Document, el: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (k, v) in &el.attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape(v.as_str()));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.name.as_str()) {
        return;
    }

    write_children(doc, el, out);
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

pub(super) fn write_children(doc: &Document, el: &ElementData, out: &mut String) {
    let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
    for child in &el.children {
        match child {
            Child::Element(id) => {
                if let Ok(c) = doc.get(*id) {
                    write_element(doc, c, out);
                }
            }
            Child::Text(t) if raw => out.push_str(t),
            Child::Text(t) => out.push_str(&partial_escape(t.as_str())),
        }
    }
}
