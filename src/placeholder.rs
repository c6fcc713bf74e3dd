//! Discovery of diagram source placeholders

use crate::document::{Document, ElementId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How placeholder elements are recognised in the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Elements whose `class` list contains the name
    Class(String),
    /// Elements carrying the attribute, optionally with an exact value
    Attribute { name: String, value: Option<String> },
}

impl Default for Marker {
    fn default() -> Self {
        Marker::Class("mermaid_src".to_string())
    }
}

impl Marker {
    pub fn matches(&self, doc: &Document, id: ElementId) -> bool {
        match self {
            Marker::Class(class) => doc.has_class(id, class),
            Marker::Attribute { name, value } => match (doc.attribute(id, name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        }
    }
}

/// A diagram source element and the container that receives its markup
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramPlaceholder {
    /// Unique identifier, the `id` attribute of the container
    pub id: String,
    pub element: ElementId,
    /// Element whose content is replaced; `None` only for a marker on the root
    /// element
    pub container: Option<ElementId>,
    /// `#<id>` of the container as it stands in the document
    pub selector: String,
    pub source: String,
}

impl DiagramPlaceholder {
    pub fn output_id(&self, suffix: &str) -> String {
        format!("{}{}", self.id, suffix)
    }
}

/// Find every placeholder in document order.
///
/// Each placeholder gets a container of its own. Normally that is its parent
/// and the identifier is the parent's `id`. A parent without an `id`, or with
/// one already taken, gets a generated `diagram-<n>` written onto it. When
/// several placeholders share a parent, each is wrapped in a new `<div>`
/// named `<parent id>-<k>` which becomes its container, so one render never
/// overwrites another.
pub fn discover(doc: &mut Document, marker: &Marker) -> Vec<DiagramPlaceholder> {
    let elements = doc.select(|d, id| marker.matches(d, id));

    let mut per_parent: HashMap<ElementId, usize> = HashMap::new();
    for &element in &elements {
        if let Some(parent) = doc.parent(element) {
            *per_parent.entry(parent).or_default() += 1;
        }
    }

    let mut seen = HashSet::new();
    let mut generated = 0usize;
    let mut shared_index: HashMap<ElementId, usize> = HashMap::new();
    let mut out = Vec::with_capacity(elements.len());

    for element in elements {
        let source = doc.text_content(element);
        let parent = doc.parent(element);

        let (id, container) = match parent {
            None => {
                generated += 1;
                let base = doc
                    .attribute(element, "id")
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("diagram-{}", generated));
                (unique_id(doc, &seen, &base), None)
            }
            Some(parent) if per_parent.get(&parent).copied().unwrap_or(0) > 1 => {
                let k = shared_index.entry(parent).or_default();
                *k += 1;
                let base = format!(
                    "{}-{}",
                    doc.attribute(parent, "id")
                        .filter(|s| !s.is_empty())
                        .unwrap_or("diagram"),
                    k
                );
                let id = unique_id(doc, &seen, &base);
                match doc.wrap(element, "div", vec![("id".to_string(), id.clone())]) {
                    Ok(wrapper) => (id, Some(wrapper)),
                    Err(e) => {
                        log::warn!("could not give placeholder {} its own container: {}", id, e);
                        (id, None)
                    }
                }
            }
            Some(parent) => {
                let existing = doc
                    .attribute(parent, "id")
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string());
                let id = match existing {
                    Some(id) if !seen.contains(&id) && doc.find_by_id(&id) == Some(parent) => id,
                    other => {
                        let base = match other {
                            Some(taken) => taken,
                            None => {
                                generated += 1;
                                format!("diagram-{}", generated)
                            }
                        };
                        let id = unique_id(doc, &seen, &base);
                        // parent was just looked up, so it exists
                        let _ = doc.set_attribute(parent, "id", &id);
                        id
                    }
                };
                (id, Some(parent))
            }
        };
        seen.insert(id.clone());

        let selector = container
            .and_then(|c| doc.attribute(c, "id"))
            .map(|c| format!("#{}", c))
            .unwrap_or_default();

        out.push(DiagramPlaceholder {
            id,
            element,
            container,
            selector,
            source,
        });
    }
    out
}

fn unique_id(doc: &Document, seen: &HashSet<String>, base: &str) -> String {
    if !seen.contains(base) && doc.find_by_id(base).is_none() {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|c| !seen.contains(c) && doc.find_by_id(c).is_none())
        .unwrap_or_else(|| base.to_string())
}
