//! Owned page document
//!
//! The page is parsed once with `scraper` and copied into a small arena of
//! elements that can be mutated after load: containers get their content
//! replaced by rendered markup (parsed into the same arena) and bind
//! functions attach attributes and listeners to the inserted nodes. The arena
//! serializes back to HTML for capture.

mod parse;
mod serialize;

use crate::{Error, Result};
use sha2::{Digest, Sha256};

/// Handle to an element inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A child slot of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(ElementId),
    Text(String),
}

/// An event listener wired up by a bind function
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub event: String,
    pub handler: String,
}

#[derive(Debug, Clone)]
struct ElementData {
    name: String,
    attrs: Vec<(String, String)>,
    parent: Option<ElementId>,
    children: Vec<Child>,
    listeners: Vec<Listener>,
    attached: bool,
}

/// A mutable page document
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<ElementData>,
    root: Option<ElementId>,
    doctype: Option<String>,
}

impl Document {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        parse::parse_document(html)
    }

    /// The `<html>` element, if the document has one
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    fn get(&self, id: ElementId) -> Result<&ElementData> {
        self.elements
            .get(id.0)
            .ok_or_else(|| Error::DocumentError(format!("unknown element {}", id)))
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut ElementData> {
        self.elements
            .get_mut(id.0)
            .ok_or_else(|| Error::DocumentError(format!("unknown element {}", id)))
    }

    pub(crate) fn alloc(
        &mut self,
        name: &str,
        attrs: Vec<(String, String)>,
        parent: Option<ElementId>,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(ElementData {
            name: name.to_string(),
            attrs,
            parent,
            children: Vec::new(),
            listeners: Vec::new(),
            attached: true,
        });
        id
    }

    pub(crate) fn push_child(&mut self, parent: ElementId, child: Child) -> Result<()> {
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Tag name of an element
    pub fn name(&self, id: ElementId) -> Option<&str> {
        self.get(id).ok().map(|e| e.name.as_str())
    }

    /// Value of an attribute
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.get(id)
            .ok()?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or overwrite an attribute
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> Result<()> {
        let el = self.get_mut(id)?;
        match el.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => el.attrs.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Whether the element's `class` attribute lists `class`
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.attribute(id, "class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).ok()?.parent
    }

    /// Whether the element is still reachable from the root
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.get(id).map(|e| e.attached).unwrap_or(false)
    }

    pub fn children(&self, id: ElementId) -> &[Child] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        for child in self.children(id) {
            match child {
                Child::Text(t) => out.push_str(t),
                Child::Element(c) => self.collect_text(*c, out),
            }
        }
    }

    /// Serialized content of an element
    pub fn inner_html(&self, id: ElementId) -> Result<String> {
        let el = self.get(id)?;
        let mut out = String::new();
        serialize::write_children(self, el, &mut out);
        Ok(out)
    }

    /// Replace all content of an element with parsed `markup`.
    ///
    /// Previous child elements are detached and no longer show up in
    /// lookups; the new nodes are live elements of this document.
    pub fn set_inner_html(&mut self, id: ElementId, markup: &str) -> Result<()> {
        let old = std::mem::take(&mut self.get_mut(id)?.children);
        for child in &old {
            if let Child::Element(c) = child {
                self.detach(*c);
            }
        }
        parse::import_fragment(self, id, markup);
        Ok(())
    }

    /// Move `id` into a new `name` element that takes its place in the parent
    pub fn wrap(
        &mut self,
        id: ElementId,
        name: &str,
        attrs: Vec<(String, String)>,
    ) -> Result<ElementId> {
        let parent = self
            .parent(id)
            .ok_or_else(|| Error::DocumentError(format!("cannot wrap parentless element {}", id)))?;
        let wrapper = self.alloc(name, attrs, Some(parent));
        let slot = self
            .get_mut(parent)?
            .children
            .iter_mut()
            .find(|c| **c == Child::Element(id))
            .ok_or_else(|| Error::DocumentError(format!("{} is not a child of {}", id, parent)))?;
        *slot = Child::Element(wrapper);
        self.get_mut(wrapper)?.children.push(Child::Element(id));
        self.get_mut(id)?.parent = Some(wrapper);
        Ok(wrapper)
    }

    /// Whether `id` is `ancestor` or lies somewhere below it
    pub fn is_within(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    fn detach(&mut self, id: ElementId) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Ok(el) = self.get_mut(cur) {
                el.attached = false;
                stack.extend(el.children.iter().filter_map(|c| match c {
                    Child::Element(e) => Some(*e),
                    _ => None,
                }));
            }
        }
    }

    /// Record an event listener on an element
    pub fn add_listener(&mut self, id: ElementId, event: &str, handler: &str) -> Result<()> {
        self.get_mut(id)?.listeners.push(Listener {
            event: event.to_string(),
            handler: handler.to_string(),
        });
        Ok(())
    }

    pub fn listeners(&self, id: ElementId) -> &[Listener] {
        self.get(id).map(|e| e.listeners.as_slice()).unwrap_or(&[])
    }

    /// All attached elements in document order
    pub fn descendants(&self) -> Vec<ElementId> {
        match self.root {
            Some(root) => self.subtree(root),
            None => Vec::new(),
        }
    }

    /// `id` followed by every element below it, in document order
    pub fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.children(id).iter().rev() {
                if let Child::Element(c) = child {
                    stack.push(*c);
                }
            }
        }
        out
    }

    /// Attached elements for which `pred` holds, in document order
    pub fn select<F>(&self, pred: F) -> Vec<ElementId>
    where
        F: Fn(&Document, ElementId) -> bool,
    {
        self.descendants().into_iter().filter(|id| pred(self, *id)).collect()
    }

    /// First attached element with the given `id` attribute
    pub fn find_by_id(&self, dom_id: &str) -> Option<ElementId> {
        self.descendants()
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(dom_id))
    }

    /// Serialize the whole document back to HTML
    pub fn to_html(&self) -> String {
        serialize::write_document(self)
    }

    /// Hex SHA-256 of the serialized document
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.to_html().as_bytes()))
    }
}
