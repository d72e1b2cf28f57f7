use std::collections::HashMap;

use indexmap::IndexMap;
use singultus_core::{Callback, Value, value::style_to_css};

/// Identifier for a node stored inside a [`MemoryDom`](crate::MemoryDom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a new [`NodeId`] from the raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Listener {
    pub event_type: String,
    pub callback: Callback,
    pub capture: bool,
}

#[derive(Debug, Default)]
pub struct ElementData {
    pub tag: String,
    pub namespace: Option<String>,
    pub attributes: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub properties: HashMap<String, Value>,
}

impl ElementData {
    pub fn new(tag: &str, namespace: Option<&str>) -> Self {
        // HTML tag names are case-insensitive, foreign ones keep their case.
        let tag = if namespace.is_some() {
            tag.to_string()
        } else {
            tag.to_ascii_lowercase()
        };
        Self {
            tag,
            namespace: namespace.map(ToString::to_string),
            ..Self::default()
        }
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if name == "style" {
            self.style = parse_css(value);
        }
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, name: &str) {
        if name == "style" {
            self.style.clear();
        }
        self.attributes.shift_remove(name);
    }

    pub fn set_style(&mut self, name: String, value: &str) {
        if value.is_empty() {
            self.style.shift_remove(&name);
        } else {
            self.style.insert(name, value.to_string());
        }
        self.attributes
            .insert("style".to_string(), style_to_css(&self.style));
    }
}

#[derive(Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    /// Markup assigned through `innerHTML`, kept unparsed.
    Raw(String),
}

#[derive(Debug)]
pub struct NodeEntry {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub listeners: Vec<Listener>,
    pub data: NodeData,
}

impl NodeEntry {
    pub const fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            data,
        }
    }

    pub const fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub const fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// Parses inline CSS text into declarations, skipping malformed entries.
pub fn parse_css(text: &str) -> IndexMap<String, String> {
    text.split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let (name, value) = (name.trim(), value.trim());
            (!name.is_empty() && !value.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

pub fn write_html(nodes: &[NodeEntry], id: NodeId, out: &mut String) {
    let Some(entry) = nodes.get(id.index()) else {
        return;
    };

    match &entry.data {
        NodeData::Document => write_children(nodes, entry, out),
        NodeData::Text(text) => escape_text(text, out),
        NodeData::Raw(html) => out.push_str(html),
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');

            if element.namespace.is_none() && VOID_ELEMENTS.contains(&element.tag.as_str()) {
                return;
            }

            write_children(nodes, entry, out);
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

pub fn write_children(nodes: &[NodeEntry], entry: &NodeEntry, out: &mut String) {
    for child in &entry.children {
        write_html(nodes, *child, out);
    }
}

pub fn write_text(nodes: &[NodeEntry], id: NodeId, out: &mut String) {
    let Some(entry) = nodes.get(id.index()) else {
        return;
    };
    match &entry.data {
        NodeData::Text(text) => out.push_str(text),
        NodeData::Raw(_) => {}
        NodeData::Document | NodeData::Element(_) => {
            for child in &entry.children {
                write_text(nodes, *child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_text_round_trips_through_declarations() {
        let style = parse_css("color: red; font-size:16px;; bogus");
        assert_eq!(style.len(), 2);
        assert_eq!(style["font-size"], "16px");
        assert_eq!(style_to_css(&style), "color: red; font-size: 16px;");
    }

    #[test]
    fn style_attribute_tracks_declarations() {
        let mut element = ElementData::new("DIV", None);
        assert_eq!(element.tag, "div");

        element.set_style("color".into(), "red");
        assert_eq!(element.attributes["style"], "color: red;");
        element.set_style("color".into(), "");
        assert_eq!(element.attributes["style"], "");

        element.set_attribute("style", "margin: 0");
        assert_eq!(element.style["margin"], "0");
        element.remove_attribute("style");
        assert!(element.style.is_empty());
    }

    #[test]
    fn escaping() {
        let mut out = String::new();
        escape_text("a < b & c", &mut out);
        assert_eq!(out, "a &lt; b &amp; c");
    }
}
