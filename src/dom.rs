//! Minimal mutable SVG element tree.
//!
//! The pipeline mutates uploaded markup in place (styling, pose projection,
//! export stripping) and re-serializes it, so it needs an owned DOM rather
//! than a read-only render tree. Comments, doctypes, and processing
//! instructions are dropped at parse time; the sanitizer has already
//! stripped them from well-behaved input.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{InkflowError, InkflowResult};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Tag names treated as drawable primitives, in the order the pipeline
/// recognizes them everywhere (inventory, projection, export).
pub const DRAWABLE_TAGS: [&str; 7] = [
    "path", "circle", "rect", "ellipse", "line", "polyline", "polygon",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Document {
    pub fn parse(text: &str) -> InkflowResult<Document> {
        let mut reader = Reader::from_str(text);
        loop {
            match reader
                .read_event()
                .map_err(|e| InkflowError::parse(e.to_string()))?
            {
                Event::Start(start) => {
                    let root = parse_element(&mut reader, &start)?;
                    return Ok(Document { root });
                }
                Event::Empty(start) => {
                    let root = parse_element_start(&start)?;
                    return Ok(Document { root });
                }
                Event::Eof => {
                    return Err(InkflowError::parse("no root element found"));
                }
                // Prolog material before the root element.
                _ => {}
            }
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, &self.root);
        out
    }

    /// Count of drawable primitives in document order.
    pub fn drawable_count(&self) -> usize {
        let mut n = 0;
        self.root.visit_drawables(&mut |_, _| n += 1);
        n
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name with any namespace prefix removed.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.local_name() == name
    }

    pub fn is_drawable(&self) -> bool {
        DRAWABLE_TAGS.contains(&self.local_name())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn prepend_child(&mut self, child: Element) {
        self.children.insert(0, Node::Element(child));
    }

    /// Depth-first visit of every element, document order.
    pub fn visit_elements(&self, f: &mut impl FnMut(&Element)) {
        f(self);
        for child in &self.children {
            if let Node::Element(el) = child {
                el.visit_elements(f);
            }
        }
    }

    pub fn visit_elements_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.visit_elements_mut(f);
            }
        }
    }

    /// Visit drawable primitives in document order, passing each one's
    /// ordinal. This is the single traversal both the inventory and the
    /// presentation-sync step rely on, so ordinals always agree.
    pub fn visit_drawables(&self, f: &mut impl FnMut(usize, &Element)) {
        let mut counter = 0;
        self.visit_elements(&mut |el| {
            if el.is_drawable() {
                f(counter, el);
                counter += 1;
            }
        });
    }

    pub fn visit_drawables_mut(&mut self, f: &mut impl FnMut(usize, &mut Element)) {
        let mut counter = 0;
        self.visit_elements_mut(&mut |el| {
            if el.is_drawable() {
                f(counter, el);
                counter += 1;
            }
        });
    }

    /// Insert `ghost` as a sibling immediately before the drawable with the
    /// given ordinal. Returns false when the ordinal does not exist.
    pub fn insert_before_drawable(&mut self, target: usize, ghost: Element) -> bool {
        let mut counter = 0;
        insert_before(self, target, &mut counter, ghost).is_none()
    }
}

// Returns the ghost back when no insertion point was found in this subtree.
fn insert_before(
    el: &mut Element,
    target: usize,
    counter: &mut usize,
    mut ghost: Element,
) -> Option<Element> {
    let mut i = 0;
    while i < el.children.len() {
        let is_drawable_child = matches!(&el.children[i], Node::Element(c) if c.is_drawable());
        if is_drawable_child {
            if *counter == target {
                el.children.insert(i, Node::Element(ghost));
                return None;
            }
            *counter += 1;
        } else if let Node::Element(child) = &mut el.children[i] {
            match insert_before(child, target, counter, ghost) {
                None => return None,
                Some(unplaced) => ghost = unplaced,
            }
        }
        i += 1;
    }
    Some(ghost)
}

fn parse_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> InkflowResult<Element> {
    let mut element = parse_element_start(start)?;

    loop {
        match reader
            .read_event()
            .map_err(|e| InkflowError::parse(e.to_string()))?
        {
            Event::Start(start) => {
                element
                    .children
                    .push(Node::Element(parse_element(reader, &start)?));
            }
            Event::Empty(start) => {
                element
                    .children
                    .push(Node::Element(parse_element_start(&start)?));
            }
            Event::End(_) => break,
            Event::Text(text) => {
                let text = text
                    .decode()
                    .map_err(|e| InkflowError::parse(e.to_string()))?;
                if !text.trim().is_empty() {
                    element.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(ch) = resolve_entity(&r) {
                    element.children.push(Node::Text(ch.to_string()));
                }
            }
            Event::Eof => {
                return Err(InkflowError::parse("unexpected end of document"));
            }
            // Comments, CDATA, and PIs are dropped.
            _ => {}
        }
    }

    Ok(element)
}

/// Resolve a predefined or character entity reference name (the bytes
/// between `&` and `;`). Unknown general entities are dropped.
fn resolve_entity(name: &[u8]) -> Option<char> {
    match name {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        _ => {
            let text = std::str::from_utf8(name).ok()?;
            let code = if let Some(hex) = text.strip_prefix("#x").or_else(|| text.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = text.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

fn parse_element_start(start: &BytesStart) -> InkflowResult<Element> {
    let name_bytes = start.name();
    let name = std::str::from_utf8(name_bytes.as_ref())
        .map_err(|e| InkflowError::parse(e.to_string()))?;

    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| InkflowError::parse(format!("invalid attribute: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| InkflowError::parse(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| InkflowError::parse(e.to_string()))?;
        element
            .attrs
            .push((key.to_string(), value.into_owned()));
    }

    Ok(element)
}

fn write_element(out: &mut String, el: &Element) {
    let _ = write!(out, "<{}", el.name);
    for (k, v) in &el.attrs {
        let _ = write!(out, r#" {}="{}""#, k, xml_escape(v));
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(out, e),
            Node::Text(t) => out.push_str(&xml_escape(t)),
        }
    }
    let _ = write!(out, "</{}>", el.name);
}

/// Escape the five XML special characters for element text and attribute
/// values. `&` must be handled first.
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
