//! Minimal owned XML document model
//!
//! The fleet's XML responses are small list documents, so the engine keeps
//! whole payloads as owned trees and splices subtrees between them. Parsing
//! and serialization go through quick-xml events; tag names are carried as
//! opaque strings (several conventions use fully-qualified legacy type
//! identifiers as tags and those must survive untouched).

use std::fmt;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// Error raised while reading or writing an XML document
#[derive(Debug, Error)]
#[error("{0}")]
pub struct XmlError(String);

impl XmlError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One node of a parsed document
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element subtree with attributes and ordered children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given tag name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Attribute value by exact name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// First child element with the given name, created if absent
    pub fn child_or_insert(&mut self, name: &str) -> &mut XmlElement {
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.name == name));
        let position = match position {
            Some(index) => index,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[position] {
            XmlNode::Element(el) => el,
            XmlNode::Text(_) => unreachable!("position points at an element"),
        }
    }

    /// Keep only the child elements satisfying the predicate; text nodes
    /// are untouched
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&XmlElement) -> bool) {
        self.children.retain(|node| match node {
            XmlNode::Element(el) => keep(el),
            XmlNode::Text(_) => true,
        });
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(el) => collect_text(el, out),
        }
    }
}

/// Parse a standalone document into its root element.
///
/// Whitespace-only text between elements is not significant in the list
/// documents the fleet produces and is dropped here; text inside leaf
/// elements is kept verbatim.
pub fn parse(input: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut roots: Vec<XmlElement> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut roots, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::new("closing tag without opening tag"))?;
                attach(&mut stack, &mut roots, element);
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| XmlError::new(format!("bad text content: {e}")))?;
                push_text(&mut stack, &value);
            }
            Ok(Event::CData(data)) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&mut stack, &value);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // declaration, comments, processing instructions
            Err(e) => return Err(XmlError::new(format!("parse error: {e}"))),
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::new("unexpected end of document"));
    }
    match roots.len() {
        0 => Err(XmlError::new("no root element")),
        1 => Ok(roots.remove(0)),
        _ => Err(XmlError::new("multiple root elements")),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlError::new(format!("bad attribute: {e}")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| XmlError::new(format!("bad attribute value: {e}")))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut Vec<XmlElement>, roots: &mut Vec<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.push_element(element),
        None => roots.push(element),
    }
}

fn push_text(stack: &mut [XmlElement], value: &str) {
    if value.trim().is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Text(value.to_string()));
    }
}

/// Serialize a root element back into a standalone document
pub fn to_document(root: &XmlElement) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| XmlError::new(format!("write error: {e}")))?;
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::new(format!("invalid utf-8: {e}")))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| XmlError::new(format!("write error: {e}")));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| XmlError::new(format!("write error: {e}")))?;
    for node in &element.children {
        match node {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| XmlError::new(format!("write error: {e}")))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| XmlError::new(format!("write error: {e}")))
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match to_document(self) {
            Ok(doc) => f.write_str(&doc),
            Err(_) => Err(fmt::Error),
        }
    }
}
