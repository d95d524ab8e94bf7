//! Minimal owned XML element tree on top of `xml-rs`.
//!
//! The vendor feeds are small, so they are read into a tree once and
//! queried with slash separated paths. Descriptors are built as trees and
//! written in one pass.

use std::io::{Read, Write};

use thiserror::Error;
use xml::common::XmlVersion;
use xml::reader::{EventReader, XmlEvent as ReadEvent};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

/// Errors from reading or writing a tree.
#[derive(Error, Debug)]
pub enum XmlError {
    /// Malformed input.
    #[error("XML parse error: {0}")]
    Read(#[from] xml::reader::Error),

    /// The writer failed.
    #[error("XML write error: {0}")]
    Write(#[from] xml::writer::Error),

    /// The input held no element at all.
    #[error("XML document has no root element")]
    NoRoot,
}

/// An element with its attributes, children and concatenated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Character data, untrimmed.
    pub text: String,
}

impl Element {
    /// Empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf element holding `text`.
    pub fn text_node(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Append one child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append children in order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append a child and return a handle to it.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Value of attribute `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Direct children with the given name.
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first direct child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }

    /// Every element reached by following `path` (`a/b/c`) from here.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.children_named(step))
                .collect();
        }
        current
    }

    /// First element reached by following `path`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// All descendants with the given name, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            if element.name == name {
                found.push(element);
            }
            stack.extend(element.children.iter().rev());
        }
        found
    }

    /// Parse a document and return its root element.
    pub fn parse<R: Read>(source: R) -> Result<Element, XmlError> {
        let reader = EventReader::new(source);
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        for event in reader {
            match event? {
                ReadEvent::StartElement {
                    name, attributes, ..
                } => {
                    let mut element = Element::new(name.local_name);
                    element.attributes = attributes
                        .into_iter()
                        .map(|a| (a.name.local_name, a.value))
                        .collect();
                    stack.push(element);
                }
                ReadEvent::Characters(text) | ReadEvent::CData(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                ReadEvent::EndElement { .. } => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => root = Some(done),
                        }
                    }
                }
                _ => {}
            }
        }

        root.ok_or(XmlError::NoRoot)
    }

    /// Parse a document held in memory.
    pub fn parse_str(source: &str) -> Result<Element, XmlError> {
        Self::parse(source.as_bytes())
    }

    /// Emit this element and its subtree.
    pub fn write<W: Write>(&self, writer: &mut EventWriter<W>) -> Result<(), XmlError> {
        let mut start = XmlEvent::start_element(self.name.as_str());
        for (key, value) in &self.attributes {
            start = start.attr(key.as_str(), value.as_str());
        }
        writer.write(start)?;

        if !self.text.is_empty() {
            writer.write(XmlEvent::characters(&self.text))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }

        writer.write(XmlEvent::end_element())?;
        Ok(())
    }

    /// Serialize as an indented UTF-8 document.
    pub fn to_document(&self, standalone: Option<bool>) -> Result<Vec<u8>, XmlError> {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .create_writer(Vec::new());

        writer.write(XmlEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("utf-8"),
            standalone,
        })?;
        self.write(&mut writer)?;

        Ok(writer.into_inner())
    }
}
