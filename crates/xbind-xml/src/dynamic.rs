//! Untyped element trees for content whose type is not known statically.

use xbind_core::QName;

use crate::error::XmlResult;
use crate::reader::{Attribute, StartTag};
use crate::writer::XmlSink;

/// A child of a [`DynamicElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicNode {
    /// A nested element.
    Element(DynamicElement),
    /// Character data.
    Text(String),
}

/// An element carrying its own name plus ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicElement {
    /// The element name.
    pub name: QName,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Children in document order.
    pub children: Vec<DynamicNode>,
}

impl DynamicElement {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a child element.
    #[must_use]
    pub fn with_child(mut self, child: DynamicElement) -> Self {
        self.children.push(DynamicNode::Element(child));
        self
    }

    /// Add text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text.into());
        self
    }

    /// Append text, merging with a preceding text child.
    pub fn push_text(&mut self, text: String) {
        if let Some(DynamicNode::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(DynamicNode::Text(text));
        }
    }

    /// Concatenated direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                DynamicNode::Text(t) => Some(t.as_str()),
                DynamicNode::Element(_) => None,
            })
            .collect()
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &DynamicElement> {
        self.children.iter().filter_map(|c| match c {
            DynamicNode::Element(e) => Some(e),
            DynamicNode::Text(_) => None,
        })
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Write this element and its subtree to a sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn write_to(&self, sink: &mut dyn XmlSink) -> XmlResult<()> {
        sink.start_element(&self.name)?;
        for attr in &self.attributes {
            sink.attribute(&attr.name, &attr.value)?;
        }
        for child in &self.children {
            match child {
                DynamicNode::Element(e) => e.write_to(sink)?,
                DynamicNode::Text(t) => sink.text(t)?,
            }
        }
        sink.end_element()
    }

    pub(crate) fn from_tag(tag: StartTag) -> Self {
        Self {
            name: tag.name,
            attributes: tag.attributes,
            children: Vec::new(),
        }
    }

    /// Drop whitespace-only text between child elements.
    pub(crate) fn normalized(mut self) -> Self {
        if self.elements().next().is_some() {
            self.children
                .retain(|c| !matches!(c, DynamicNode::Text(t) if t.trim().is_empty()));
        }
        self
    }
}
