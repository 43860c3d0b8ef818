//! Pull-style XML input.
//!
//! An [`XmlCursor`] is always positioned on a start tag, an end tag, or the
//! end of the document. Operations that consume an element (`element_text`,
//! `skip_element`, `read_subtree`) leave the cursor on the next tag after
//! that element's end.

use std::io::BufRead;

use xbind_core::{NamespaceContext, NamespaceScope, QName};

use crate::dom::NodeId;
use crate::dynamic::DynamicElement;
use crate::error::{XmlError, XmlResult};
use crate::reader::{Attribute, EventReader, StartTag, XmlEvent};

/// What the cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEvent {
    /// A start tag.
    StartElement,
    /// An end tag.
    EndElement,
    /// The end of the document.
    EndDocument,
}

/// A pull-style XML reader.
pub trait XmlCursor {
    /// The current position.
    fn event(&self) -> CursorEvent;

    /// The element name at a start or end tag.
    fn name(&self) -> Option<&QName>;

    /// Attributes of the current start tag; empty elsewhere.
    fn attributes(&self) -> &[Attribute];

    /// Look up an attribute of the current start tag.
    fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Advance to the next start or end tag, skipping character data.
    fn next_tag(&mut self) -> XmlResult<CursorEvent>;

    /// Read the text of the current element, which must not contain child
    /// elements, and move past its end tag.
    fn element_text(&mut self) -> XmlResult<String>;

    /// Skip the current element and its subtree.
    fn skip_element(&mut self) -> XmlResult<()>;

    /// Read the current element and its subtree as a dynamic tree.
    fn read_subtree(&mut self) -> XmlResult<DynamicElement>;

    /// Namespace bindings in scope at the current position.
    fn namespaces(&self) -> &dyn NamespaceContext;

    /// An owned copy of the bindings in scope, for values that must be
    /// resolved after the cursor has moved on (`QName` element content).
    fn namespace_snapshot(&self) -> NamespaceScope;

    /// The DOM node at the current start tag, for tree-backed cursors.
    fn node(&self) -> Option<NodeId> {
        None
    }

    /// The name of the current start tag, or an error elsewhere.
    fn require_start(&self) -> XmlResult<QName> {
        match (self.event(), self.name()) {
            (CursorEvent::StartElement, Some(name)) => Ok(name.clone()),
            (event, _) => Err(XmlError::InvalidState(format!(
                "expected a start tag, cursor is at {event:?}"
            ))),
        }
    }
}

#[derive(Debug)]
enum Position {
    Start(StartTag),
    End(QName),
    Done,
}

/// An [`XmlCursor`] over a byte stream.
#[derive(Debug)]
pub struct StreamCursor<R: BufRead> {
    reader: EventReader<R>,
    position: Position,
}

impl<R: BufRead> StreamCursor<R> {
    /// Create a cursor positioned on the document element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingElement`] if the input has no element.
    pub fn new(source: R) -> XmlResult<Self> {
        let mut cursor = Self {
            reader: EventReader::new(source),
            position: Position::Done,
        };
        if cursor.next_tag()? != CursorEvent::StartElement {
            return Err(XmlError::MissingElement("root element".to_owned()));
        }
        Ok(cursor)
    }

    fn take_start(&mut self) -> XmlResult<StartTag> {
        match std::mem::replace(&mut self.position, Position::Done) {
            Position::Start(tag) => Ok(tag),
            other => {
                let event = position_event(&other);
                self.position = other;
                Err(XmlError::InvalidState(format!(
                    "expected a start tag, cursor is at {event:?}"
                )))
            }
        }
    }
}

fn position_event(position: &Position) -> CursorEvent {
    match position {
        Position::Start(_) => CursorEvent::StartElement,
        Position::End(_) => CursorEvent::EndElement,
        Position::Done => CursorEvent::EndDocument,
    }
}

impl<R: BufRead> XmlCursor for StreamCursor<R> {
    fn event(&self) -> CursorEvent {
        position_event(&self.position)
    }

    fn name(&self) -> Option<&QName> {
        match &self.position {
            Position::Start(tag) => Some(&tag.name),
            Position::End(name) => Some(name),
            Position::Done => None,
        }
    }

    fn attributes(&self) -> &[Attribute] {
        match &self.position {
            Position::Start(tag) => &tag.attributes,
            _ => &[],
        }
    }

    fn next_tag(&mut self) -> XmlResult<CursorEvent> {
        loop {
            match self.reader.next_event()? {
                XmlEvent::Start(tag) => self.position = Position::Start(tag),
                XmlEvent::End(name) => self.position = Position::End(name),
                XmlEvent::Text(_) => continue,
                XmlEvent::Eof => self.position = Position::Done,
            }
            return Ok(self.event());
        }
    }

    fn element_text(&mut self) -> XmlResult<String> {
        let tag = self.take_start()?;
        let mut text = String::new();
        loop {
            match self.reader.next_event()? {
                XmlEvent::Text(t) => text.push_str(&t),
                XmlEvent::End(_) => break,
                XmlEvent::Start(child) => {
                    return Err(XmlError::UnexpectedElement(format!(
                        "{} inside text-only element {}",
                        child.name, tag.name
                    )));
                }
                XmlEvent::Eof => {
                    return Err(XmlError::MissingElement(format!("end tag for {}", tag.name)));
                }
            }
        }
        self.next_tag()?;
        Ok(text)
    }

    fn skip_element(&mut self) -> XmlResult<()> {
        let tag = self.take_start()?;
        let mut depth: u32 = 1;
        while depth > 0 {
            match self.reader.next_event()? {
                XmlEvent::Start(_) => depth += 1,
                XmlEvent::End(_) => depth -= 1,
                XmlEvent::Text(_) => {}
                XmlEvent::Eof => {
                    return Err(XmlError::MissingElement(format!("end tag for {}", tag.name)));
                }
            }
        }
        self.next_tag()?;
        Ok(())
    }

    fn read_subtree(&mut self) -> XmlResult<DynamicElement> {
        let tag = self.take_start()?;
        let mut stack = vec![DynamicElement::from_tag(tag)];
        loop {
            match self.reader.next_event()? {
                XmlEvent::Start(child) => stack.push(DynamicElement::from_tag(child)),
                XmlEvent::Text(t) => {
                    if let Some(top) = stack.last_mut() {
                        top.push_text(t);
                    }
                }
                XmlEvent::End(name) => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| XmlError::UnexpectedElement(name.to_string()))?
                        .normalized();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(crate::DynamicNode::Element(done)),
                        None => {
                            self.next_tag()?;
                            return Ok(done);
                        }
                    }
                }
                XmlEvent::Eof => {
                    return Err(XmlError::MissingElement("end of subtree".to_owned()));
                }
            }
        }
    }

    fn namespaces(&self) -> &dyn NamespaceContext {
        self.reader.scope()
    }

    fn namespace_snapshot(&self) -> NamespaceScope {
        self.reader.scope().clone()
    }
}
