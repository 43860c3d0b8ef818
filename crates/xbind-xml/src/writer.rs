//! Push-style XML output.
//!
//! [`XmlSink`] is what the binding engine writes to. [`StreamWriter`]
//! serializes to bytes through `quick_xml::Writer` and repairs namespaces:
//! whenever an element or attribute name needs a namespace that is not in
//! scope, a declaration is emitted on the element being started.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use xbind_core::{NamespaceContext, NamespaceScope, QName};

use crate::dom::NodeId;
use crate::error::{XmlError, XmlResult};

/// A push-style XML writer.
///
/// Attributes and namespace bindings apply to the most recently started
/// element and must precede its content.
pub trait XmlSink {
    /// Write the XML declaration.
    fn start_document(&mut self, encoding: &str) -> XmlResult<()>;

    /// Finish the document. All elements must be closed.
    fn end_document(&mut self) -> XmlResult<()>;

    /// Open an element.
    fn start_element(&mut self, name: &QName) -> XmlResult<()>;

    /// Add an attribute to the open element.
    fn attribute(&mut self, name: &QName, value: &str) -> XmlResult<()>;

    /// Write character data.
    fn text(&mut self, text: &str) -> XmlResult<()>;

    /// Close the innermost open element.
    fn end_element(&mut self) -> XmlResult<()>;

    /// Make sure `uri` has a non-empty prefix on the open element and return
    /// it, declaring `preferred` (or a generated prefix) when needed.
    fn bind_namespace(&mut self, preferred: Option<&str>, uri: &str) -> XmlResult<String>;

    /// The namespace bindings in scope.
    fn namespaces(&self) -> &dyn NamespaceContext;

    /// The DOM node of the open element, for sinks that build a tree.
    fn current_node(&self) -> Option<NodeId> {
        None
    }
}

/// An [`XmlSink`] that serializes to any [`Write`].
pub struct StreamWriter<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
    scope: NamespaceScope,
    generated: usize,
}

impl<W: Write> std::fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("open", &self.open)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: Write> StreamWriter<W> {
    /// Create a compact writer.
    pub fn new(inner: W) -> Self {
        Self::from_writer(Writer::new(inner))
    }

    /// Create a writer that indents nested elements by two spaces.
    pub fn new_indented(inner: W) -> Self {
        Self::from_writer(Writer::new_with_indent(inner, b' ', 2))
    }

    fn from_writer(writer: Writer<W>) -> Self {
        Self {
            writer,
            pending: None,
            open: Vec::new(),
            scope: NamespaceScope::new(),
            generated: 0,
        }
    }

    /// Consume the writer and return the underlying output.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn flush_pending(&mut self) -> XmlResult<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn declare(&mut self, prefix: &str, uri: &str) -> XmlResult<()> {
        let start = self.pending.as_mut().ok_or_else(|| {
            XmlError::InvalidState("attributes must precede element content".to_owned())
        })?;
        start.push_attribute((xmlns_key(prefix).as_str(), uri));
        self.scope.declare(prefix, uri);
        Ok(())
    }

    fn generate_prefix(&mut self) -> String {
        loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if self.scope.resolve(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn is_declared_here(&self, prefix: &str) -> bool {
        self.scope
            .current_declarations()
            .iter()
            .any(|(p, _)| p == prefix)
    }

    /// Prefix used for an element name. A declaration it needs is recorded
    /// in scope and returned as `(prefix, uri)`.
    fn element_prefix(&mut self, name: &QName) -> (String, Option<(String, String)>) {
        let Some(uri) = name.namespace() else {
            if self.scope.resolve("").is_some() {
                self.scope.declare("", "");
                return (String::new(), Some((String::new(), String::new())));
            }
            return (String::new(), None);
        };

        if let Some(prefix) = name.prefix() {
            if self.scope.resolve(prefix) == Some(uri) {
                return (prefix.to_owned(), None);
            }
            self.scope.declare(prefix, uri);
            return (prefix.to_owned(), Some((prefix.to_owned(), uri.to_owned())));
        }
        if self.scope.resolve("") == Some(uri) {
            return (String::new(), None);
        }
        if let Some(prefix) = self.scope.non_default_prefix_for(uri) {
            return (prefix.to_owned(), None);
        }
        self.scope.declare("", uri);
        (String::new(), Some((String::new(), uri.to_owned())))
    }
}

fn xmlns_key(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_owned()
    } else {
        format!("xmlns:{prefix}")
    }
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_owned()
    } else {
        format!("{prefix}:{local}")
    }
}

impl<W: Write> XmlSink for StreamWriter<W> {
    fn start_document(&mut self, encoding: &str) -> XmlResult<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))?;
        Ok(())
    }

    fn end_document(&mut self) -> XmlResult<()> {
        if let Some(open) = self.open.last() {
            return Err(XmlError::InvalidState(format!(
                "element {open} still open at end of document"
            )));
        }
        self.writer.get_mut().flush()?;
        Ok(())
    }

    fn start_element(&mut self, name: &QName) -> XmlResult<()> {
        self.flush_pending()?;
        self.scope.push();
        let (prefix, declaration) = self.element_prefix(name);
        let tag = qualified(&prefix, name.local_part());

        let mut start = BytesStart::new(tag.clone());
        if let Some((p, uri)) = declaration {
            start.push_attribute((xmlns_key(&p).as_str(), uri.as_str()));
        }
        self.pending = Some(start);
        self.open.push(tag);
        Ok(())
    }

    fn attribute(&mut self, name: &QName, value: &str) -> XmlResult<()> {
        let key = match name.namespace() {
            None => name.local_part().to_owned(),
            Some(uri) => {
                let prefix = self.bind_namespace(name.prefix(), uri)?;
                qualified(&prefix, name.local_part())
            }
        };
        let start = self.pending.as_mut().ok_or_else(|| {
            XmlError::InvalidState("attributes must precede element content".to_owned())
        })?;
        start.push_attribute((key.as_str(), value));
        Ok(())
    }

    fn text(&mut self, text: &str) -> XmlResult<()> {
        if self.open.is_empty() {
            return Err(XmlError::InvalidState(
                "text outside the document element".to_owned(),
            ));
        }
        if text.is_empty() {
            return Ok(());
        }
        self.flush_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn end_element(&mut self) -> XmlResult<()> {
        let tag = self
            .open
            .pop()
            .ok_or_else(|| XmlError::InvalidState("no open element to end".to_owned()))?;
        match self.pending.take() {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => self.writer.write_event(Event::End(BytesEnd::new(tag)))?,
        }
        self.scope.pop();
        Ok(())
    }

    fn bind_namespace(&mut self, preferred: Option<&str>, uri: &str) -> XmlResult<String> {
        if let Some(p) = preferred.filter(|p| !p.is_empty()) {
            if self.scope.resolve(p) == Some(uri) {
                return Ok(p.to_owned());
            }
            if !self.is_declared_here(p) {
                self.declare(p, uri)?;
                return Ok(p.to_owned());
            }
        }
        if let Some(p) = self.scope.non_default_prefix_for(uri) {
            return Ok(p.to_owned());
        }
        let prefix = self.generate_prefix();
        self.declare(&prefix, uri)?;
        Ok(prefix)
    }

    fn namespaces(&self) -> &dyn NamespaceContext {
        &self.scope
    }
}
