//! An arena-backed XML document tree.
//!
//! Nodes live in a `Vec` owned by the [`Document`] and are addressed by
//! [`NodeId`]. Detached nodes stay in the arena until the document is
//! dropped, so a `NodeId` never dangles. [`DomCursor`] reads a subtree
//! through the [`XmlCursor`] interface and [`DomWriter`] builds or rewrites
//! one through [`XmlSink`].

use xbind_core::{NamespaceContext, NamespaceScope, QName, XML_NAMESPACE};

use crate::cursor::{CursorEvent, XmlCursor};
use crate::dynamic::{DynamicElement, DynamicNode};
use crate::error::{XmlError, XmlResult};
use crate::reader::{Attribute, EventReader, XmlEvent};
use crate::writer::{StreamWriter, XmlSink};

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element {
        name: QName,
        attributes: Vec<Attribute>,
        namespaces: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse a document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if the input is not well-formed.
    pub fn parse(xml: &[u8]) -> XmlResult<Self> {
        let mut doc = Self::new();
        let mut reader = EventReader::new(xml);
        let mut current = doc.root();
        loop {
            match reader.next_event()? {
                XmlEvent::Start(tag) => {
                    let node = doc.push(NodeKind::Element {
                        name: tag.name,
                        attributes: tag.attributes,
                        namespaces: tag.namespaces,
                    });
                    doc.append_child(current, node);
                    current = node;
                }
                XmlEvent::End(_) => {
                    current = doc.parent(current).unwrap_or_else(|| doc.root());
                }
                XmlEvent::Text(text) => {
                    if current == doc.root() {
                        continue;
                    }
                    if let Some(&last) = doc.children(current).last() {
                        if let NodeKind::Text(existing) = &mut doc.nodes[last.0].kind {
                            existing.push_str(&text);
                            continue;
                        }
                    }
                    let node = doc.create_text(text);
                    doc.append_child(current, node);
                }
                XmlEvent::Eof => {
                    tracing::trace!(nodes = doc.nodes.len(), "parsed document");
                    return Ok(doc);
                }
            }
        }
    }

    /// Serialize the whole document, with an XML declaration.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if serialization fails.
    pub fn to_xml(&self) -> XmlResult<String> {
        let mut writer = StreamWriter::new(Vec::new());
        writer.start_document("UTF-8")?;
        for &child in self.children(self.root()) {
            self.write_node(child, &mut writer)?;
        }
        writer.end_document()?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::ParseError(e.to_string()))
    }

    /// Serialize one node and its subtree without a declaration.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if serialization fails.
    pub fn node_to_xml(&self, node: NodeId) -> XmlResult<String> {
        let mut writer = StreamWriter::new(Vec::new());
        self.write_node(node, &mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::ParseError(e.to_string()))
    }

    /// Write a node and its subtree to a sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn write_node(&self, node: NodeId, sink: &mut dyn XmlSink) -> XmlResult<()> {
        match &self.data(node).kind {
            NodeKind::Document => {
                for &child in self.children(node) {
                    self.write_node(child, sink)?;
                }
            }
            NodeKind::Element {
                name,
                attributes,
                namespaces,
            } => {
                sink.start_element(name)?;
                for (prefix, uri) in namespaces {
                    if !prefix.is_empty() && !uri.is_empty() {
                        sink.bind_namespace(Some(prefix), uri)?;
                    }
                }
                for attr in attributes {
                    sink.attribute(&attr.name, &attr.value)?;
                }
                for &child in self.children(node) {
                    self.write_node(child, sink)?;
                }
                sink.end_element()?;
            }
            NodeKind::Text(text) => sink.text(text)?,
        }
        Ok(())
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// The document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The first element child of the document node.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.first_element_child(self.root())
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.push(NodeKind::Element {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Detach a node from its parent, if any.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before `reference` under `parent`, or append when
    /// `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|&c| c == reference) {
            Some(at) => children.insert(at, child),
            None => children.push(child),
        }
    }

    /// Remove `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidState`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> XmlResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(XmlError::InvalidState("node is not a child of the given parent".to_owned()));
        }
        self.detach(child);
        Ok(())
    }

    /// Put `new` in the place of `old` under `old`'s parent.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidState`] if `old` has no parent.
    pub fn replace_node(&mut self, new: NodeId, old: NodeId) -> XmlResult<()> {
        let parent = self
            .parent(old)
            .ok_or_else(|| XmlError::InvalidState("cannot replace a detached node".to_owned()))?;
        self.insert_before(parent, new, old);
        self.detach(old);
        Ok(())
    }

    /// Remove all children, attributes and namespace declarations of an
    /// element, keeping its name and position.
    pub fn clear_element(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        if let NodeKind::Element {
            attributes,
            namespaces,
            ..
        } = &mut self.nodes[node.0].kind
        {
            attributes.clear();
            namespaces.clear();
        }
    }

    /// The parent of a node.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    /// Children of a node in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    /// Child elements of a node in order.
    pub fn child_elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// The first child element of a node.
    #[must_use]
    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.child_elements(node).next()
    }

    /// The next sibling element of a node.
    #[must_use]
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let at = siblings.iter().position(|&c| c == node)?;
        siblings[at + 1..].iter().copied().find(|&c| self.is_element(c))
    }

    /// Whether a node is an element.
    #[must_use]
    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.data(node).kind, NodeKind::Element { .. })
    }

    /// The name of an element node.
    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&QName> {
        match &self.data(node).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The attributes of an element node.
    #[must_use]
    pub fn attributes(&self, node: NodeId) -> &[Attribute] {
        match &self.data(node).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &QName) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set (or replace) an attribute on an element node.
    pub fn set_attribute(&mut self, node: NodeId, name: QName, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            let value = value.into();
            match attributes.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attributes.push(Attribute::new(name, value)),
            }
        }
    }

    /// Record a namespace declaration on an element node.
    pub fn declare_namespace(&mut self, node: NodeId, prefix: &str, uri: &str) {
        if let NodeKind::Element { namespaces, .. } = &mut self.nodes[node.0].kind {
            namespaces.retain(|(p, _)| p != prefix);
            namespaces.push((prefix.to_owned(), uri.to_owned()));
        }
    }

    /// The text of a text node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.data(node).kind {
            NodeKind::Text(t) => out.push_str(t),
            _ => {
                for &child in self.children(node) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// All nodes in the subtree rooted at `node`, depth first, `node` first.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Resolve a prefix from the declarations on `node` and its ancestors.
    #[must_use]
    pub fn lookup_namespace(&self, node: NodeId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if let NodeKind::Element { namespaces, .. } = &self.data(n).kind {
                if let Some((_, uri)) = namespaces.iter().find(|(p, _)| p == prefix) {
                    return (!uri.is_empty()).then_some(uri.as_str());
                }
            }
            current = self.parent(n);
        }
        None
    }

    /// Collect the bindings in scope at `node`, outermost first.
    #[must_use]
    pub fn scope_at(&self, node: NodeId) -> NamespaceScope {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            chain.push(n);
            current = self.parent(n);
        }
        let mut scope = NamespaceScope::new();
        for n in chain.into_iter().rev() {
            if let NodeKind::Element { namespaces, .. } = &self.data(n).kind {
                scope.push();
                for (prefix, uri) in namespaces {
                    scope.declare(prefix, uri);
                }
            }
        }
        scope
    }

    /// Find a prefix bound to `uri` at `node` that is not shadowed.
    #[must_use]
    pub fn lookup_prefix(&self, node: NodeId, uri: &str) -> Option<&str> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let NodeKind::Element { namespaces, .. } = &self.data(n).kind {
                for (p, u) in namespaces {
                    if u == uri && self.lookup_namespace(node, p) == Some(uri) {
                        return Some(p.as_str());
                    }
                }
            }
            current = self.parent(n);
        }
        None
    }

    /// Convert an element subtree into a dynamic tree.
    #[must_use]
    pub fn to_dynamic(&self, node: NodeId) -> Option<DynamicElement> {
        let NodeKind::Element {
            name, attributes, ..
        } = &self.data(node).kind
        else {
            return None;
        };
        let mut element = DynamicElement::new(name.clone());
        element.attributes.clone_from(attributes);
        for &child in self.children(node) {
            match &self.data(child).kind {
                NodeKind::Text(t) => element.push_text(t.clone()),
                NodeKind::Element { .. } => {
                    if let Some(sub) = self.to_dynamic(child) {
                        element.children.push(DynamicNode::Element(sub));
                    }
                }
                NodeKind::Document => {}
            }
        }
        Some(element.normalized())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomPosition {
    Start(NodeId),
    End(NodeId),
    Done,
}

/// An [`XmlCursor`] over an element subtree of a [`Document`].
#[derive(Debug)]
pub struct DomCursor<'d> {
    doc: &'d Document,
    root: NodeId,
    position: DomPosition,
}

impl<'d> DomCursor<'d> {
    /// Create a cursor positioned on `node`'s start tag.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidState`] if `node` is not an element.
    pub fn new(doc: &'d Document, node: NodeId) -> XmlResult<Self> {
        if !doc.is_element(node) {
            return Err(XmlError::InvalidState("cursor root must be an element".to_owned()));
        }
        Ok(Self {
            doc,
            root: node,
            position: DomPosition::Start(node),
        })
    }

    fn current(&self) -> Option<NodeId> {
        match self.position {
            DomPosition::Start(n) | DomPosition::End(n) => Some(n),
            DomPosition::Done => None,
        }
    }

    fn require_start_node(&self) -> XmlResult<NodeId> {
        match self.position {
            DomPosition::Start(n) => Ok(n),
            other => Err(XmlError::InvalidState(format!(
                "expected a start tag, cursor is at {other:?}"
            ))),
        }
    }
}

impl XmlCursor for DomCursor<'_> {
    fn event(&self) -> CursorEvent {
        match self.position {
            DomPosition::Start(_) => CursorEvent::StartElement,
            DomPosition::End(_) => CursorEvent::EndElement,
            DomPosition::Done => CursorEvent::EndDocument,
        }
    }

    fn name(&self) -> Option<&QName> {
        self.current().and_then(|n| self.doc.name(n))
    }

    fn attributes(&self) -> &[Attribute] {
        match self.position {
            DomPosition::Start(n) => self.doc.attributes(n),
            _ => &[],
        }
    }

    fn next_tag(&mut self) -> XmlResult<CursorEvent> {
        self.position = match self.position {
            DomPosition::Start(n) => match self.doc.first_element_child(n) {
                Some(child) => DomPosition::Start(child),
                None => DomPosition::End(n),
            },
            DomPosition::End(n) if n == self.root => DomPosition::Done,
            DomPosition::End(n) => match self.doc.next_element_sibling(n) {
                Some(sibling) => DomPosition::Start(sibling),
                None => match self.doc.parent(n) {
                    Some(parent) => DomPosition::End(parent),
                    None => DomPosition::Done,
                },
            },
            DomPosition::Done => DomPosition::Done,
        };
        Ok(self.event())
    }

    fn element_text(&mut self) -> XmlResult<String> {
        let node = self.require_start_node()?;
        if let Some(child) = self.doc.first_element_child(node) {
            return Err(XmlError::UnexpectedElement(format!(
                "{} inside text-only element",
                self.doc.name(child).map(ToString::to_string).unwrap_or_default()
            )));
        }
        let text = self.doc.text_content(node);
        self.position = DomPosition::End(node);
        self.next_tag()?;
        Ok(text)
    }

    fn skip_element(&mut self) -> XmlResult<()> {
        let node = self.require_start_node()?;
        self.position = DomPosition::End(node);
        self.next_tag()?;
        Ok(())
    }

    fn read_subtree(&mut self) -> XmlResult<DynamicElement> {
        let node = self.require_start_node()?;
        let tree = self
            .doc
            .to_dynamic(node)
            .ok_or_else(|| XmlError::InvalidState("subtree root is not an element".to_owned()))?;
        self.position = DomPosition::End(node);
        self.next_tag()?;
        Ok(tree)
    }

    fn namespaces(&self) -> &dyn NamespaceContext {
        self
    }

    fn namespace_snapshot(&self) -> NamespaceScope {
        self.current()
            .map_or_else(NamespaceScope::new, |n| self.doc.scope_at(n))
    }

    fn node(&self) -> Option<NodeId> {
        match self.position {
            DomPosition::Start(n) => Some(n),
            _ => None,
        }
    }
}

impl NamespaceContext for DomCursor<'_> {
    fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.doc.lookup_namespace(self.current()?, prefix)
    }

    fn prefix(&self, uri: &str) -> Option<&str> {
        self.doc.lookup_prefix(self.current()?, uri)
    }
}

/// An [`XmlSink`] that builds elements inside a [`Document`].
///
/// New elements are appended under the parent given at construction. A
/// writer created with [`DomWriter::reusing`] rewrites an existing element
/// in place: the node is kept when the written name matches, and replaced
/// in its parent otherwise.
#[derive(Debug)]
pub struct DomWriter<'d> {
    doc: &'d mut Document,
    parent: NodeId,
    open: Vec<NodeId>,
    reuse: Option<NodeId>,
    written: Option<NodeId>,
    generated: usize,
}

impl<'d> DomWriter<'d> {
    /// Append new content under `parent`.
    pub fn new(doc: &'d mut Document, parent: NodeId) -> Self {
        Self {
            doc,
            parent,
            open: Vec::new(),
            reuse: None,
            written: None,
            generated: 0,
        }
    }

    /// Rewrite the element `node`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidState`] if `node` is detached.
    pub fn reusing(doc: &'d mut Document, node: NodeId) -> XmlResult<Self> {
        let parent = doc
            .parent(node)
            .ok_or_else(|| XmlError::InvalidState("cannot rewrite a detached node".to_owned()))?;
        let mut writer = Self::new(doc, parent);
        writer.reuse = Some(node);
        Ok(writer)
    }

    /// The outermost element written so far.
    #[must_use]
    pub fn written(&self) -> Option<NodeId> {
        self.written
    }

    fn top(&self) -> XmlResult<NodeId> {
        self.open
            .last()
            .copied()
            .ok_or_else(|| XmlError::InvalidState("no open element".to_owned()))
    }
}

impl XmlSink for DomWriter<'_> {
    fn start_document(&mut self, _encoding: &str) -> XmlResult<()> {
        Ok(())
    }

    fn end_document(&mut self) -> XmlResult<()> {
        match self.open.last() {
            Some(_) => Err(XmlError::InvalidState("element still open at end of document".to_owned())),
            None => Ok(()),
        }
    }

    fn start_element(&mut self, name: &QName) -> XmlResult<()> {
        let node = match (self.open.last().copied(), self.reuse.take()) {
            (None, Some(old)) if self.doc.name(old) == Some(name) => {
                self.doc.clear_element(old);
                old
            }
            (None, Some(old)) => {
                let node = self.doc.create_element(name.clone());
                self.doc.replace_node(node, old)?;
                node
            }
            (parent, _) => {
                let node = self.doc.create_element(name.clone());
                self.doc.append_child(parent.unwrap_or(self.parent), node);
                node
            }
        };
        if self.open.is_empty() && self.written.is_none() {
            self.written = Some(node);
        }
        self.open.push(node);
        Ok(())
    }

    fn attribute(&mut self, name: &QName, value: &str) -> XmlResult<()> {
        let node = self.top()?;
        self.doc.set_attribute(node, name.clone(), value);
        Ok(())
    }

    fn text(&mut self, text: &str) -> XmlResult<()> {
        let node = self.top()?;
        if !text.is_empty() {
            let t = self.doc.create_text(text);
            self.doc.append_child(node, t);
        }
        Ok(())
    }

    fn end_element(&mut self) -> XmlResult<()> {
        self.open
            .pop()
            .map(|_| ())
            .ok_or_else(|| XmlError::InvalidState("no open element to end".to_owned()))
    }

    fn bind_namespace(&mut self, preferred: Option<&str>, uri: &str) -> XmlResult<String> {
        let node = self.top()?;
        if let Some(p) = preferred.filter(|p| !p.is_empty()) {
            if self.doc.lookup_namespace(node, p) == Some(uri) {
                return Ok(p.to_owned());
            }
            if self.doc.lookup_namespace(node, p).is_none() {
                self.doc.declare_namespace(node, p, uri);
                return Ok(p.to_owned());
            }
        }
        if let Some(p) = self.doc.lookup_prefix(node, uri).filter(|p| !p.is_empty()) {
            return Ok(p.to_owned());
        }
        let prefix = loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if self.doc.lookup_namespace(node, &candidate).is_none() {
                break candidate;
            }
        };
        self.doc.declare_namespace(node, &prefix, uri);
        Ok(prefix)
    }

    fn namespaces(&self) -> &dyn NamespaceContext {
        self
    }

    fn current_node(&self) -> Option<NodeId> {
        self.open.last().copied()
    }
}

impl NamespaceContext for DomWriter<'_> {
    fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.doc.lookup_namespace(*self.open.last()?, prefix)
    }

    fn prefix(&self, uri: &str) -> Option<&str> {
        self.doc.lookup_prefix(*self.open.last()?, uri)
    }
}
