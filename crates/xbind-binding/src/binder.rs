//! Live association between objects and DOM nodes.
//!
//! A [`Binder`] marshals into and unmarshals from an arena [`Document`] and
//! remembers which node each object was written to or read from, so that
//! either side can later be brought up to date from the other.

use std::collections::HashMap;

use xbind_xml::{Document, DomCursor, DomWriter, NodeId};

use crate::context::BindingContext;
use crate::error::{BindError, BindResult};
use crate::session::ReadContext;
use crate::value::{NamedValue, ObjectId, Value};

/// Object/node pairs, kept as a bijection: binding a pair first removes
/// any pair that shares either end.
#[derive(Debug, Default, Clone)]
pub struct BindingTable {
    nodes: HashMap<ObjectId, NodeId>,
    objects: HashMap<NodeId, ObjectId>,
}

impl BindingTable {
    /// Associate `object` with `node`.
    pub fn bind(&mut self, object: ObjectId, node: NodeId) {
        if let Some(stale) = self.nodes.insert(object, node) {
            if stale != node {
                self.objects.remove(&stale);
            }
        }
        if let Some(stale) = self.objects.insert(node, object) {
            if stale != object {
                self.nodes.remove(&stale);
            }
        }
        tracing::trace!(%object, ?node, "bound object to node");
    }

    /// The node bound to `object`.
    #[must_use]
    pub fn node(&self, object: ObjectId) -> Option<NodeId> {
        self.nodes.get(&object).copied()
    }

    /// The object bound to `node`.
    #[must_use]
    pub fn object(&self, node: NodeId) -> Option<ObjectId> {
        self.objects.get(&node).copied()
    }

    /// Drop the pair that contains `node`, if any.
    pub fn remove_node(&mut self, node: NodeId) {
        if let Some(object) = self.objects.remove(&node) {
            self.nodes.remove(&object);
        }
    }

    /// Number of bound pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Keeps objects and the nodes of a [`Document`] in sync.
#[derive(Debug)]
pub struct Binder<'c> {
    context: &'c BindingContext,
    table: BindingTable,
}

impl<'c> Binder<'c> {
    /// Create a binder with no associations.
    #[must_use]
    pub fn new(context: &'c BindingContext) -> Self {
        Self {
            context,
            table: BindingTable::default(),
        }
    }

    /// The current associations.
    #[must_use]
    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    /// Associate an object with a node. Named wrappers are unwrapped.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Marshal`] if the value is not an object.
    pub fn bind(&mut self, value: &Value, node: NodeId) -> BindResult<()> {
        let object = identity(value)?;
        self.table.bind(object, node);
        Ok(())
    }

    /// The node an object is bound to.
    #[must_use]
    pub fn get_node(&self, value: &Value) -> Option<NodeId> {
        value.identity().and_then(|id| self.table.node(id))
    }

    /// The identity of the object bound to a node.
    #[must_use]
    pub fn get_object(&self, node: NodeId) -> Option<ObjectId> {
        self.table.object(node)
    }

    /// Marshal `value` as a new child of `parent`, binding every object
    /// written to its element. Returns the new element.
    ///
    /// # Errors
    ///
    /// Fails as [`Marshaller::marshal_value`](crate::Marshaller::marshal_value).
    pub fn marshal(&mut self, value: &Value, doc: &mut Document, parent: NodeId) -> BindResult<NodeId> {
        let mut writer = DomWriter::new(doc, parent);
        self.context
            .marshaller()
            .marshal_into(value, &mut writer, Some(&mut self.table))?;
        writer
            .written()
            .ok_or_else(|| BindError::Marshal("nothing was written".to_owned()))
    }

    /// Unmarshal the element `node`, binding every object read to its
    /// element.
    ///
    /// # Errors
    ///
    /// Fails as [`Unmarshaller::unmarshal_value`](crate::Unmarshaller::unmarshal_value).
    pub fn unmarshal(&mut self, doc: &Document, node: NodeId) -> BindResult<Value> {
        let mut cursor = DomCursor::new(doc, node)?;
        let mut ctx = ReadContext::new(self.context);
        ctx.binder = Some(&mut self.table);
        crate::unmarshaller::read_root(&mut ctx, &mut cursor)
    }

    /// Rewrite the node bound to `value` from the object's current state.
    /// The element keeps its current name unless `value` is a named
    /// wrapper; the node itself is kept when the name is unchanged and
    /// replaced otherwise. Returns the element now bound to the object.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Marshal`] if the object is not bound, or fails as
    /// [`Marshaller::marshal_value`](crate::Marshaller::marshal_value).
    pub fn update_xml(&mut self, value: &Value, doc: &mut Document) -> BindResult<NodeId> {
        let object = identity(value)?;
        let node = self
            .table
            .node(object)
            .ok_or_else(|| BindError::Marshal(format!("object {object} is not bound to a node")))?;
        let named = match (value, doc.name(node)) {
            (Value::Named(_), _) | (_, None) => value.clone(),
            (_, Some(name)) => NamedValue::new(name.clone(), value.clone()).into(),
        };
        self.invalidate(doc, node);
        let mut writer = DomWriter::reusing(doc, node)?;
        self.context
            .marshaller()
            .marshal_into(&named, &mut writer, Some(&mut self.table))?;
        let written = writer
            .written()
            .ok_or_else(|| BindError::Marshal("nothing was written".to_owned()))?;
        tracing::trace!(%object, ?node, ?written, "updated node from object");
        Ok(written)
    }

    /// Re-read `node` into `existing`, which keeps its identity. Returns the
    /// updated object.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Unmarshal`] if no binding matches the element,
    /// or fails as [`Unmarshaller::unmarshal_value`](crate::Unmarshaller::unmarshal_value).
    pub fn update_object(&mut self, doc: &Document, node: NodeId, existing: Value) -> BindResult<Value> {
        let registry = self.context;
        let object = existing.into_object()?;
        let skeleton = registry
            .find_skeleton_for_type(object.key(), object.describe_fn())
            .ok_or_else(|| BindError::Unmarshal(format!("no binding registered for {}", object.key())))?;
        self.invalidate(doc, node);
        let mut cursor = DomCursor::new(doc, node)?;
        let mut ctx = ReadContext::new(registry);
        ctx.binder = Some(&mut self.table);
        skeleton.read(&mut ctx, &mut cursor, Some(object))
    }

    /// Forget the associations of `node` and every node below it.
    pub fn invalidate(&mut self, doc: &Document, node: NodeId) {
        for n in doc.descendants(node) {
            self.table.remove_node(n);
        }
    }
}

fn identity(value: &Value) -> BindResult<ObjectId> {
    value
        .identity()
        .ok_or_else(|| BindError::Marshal(format!("cannot bind a {} value", value.kind_name())))
}
