//! XML to object graph.

use std::io::BufRead;

use xbind_xml::{StreamCursor, XmlCursor};

use crate::bind::XmlBind;
use crate::context::BindingContext;
use crate::descriptor::TypeKey;
use crate::error::{BindError, BindResult};
use crate::listener::UnmarshalListener;
use crate::property::{Lookup, PropertyFlags, build_property};
use crate::session::ReadContext;
use crate::value::{Named, Value};

/// Reads XML documents into values.
pub struct Unmarshaller<'c> {
    context: &'c BindingContext,
    listener: Option<Box<dyn UnmarshalListener + 'c>>,
}

impl std::fmt::Debug for Unmarshaller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unmarshaller")
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl<'c> Unmarshaller<'c> {
    /// Create an unmarshaller.
    #[must_use]
    pub fn new(context: &'c BindingContext) -> Self {
        Self {
            context,
            listener: None,
        }
    }

    /// Receive callbacks around every object read.
    pub fn set_listener(&mut self, listener: impl UnmarshalListener + 'c) -> &mut Self {
        self.listener = Some(Box::new(listener));
        self
    }

    fn session(&self) -> ReadContext<'_> {
        let mut ctx = ReadContext::new(self.context);
        ctx.listener = self.listener.as_deref().map(|l| l as &dyn UnmarshalListener);
        ctx
    }

    /// Read a document whose element is a registered root.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::UnknownRootElement`] if no type is registered
    /// for the document element, and [`BindError::Unmarshal`] or
    /// [`BindError::InvalidLexicalValue`] for content that does not match
    /// the binding. Malformed XML surfaces as [`BindError::Xml`].
    pub fn unmarshal_value<R: BufRead>(&self, source: R) -> BindResult<Value> {
        let mut cursor = StreamCursor::new(source)?;
        self.unmarshal_from_cursor(&mut cursor)
    }

    /// Read the element at the cursor, resolving its type by name.
    ///
    /// # Errors
    ///
    /// Fails as [`unmarshal_value`](Self::unmarshal_value).
    pub fn unmarshal_from_cursor(&self, cursor: &mut dyn XmlCursor) -> BindResult<Value> {
        read_root(&mut self.session(), cursor)
    }

    /// Read a document into `T`. The document element must be a root
    /// element of `T` or of a bound subtype.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Unmarshal`] if the element is bound to another
    /// type, and otherwise fails as [`unmarshal_value`](Self::unmarshal_value)
    /// or `T::from_value`.
    pub fn unmarshal<T: XmlBind, R: BufRead>(&self, source: R) -> BindResult<T> {
        let registry = self.context;
        let mut cursor = StreamCursor::new(source)?;
        let key = TypeKey::of::<T>();
        let value = match registry.skeleton_for_key(key) {
            Some(expected) => {
                let name = cursor.require_start()?;
                let skeleton = registry
                    .root_skeleton(&name)
                    .filter(|s| s.derives_from(registry, expected.id()))
                    .ok_or_else(|| {
                        BindError::Unmarshal(format!("element {name} is not bound to {key}"))
                    })?;
                skeleton.read_nested(&mut self.session(), &mut cursor, Value::Null)?
            }
            None => self.unmarshal_from_cursor(&mut cursor)?,
        };
        T::from_value(value)
    }

    /// Read a document as `T` regardless of its element name, which is
    /// returned alongside the value.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if `T` references an
    /// unregistered structure, and otherwise fails as
    /// [`unmarshal_value`](Self::unmarshal_value) or `T::from_value`.
    pub fn unmarshal_declared<T: XmlBind, R: BufRead>(&self, source: R) -> BindResult<Named<T>> {
        let mut cursor = StreamCursor::new(source)?;
        let property = build_property(
            &mut Lookup(self.context),
            T::describe,
            &PropertyFlags::default(),
        )?;
        let name = cursor.require_start()?;
        tracing::trace!(element = %name, type_name = TypeKey::of::<T>().name(), "unmarshalling declared type");
        let value = property.read_element(&mut self.session(), &mut cursor, Value::Null)?;
        Ok(Named {
            name,
            value: T::from_value(value)?,
        })
    }
}

/// Read the element at the cursor through the root-element index.
pub(crate) fn read_root(ctx: &mut ReadContext<'_>, cursor: &mut dyn XmlCursor) -> BindResult<Value> {
    let registry = ctx.registry;
    let name = cursor.require_start()?;
    let skeleton = registry
        .root_skeleton(&name)
        .ok_or(BindError::UnknownRootElement(name))?;
    tracing::trace!(type_name = skeleton.key().name(), "unmarshalling root element");
    skeleton.read_nested(ctx, cursor, Value::Null)
}
