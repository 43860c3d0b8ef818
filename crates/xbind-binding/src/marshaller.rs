//! Object graph to XML.

use std::io::Write;

use xbind_xml::{StreamWriter, XmlSink};

use crate::binder::BindingTable;
use crate::bind::XmlBind;
use crate::context::BindingContext;
use crate::error::{BindError, BindResult};
use crate::listener::MarshalListener;
use crate::property::write_runtime_leaf;
use crate::session::WriteContext;
use crate::value::Value;

/// Writes values as XML documents.
///
/// A marshaller borrows a finished [`BindingContext`] and holds only its
/// own output settings, so any number can run against one context.
pub struct Marshaller<'c> {
    context: &'c BindingContext,
    fragment: bool,
    formatted_output: bool,
    encoding: String,
    listener: Option<Box<dyn MarshalListener + 'c>>,
}

impl std::fmt::Debug for Marshaller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaller")
            .field("fragment", &self.fragment)
            .field("formatted_output", &self.formatted_output)
            .field("encoding", &self.encoding)
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl<'c> Marshaller<'c> {
    /// Create a marshaller with the context's configured output settings.
    #[must_use]
    pub fn new(context: &'c BindingContext) -> Self {
        let config = context.config();
        Self {
            context,
            fragment: config.fragment,
            formatted_output: config.formatted_output,
            encoding: config.encoding.clone(),
            listener: None,
        }
    }

    /// Omit the XML declaration.
    pub fn set_fragment(&mut self, fragment: bool) -> &mut Self {
        self.fragment = fragment;
        self
    }

    /// Indent the output.
    pub fn set_formatted_output(&mut self, formatted: bool) -> &mut Self {
        self.formatted_output = formatted;
        self
    }

    /// Encoding label for the XML declaration. Only UTF-8 can be written.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.encoding = encoding.into();
        self
    }

    /// Receive callbacks around every object written.
    pub fn set_listener(&mut self, listener: impl MarshalListener + 'c) -> &mut Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Marshal a typed value.
    ///
    /// # Errors
    ///
    /// Fails as [`marshal_value`](Self::marshal_value).
    pub fn marshal<T: XmlBind, W: Write>(&self, value: &T, out: W) -> BindResult<()> {
        self.marshal_value(&value.to_value(), out)
    }

    /// Marshal a value to a byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Marshal`] if the value's type is not registered,
    /// it is not a document element and carries no explicit name, or the
    /// encoding is not UTF-8. Write failures surface as [`BindError::Xml`].
    pub fn marshal_value<W: Write>(&self, value: &Value, out: W) -> BindResult<()> {
        let mut writer = if self.formatted_output {
            StreamWriter::new_indented(out)
        } else {
            StreamWriter::new(out)
        };
        self.marshal_to_sink(value, &mut writer)
    }

    /// Marshal a value to a string.
    ///
    /// # Errors
    ///
    /// Fails as [`marshal_value`](Self::marshal_value).
    pub fn marshal_to_string(&self, value: &Value) -> BindResult<String> {
        let mut out = Vec::new();
        self.marshal_value(value, &mut out)?;
        String::from_utf8(out).map_err(|e| BindError::Marshal(e.to_string()))
    }

    /// Marshal a value as a complete document on any sink.
    ///
    /// # Errors
    ///
    /// Fails as [`marshal_value`](Self::marshal_value).
    pub fn marshal_to_sink(&self, value: &Value, sink: &mut dyn XmlSink) -> BindResult<()> {
        if !is_utf8(&self.encoding) {
            return Err(BindError::Marshal(format!(
                "unsupported encoding {}",
                self.encoding
            )));
        }
        if !self.fragment {
            sink.start_document(&self.encoding)?;
        }
        self.marshal_into(value, sink, None)?;
        sink.end_document()?;
        Ok(())
    }

    /// Write one document element, without declaration handling.
    pub(crate) fn marshal_into(
        &self,
        value: &Value,
        sink: &mut dyn XmlSink,
        binder: Option<&mut BindingTable>,
    ) -> BindResult<()> {
        let registry = self.context;
        let (name, payload) = match value {
            Value::Named(named) => (Some(&named.name), &named.value),
            other => (None, other),
        };
        let mut ctx = WriteContext::new(registry);
        ctx.binder = binder;
        ctx.listener = self.listener.as_deref().map(|l| l as &dyn MarshalListener);

        match (payload, name) {
            (Value::Object(object), name) => {
                let skeleton = registry
                    .find_skeleton_for_type(object.key(), object.describe_fn())
                    .ok_or_else(|| {
                        BindError::Marshal(format!("no binding registered for {}", object.key()))
                    })?;
                if name.is_none() && skeleton.element_name().is_none() {
                    return Err(BindError::Marshal(format!(
                        "{} is not a document element",
                        object.key()
                    )));
                }
                tracing::trace!(type_name = object.key().name(), "marshalling object");
                skeleton.write(&mut ctx, sink, payload, name, false)
            }
            (Value::Dynamic(element), None) => Ok(element.write_to(sink)?),
            (Value::Null, _) => Err(BindError::Marshal("cannot marshal a null value".to_owned())),
            (simple, Some(name)) => write_runtime_leaf(ctx.converter, sink, simple, name),
            (other, None) => Err(BindError::Marshal(format!(
                "a {} value is not a document element",
                other.kind_name()
            ))),
        }
    }
}

fn is_utf8(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case("utf-8") || encoding.eq_ignore_ascii_case("utf8")
}
