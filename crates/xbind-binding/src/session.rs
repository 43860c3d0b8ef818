//! Per-call state threaded through skeletons and properties.

use xbind_core::DatatypeConverter;

use crate::binder::BindingTable;
use crate::context::BindingContext;
use crate::listener::{MarshalListener, UnmarshalListener};
use crate::value::Object;

/// State for one marshalling call.
pub(crate) struct WriteContext<'a> {
    pub(crate) registry: &'a BindingContext,
    pub(crate) converter: DatatypeConverter,
    pub(crate) binder: Option<&'a mut BindingTable>,
    pub(crate) listener: Option<&'a dyn MarshalListener>,
}

impl<'a> WriteContext<'a> {
    pub(crate) fn new(registry: &'a BindingContext) -> Self {
        Self {
            registry,
            converter: registry.converter(),
            binder: None,
            listener: None,
        }
    }

    pub(crate) fn before(&self, object: &Object) {
        if let Some(listener) = self.listener {
            listener.before_marshal(object);
        }
    }

    pub(crate) fn after(&self, object: &Object) {
        if let Some(listener) = self.listener {
            listener.after_marshal(object);
        }
    }
}

/// State for one unmarshalling call.
pub(crate) struct ReadContext<'a> {
    pub(crate) registry: &'a BindingContext,
    pub(crate) converter: DatatypeConverter,
    pub(crate) binder: Option<&'a mut BindingTable>,
    pub(crate) listener: Option<&'a dyn UnmarshalListener>,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(registry: &'a BindingContext) -> Self {
        Self {
            registry,
            converter: registry.converter(),
            binder: None,
            listener: None,
        }
    }

    pub(crate) fn before(&self, object: &Object) {
        if let Some(listener) = self.listener {
            listener.before_unmarshal(object);
        }
    }

    pub(crate) fn after(&self, object: &Object) {
        if let Some(listener) = self.listener {
            listener.after_unmarshal(object);
        }
    }
}
