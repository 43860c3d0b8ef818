//! Lifecycle callbacks around each object written or read.

use crate::value::Object;

/// Callbacks invoked around every object a marshaller writes.
pub trait MarshalListener {
    /// Called before the object's element is started.
    fn before_marshal(&self, _object: &Object) {}

    /// Called after the object's element is closed.
    fn after_marshal(&self, _object: &Object) {}
}

/// Callbacks invoked around every object an unmarshaller reads.
pub trait UnmarshalListener {
    /// Called once the object is created, before its content is read.
    fn before_unmarshal(&self, _object: &Object) {}

    /// Called after the object's content has been read.
    fn after_unmarshal(&self, _object: &Object) {}
}
