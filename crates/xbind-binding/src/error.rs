//! Error types for the binding engine.

use xbind_core::{LexicalError, QName};
use xbind_xml::XmlError;

/// Errors raised while building a binding context or moving values between
/// Rust and XML.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// A type cannot be bound: unsupported shape, unresolved type
    /// parameter, illegal annotation combination, or a name collision.
    #[error("binding configuration error: {0}")]
    Configuration(String),

    /// A value could not be written.
    #[error("marshal error: {0}")]
    Marshal(String),

    /// A document could not be read into values.
    #[error("unmarshal error: {0}")]
    Unmarshal(String),

    /// The document element is not registered as a root element.
    #[error("unknown root element {0}")]
    UnknownRootElement(QName),

    /// Text that does not denote a value of the bound datatype.
    #[error(transparent)]
    InvalidLexicalValue(#[from] LexicalError),

    /// Malformed XML or a failing underlying reader or writer.
    #[error(transparent)]
    Xml(#[from] XmlError),
}

impl From<std::io::Error> for BindError {
    fn from(err: std::io::Error) -> Self {
        Self::Xml(XmlError::Io(err))
    }
}

/// Convenience result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;
