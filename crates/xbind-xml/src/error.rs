//! Error types for the XML layer.

use std::io;

/// Errors that can occur while reading or writing XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error from the underlying source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// Text or attribute content could not be decoded.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// A prefix was used without a namespace declaration in scope.
    #[error("unbound namespace prefix: {0}")]
    UnboundPrefix(String),

    /// A cursor or sink operation was called in the wrong state.
    #[error("invalid XML state: {0}")]
    InvalidState(String),
}

/// Convenience result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;
