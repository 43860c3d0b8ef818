//! Error types for the xbind core.

/// A lexical form that does not denote a value of the requested datatype.
///
/// Raised by the datatype converters for malformed dates, odd-length hex,
/// unresolvable `QName` prefixes, negative values for unsigned types, and
/// unknown enum constants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid lexical value '{value}' for {datatype}: {reason}")]
pub struct LexicalError {
    /// The XML Schema datatype being converted (e.g. `hexBinary`).
    pub datatype: &'static str,
    /// The offending lexical (or printed) value.
    pub value: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl LexicalError {
    /// Create a new lexical error.
    pub fn new(datatype: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            datatype,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for datatype conversions.
pub type LexicalResult<T> = Result<T, LexicalError>;
