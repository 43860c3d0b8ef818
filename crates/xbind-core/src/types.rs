//! Value types for XML Schema primitives without a direct ecosystem type.

use std::fmt;

use bytes::Bytes;

/// Bytes carried as `xs:hexBinary` rather than `xs:base64Binary`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBinary(pub Vec<u8>);

impl HexBinary {
    /// Borrow the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBinary {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for HexBinary {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

/// Opaque binary content with an optional MIME content type hint.
///
/// Written as base64 text; the content type travels in the
/// `xmime:contentType` attribute when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataHandle {
    /// MIME type of the content, e.g. `image/png`.
    pub content_type: Option<String>,
    /// The content.
    pub data: Bytes,
}

impl DataHandle {
    /// Create a data handle.
    #[must_use]
    pub fn new(content_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.map(ToOwned::to_owned),
            data: data.into(),
        }
    }
}

/// An `xs:duration` value: `PnYnMnDTnHnMnS`, optionally negated.
///
/// Components are kept as written; `P1D` and `PT24H` are distinct values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct XmlDuration {
    /// Whether the duration is negative.
    pub negative: bool,
    /// Years.
    pub years: u32,
    /// Months.
    pub months: u32,
    /// Days.
    pub days: u32,
    /// Hours.
    pub hours: u32,
    /// Minutes.
    pub minutes: u32,
    /// Whole seconds.
    pub seconds: u32,
    /// Fractional seconds in nanoseconds.
    pub nanos: u32,
}

impl XmlDuration {
    /// A duration of days, hours, minutes and seconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_seconds(total: u64) -> Self {
        let days = u32::try_from(total / 86_400).unwrap_or(u32::MAX);
        let rem = total % 86_400;
        Self {
            days,
            hours: (rem / 3_600) as u32,
            minutes: (rem % 3_600 / 60) as u32,
            seconds: (rem % 60) as u32,
            ..Self::default()
        }
    }

    fn has_time(&self) -> bool {
        self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.nanos != 0
    }
}

/// The canonical lexical form. A zero duration prints as `PT0S`.
impl fmt::Display for XmlDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.years != 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        let has_date = self.years != 0 || self.months != 0 || self.days != 0;
        if !self.has_time() {
            if !has_date {
                f.write_str("T0S")?;
            }
            return Ok(());
        }
        f.write_str("T")?;
        if self.hours != 0 {
            write!(f, "{}H", self.hours)?;
        }
        if self.minutes != 0 {
            write!(f, "{}M", self.minutes)?;
        }
        if self.seconds != 0 || self.nanos != 0 {
            if self.nanos == 0 {
                write!(f, "{}S", self.seconds)?;
            } else {
                let frac = format!("{:09}", self.nanos);
                write!(f, "{}.{}S", self.seconds, frac.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}
