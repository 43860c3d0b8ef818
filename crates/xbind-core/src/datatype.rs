//! Lexical converters for XML Schema primitive datatypes.
//!
//! Every datatype has a `parse_*` / `print_*` pair on [`DatatypeConverter`].
//! Parsers collapse surrounding whitespace as XML Schema requires and report
//! malformed input as [`LexicalError`]. Printers produce the canonical form.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use url::Url;
use uuid::Uuid;

use crate::error::{LexicalError, LexicalResult};
use crate::namespace::NamespaceContext;
use crate::qname::QName;
use crate::types::XmlDuration;

/// Stateless lexical to value codecs.
///
/// The converter is passed explicitly to every property that needs it; it
/// carries no state, so copies are free.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatatypeConverter;

macro_rules! integer_codec {
    ($parse:ident, $print:ident, $ty:ty, $datatype:literal, $unsigned:literal) => {
        #[doc = concat!("Parse an `xs:", $datatype, "`.")]
        ///
        /// # Errors
        ///
        /// Returns [`LexicalError`] if the text is not an integer in range.
        pub fn $parse(&self, s: &str) -> LexicalResult<$ty> {
            parse_bounded_integer($datatype, s, $unsigned)
        }

        #[doc = concat!("Print an `xs:", $datatype, "`.")]
        #[must_use]
        pub fn $print(&self, v: $ty) -> String {
            v.to_string()
        }
    };
}

fn parse_bounded_integer<T: TryFrom<i128>>(
    datatype: &'static str,
    s: &str,
    unsigned: bool,
) -> LexicalResult<T> {
    let n: i128 = s
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| LexicalError::new(datatype, s, e.to_string()))?;
    if unsigned && n < 0 {
        return Err(LexicalError::new(
            datatype,
            s,
            "negative value for unsigned type",
        ));
    }
    T::try_from(n).map_err(|_| LexicalError::new(datatype, s, "value out of range"))
}

#[allow(clippy::unused_self)]
impl DatatypeConverter {
    /// Create a converter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    integer_codec!(parse_byte, print_byte, i8, "byte", false);
    integer_codec!(parse_short, print_short, i16, "short", false);
    integer_codec!(parse_int, print_int, i32, "int", false);
    integer_codec!(parse_long, print_long, i64, "long", false);
    integer_codec!(parse_unsigned_byte, print_unsigned_byte, u8, "unsignedByte", true);
    integer_codec!(parse_unsigned_short, print_unsigned_short, u16, "unsignedShort", true);
    integer_codec!(parse_unsigned_int, print_unsigned_int, u32, "unsignedInt", true);
    integer_codec!(parse_unsigned_long, print_unsigned_long, u64, "unsignedLong", true);

    /// Parse an `xs:string`. Strings are taken verbatim.
    #[must_use]
    pub fn parse_string(&self, s: &str) -> String {
        s.to_owned()
    }

    /// Print an `xs:string`.
    #[must_use]
    pub fn print_string(&self, s: &str) -> String {
        s.to_owned()
    }

    /// Parse an `xs:boolean`: `true`, `false`, `1` or `0`.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] for any other text.
    pub fn parse_boolean(&self, s: &str) -> LexicalResult<bool> {
        match s.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(LexicalError::new("boolean", s, "expected true, false, 1 or 0")),
        }
    }

    /// Print an `xs:boolean`.
    #[must_use]
    pub fn print_boolean(&self, v: bool) -> String {
        if v { "true" } else { "false" }.to_owned()
    }

    /// Parse an `xs:double`, accepting `INF`, `-INF` and `NaN`.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a number.
    pub fn parse_double(&self, s: &str) -> LexicalResult<f64> {
        match s.trim() {
            "INF" | "+INF" => Ok(f64::INFINITY),
            "-INF" => Ok(f64::NEG_INFINITY),
            "NaN" => Ok(f64::NAN),
            t if is_float_literal(t) => t
                .parse()
                .map_err(|e: std::num::ParseFloatError| LexicalError::new("double", s, e.to_string())),
            _ => Err(LexicalError::new("double", s, "not a floating point number")),
        }
    }

    /// Print an `xs:double`.
    #[must_use]
    pub fn print_double(&self, v: f64) -> String {
        if v.is_nan() {
            "NaN".to_owned()
        } else if v.is_infinite() {
            if v > 0.0 { "INF" } else { "-INF" }.to_owned()
        } else {
            v.to_string()
        }
    }

    /// Parse an `xs:float`.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a number.
    pub fn parse_float(&self, s: &str) -> LexicalResult<f32> {
        match s.trim() {
            "INF" | "+INF" => Ok(f32::INFINITY),
            "-INF" => Ok(f32::NEG_INFINITY),
            "NaN" => Ok(f32::NAN),
            t if is_float_literal(t) => t
                .parse()
                .map_err(|e: std::num::ParseFloatError| LexicalError::new("float", s, e.to_string())),
            _ => Err(LexicalError::new("float", s, "not a floating point number")),
        }
    }

    /// Print an `xs:float`.
    #[must_use]
    pub fn print_float(&self, v: f32) -> String {
        if v.is_nan() {
            "NaN".to_owned()
        } else if v.is_infinite() {
            if v > 0.0 { "INF" } else { "-INF" }.to_owned()
        } else {
            v.to_string()
        }
    }

    /// Parse a character carried as a one-character string.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] unless the text is exactly one character.
    pub fn parse_char(&self, s: &str) -> LexicalResult<char> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(LexicalError::new("char", s, "expected exactly one character")),
        }
    }

    /// Print a character.
    #[must_use]
    pub fn print_char(&self, v: char) -> String {
        v.to_string()
    }

    /// Parse an `xs:decimal`. Exponent notation is not part of the lexical space.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a plain decimal.
    pub fn parse_decimal(&self, s: &str) -> LexicalResult<BigDecimal> {
        let t = s.trim();
        if t.contains(['e', 'E']) {
            return Err(LexicalError::new("decimal", s, "exponent notation not allowed"));
        }
        BigDecimal::from_str(t).map_err(|e| LexicalError::new("decimal", s, e.to_string()))
    }

    /// Print an `xs:decimal` in plain notation.
    #[must_use]
    pub fn print_decimal(&self, v: &BigDecimal) -> String {
        v.to_plain_string()
    }

    /// Parse an `xs:integer`.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not an integer.
    pub fn parse_integer(&self, s: &str) -> LexicalResult<BigInt> {
        let t = s.trim();
        BigInt::from_str(t.strip_prefix('+').unwrap_or(t))
            .map_err(|e| LexicalError::new("integer", s, e.to_string()))
    }

    /// Print an `xs:integer`.
    #[must_use]
    pub fn print_integer(&self, v: &BigInt) -> String {
        v.to_string()
    }

    /// Parse an `xs:dateTime`, normalized to UTC. A value without a timezone
    /// is taken as UTC.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a date-time.
    pub fn parse_date_time(&self, s: &str) -> LexicalResult<DateTime<Utc>> {
        let t = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|dt| dt.and_utc())
            .map_err(|e| LexicalError::new("dateTime", s, e.to_string()))
    }

    /// Print an `xs:dateTime` with a colon-separated offset, e.g.
    /// `2024-05-01T12:00:00+00:00`.
    #[must_use]
    pub fn print_date_time(&self, v: &DateTime<Utc>) -> String {
        let mut out = v.format("%Y-%m-%dT%H:%M:%S%.f%z").to_string();
        // %z is +HHMM; the lexical form wants +HH:MM.
        let at = out.len() - 2;
        out.insert(at, ':');
        out
    }

    /// Parse an `xs:date`. A trailing timezone is accepted and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a date.
    pub fn parse_date(&self, s: &str) -> LexicalResult<NaiveDate> {
        let (date, rest) = NaiveDate::parse_and_remainder(s.trim(), "%Y-%m-%d")
            .map_err(|e| LexicalError::new("date", s, e.to_string()))?;
        timezone_offset(rest).ok_or_else(|| LexicalError::new("date", s, "trailing characters"))?;
        Ok(date)
    }

    /// Print an `xs:date`.
    #[must_use]
    pub fn print_date(&self, v: &NaiveDate) -> String {
        v.format("%Y-%m-%d").to_string()
    }

    /// Parse an `xs:time`, normalizing any offset to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a time of day.
    pub fn parse_time(&self, s: &str) -> LexicalResult<NaiveTime> {
        let (time, rest) = NaiveTime::parse_and_remainder(s.trim(), "%H:%M:%S%.f")
            .map_err(|e| LexicalError::new("time", s, e.to_string()))?;
        let offset =
            timezone_offset(rest).ok_or_else(|| LexicalError::new("time", s, "trailing characters"))?;
        Ok(time.overflowing_sub_signed(TimeDelta::seconds(offset)).0)
    }

    /// Print an `xs:time`.
    #[must_use]
    pub fn print_time(&self, v: &NaiveTime) -> String {
        v.format("%H:%M:%S%.f").to_string()
    }

    /// Parse an `xs:duration` (`-PnYnMnDTnHnMnS`).
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a duration.
    pub fn parse_duration(&self, s: &str) -> LexicalResult<XmlDuration> {
        parse_duration_components(s.trim()).ok_or_else(|| LexicalError::new("duration", s, "malformed duration"))
    }

    /// Print an `xs:duration`.
    #[must_use]
    pub fn print_duration(&self, v: &XmlDuration) -> String {
        v.to_string()
    }

    /// Parse `xs:hexBinary`. Each pair of hex digits encodes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] for odd length or non-hex characters.
    pub fn parse_hex_binary(&self, s: &str) -> LexicalResult<Vec<u8>> {
        let t = s.trim();
        if t.len() % 2 != 0 {
            return Err(LexicalError::new("hexBinary", s, "odd number of hex digits"));
        }
        hex::decode(t).map_err(|e| LexicalError::new("hexBinary", s, e.to_string()))
    }

    /// Print `xs:hexBinary` with uppercase digits.
    #[must_use]
    pub fn print_hex_binary(&self, v: &[u8]) -> String {
        hex::encode_upper(v)
    }

    /// Parse `xs:base64Binary`. Embedded whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not valid base64.
    pub fn parse_base64_binary(&self, s: &str) -> LexicalResult<Vec<u8>> {
        let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| LexicalError::new("base64Binary", s, e.to_string()))
    }

    /// Print `xs:base64Binary`.
    #[must_use]
    pub fn print_base64_binary(&self, v: &[u8]) -> String {
        STANDARD.encode(v)
    }

    /// Parse an `xs:QName`, resolving its prefix (or the default namespace
    /// for a bare name) through `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the name is not a valid `prefix:local`
    /// or bare local name, or if the prefix is not bound.
    pub fn parse_qname(&self, s: &str, ctx: &dyn NamespaceContext) -> LexicalResult<QName> {
        let t = s.trim();
        let (prefix, local) = t.split_once(':').map_or((None, t), |(p, l)| (Some(p), l));
        if local.is_empty() || local.contains(':') || prefix.is_some_and(str::is_empty) {
            return Err(LexicalError::new("QName", s, "expected prefix:local or local"));
        }
        match prefix {
            Some(prefix) => {
                let uri = ctx
                    .namespace_uri(prefix)
                    .ok_or_else(|| LexicalError::new("QName", s, format!("unbound prefix '{prefix}'")))?;
                Ok(QName::new(uri, local).with_prefix(prefix))
            }
            None => Ok(QName::with_namespace(ctx.namespace_uri(""), local)),
        }
    }

    /// Print an `xs:QName`.
    ///
    /// An explicit prefix on the value wins; a name without a namespace is
    /// printed bare; otherwise `ctx` must know a prefix for the namespace.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if no prefix is bound to the namespace.
    pub fn print_qname(&self, v: &QName, ctx: &dyn NamespaceContext) -> LexicalResult<String> {
        if let Some(prefix) = v.prefix() {
            return Ok(format!("{prefix}:{}", v.local_part()));
        }
        let Some(ns) = v.namespace() else {
            return Ok(v.local_part().to_owned());
        };
        match ctx.prefix(ns) {
            Some("") => Ok(v.local_part().to_owned()),
            Some(prefix) => Ok(format!("{prefix}:{}", v.local_part())),
            None => Err(LexicalError::new(
                "QName",
                v.to_string(),
                format!("no prefix bound to namespace '{ns}'"),
            )),
        }
    }

    /// Parse an `xs:anyURI`. Only absolute URIs are representable.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not an absolute URI.
    pub fn parse_any_uri(&self, s: &str) -> LexicalResult<Url> {
        Url::parse(s.trim()).map_err(|e| LexicalError::new("anyURI", s, e.to_string()))
    }

    /// Print an `xs:anyURI`.
    #[must_use]
    pub fn print_any_uri(&self, v: &Url) -> String {
        v.as_str().to_owned()
    }

    /// Parse a UUID in its hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns [`LexicalError`] if the text is not a UUID.
    pub fn parse_uuid(&self, s: &str) -> LexicalResult<Uuid> {
        Uuid::parse_str(s.trim()).map_err(|e| LexicalError::new("uuid", s, e.to_string()))
    }

    /// Print a UUID in lowercase hyphenated form.
    #[must_use]
    pub fn print_uuid(&self, v: &Uuid) -> String {
        v.hyphenated().to_string()
    }
}

/// Digits, sign, point and exponent only; keeps Rust's `inf`/`nan`
/// spellings out of the lexical space.
fn is_float_literal(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Offset in seconds of a timezone suffix: empty, `Z`, or `+HH:MM`/`-HH:MM`.
fn timezone_offset(rest: &str) -> Option<i64> {
    match rest {
        "" | "Z" => Some(0),
        _ => {
            let (sign, body) = match rest.as_bytes().first()? {
                b'+' => (1, &rest[1..]),
                b'-' => (-1, &rest[1..]),
                _ => return None,
            };
            let (h, m) = body.split_once(':')?;
            if h.len() != 2 || m.len() != 2 {
                return None;
            }
            let hours: i64 = h.parse().ok()?;
            let minutes: i64 = m.parse().ok()?;
            (hours <= 14 && minutes < 60).then_some(sign * (hours * 3_600 + minutes * 60))
        }
    }
}

fn parse_duration_components(s: &str) -> Option<XmlDuration> {
    let mut d = XmlDuration::default();
    let rest = match s.strip_prefix('-') {
        Some(r) => {
            d.negative = true;
            r
        }
        None => s,
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, Some(time))
        }
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return None;
    }

    let mut order = 0;
    for (value, designator) in components(date_part)? {
        let slot = match designator {
            'Y' if order < 1 => &mut d.years,
            'M' if order < 2 => &mut d.months,
            'D' if order < 3 => &mut d.days,
            _ => return None,
        };
        *slot = value.parse().ok()?;
        order = match designator {
            'Y' => 1,
            'M' => 2,
            _ => 3,
        };
    }

    if let Some(time) = time_part {
        let mut order = 0;
        for (value, designator) in components(time)? {
            match designator {
                'H' if order < 1 => {
                    d.hours = value.parse().ok()?;
                    order = 1;
                }
                'M' if order < 2 => {
                    d.minutes = value.parse().ok()?;
                    order = 2;
                }
                'S' if order < 3 => {
                    let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
                    d.seconds = whole.parse().ok()?;
                    if !frac.is_empty() {
                        if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
                            return None;
                        }
                        d.nanos = format!("{frac:0<9}").parse().ok()?;
                    }
                    order = 3;
                }
                _ => return None,
            }
        }
    }

    Some(d)
}

/// Split `1Y2M3D` into `[("1", 'Y'), ("2", 'M'), ("3", 'D')]`.
fn components(s: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_alphabetic() {
            if i == start {
                return None;
            }
            out.push((&s[start..i], c));
            start = i + 1;
        }
    }
    (start == s.len()).then_some(out)
}
