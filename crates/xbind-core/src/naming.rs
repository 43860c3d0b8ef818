//! Identifier to XML name conversion.
//!
//! A Rust type name such as `my_app::model::PurchaseOrder` maps to the XML
//! name `purchaseOrder`: the path and generic arguments are stripped, the
//! identifier is split into words at case, digit and punctuation boundaries,
//! and the words are re-joined in lower camel case.

/// Characters that separate words and never appear in the result.
const PUNCTUATION: &[char] = &['-', '.', ':', '_', '\u{00B7}', '\u{0387}', '\u{06DD}', '\u{06DE}'];

/// Convert a (possibly path-qualified) type name to an XML name.
#[must_use]
pub fn identifier_to_xml_name(type_name: &str) -> String {
    let words = split_identifier(simple_name(type_name));
    let mut out = String::with_capacity(type_name.len());

    for word in words.iter().filter(|w| !w.is_empty()) {
        if out.is_empty() {
            out.push_str(&word.to_lowercase());
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}

/// Strip module path and generic arguments: `a::b::Foo<c::Bar>` becomes `Foo`.
fn simple_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

fn is_uncased(ch: char) -> bool {
    !ch.is_lowercase() && !ch.is_uppercase()
}

fn split_identifier(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut last: Option<char> = None;

    for ch in identifier.chars() {
        if PUNCTUATION.contains(&ch) {
            if !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
        } else if ch.is_ascii_digit() {
            if !word.is_empty() && !last.is_some_and(|c| c.is_ascii_digit()) {
                words.push(std::mem::take(&mut word));
            }
            word.push(ch);
        } else if let Some(prev) = last {
            if prev.is_lowercase() && ch.is_uppercase() {
                words.push(std::mem::take(&mut word));
                word.push(ch);
            } else if prev.is_uppercase() && ch.is_lowercase() {
                // FOOBar splits as FOO + Bar: the last capital starts the next word.
                if word.chars().count() > 1 {
                    word.pop();
                    words.push(std::mem::take(&mut word));
                } else {
                    word.clear();
                }
                word.push(prev);
                word.push(ch);
            } else if prev.is_alphabetic() != ch.is_alphabetic()
                || is_uncased(prev) != is_uncased(ch)
            {
                words.push(std::mem::take(&mut word));
                word.push(ch);
            } else {
                word.push(ch);
            }
        } else {
            word.push(ch);
        }
        last = Some(ch);
    }

    if !word.is_empty() {
        words.push(word);
    }
    words
}
