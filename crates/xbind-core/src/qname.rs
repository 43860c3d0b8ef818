//! Qualified XML names.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A qualified XML name: optional namespace URI, local part, optional prefix.
///
/// Two names are equal when their namespace and local part are equal; the
/// prefix is a serialization hint only and takes no part in equality or
/// hashing.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct QName {
    namespace: Option<String>,
    local: String,
    prefix: Option<String>,
}

impl QName {
    /// Create a name in the given namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
            local: local.into(),
            prefix: None,
        }
    }

    /// Create a name with no namespace.
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
            prefix: None,
        }
    }

    /// Create a name in an optional namespace.
    #[must_use]
    pub fn with_namespace(namespace: Option<&str>, local: impl Into<String>) -> Self {
        match namespace {
            Some(ns) => Self::new(ns, local),
            None => Self::local(local),
        }
    }

    /// Attach a preferred prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// The namespace URI, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The local part.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local
    }

    /// The preferred prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The same name in a different namespace, keeping the local part.
    #[must_use]
    pub fn in_namespace(&self, namespace: Option<&str>) -> Self {
        Self::with_namespace(namespace, self.local.clone())
    }

    /// Parse Clark notation (`{uri}local` or `local`).
    #[must_use]
    pub fn from_clark(s: &str) -> Self {
        if let Some(rest) = s.strip_prefix('{') {
            if let Some((ns, local)) = rest.split_once('}') {
                return Self::new(ns, local);
            }
        }
        Self::local(s)
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.namespace, &self.local).cmp(&(&other.namespace, &other.local))
    }
}

/// Clark notation: `{uri}local`, or just `local` without a namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}
