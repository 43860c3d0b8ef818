//! Namespace prefix resolution.

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` declarations themselves.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Prefix to namespace URI lookup in both directions.
///
/// The empty prefix denotes the default namespace.
pub trait NamespaceContext {
    /// Resolve a prefix (`""` for the default namespace) to its URI.
    fn namespace_uri(&self, prefix: &str) -> Option<&str>;

    /// Find a prefix currently bound to `uri`. Returns `Some("")` when the
    /// URI is the default namespace.
    fn prefix(&self, uri: &str) -> Option<&str>;
}

/// A stack of namespace declaration frames, one per open element.
#[derive(Debug, Clone)]
pub struct NamespaceScope {
    frames: Vec<Vec<(String, String)>>,
}

impl Default for NamespaceScope {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceScope {
    /// Create a scope with only the `xml` prefix bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![vec![("xml".to_owned(), XML_NAMESPACE.to_owned())]],
        }
    }

    /// Open a new frame.
    pub fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Close the innermost frame. The base frame is never removed.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Declare `prefix` as bound to `uri` in the innermost frame. An empty
    /// URI with the empty prefix undeclares the default namespace.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if let Some(frame) = self.frames.last_mut() {
            if let Some(slot) = frame.iter_mut().find(|(p, _)| p == prefix) {
                uri.clone_into(&mut slot.1);
            } else {
                frame.push((prefix.to_owned(), uri.to_owned()));
            }
        }
    }

    /// Declarations made in the innermost frame, in declaration order.
    #[must_use]
    pub fn current_declarations(&self) -> &[(String, String)] {
        self.frames.last().map_or(&[], Vec::as_slice)
    }

    /// Resolve a prefix through all frames, innermost first.
    #[must_use]
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Find a prefix bound to `uri` that is not shadowed by an inner
    /// declaration of the same prefix.
    #[must_use]
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if uri.is_empty() {
            return None;
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .filter(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
            .find(|p| self.resolve(p) == Some(uri))
    }

    /// Find a non-empty prefix bound to `uri`, skipping the default namespace.
    #[must_use]
    pub fn non_default_prefix_for(&self, uri: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .filter(|(p, u)| u == uri && !p.is_empty())
            .map(|(p, _)| p.as_str())
            .find(|p| self.resolve(p) == Some(uri))
    }
}

impl NamespaceContext for NamespaceScope {
    fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.resolve(prefix)
    }

    fn prefix(&self, uri: &str) -> Option<&str> {
        self.prefix_for(uri)
    }
}
