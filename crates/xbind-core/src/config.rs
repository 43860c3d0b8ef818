//! Configuration for binding sessions.
//!
//! Configuration can be built in code or driven by environment variables.

/// Encoding accepted by the marshaller.
const DEFAULT_ENCODING: &str = "UTF-8";

/// Settings shared by a binding context and the marshallers it creates.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingConfig {
    /// Namespace applied to types that do not declare one.
    pub target_namespace: Option<String>,
    /// Omit the XML declaration when marshalling.
    pub fragment: bool,
    /// Indent marshalled output.
    pub formatted_output: bool,
    /// Encoding label written in the XML declaration.
    pub encoding: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            target_namespace: None,
            fragment: false,
            formatted_output: false,
            encoding: DEFAULT_ENCODING.to_owned(),
        }
    }
}

impl BindingConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `XBIND_TARGET_NAMESPACE` | *(unset)* |
    /// | `XBIND_FRAGMENT` | `false` |
    /// | `XBIND_FORMATTED_OUTPUT` | `false` |
    /// | `XBIND_ENCODING` | `UTF-8` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("XBIND_TARGET_NAMESPACE") {
            if !v.is_empty() {
                config.target_namespace = Some(v);
            }
        }
        if let Ok(v) = std::env::var("XBIND_FRAGMENT") {
            config.fragment = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("XBIND_FORMATTED_OUTPUT") {
            config.formatted_output = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("XBIND_ENCODING") {
            config.encoding = v;
        }

        tracing::debug!(?config, "loaded binding config from environment");
        config
    }

    /// Whether the configured encoding can be produced by the writer.
    #[must_use]
    pub fn is_supported_encoding(&self) -> bool {
        self.encoding.eq_ignore_ascii_case(DEFAULT_ENCODING)
            || self.encoding.eq_ignore_ascii_case("UTF8")
    }
}

fn parse_flag(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}
