//! Enumerations.

use xbind_core::{LexicalError, QName};

use crate::descriptor::TypeKey;
use crate::error::{BindError, BindResult};
use crate::value::Value;

/// A registered enumeration. Shared by every property of the same type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumInfo {
    key: TypeKey,
    type_name: QName,
    constants: Vec<&'static str>,
}

impl EnumInfo {
    pub(crate) fn new(key: TypeKey, type_name: QName, constants: Vec<&'static str>) -> Self {
        Self {
            key,
            type_name,
            constants,
        }
    }

    /// The Rust type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The schema type name.
    #[must_use]
    pub fn type_name(&self) -> &QName {
        &self.type_name
    }

    /// Lexical constants in declaration order.
    #[must_use]
    pub fn constants(&self) -> &[&'static str] {
        &self.constants
    }

    pub(crate) fn print(&self, value: &Value) -> BindResult<String> {
        match value {
            Value::Enum(s) if self.constants.contains(&s.as_str()) => Ok(s.clone()),
            Value::Enum(s) => Err(BindError::Marshal(format!(
                "'{s}' is not a constant of {}",
                self.type_name
            ))),
            other => Err(BindError::Marshal(format!(
                "expected a constant of {}, found {}",
                self.type_name,
                other.kind_name()
            ))),
        }
    }

    pub(crate) fn parse(&self, text: &str) -> BindResult<Value> {
        let t = text.trim();
        if self.constants.contains(&t) {
            return Ok(Value::Enum(t.to_owned()));
        }
        Err(LexicalError::new("enum", text, format!("not a constant of {}", self.type_name)).into())
    }
}
