//! End-to-end tests for xbind.
//!
//! The [`model`] module holds a small set of bound types covering every
//! property shape; the `test_*` modules exercise them through the public
//! marshalling, unmarshalling, binder and schema APIs.
//!
//! Run them with:
//! ```text
//! cargo test -p xbind-integration
//! ```

use std::sync::Once;

use xbind_binding::{BindingContext, Value};

#[allow(missing_docs)]
pub mod model;

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A context with every model type registered.
///
/// # Errors
///
/// Returns the registration error, if any.
pub fn model_context() -> anyhow::Result<BindingContext> {
    init_tracing();
    let context = BindingContext::builder()
        .register::<model::Person>()
        .register::<model::Group>()
        .register::<model::Category>()
        .register::<model::Item>()
        .register::<model::Zoo>()
        .register::<model::Dog>()
        .register::<model::Cat>()
        .register::<model::Price>()
        .register::<model::Envelope>()
        .register::<model::Shelf>()
        .register::<model::Author>()
        .register::<model::Badge>()
        .register::<model::Sorted>()
        .build()?;
    Ok(context)
}

/// Marshal without an XML declaration.
///
/// # Errors
///
/// Returns the marshalling error, if any.
pub fn to_fragment(context: &BindingContext, value: &Value) -> anyhow::Result<String> {
    let mut marshaller = context.marshaller();
    marshaller.set_fragment(true);
    Ok(marshaller.marshal_to_string(value)?)
}

mod test_binder;
mod test_content;
mod test_datatype;
mod test_inheritance;
mod test_listener;
mod test_registry;
mod test_schema;
