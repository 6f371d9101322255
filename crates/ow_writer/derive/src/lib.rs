//! Derive macro for `ow_writer::Resource`.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static RESOURCE_ATTRIBUTE_NAME: &str = "resource";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod expand;

// -----------------------------------------------------------------------------
// Macros

/// # Resource Derivation
///
/// `#[derive(Resource)]` implements `Resource` and `WriteValue` for a struct
/// with named fields. Every field becomes a property, in declaration order,
/// named after the field.
///
/// ## Type attributes
///
/// - `name = "..."`: the type name used in diagnostics (default: the identifier).
/// - `count = path`, `next_link = path`, `etag = path`: a resource-level
///   annotation read by `fn(&Self) -> Option<AnnotationValue>`.
/// - `count_writer = path`, `next_link_writer = path`, `etag_writer = path`:
///   a resource-level annotation written by
///   `fn(&Self, AnnotationWriter<'_>) -> Result<(), WriteError>`.
/// - `before_serialize = path`, `after_serialize = path`: `fn(&Self)` hooks.
/// - `auto_register`: submit the type for `MetadataFactory::auto_register`.
///   No effect on generic types or without the `auto_register` feature.
///
/// ## Field attributes
///
/// - `rename = "..."`: the property name.
/// - `skip`: not a property.
/// - `skip_if = path`: omit while `fn(&Self, &FieldType) -> bool` holds.
/// - `skip_if_default`: omit while the field equals its `Default`.
/// - `count`, `next_link`, `etag` and their `_writer` forms, as above, for
///   property-level annotations.
/// - `position = "pre" | "post"`: where the property's annotations go.
/// - `dynamic`: the field holds the open properties.
/// - `annotations`: the field holds custom annotations.
///
/// ```rust, ignore
/// #[derive(Resource)]
/// #[resource(name = "Order", etag = Order::etag)]
/// struct Order {
///     #[resource(rename = "Id")]
///     id: i64,
///     #[resource(rename = "Lines", count = Order::line_count)]
///     lines: Vec<Line>,
///     #[resource(dynamic)]
///     extra: BTreeMap<String, Value>,
/// }
/// ```
#[proc_macro_derive(Resource, attributes(resource))]
pub fn derive_resource(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match expand::expand_resource(&ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
