//! Record shapes for the search index and the roast telemetry it points at.
//!
//! Each namespace builds its own registry; no type is shared between them.

pub mod roast;
pub mod search;

use crate::type_description::{PropertyDescriptor, TypeDescription};

/// A property that may be missing, with the same name on both sides
pub(crate) fn optional_field(name: &str, typ: TypeDescription) -> PropertyDescriptor {
    PropertyDescriptor::same(name, TypeDescription::optional(typ))
}
