// Schema-driven runtime type transformer for roast telemetry records
pub mod type_description;
pub mod validation;
pub mod schema_registry;
pub mod transformation_engine;
pub mod schemas;
pub mod reporter;

// Re-export core types for convenience
pub use type_description::{AdditionalProperties, ObjectType, PrimitiveKind, PropertyDescriptor, TypeDescription};
pub use validation::{PathSegment, PropertyPath, ValidationError};
pub use schema_registry::{RegistryBuilder, RegistryError, TypeRegistry};
pub use transformation_engine::{
    Direction, PropertyMapCache, SchemaTransformer, TransformationError, TransformerOptions,
    UnknownKeyPolicy,
};
pub use reporter::{BatchReport, BatchReporter, ReportFormat};
