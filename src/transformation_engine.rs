use std::sync::Arc;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Map, Value};
use thiserror::Error;
use crate::{
    schema_registry::TypeRegistry,
    type_description::{
        AdditionalProperties, ObjectId, ObjectType, PrimitiveKind, PropertyDescriptor,
        TypeDescription,
    },
    validation::{PropertyPath, ValidationError},
};

/// Which side of a property rename the input is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// External (wire) names to internal names
    Decode,
    /// Internal names back to external names
    Encode,
}

impl Direction {
    pub fn source_name<'a>(&self, property: &'a PropertyDescriptor) -> &'a str {
        match self {
            Direction::Decode => &property.external_name,
            Direction::Encode => &property.internal_name,
        }
    }

    pub fn target_name<'a>(&self, property: &'a PropertyDescriptor) -> &'a str {
        match self {
            Direction::Decode => &property.internal_name,
            Direction::Encode => &property.external_name,
        }
    }
}

/// How undeclared keys are treated on objects whose catch-all is forbidden
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Copy them through verbatim
    #[default]
    Preserve,
    /// Fail validation on the first one
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct TransformerOptions {
    pub unknown_keys: UnknownKeyPolicy,
}

/// Errors that can occur during a decode or encode
#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("JSON parsing error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl TransformationError {
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            TransformationError::Validation(error) => Some(error),
            _ => None,
        }
    }
}

/// Where a declared property lands on the other side of the rename
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTarget {
    pub target_key: String,
    /// Position of the descriptor in the object's property list
    pub index: usize,
}

/// Source key to target, in declaration order
pub type PropertyMap = IndexMap<String, PropertyTarget>;

/// Lazily built property maps keyed by object identity and direction
#[derive(Debug, Default)]
pub struct PropertyMapCache {
    entries: DashMap<(ObjectId, Direction), Arc<PropertyMap>>,
}

impl PropertyMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the map for `object`, building it on first use.
    /// Concurrent first use may build it twice; both builds are equal.
    pub fn get_or_build(&self, object: &ObjectType, direction: Direction) -> Arc<PropertyMap> {
        let key = (object.id(), direction);
        if let Some(existing) = self.entries.get(&key) {
            return Arc::clone(existing.value());
        }

        let built = Arc::new(build_property_map(object, direction));
        debug!(
            "Built {:?} property map for object {:?} ({} properties)",
            direction,
            object.id(),
            built.len()
        );
        let entry = self.entries.entry(key).or_insert(built);
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn build_property_map(object: &ObjectType, direction: Direction) -> PropertyMap {
    object
        .properties()
        .iter()
        .enumerate()
        .map(|(index, property)| {
            (
                direction.source_name(property).to_string(),
                PropertyTarget {
                    target_key: direction.target_name(property).to_string(),
                    index,
                },
            )
        })
        .collect()
}

/// Interprets type descriptions from one registry against JSON values
#[derive(Debug)]
pub struct SchemaTransformer {
    registry: Arc<TypeRegistry>,
    options: TransformerOptions,
    cache: PropertyMapCache,
}

impl SchemaTransformer {
    pub fn new(registry: TypeRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    pub fn from_shared(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            options: TransformerOptions::default(),
            cache: PropertyMapCache::new(),
        }
    }

    pub fn with_options(mut self, options: TransformerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &TransformerOptions {
        &self.options
    }

    pub fn cache(&self) -> &PropertyMapCache {
        &self.cache
    }

    /// Parse `json_text` and decode it against the named root type
    pub fn decode(&self, json_text: &str, root_type: &str) -> Result<Value, TransformationError> {
        let value: Value = serde_json::from_str(json_text).map_err(TransformationError::Parse)?;
        self.decode_value(&value, root_type)
    }

    pub fn decode_value(&self, value: &Value, root_type: &str) -> Result<Value, TransformationError> {
        self.transform_root(value, root_type, Direction::Decode)
    }

    /// Encode a decoded value back to pretty-printed JSON text
    pub fn encode(&self, value: &Value, root_type: &str) -> Result<String, TransformationError> {
        let encoded = self.encode_value(value, root_type)?;
        serde_json::to_string_pretty(&encoded).map_err(TransformationError::Serialize)
    }

    pub fn encode_value(&self, value: &Value, root_type: &str) -> Result<Value, TransformationError> {
        self.transform_root(value, root_type, Direction::Encode)
    }

    fn transform_root(
        &self,
        value: &Value,
        root_type: &str,
        direction: Direction,
    ) -> Result<Value, TransformationError> {
        if !self.registry.contains(root_type) {
            return Err(TransformationError::UnknownType(root_type.to_string()));
        }
        let root = TypeDescription::reference(root_type);
        let transformed = self.transform(Some(value), &root, direction)?;
        Ok(transformed.unwrap_or(Value::Null))
    }

    /// Transform `value` against `typ`. `None` stands for a missing value on both sides.
    ///
    /// Property maps are cached only for object descriptions owned by the registry,
    /// so ad-hoc descriptions passed here do not grow the cache.
    pub fn transform(
        &self,
        value: Option<&Value>,
        typ: &TypeDescription,
        direction: Direction,
    ) -> Result<Option<Value>, TransformationError> {
        self.transform_at(value, typ, direction, None, None, &PropertyPath::root())
    }

    fn transform_at<'a>(
        &'a self,
        value: Option<&Value>,
        typ: &'a TypeDescription,
        direction: Direction,
        key: Option<&str>,
        parent: Option<&str>,
        path: &PropertyPath,
    ) -> Result<Option<Value>, TransformationError> {
        let mut typ = typ;
        let mut ref_name: Option<&str> = None;
        while let TypeDescription::Reference(name) = typ {
            typ = self
                .registry
                .get(name)
                .ok_or_else(|| TransformationError::UnknownType(name.clone()))?;
            ref_name = Some(name.as_str());
        }

        let invalid = |expected: &str| -> TransformationError {
            ValidationError::new(expected, value)
                .with_key(key)
                .with_parent(parent)
                .with_path(path)
                .into()
        };

        match typ {
            TypeDescription::Primitive(PrimitiveKind::Any) => Ok(value.cloned()),
            TypeDescription::Primitive(kind) => {
                if primitive_matches(*kind, value) {
                    Ok(value.cloned())
                } else {
                    Err(invalid(kind.name()))
                }
            }
            TypeDescription::Never => Err(invalid(&typ.pretty_name())),
            TypeDescription::Literal(literal) => {
                if value == Some(literal) {
                    Ok(value.cloned())
                } else {
                    Err(invalid(&typ.pretty_name()))
                }
            }
            TypeDescription::Enum(members) => match value {
                Some(Value::String(s)) if members.iter().any(|member| member == s) => {
                    Ok(value.cloned())
                }
                _ => Err(invalid(&typ.pretty_name())),
            },
            TypeDescription::UnionOf(members) => {
                for member in members {
                    match self.transform_at(value, member, direction, None, None, path) {
                        Ok(transformed) => return Ok(transformed),
                        Err(TransformationError::Validation(error)) => {
                            trace!("Union member {} rejected value: {}", member, error);
                        }
                        Err(other) => return Err(other),
                    }
                }
                Err(invalid(&typ.pretty_name()))
            }
            TypeDescription::ArrayOf(element) => {
                let Some(Value::Array(items)) = value else {
                    return Err(invalid("array"));
                };
                let mut transformed = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = path.child_index(index);
                    let result =
                        self.transform_at(Some(item), element, direction, None, None, &item_path)?;
                    transformed.push(result.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(transformed)))
            }
            TypeDescription::ObjectOf(object) => {
                let Some(Value::Object(input)) = value else {
                    return Err(invalid(ref_name.unwrap_or("object")));
                };
                self.transform_object(input, object, direction, ref_name, path)
                    .map(|map| Some(Value::Object(map)))
            }
            TypeDescription::Date => match value {
                Some(Value::Null) => Ok(Some(Value::Null)),
                // Epoch numbers are not parsed as dates
                Some(Value::Number(_)) => Ok(value.cloned()),
                Some(Value::String(text)) if parse_timestamp(text).is_some() => Ok(value.cloned()),
                _ => Err(invalid("Date")),
            },
            TypeDescription::Reference(_) => unreachable!("references are resolved above"),
        }
    }

    fn transform_object(
        &self,
        input: &Map<String, Value>,
        object: &ObjectType,
        direction: Direction,
        ref_name: Option<&str>,
        path: &PropertyPath,
    ) -> Result<Map<String, Value>, TransformationError> {
        // Only registry-owned objects are cached; ad-hoc descriptions get a fresh map
        let properties = if self.registry.owns_object(object.id()) {
            self.cache.get_or_build(object, direction)
        } else {
            Arc::new(build_property_map(object, direction))
        };
        let mut result = Map::new();

        for (source_key, target) in properties.iter() {
            let property = &object.properties()[target.index];
            let transformed = self.transform_at(
                input.get(source_key),
                &property.typ,
                direction,
                Some(source_key.as_str()),
                ref_name,
                &path.child_key(source_key),
            )?;
            if let Some(transformed) = transformed {
                result.insert(target.target_key.clone(), transformed);
            }
        }

        for (extra_key, extra_value) in input {
            if properties.contains_key(extra_key) {
                continue;
            }
            let extra_path = path.child_key(extra_key);
            if properties.values().any(|target| target.target_key == *extra_key) {
                // Would overwrite a declared property's output
                return Err(ValidationError::new(
                    TypeDescription::never().pretty_name(),
                    Some(extra_value),
                )
                .with_key(Some(extra_key.as_str()))
                .with_parent(ref_name)
                .with_path(&extra_path)
                .into());
            }
            let transformed = match object.additional() {
                AdditionalProperties::Allowed(additional) => self.transform_at(
                    Some(extra_value),
                    additional,
                    direction,
                    Some(extra_key.as_str()),
                    ref_name,
                    &extra_path,
                )?,
                AdditionalProperties::Forbidden => match self.options.unknown_keys {
                    UnknownKeyPolicy::Preserve => Some(extra_value.clone()),
                    UnknownKeyPolicy::Reject => {
                        return Err(ValidationError::new(
                            TypeDescription::never().pretty_name(),
                            Some(extra_value),
                        )
                        .with_key(Some(extra_key.as_str()))
                        .with_parent(ref_name)
                        .with_path(&extra_path)
                        .into());
                    }
                },
            };
            if let Some(transformed) = transformed {
                result.insert(extra_key.clone(), transformed);
            }
        }

        Ok(result)
    }
}

fn primitive_matches(kind: PrimitiveKind, value: Option<&Value>) -> bool {
    match (kind, value) {
        (PrimitiveKind::Any, _) => true,
        (PrimitiveKind::Undefined, None) => true,
        (PrimitiveKind::Boolean, Some(Value::Bool(_))) => true,
        (PrimitiveKind::Number, Some(Value::Number(_))) => true,
        (PrimitiveKind::String, Some(Value::String(_))) => true,
        (PrimitiveKind::Null, Some(Value::Null)) => true,
        _ => false,
    }
}

/// Parse a calendar timestamp in any of the accepted textual forms
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.naive_utc());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
