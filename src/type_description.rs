use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Declarative description of an accepted JSON shape
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescription {
    Primitive(PrimitiveKind),
    /// Exactly one scalar value
    Literal(Value),
    /// One of a fixed, ordered set of string literals
    Enum(Vec<String>),
    ArrayOf(Box<TypeDescription>),
    /// Alternatives tried in declaration order, first success wins
    UnionOf(Vec<TypeDescription>),
    ObjectOf(ObjectType),
    /// Indirection resolved against the registry at traversal time
    Reference(String),
    /// A calendar timestamp transmitted as a string
    Date,
    /// Never matches
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Number,
    String,
    Null,
    /// A missing key
    Undefined,
    Any,
}

/// Identity of an object description, used to key the property-map cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

/// What happens to keys an object description does not declare
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(Box<TypeDescription>),
    /// The `false` flag. Enforcement is up to the engine's unknown-key policy.
    Forbidden,
}

/// Object with named properties and a catch-all for everything else
#[derive(Debug, Clone)]
pub struct ObjectType {
    id: ObjectId,
    properties: Vec<PropertyDescriptor>,
    additional: AdditionalProperties,
}

/// A declared property, with the name used on the wire and the name used internally
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub external_name: String,
    pub internal_name: String,
    pub typ: TypeDescription,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Undefined => "undefined",
            PrimitiveKind::Any => "any",
        }
    }
}

impl ObjectType {
    pub fn new(properties: Vec<PropertyDescriptor>, additional: AdditionalProperties) -> Self {
        Self {
            id: ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)),
            properties,
            additional,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn additional(&self) -> &AdditionalProperties {
        &self.additional
    }
}

// Identity does not take part in equality: two objects with the same shape are equal.
impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties && self.additional == other.additional
    }
}

impl PropertyDescriptor {
    pub fn new(
        external_name: impl Into<String>,
        internal_name: impl Into<String>,
        typ: TypeDescription,
    ) -> Self {
        Self {
            external_name: external_name.into(),
            internal_name: internal_name.into(),
            typ,
        }
    }

    /// A property whose external and internal names are identical
    pub fn same(name: impl Into<String>, typ: TypeDescription) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, typ)
    }
}

impl TypeDescription {
    pub fn boolean() -> Self {
        TypeDescription::Primitive(PrimitiveKind::Boolean)
    }

    pub fn number() -> Self {
        TypeDescription::Primitive(PrimitiveKind::Number)
    }

    pub fn string() -> Self {
        TypeDescription::Primitive(PrimitiveKind::String)
    }

    pub fn null() -> Self {
        TypeDescription::Primitive(PrimitiveKind::Null)
    }

    pub fn undefined() -> Self {
        TypeDescription::Primitive(PrimitiveKind::Undefined)
    }

    pub fn any() -> Self {
        TypeDescription::Primitive(PrimitiveKind::Any)
    }

    pub fn date() -> Self {
        TypeDescription::Date
    }

    pub fn never() -> Self {
        TypeDescription::Never
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        TypeDescription::Literal(value.into())
    }

    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDescription::Enum(members.into_iter().map(Into::into).collect())
    }

    pub fn array_of(element: TypeDescription) -> Self {
        TypeDescription::ArrayOf(Box::new(element))
    }

    pub fn union_of(members: Vec<TypeDescription>) -> Self {
        TypeDescription::UnionOf(members)
    }

    /// `T` or a missing key
    pub fn optional(typ: TypeDescription) -> Self {
        TypeDescription::UnionOf(vec![TypeDescription::undefined(), typ])
    }

    /// Object with declared properties. `additional` of `None` is the `false` flag.
    pub fn object(properties: Vec<PropertyDescriptor>, additional: Option<TypeDescription>) -> Self {
        let additional = match additional {
            Some(typ) => AdditionalProperties::Allowed(Box::new(typ)),
            None => AdditionalProperties::Forbidden,
        };
        TypeDescription::ObjectOf(ObjectType::new(properties, additional))
    }

    /// Object with no declared properties whose every value matches `additional`
    pub fn map(additional: TypeDescription) -> Self {
        Self::object(Vec::new(), Some(additional))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        TypeDescription::Reference(name.into())
    }

    /// Human-readable rendering used in validation messages
    pub fn pretty_name(&self) -> String {
        match self {
            TypeDescription::Primitive(kind) => kind.name().to_string(),
            TypeDescription::Literal(Value::String(s)) => s.clone(),
            TypeDescription::Literal(other) => other.to_string(),
            TypeDescription::Enum(members) => format!("one of [{}]", members.join(", ")),
            TypeDescription::ArrayOf(element) => format!("array of {}", element.pretty_name()),
            TypeDescription::UnionOf(members) => match members.as_slice() {
                [TypeDescription::Primitive(PrimitiveKind::Undefined), inner] => {
                    format!("an optional {}", inner.pretty_name())
                }
                _ => {
                    let names: Vec<String> = members.iter().map(|m| m.pretty_name()).collect();
                    format!("one of [{}]", names.join(", "))
                }
            },
            TypeDescription::ObjectOf(_) => "object".to_string(),
            TypeDescription::Reference(name) => name.clone(),
            TypeDescription::Date => "Date".to_string(),
            TypeDescription::Never => "nothing".to_string(),
        }
    }

    /// Visit every reference name reachable without resolving references
    pub fn for_each_reference<'a>(&'a self, visit: &mut dyn FnMut(&'a str)) {
        match self {
            TypeDescription::Reference(name) => visit(name.as_str()),
            TypeDescription::ArrayOf(element) => element.for_each_reference(visit),
            TypeDescription::UnionOf(members) => {
                for member in members {
                    member.for_each_reference(visit);
                }
            }
            TypeDescription::ObjectOf(object) => {
                for property in object.properties() {
                    property.typ.for_each_reference(visit);
                }
                if let AdditionalProperties::Allowed(typ) = object.additional() {
                    typ.for_each_reference(visit);
                }
            }
            TypeDescription::Primitive(_)
            | TypeDescription::Literal(_)
            | TypeDescription::Enum(_)
            | TypeDescription::Date
            | TypeDescription::Never => {}
        }
    }

    /// Visit every object description nested inside this one, itself included
    pub fn for_each_object<'a>(&'a self, visit: &mut dyn FnMut(&'a ObjectType)) {
        match self {
            TypeDescription::ArrayOf(element) => element.for_each_object(visit),
            TypeDescription::UnionOf(members) => {
                for member in members {
                    member.for_each_object(visit);
                }
            }
            TypeDescription::ObjectOf(object) => {
                visit(object);
                for property in object.properties() {
                    property.typ.for_each_object(visit);
                }
                if let AdditionalProperties::Allowed(typ) = object.additional() {
                    typ.for_each_object(visit);
                }
            }
            TypeDescription::Primitive(_)
            | TypeDescription::Literal(_)
            | TypeDescription::Enum(_)
            | TypeDescription::Reference(_)
            | TypeDescription::Date
            | TypeDescription::Never => {}
        }
    }
}

impl fmt::Display for TypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_builds_union_with_undefined_first() {
        let typ = TypeDescription::optional(TypeDescription::number());
        match typ {
            TypeDescription::UnionOf(members) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0], TypeDescription::undefined());
                assert_eq!(members[1], TypeDescription::number());
            }
            other => panic!("expected a union, got {:?}", other),
        }
    }

    #[test]
    fn test_property_descriptor_same_name() {
        let prop = PropertyDescriptor::same("roastName", TypeDescription::string());
        assert_eq!(prop.external_name, "roastName");
        assert_eq!(prop.internal_name, "roastName");
    }

    #[test]
    fn test_object_ids_are_unique() {
        let a = ObjectType::new(Vec::new(), AdditionalProperties::Forbidden);
        let b = ObjectType::new(Vec::new(), AdditionalProperties::Forbidden);
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_pretty_names() {
        assert_eq!(TypeDescription::number().pretty_name(), "number");
        assert_eq!(TypeDescription::literal("array").pretty_name(), "array");
        assert_eq!(TypeDescription::literal(json!(3)).pretty_name(), "3");
        assert_eq!(
            TypeDescription::enumeration(["roasts", "_doc"]).pretty_name(),
            "one of [roasts, _doc]"
        );
        assert_eq!(
            TypeDescription::optional(TypeDescription::array_of(TypeDescription::number()))
                .pretty_name(),
            "an optional array of number"
        );
        assert_eq!(
            TypeDescription::union_of(vec![TypeDescription::number(), TypeDescription::null()])
                .pretty_name(),
            "one of [number, null]"
        );
        assert_eq!(TypeDescription::reference("Hit").pretty_name(), "Hit");
        assert_eq!(TypeDescription::date().to_string(), "Date");
    }

    #[test]
    fn test_for_each_reference_walks_nested_types() {
        let typ = TypeDescription::object(
            vec![
                PropertyDescriptor::same(
                    "hits",
                    TypeDescription::optional(TypeDescription::array_of(
                        TypeDescription::reference("Hit"),
                    )),
                ),
                PropertyDescriptor::same("total", TypeDescription::reference("Total")),
            ],
            Some(TypeDescription::reference("Extra")),
        );

        let mut names = Vec::new();
        typ.for_each_reference(&mut |name| names.push(name.to_string()));
        assert_eq!(names, vec!["Hit", "Total", "Extra"]);
    }

    #[test]
    fn test_for_each_object_includes_nested_objects() {
        let inner = TypeDescription::object(
            vec![PropertyDescriptor::same("url", TypeDescription::string())],
            None,
        );
        let typ = TypeDescription::object(
            vec![PropertyDescriptor::same(
                "sources",
                TypeDescription::optional(TypeDescription::array_of(inner)),
            )],
            Some(TypeDescription::map(TypeDescription::number())),
        );

        let mut ids = Vec::new();
        typ.for_each_object(&mut |object| ids.push(object.id()));
        assert_eq!(ids.len(), 3);
        ids.dedup();
        assert_eq!(ids.len(), 3);

        let mut count = 0;
        TypeDescription::reference("Hit").for_each_object(&mut |_| count += 1);
        assert_eq!(count, 0);
    }
}
