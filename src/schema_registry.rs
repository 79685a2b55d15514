use std::collections::{HashMap, HashSet};
use log::debug;
use thiserror::Error;
use crate::type_description::{ObjectId, TypeDescription};

/// Immutable mapping from type name to type description
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescription>,
    /// Every object description reachable from a registered type
    objects: HashSet<ObjectId>,
}

/// Collects named types and checks them before handing out a registry
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    types: HashMap<String, TypeDescription>,
    duplicates: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Type {referenced_from} references unknown type {reference}")]
    UnresolvedReference {
        reference: String,
        referenced_from: String,
    },

    #[error("Type registered more than once: {0}")]
    DuplicateType(String),
}

impl TypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a named type
    pub fn get(&self, name: &str) -> Option<&TypeDescription> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether `id` names an object description held by this registry
    pub fn owns_object(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl RegistryBuilder {
    /// Register a named type
    pub fn add_type(mut self, name: impl Into<String>, typ: TypeDescription) -> Self {
        let name = name.into();
        if self.types.insert(name.clone(), typ).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Seal the registry. Every reference must resolve to a registered name.
    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateType(name));
        }

        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort_unstable();
        for name in names {
            let mut missing = None;
            self.types[name].for_each_reference(&mut |reference| {
                if missing.is_none() && !self.types.contains_key(reference) {
                    missing = Some(reference.to_string());
                }
            });
            if let Some(reference) = missing {
                return Err(RegistryError::UnresolvedReference {
                    reference,
                    referenced_from: name.clone(),
                });
            }
        }

        let mut objects = HashSet::new();
        for typ in self.types.values() {
            typ.for_each_object(&mut |object| {
                objects.insert(object.id());
            });
        }

        debug!(
            "Built type registry with {} types and {} object descriptions",
            self.types.len(),
            objects.len()
        );
        Ok(TypeRegistry {
            types: self.types,
            objects,
        })
    }
}
