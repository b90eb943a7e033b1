use crate::schema::{Reference, Schema};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;

/// Registry of named component schemas for one document generation pass
///
/// Names are unique: the first registrant keeps the proposed name, later ones get a numeric
/// suffix (`Foo`, `Foo1`, `Foo2`, ...). References already handed out are remembered by type
/// identity and by type name so the same type always resolves to the same reference.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    /// Component schemas; `None` marks a reserved entry still being built
    schemas: IndexMap<String, Option<Schema>>,
    by_identity: HashMap<String, Reference>,
    by_name: HashMap<String, Reference>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a schema under a collision-free name derived from `proposed_name`
    pub fn register(&mut self, schema: Schema, proposed_name: &str) -> Reference {
        let name = self.unique_name(proposed_name);
        debug!("Registering schema {}", name);
        self.schemas.insert(name.clone(), Some(schema));
        Reference::to_schema(&name)
    }

    /// Claim a name before the schema is known, so that recursive uses can refer to it
    pub fn reserve(&mut self, proposed_name: &str) -> Reference {
        let name = self.unique_name(proposed_name);
        debug!("Reserving schema name {}", name);
        self.schemas.insert(name.clone(), None);
        Reference::to_schema(&name)
    }

    /// Fill a reserved entry
    pub fn complete(&mut self, reference: &Reference, schema: Schema) {
        match self.schemas.get_mut(reference.schema_name()) {
            Some(slot) if slot.is_none() => *slot = Some(schema),
            Some(_) => debug!(
                "Schema {} is already complete, keeping the first definition",
                reference.schema_name()
            ),
            None => {
                self.schemas
                    .insert(reference.schema_name().to_string(), Some(schema));
            }
        }
    }

    /// Remember the reference of a type by identity and by type name
    pub fn remember(&mut self, identity: Option<&str>, type_name: &str, reference: &Reference) {
        if let Some(identity) = identity {
            self.by_identity
                .insert(identity.to_string(), reference.clone());
        }
        self.by_name.insert(type_name.to_string(), reference.clone());
    }

    /// Reference previously remembered for a type identity or, failing that, a type name
    pub fn lookup(&self, identity: Option<&str>, type_name: Option<&str>) -> Option<Reference> {
        identity
            .and_then(|identity| self.by_identity.get(identity))
            .or_else(|| type_name.and_then(|name| self.by_name.get(name)))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Schema registered under `name`, if complete
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name).and_then(Option::as_ref)
    }

    /// Registered schemas in registration order
    pub fn schemas(&self) -> IndexMap<String, Schema> {
        self.schemas
            .iter()
            .map(|(name, schema)| (name.clone(), schema.clone().unwrap_or_default()))
            .collect()
    }

    pub fn into_schemas(self) -> IndexMap<String, Schema> {
        self.schemas
            .into_iter()
            .map(|(name, schema)| (name, schema.unwrap_or_default()))
            .collect()
    }

    fn unique_name(&self, proposed_name: &str) -> String {
        if !self.schemas.contains_key(proposed_name) {
            return proposed_name.to_string();
        }
        let mut counter = 0;
        loop {
            counter += 1;
            let candidate = format!("{}{}", proposed_name, counter);
            if !self.schemas.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;

    #[test]
    fn test_collisions_get_numeric_suffixes() {
        let mut registry = ReferenceRegistry::new();
        let first = registry.register(Schema::of_type(SchemaType::Object), "Foo");
        let second = registry.register(Schema::of_type(SchemaType::String), "Foo");
        let third = registry.register(Schema::of_type(SchemaType::Integer), "Foo");

        assert_eq!(first.schema_name(), "Foo");
        assert_eq!(second.schema_name(), "Foo1");
        assert_eq!(third.schema_name(), "Foo2");

        let names: Vec<String> = registry.schemas().keys().cloned().collect();
        assert_eq!(names, vec!["Foo", "Foo1", "Foo2"]);
    }

    #[test]
    fn test_reserve_then_complete() {
        let mut registry = ReferenceRegistry::new();
        let reference = registry.reserve("Node");
        assert!(registry.contains("Node"));
        assert!(registry.get("Node").is_none());

        registry.complete(&reference, Schema::of_type(SchemaType::Object));
        assert_eq!(
            registry.get("Node").unwrap().schema_type,
            Some(SchemaType::Object)
        );
    }

    #[test]
    fn test_complete_is_write_once() {
        let mut registry = ReferenceRegistry::new();
        let reference = registry.register(Schema::of_type(SchemaType::Object), "User");
        registry.complete(&reference, Schema::of_type(SchemaType::String));
        assert_eq!(
            registry.get("User").unwrap().schema_type,
            Some(SchemaType::Object)
        );
    }

    #[test]
    fn test_lookup_by_identity_then_name() {
        let mut registry = ReferenceRegistry::new();
        let reference = registry.register(Schema::default(), "PageOfUser");
        registry.remember(Some("shop::Page<shop::User>"), "PageOfUser", &reference);

        assert_eq!(
            registry.lookup(Some("shop::Page<shop::User>"), None),
            Some(reference.clone())
        );
        assert_eq!(
            registry.lookup(Some("other"), Some("PageOfUser")),
            Some(reference)
        );
        assert!(registry.lookup(Some("other"), None).is_none());
    }

    #[test]
    fn test_pending_entries_export_as_empty_schemas() {
        let mut registry = ReferenceRegistry::new();
        registry.reserve("Pending");
        let schemas = registry.into_schemas();
        assert!(schemas["Pending"].is_unconstrained());
    }
}
