//! Per-kind entity collections with a schema registry.

use crate::error::{GraphError, Result};
use crate::types::{Attributes, Entity, EntityRef, KindSchema};
use std::collections::HashMap;

/// Entities of a single kind plus the schema they were validated against.
#[derive(Debug, Clone)]
struct KindCollection {
    schema: KindSchema,
    /// Always sorted by id, which is also creation order
    entities: Vec<Entity>,
    next_id: u64,
}

impl KindCollection {
    fn new(schema: KindSchema) -> Self {
        Self {
            schema,
            entities: Vec::new(),
            next_id: 1,
        }
    }

    fn find(&self, id: u64) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|idx| &self.entities[idx])
    }
}

/// Owns every entity, grouped by kind.
///
/// Ids are unique within a kind only, so an entity is always addressed by
/// its [`EntityRef`].
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    kinds: HashMap<String, KindCollection>,
    /// Kind names in registration order
    order: Vec<String>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a kind and its attribute schema.
    ///
    /// Registering the same kind again with an identical schema is a no-op.
    pub fn register_kind(&mut self, kind: &str, schema: KindSchema) -> Result<()> {
        if let Some(existing) = self.kinds.get(kind) {
            if existing.schema == schema {
                return Ok(());
            }
            return Err(GraphError::Schema {
                kind: kind.to_string(),
            });
        }

        self.kinds.insert(kind.to_string(), KindCollection::new(schema));
        self.order.push(kind.to_string());
        Ok(())
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names, in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// The attribute schema of a registered kind.
    pub fn schema(&self, kind: &str) -> Result<&KindSchema> {
        self.collection(kind).map(|c| &c.schema)
    }

    /// Create an entity and return its reference.
    pub fn create(
        &mut self,
        kind: &str,
        name: &str,
        cultural_context: &str,
        definition: &str,
        attributes: Attributes,
    ) -> Result<EntityRef> {
        let entity = self.stage(kind, name, cultural_context, definition, attributes)?;
        let reference = entity.reference();
        self.commit(entity);
        Ok(reference)
    }

    /// Validate a new entity and assign its id without storing it.
    pub(crate) fn stage(
        &self,
        kind: &str,
        name: &str,
        cultural_context: &str,
        definition: &str,
        attributes: Attributes,
    ) -> Result<Entity> {
        let collection = self.collection(kind)?;

        if name.trim().is_empty() {
            return Err(GraphError::attribute(kind, "name cannot be empty"));
        }
        collection.schema.validate(kind, &attributes)?;

        Ok(Entity {
            kind: kind.to_string(),
            id: collection.next_id,
            name: name.to_string(),
            cultural_context: cultural_context.to_string(),
            definition: definition.to_string(),
            attributes,
        })
    }

    /// Store an already validated entity, keeping its id.
    ///
    /// Entities must arrive in increasing id order within their kind.
    pub(crate) fn commit(&mut self, entity: Entity) {
        if let Some(collection) = self.kinds.get_mut(&entity.kind) {
            collection.next_id = collection.next_id.max(entity.id + 1);
            collection.entities.push(entity);
        }
    }

    /// Resolve a reference to its entity.
    pub fn get(&self, reference: &EntityRef) -> Result<&Entity> {
        self.collection(&reference.kind)?
            .find(reference.id)
            .ok_or_else(|| GraphError::NotFound(reference.to_string()))
    }

    /// All entities of a kind, in creation order.
    ///
    /// The iterator is cloneable, so it can be restarted from the beginning.
    pub fn list(&self, kind: &str) -> Result<std::slice::Iter<'_, Entity>> {
        self.collection(kind).map(|c| c.entities.iter())
    }

    pub fn exists(&self, reference: &EntityRef) -> bool {
        self.kinds
            .get(&reference.kind)
            .is_some_and(|c| c.find(reference.id).is_some())
    }

    /// Total number of entities across all kinds.
    pub fn len(&self) -> usize {
        self.kinds.values().map(|c| c.entities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collection(&self, kind: &str) -> Result<&KindCollection> {
        self.kinds
            .get(kind)
            .ok_or_else(|| GraphError::UnknownKind(kind.to_string()))
    }
}
