//! High-level knowledge base API.
//!
//! [`KnowledgeBase`] keeps the in-memory model and the SQLite storage in
//! step. Each mutation is validated first, written in a transaction, and
//! only then applied in memory, so a rejected call changes nothing.

use crate::annotations::{Annotations, Contradiction, CulturalInterpretation, NewContradiction, NewInterpretation};
use crate::catalog;
use crate::entity::EntityStore;
use crate::error::GraphError;
use crate::query::QueryEngine;
use crate::relation::RelationGraph;
use crate::storage::Storage;
use crate::types::{
    AttrValue, Attributes, Entity, EntityRef, KindSchema, NewRelation, Relation, RelationRecord, check_unit_range,
};
use eyre::{Context, Result};
use std::path::Path;

/// Base fields every entity carries, as they appear in loose field maps.
const BASE_FIELDS: [&str; 3] = ["name", "cultural_context", "definition"];

/// The main knowledge base.
pub struct KnowledgeBase {
    entities: EntityStore,
    relations: RelationGraph,
    annotations: Annotations,
    storage: Storage,
}

impl KnowledgeBase {
    /// Initialize a new knowledge base in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let storage = Storage::init(root)?;
        Self::load(storage)
    }

    /// Open an existing knowledge base.
    pub fn open(root: &Path) -> Result<Self> {
        let storage = Storage::open(root)?;
        Self::load(storage)
    }

    /// A knowledge base backed by an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let storage = Storage::in_memory()?;
        Self::load(storage)
    }

    /// Rebuild the in-memory model from storage.
    ///
    /// Rows that no longer satisfy the model's invariants are logged and
    /// skipped.
    fn load(storage: Storage) -> Result<Self> {
        let mut entities = EntityStore::new();
        for (kind, schema) in storage.load_kinds()? {
            entities
                .register_kind(&kind, schema)
                .with_context(|| format!("Stored schema for '{}' is inconsistent", kind))?;
        }

        for entity in storage.load_entities()? {
            if !entities.is_registered(&entity.kind) {
                log::warn!("Skipping entity {}: kind is not registered", entity.reference());
                continue;
            }
            entities.commit(entity);
        }

        let mut relations = RelationGraph::new();
        for relation in storage.load_relations()? {
            let dangling = [&relation.source, &relation.target]
                .into_iter()
                .find(|r| !entities.exists(r));
            if let Some(missing) = dangling {
                log::warn!("Skipping relation {}: endpoint {} does not exist", relation.id, missing);
                continue;
            }
            if let Err(e) = check_unit_range("strength", relation.strength) {
                log::warn!("Skipping relation {}: {}", relation.id, e);
                continue;
            }
            relations.commit(relation);
        }

        let mut annotations = Annotations::new();
        for c in storage.load_contradictions()? {
            if entities.exists(&c.first) && entities.exists(&c.second) {
                annotations.commit_contradiction(c);
            } else {
                log::warn!("Skipping contradiction {}: endpoint does not exist", c.id);
            }
        }
        for i in storage.load_interpretations()? {
            if entities.exists(&i.base) {
                annotations.commit_interpretation(i);
            } else {
                log::warn!("Skipping interpretation {}: {} does not exist", i.id, i.base);
            }
        }

        log::debug!(
            "Loaded {} entities, {} relations, {} contradictions, {} interpretations",
            entities.len(),
            relations.len(),
            annotations.contradictions().len(),
            annotations.interpretations().len()
        );

        Ok(Self {
            entities,
            relations,
            annotations,
            storage,
        })
    }

    /// Register a kind. Re-registering an identical schema is a no-op.
    pub fn register_kind(&mut self, kind: &str, schema: KindSchema) -> Result<()> {
        if self.entities.is_registered(kind) {
            self.entities.register_kind(kind, schema)?;
            return Ok(());
        }

        self.storage
            .insert_kind(kind, &schema)
            .context("Failed to persist kind")?;
        self.entities.register_kind(kind, schema)?;

        log::debug!("Registered kind '{}'", kind);
        Ok(())
    }

    /// Register all built-in concept kinds.
    pub fn register_builtin_kinds(&mut self) -> Result<()> {
        for kind in catalog::BUILTIN_KINDS {
            if let Some(schema) = catalog::builtin_schema(kind) {
                self.register_kind(kind, schema)?;
            }
        }
        Ok(())
    }

    /// Create a new entity.
    pub fn create(
        &mut self,
        kind: &str,
        name: &str,
        cultural_context: &str,
        definition: &str,
        attributes: Attributes,
    ) -> Result<EntityRef> {
        let entity = self
            .entities
            .stage(kind, name, cultural_context, definition, attributes)?;

        self.storage
            .insert_entity(&entity)
            .context("Failed to persist entity")?;

        let reference = entity.reference();
        log::debug!("Created entity {} ({})", reference, entity.name);
        self.entities.commit(entity);

        Ok(reference)
    }

    /// Create an entity from an untyped field map.
    ///
    /// `name`, `cultural_context` and `definition` are taken from the map;
    /// other keys are kept only when the kind's schema declares them.
    /// Unknown keys are dropped.
    pub fn insert_fields(
        &mut self,
        kind: &str,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<EntityRef> {
        let schema = self.entities.schema(kind)?;

        let mut attributes = Attributes::new();
        let mut used = 0;
        for (key, value) in fields {
            if BASE_FIELDS.contains(&key.as_str()) {
                used += 1;
                continue;
            }
            if schema.field(key).is_none() {
                log::debug!("Ignoring field '{}' not declared by kind '{}'", key, kind);
                continue;
            }
            let value = AttrValue::from_json(value).ok_or_else(|| {
                GraphError::attribute(kind, format!("attribute '{}' has no scalar value", key))
            })?;
            attributes.insert(key.clone(), value);
            used += 1;
        }

        if used == 0 {
            return Err(GraphError::attribute(kind, "no usable fields were provided").into());
        }

        let text = |key: &str| fields.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let (name, culture, definition) = (text("name"), text("cultural_context"), text("definition"));

        self.create(kind, &name, &culture, &definition, attributes)
    }

    /// Get an entity by reference.
    pub fn get(&self, reference: &EntityRef) -> Result<&Entity> {
        Ok(self.entities.get(reference)?)
    }

    /// Add a relation between two existing entities.
    pub fn add_relation(&mut self, relation: NewRelation) -> Result<Relation> {
        let relation = self.relations.stage(&self.entities, relation)?;

        self.storage
            .insert_relation(&relation)
            .context("Failed to persist relation")?;

        log::debug!(
            "Added relation {}: {} --{}--> {}",
            relation.id,
            relation.source,
            relation.relation_type,
            relation.target
        );
        Ok(self.relations.commit(relation).clone())
    }

    /// Add a relation from an untyped record.
    pub fn add_relation_record(&mut self, record: RelationRecord) -> Result<Relation> {
        let relation = NewRelation::try_from(record)?;
        self.add_relation(relation)
    }

    /// Record a contradiction between two entities.
    pub fn add_contradiction(&mut self, new: NewContradiction) -> Result<Contradiction> {
        let contradiction = self.annotations.stage_contradiction(&self.entities, new)?;
        self.storage
            .insert_contradiction(&contradiction)
            .context("Failed to persist contradiction")?;
        self.annotations.commit_contradiction(contradiction.clone());
        Ok(contradiction)
    }

    /// Record a culture's interpretation of an entity.
    pub fn add_interpretation(&mut self, new: NewInterpretation) -> Result<CulturalInterpretation> {
        let interpretation = self.annotations.stage_interpretation(&self.entities, new)?;
        self.storage
            .insert_interpretation(&interpretation)
            .context("Failed to persist interpretation")?;
        self.annotations.commit_interpretation(interpretation.clone());
        Ok(interpretation)
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Analytical queries over the current state.
    pub fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.entities, &self.relations)
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }
}
