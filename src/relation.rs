//! Polymorphic relation graph with forward and reverse adjacency indices.

use crate::entity::EntityStore;
use crate::error::{GraphError, Result};
use crate::types::{EntityRef, NewRelation, Relation, check_unit_range};
use chrono::Utc;
use std::collections::HashMap;

/// Owns all relations between entities.
///
/// Relations are stored in insertion order. The indices map an entity to
/// the positions of the relations it is the source or target of, so every
/// per-entity lookup avoids a full scan.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    relations: Vec<Relation>,
    forward: HashMap<EntityRef, Vec<usize>>,
    reverse: HashMap<EntityRef, Vec<usize>>,
    next_id: u64,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Validate and add a relation. Both endpoints must already exist.
    ///
    /// Several relations may share the same source, target and type.
    pub fn add(&mut self, store: &EntityStore, relation: NewRelation) -> Result<&Relation> {
        let relation = self.stage(store, relation)?;
        Ok(self.commit(relation))
    }

    /// Validate a relation and assign its id without storing it.
    pub(crate) fn stage(&self, store: &EntityStore, new: NewRelation) -> Result<Relation> {
        check_endpoint(store, &new.source)?;
        check_endpoint(store, &new.target)?;
        check_unit_range("strength", new.strength)?;

        Ok(Relation {
            id: self.next_id.max(1),
            source: new.source,
            target: new.target,
            relation_type: new.relation_type,
            strength: new.strength,
            cultural_specificity: new.cultural_specificity,
            logical_necessity: new.logical_necessity,
            temporal_stability: new.temporal_stability,
            created_at: Utc::now(),
        })
    }

    /// Store a validated relation, keeping its id.
    pub(crate) fn commit(&mut self, relation: Relation) -> &Relation {
        let idx = self.relations.len();
        self.next_id = self.next_id.max(relation.id + 1);
        self.forward.entry(relation.source.clone()).or_default().push(idx);
        self.reverse.entry(relation.target.clone()).or_default().push(idx);
        self.relations.push(relation);
        &self.relations[idx]
    }

    /// Relations whose source is `reference`, in insertion order.
    pub fn relations_from(&self, reference: &EntityRef) -> impl Iterator<Item = &Relation> + Clone {
        self.indexed(&self.forward, reference)
    }

    /// Relations whose target is `reference`, in insertion order.
    pub fn relations_to(&self, reference: &EntityRef) -> impl Iterator<Item = &Relation> + Clone {
        self.indexed(&self.reverse, reference)
    }

    /// Relations connecting kinds `a` and `b` in either direction.
    pub fn relations_between_kinds<'g>(
        &'g self,
        a: &str,
        b: &str,
    ) -> impl Iterator<Item = &'g Relation> + Clone {
        self.relations.iter().filter(move |r| {
            let (s, t) = (r.source.kind.as_str(), r.target.kind.as_str());
            (s == a && t == b) || (s == b && t == a)
        })
    }

    /// Every relation, in insertion order.
    pub fn all(&self) -> std::slice::Iter<'_, Relation> {
        self.relations.iter()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    fn indexed<'a>(
        &'a self,
        index: &'a HashMap<EntityRef, Vec<usize>>,
        reference: &EntityRef,
    ) -> impl Iterator<Item = &'a Relation> + Clone {
        index
            .get(reference)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&idx| &self.relations[idx])
    }
}

fn check_endpoint(store: &EntityStore, reference: &EntityRef) -> Result<()> {
    if !store.is_registered(&reference.kind) {
        return Err(GraphError::UnknownKind(reference.kind.clone()));
    }
    if !store.exists(reference) {
        return Err(GraphError::ReferentialIntegrity(reference.to_string()));
    }
    Ok(())
}
