//! Analytical queries over the entity store and relation graph.
//!
//! Every query is a pure read. Given the same store and graph state each
//! one returns the same rows in the same order, ties included.

use crate::entity::EntityStore;
use crate::error::{GraphError, Result};
use crate::relation::RelationGraph;
use crate::types::{AttrType, Entity, EntityRef, LogicalNecessity, Relation};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default number of rows in the strongest-relations ranking.
pub const DEFAULT_STRONGEST_LIMIT: usize = 10;

/// Parameters of an independence query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndependenceQuery {
    pub candidate_kinds: Vec<String>,
    pub excluded_source_kind: String,
    pub excluded_relation_types: Vec<String>,
}

impl IndependenceQuery {
    /// Exclude targets of relations coming from `excluded_source_kind`.
    pub fn new(excluded_source_kind: impl Into<String>) -> Self {
        Self {
            candidate_kinds: Vec::new(),
            excluded_source_kind: excluded_source_kind.into(),
            excluded_relation_types: Vec::new(),
        }
    }

    /// Add a kind whose entities are checked.
    pub fn candidate(mut self, kind: impl Into<String>) -> Self {
        self.candidate_kinds.push(kind.into());
        self
    }

    pub fn candidates(mut self, kinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.candidate_kinds.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Relation types that make a target dependent.
    pub fn excluding(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_relation_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Concepts that no divine entity creates, generates or causes.
    pub fn divine_creation() -> Self {
        Self::new("divine")
            .candidates(["existence", "nothingness", "dao", "consciousness"])
            .excluding(["creates", "generates", "causes"])
    }
}

/// Parameters of a paradox query.
#[derive(Debug, Clone, PartialEq)]
pub struct ParadoxQuery {
    pub pivot_kind: String,
    pub threshold_attribute: String,
    pub min_threshold: i64,
    /// When set, only relations whose other endpoint has this kind count
    pub counterpart_kind: Option<String>,
}

impl ParadoxQuery {
    pub fn new(pivot_kind: impl Into<String>, threshold_attribute: impl Into<String>, min_threshold: i64) -> Self {
        Self {
            pivot_kind: pivot_kind.into(),
            threshold_attribute: threshold_attribute.into(),
            min_threshold,
            counterpart_kind: None,
        }
    }

    pub fn counterpart(mut self, kind: impl Into<String>) -> Self {
        self.counterpart_kind = Some(kind.into());
        self
    }

    /// High-tension links between nothingness and existence concepts.
    pub fn nothingness_existence(min_threshold: i64) -> Self {
        Self::new("nothingness", "paradox_level", min_threshold).counterpart("existence")
    }
}

/// Options for network analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkOptions {
    /// Length of the strongest-relations ranking
    pub top_n: usize,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_STRONGEST_LIMIT,
        }
    }
}

/// A relation between two kinds with both endpoints resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossKindRow<'a> {
    pub relation_id: u64,
    pub source: &'a Entity,
    pub target: &'a Entity,
    pub relation_type: &'a str,
    pub strength: f64,
}

impl<'a> CrossKindRow<'a> {
    /// The endpoint belonging to `kind`, preferring the source.
    pub fn endpoint(&self, kind: &str) -> Option<&'a Entity> {
        if self.source.kind == kind {
            Some(self.source)
        } else if self.target.kind == kind {
            Some(self.target)
        } else {
            None
        }
    }
}

/// Entities of one candidate kind that survived the exclusion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndependentEntities<'a> {
    pub kind: String,
    pub entities: Vec<&'a Entity>,
}

/// One relation touching a pivot entity above the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParadoxRow<'a> {
    pub relation_id: u64,
    pub counterpart: &'a Entity,
    pub pivot: &'a Entity,
    pub relation_type: &'a str,
    pub strength: f64,
    pub threshold_value: i64,
    pub logical_necessity: LogicalNecessity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubRank {
    pub kind: String,
    pub connection_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrongRelation {
    pub relation_id: u64,
    pub source_kind: String,
    pub target_kind: String,
    pub relation_type: String,
    pub strength: f64,
    pub cultural_specificity: Option<String>,
    pub logical_necessity: LogicalNecessity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CulturalGroup {
    pub culture: String,
    pub count: usize,
    pub mean_strength: f64,
}

/// Result of [`QueryEngine::network_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkAnalysis {
    pub hub_ranking: Vec<HubRank>,
    pub strongest_relations: Vec<StrongRelation>,
    pub cultural_analysis: Vec<CulturalGroup>,
}

/// Read-only view over a store and graph that runs the analytical queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    entities: &'a EntityStore,
    relations: &'a RelationGraph,
}

impl<'a> QueryEngine<'a> {
    pub fn new(entities: &'a EntityStore, relations: &'a RelationGraph) -> Self {
        Self { entities, relations }
    }

    /// Every relation between kinds `a` and `b`, in either direction.
    ///
    /// Sorted by strength descending; equal strengths keep insertion order.
    pub fn cross_kind_relations(&self, a: &str, b: &str) -> Result<Vec<CrossKindRow<'a>>> {
        self.require_kind(a)?;
        self.require_kind(b)?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for relation in self.relations.relations_between_kinds(a, b) {
            if !seen.insert(relation.id) {
                continue;
            }
            rows.push(CrossKindRow {
                relation_id: relation.id,
                source: self.entities.get(&relation.source)?,
                target: self.entities.get(&relation.target)?,
                relation_type: &relation.relation_type,
                strength: relation.strength,
            });
        }

        rows.sort_by(|x, y| y.strength.total_cmp(&x.strength));
        Ok(rows)
    }

    /// Entities of each candidate kind that are not the target of an
    /// excluded relation from the excluded source kind.
    ///
    /// Results follow the order of `candidate_kinds`; entities keep
    /// creation order.
    pub fn independence(&self, query: &IndependenceQuery) -> Result<Vec<IndependentEntities<'a>>> {
        self.require_kind(&query.excluded_source_kind)?;
        for kind in &query.candidate_kinds {
            self.require_kind(kind)?;
        }

        let excluded = self.excluded_targets(query)?;

        let mut results = Vec::with_capacity(query.candidate_kinds.len());
        for kind in &query.candidate_kinds {
            let entities = self
                .entities
                .list(kind)?
                .filter(|e| !excluded.contains(&e.reference()))
                .collect();
            results.push(IndependentEntities {
                kind: kind.clone(),
                entities,
            });
        }
        Ok(results)
    }

    /// Relations touching a pivot entity whose integer threshold attribute
    /// is at least `min_threshold`, one row per relation.
    ///
    /// Rows are ordered by threshold value, then strength, both descending,
    /// then by insertion order. When both endpoints qualify as pivots the
    /// source is used.
    pub fn paradoxes(&self, query: &ParadoxQuery) -> Result<Vec<ParadoxRow<'a>>> {
        let schema = self.entities.schema(&query.pivot_kind)?;
        match schema.field(&query.threshold_attribute) {
            Some(field) if field.ty == AttrType::Integer => {}
            Some(field) => {
                return Err(GraphError::attribute(
                    &query.pivot_kind,
                    format!(
                        "threshold attribute '{}' is {}, not integer",
                        query.threshold_attribute, field.ty
                    ),
                ));
            }
            None => {
                return Err(GraphError::attribute(
                    &query.pivot_kind,
                    format!("undeclared attribute '{}'", query.threshold_attribute),
                ));
            }
        }
        if let Some(kind) = &query.counterpart_kind {
            self.require_kind(kind)?;
        }

        let mut pivots: HashMap<EntityRef, (&'a Entity, i64)> = HashMap::new();
        for entity in self.entities.list(&query.pivot_kind)? {
            let level = entity.attr(&query.threshold_attribute).and_then(|v| v.as_integer());
            if let Some(level) = level.filter(|&l| l >= query.min_threshold) {
                pivots.insert(entity.reference(), (entity, level));
            }
        }

        // Relation id order is insertion order
        let mut touching: BTreeMap<u64, &'a Relation> = BTreeMap::new();
        for entity in pivots.values().map(|(e, _)| *e) {
            let reference = entity.reference();
            for relation in self
                .relations
                .relations_from(&reference)
                .chain(self.relations.relations_to(&reference))
            {
                touching.insert(relation.id, relation);
            }
        }

        let mut rows = Vec::new();
        for relation in touching.into_values() {
            let Some((pivot, level, other)) = pivots
                .get(&relation.source)
                .map(|&(e, l)| (e, l, &relation.target))
                .or_else(|| pivots.get(&relation.target).map(|&(e, l)| (e, l, &relation.source)))
            else {
                continue;
            };

            if query.counterpart_kind.as_ref().is_some_and(|k| k != &other.kind) {
                continue;
            }

            rows.push(ParadoxRow {
                relation_id: relation.id,
                counterpart: self.entities.get(other)?,
                pivot,
                relation_type: &relation.relation_type,
                strength: relation.strength,
                threshold_value: level,
                logical_necessity: relation.logical_necessity,
            });
        }

        rows.sort_by(|x, y| {
            y.threshold_value
                .cmp(&x.threshold_value)
                .then_with(|| y.strength.total_cmp(&x.strength))
        });
        Ok(rows)
    }

    /// Hub ranking, strongest relations and cultural aggregation over the
    /// whole graph.
    pub fn network_analysis(&self, options: NetworkOptions) -> NetworkAnalysis {
        NetworkAnalysis {
            hub_ranking: self.hub_ranking(),
            strongest_relations: self.strongest_relations(options.top_n),
            cultural_analysis: self.cultural_analysis(),
        }
    }

    /// Relation counts per source kind, highest first.
    pub fn hub_ranking(&self) -> Vec<HubRank> {
        let mut ranks: Vec<HubRank> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for relation in self.relations.all() {
            let kind = relation.source.kind.as_str();
            match positions.get(kind) {
                Some(&idx) => ranks[idx].connection_count += 1,
                None => {
                    positions.insert(kind, ranks.len());
                    ranks.push(HubRank {
                        kind: kind.to_string(),
                        connection_count: 1,
                    });
                }
            }
        }

        ranks.sort_by(|a, b| b.connection_count.cmp(&a.connection_count));
        ranks
    }

    /// The `top_n` strongest relations.
    pub fn strongest_relations(&self, top_n: usize) -> Vec<StrongRelation> {
        let mut relations: Vec<&Relation> = self.relations.all().collect();
        relations.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        relations
            .into_iter()
            .take(top_n)
            .map(|r| StrongRelation {
                relation_id: r.id,
                source_kind: r.source.kind.clone(),
                target_kind: r.target.kind.clone(),
                relation_type: r.relation_type.clone(),
                strength: r.strength,
                cultural_specificity: r.cultural_specificity.clone(),
                logical_necessity: r.logical_necessity,
            })
            .collect()
    }

    /// Count and mean strength per cultural specificity, most common first.
    ///
    /// Relations without a cultural specificity are left out.
    pub fn cultural_analysis(&self) -> Vec<CulturalGroup> {
        let mut groups: Vec<(String, usize, f64)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for relation in self.relations.all() {
            let Some(culture) = relation.cultural_specificity.as_deref() else {
                continue;
            };
            match positions.get(culture) {
                Some(&idx) => {
                    groups[idx].1 += 1;
                    groups[idx].2 += relation.strength;
                }
                None => {
                    positions.insert(culture, groups.len());
                    groups.push((culture.to_string(), 1, relation.strength));
                }
            }
        }

        let mut groups: Vec<CulturalGroup> = groups
            .into_iter()
            .map(|(culture, count, total)| CulturalGroup {
                culture,
                count,
                mean_strength: total / count as f64,
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups
    }

    fn excluded_targets(&self, query: &IndependenceQuery) -> Result<HashSet<EntityRef>> {
        let mut excluded = HashSet::new();
        if query.excluded_relation_types.is_empty() {
            return Ok(excluded);
        }

        for source in self.entities.list(&query.excluded_source_kind)? {
            for relation in self.relations.relations_from(&source.reference()) {
                if query.excluded_relation_types.contains(&relation.relation_type) {
                    excluded.insert(relation.target.clone());
                }
            }
        }
        Ok(excluded)
    }

    fn require_kind(&self, kind: &str) -> Result<()> {
        if self.entities.is_registered(kind) {
            Ok(())
        } else {
            Err(GraphError::UnknownKind(kind.to_string()))
        }
    }
}
