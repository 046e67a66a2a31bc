//! Seed files: bulk concept and relation data in YAML.
//!
//! Relation records in a seed refer to concepts by their position within
//! the seed file (the n-th concept of a kind has id n), so a seed can be
//! loaded into a knowledge base that already holds data.

use crate::annotations::{NewContradiction, NewInterpretation};
use crate::batch::{ConceptSpec, StoreBatchExt};
use crate::error::GraphError;
use crate::store::KnowledgeBase;
use crate::types::{EntityRef, KindSchema, RelationRecord};
use eyre::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const SAMPLE_SEED: &str = include_str!("../data/sample_seed.yaml");

/// A kind declared by a seed file in addition to the built-in ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KindDeclaration {
    pub name: String,
    #[serde(flatten)]
    pub schema: KindSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub kinds: Vec<KindDeclaration>,
    #[serde(default)]
    pub concepts: Vec<ConceptSpec>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
    #[serde(default)]
    pub contradictions: Vec<NewContradiction>,
    #[serde(default)]
    pub interpretations: Vec<NewInterpretation>,
}

impl SeedFile {
    /// Parse a seed from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse seed file")
    }

    /// Read and parse a seed file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::from_yaml(&text)
    }
}

/// The bundled sample knowledge base.
pub fn sample_seed() -> Result<SeedFile> {
    SeedFile::from_yaml(SAMPLE_SEED)
}

/// What a seed load did.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub concepts: usize,
    pub relations: usize,
    pub contradictions: usize,
    pub interpretations: usize,
    /// Human-readable reasons for every rejected record.
    pub errors: Vec<String>,
}

/// Maps seed-local references to the references assigned on insertion.
#[derive(Default)]
struct LocalIds {
    by_kind: HashMap<String, Vec<Option<EntityRef>>>,
}

impl LocalIds {
    fn push(&mut self, kind: &str, assigned: Option<EntityRef>) {
        self.by_kind.entry(kind.to_string()).or_default().push(assigned);
    }

    fn resolve(&self, kind: &str, id: u64) -> std::result::Result<EntityRef, GraphError> {
        let local = EntityRef::new(kind, id);
        let slot = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| self.by_kind.get(kind)?.get(idx).cloned().flatten());
        slot.ok_or_else(|| GraphError::ReferentialIntegrity(local.to_string()))
    }

    fn remap(&self, r: &EntityRef) -> std::result::Result<EntityRef, GraphError> {
        self.resolve(&r.kind, r.id)
    }
}

/// Load a seed into `kb`.
///
/// The built-in kinds are registered first. Individual records that fail
/// validation are skipped and reported; storage failures abort the load.
pub fn load_seed(kb: &mut KnowledgeBase, seed: SeedFile) -> Result<SeedReport> {
    kb.register_builtin_kinds()?;
    for decl in seed.kinds {
        kb.register_kind(&decl.name, decl.schema)
            .with_context(|| format!("Failed to register kind '{}'", decl.name))?;
    }

    let mut report = SeedReport::default();

    let kinds: Vec<String> = seed.concepts.iter().map(|c| c.kind.clone()).collect();
    let created = kb.batch_create(seed.concepts)?;
    let failed: HashMap<usize, String> = created.errors.into_iter().collect();

    let mut ids = LocalIds::default();
    let mut assigned = created.created.into_iter();
    for (i, kind) in kinds.iter().enumerate() {
        match failed.get(&i) {
            Some(reason) => {
                report.errors.push(format!("concept {}: {}", i + 1, reason));
                ids.push(kind, None);
            }
            None => ids.push(kind, assigned.next()),
        }
    }
    report.concepts = kinds.len() - failed.len();

    // Position in the seed file of each record handed to batch_relate
    let mut positions = Vec::new();
    let mut records = Vec::new();
    let mut relation_errors = Vec::new();
    for (i, mut record) in seed.relations.into_iter().enumerate() {
        let endpoints = ids
            .resolve(&record.source_kind, record.source_id)
            .and_then(|s| Ok((s, ids.resolve(&record.target_kind, record.target_id)?)));
        match endpoints {
            Ok((source, target)) => {
                record.source_id = source.id;
                record.target_id = target.id;
                positions.push(i);
                records.push(record);
            }
            Err(e) => relation_errors.push((i, e.to_string())),
        }
    }
    let related = kb.batch_relate(records)?;
    report.relations = related.related.len();
    relation_errors.extend(related.errors.into_iter().map(|(i, e)| (positions[i], e)));
    relation_errors.sort_by_key(|(i, _)| *i);
    report
        .errors
        .extend(relation_errors.into_iter().map(|(i, e)| format!("relation {}: {}", i + 1, e)));

    for (i, mut new) in seed.contradictions.into_iter().enumerate() {
        let result = ids
            .remap(&new.first)
            .and_then(|first| Ok((first, ids.remap(&new.second)?)))
            .map_err(eyre::Report::from)
            .and_then(|(first, second)| {
                new.first = first;
                new.second = second;
                kb.add_contradiction(new)
            });
        match result {
            Ok(_) => report.contradictions += 1,
            Err(e) => report.errors.push(format!("contradiction {}: {}", i + 1, e)),
        }
    }

    for (i, mut new) in seed.interpretations.into_iter().enumerate() {
        let result = ids.remap(&new.base).map_err(eyre::Report::from).and_then(|base| {
            new.base = base;
            kb.add_interpretation(new)
        });
        match result {
            Ok(_) => report.interpretations += 1,
            Err(e) => report.errors.push(format!("interpretation {}: {}", i + 1, e)),
        }
    }

    log::info!(
        "Seed loaded: {} concepts, {} relations, {} rejected records",
        report.concepts,
        report.relations,
        report.errors.len()
    );
    Ok(report)
}
