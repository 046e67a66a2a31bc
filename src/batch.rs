//! Batch operations for bulk loading.

use crate::error::GraphError;
use crate::store::KnowledgeBase;
use crate::types::{AttrValue, Attributes, EntityRef, Relation, RelationRecord};
use eyre::Result;
use serde::Deserialize;

/// Specification for creating a concept in a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConceptSpec {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub cultural_context: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ConceptSpec {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            cultural_context: String::new(),
            definition: String::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.cultural_context = culture.into();
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Result of a batch create operation.
#[derive(Debug)]
pub struct BatchCreateResult {
    /// References of the created entities.
    pub created: Vec<EntityRef>,
    /// Errors that occurred (index, error message).
    pub errors: Vec<(usize, String)>,
}

/// Result of a batch relate operation.
#[derive(Debug)]
pub struct BatchRelateResult {
    pub related: Vec<Relation>,
    /// Errors that occurred (index, error message).
    pub errors: Vec<(usize, String)>,
}

/// Extension trait for batch operations on KnowledgeBase.
///
/// Each item is applied on its own. An item that fails validation is
/// reported and the rest still go through; any other failure (storage)
/// aborts the batch.
pub trait StoreBatchExt {
    fn batch_create(&mut self, specs: Vec<ConceptSpec>) -> Result<BatchCreateResult>;

    fn batch_relate(&mut self, records: Vec<RelationRecord>) -> Result<BatchRelateResult>;
}

impl StoreBatchExt for KnowledgeBase {
    fn batch_create(&mut self, specs: Vec<ConceptSpec>) -> Result<BatchCreateResult> {
        let mut created = Vec::new();
        let mut errors = Vec::new();

        for (i, spec) in specs.into_iter().enumerate() {
            match self.create(
                &spec.kind,
                &spec.name,
                &spec.cultural_context,
                &spec.definition,
                spec.attributes,
            ) {
                Ok(reference) => created.push(reference),
                Err(e) => {
                    let e = rejected(e)?;
                    log::warn!("Batch concept {} ({}) rejected: {}", i, spec.name, e);
                    errors.push((i, e));
                }
            }
        }

        Ok(BatchCreateResult { created, errors })
    }

    fn batch_relate(&mut self, records: Vec<RelationRecord>) -> Result<BatchRelateResult> {
        let mut related = Vec::new();
        let mut errors = Vec::new();

        for (i, record) in records.into_iter().enumerate() {
            match self.add_relation_record(record) {
                Ok(relation) => related.push(relation),
                Err(e) => {
                    let e = rejected(e)?;
                    log::warn!("Batch relation {} rejected: {}", i, e);
                    errors.push((i, e));
                }
            }
        }

        Ok(BatchRelateResult { related, errors })
    }
}

/// Message for a validation failure; anything else is passed back up.
fn rejected(e: eyre::Report) -> Result<String> {
    match e.downcast_ref::<GraphError>() {
        Some(_) => Ok(e.to_string()),
        None => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_STRENGTH, KindSchema};
    use tempfile::TempDir;

    fn setup_test_kb() -> (TempDir, KnowledgeBase) {
        let temp_dir = TempDir::new().unwrap();
        let mut kb = KnowledgeBase::init(temp_dir.path()).unwrap();
        kb.register_kind("existence", KindSchema::new()).unwrap();
        kb.register_kind("nothingness", KindSchema::new()).unwrap();
        (temp_dir, kb)
    }

    fn record(source: (&str, u64), target: (&str, u64), ty: &str) -> RelationRecord {
        RelationRecord {
            source_kind: source.0.to_string(),
            source_id: source.1,
            target_kind: target.0.to_string(),
            target_id: target.1,
            relation_type: ty.to_string(),
            strength: DEFAULT_STRENGTH,
            cultural_specificity: None,
            logical_necessity: None,
            temporal_stability: None,
        }
    }

    #[test]
    fn test_batch_create() {
        let (_temp_dir, mut kb) = setup_test_kb();

        let specs = vec![
            ConceptSpec::new("existence", "存在").with_culture("western"),
            ConceptSpec::new("angel", "Gabriel"),
            ConceptSpec::new("nothingness", "無").with_definition("wu"),
        ];

        let result = kb.batch_create(specs).unwrap();

        assert_eq!(
            result.created,
            vec![EntityRef::new("existence", 1), EntityRef::new("nothingness", 1)]
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].0, 1);
    }

    #[test]
    fn test_batch_relate_reports_bad_records() {
        let (_temp_dir, mut kb) = setup_test_kb();
        kb.batch_create(vec![
            ConceptSpec::new("existence", "存在"),
            ConceptSpec::new("nothingness", "無"),
        ])
        .unwrap();

        let mut bad_enum = record(("nothingness", 1), ("existence", 1), "generates");
        bad_enum.logical_necessity = Some("probable".to_string());

        let result = kb
            .batch_relate(vec![
                record(("nothingness", 1), ("existence", 1), "generates"),
                record(("nothingness", 2), ("existence", 1), "generates"),
                bad_enum,
            ])
            .unwrap();

        assert_eq!(result.related.len(), 1);
        let failed: Vec<usize> = result.errors.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![1, 2]);
        assert_eq!(kb.relations().len(), 1);
    }

    #[test]
    fn test_storage_failure_aborts_batch_create() {
        let (_temp_dir, mut kb) = setup_test_kb();
        kb.storage().execute_raw("DROP TABLE entities").unwrap();

        let result = kb.batch_create(vec![
            ConceptSpec::new("angel", "Gabriel"),
            ConceptSpec::new("existence", "存在"),
        ]);

        let err = result.unwrap_err();
        assert!(err.downcast_ref::<GraphError>().is_none());
        assert!(err.to_string().contains("Failed to persist entity"));
        assert!(kb.entities().list("existence").unwrap().next().is_none());
    }

    #[test]
    fn test_storage_failure_aborts_batch_relate() {
        let (_temp_dir, mut kb) = setup_test_kb();
        kb.batch_create(vec![
            ConceptSpec::new("existence", "存在"),
            ConceptSpec::new("nothingness", "無"),
        ])
        .unwrap();
        kb.storage().execute_raw("DROP TABLE relations").unwrap();

        let result = kb.batch_relate(vec![
            record(("nothingness", 9), ("existence", 1), "generates"),
            record(("nothingness", 1), ("existence", 1), "generates"),
        ]);

        assert!(result.unwrap_err().downcast_ref::<GraphError>().is_none());
        assert!(kb.relations().is_empty());
    }
}
