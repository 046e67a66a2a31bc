//! JSON export of the whole knowledge base.

use crate::annotations::{Contradiction, CulturalInterpretation};
use crate::store::KnowledgeBase;
use crate::types::{Entity, KindSchema, Relation};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Current export format version.
pub const EXPORT_VERSION: u32 = 1;

/// One kind with its schema and entities in id order.
#[derive(Debug, Serialize)]
pub struct KindExport<'a> {
    pub name: &'a str,
    pub schema: &'a KindSchema,
    pub entities: Vec<&'a Entity>,
}

/// Snapshot of a knowledge base, borrowed from it.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub kinds: Vec<KindExport<'a>>,
    pub relations: Vec<&'a Relation>,
    pub contradictions: &'a [Contradiction],
    pub interpretations: &'a [CulturalInterpretation],
}

impl<'a> ExportDocument<'a> {
    pub fn from_kb(kb: &'a KnowledgeBase) -> Result<Self> {
        let entities = kb.entities();
        let mut kinds = Vec::new();
        for name in entities.kinds() {
            kinds.push(KindExport {
                name,
                schema: entities.schema(name)?,
                entities: entities.list(name)?.collect(),
            });
        }

        Ok(Self {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            kinds,
            relations: kb.relations().all().collect(),
            contradictions: kb.annotations().contradictions(),
            interpretations: kb.annotations().interpretations(),
        })
    }

    /// Pretty-printed JSON. Non-ASCII text is written as-is.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("Failed to write export to {}", path.display()))?;
        log::info!(
            "Exported {} kinds and {} relations to {}",
            self.kinds.len(),
            self.relations.len(),
            path.display()
        );
        Ok(())
    }
}
