//! SQLite persistence for kinds, entities, relations and annotations.
//!
//! Every write runs in its own transaction. A failed write is rolled back
//! when the transaction is dropped, so no partial record is ever visible.

use crate::annotations::{Contradiction, CulturalInterpretation};
use crate::types::{Entity, EntityRef, KindSchema, Relation};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::fs;
use std::path::Path;

/// Storage directory name.
pub const STORE_DIR: &str = ".ontograph";

/// SQLite database file.
pub const DB_FILE: &str = "ontograph.db";

/// Bumped whenever the table layout changes.
const SCHEMA_VERSION: i64 = 1;

/// Storage handle for reading/writing the knowledge base.
pub struct Storage {
    db: Connection,
}

impl Storage {
    /// Initialize storage in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let store_dir = root.join(STORE_DIR);
        fs::create_dir_all(&store_dir).context("Failed to create .ontograph directory")?;

        let db = Connection::open(store_dir.join(DB_FILE)).context("Failed to open SQLite database")?;
        let storage = Self { db };
        storage.init_schema()?;

        log::info!("Initialized storage in {}", store_dir.display());
        Ok(storage)
    }

    /// Open existing storage.
    pub fn open(root: &Path) -> Result<Self> {
        let store_dir = root.join(STORE_DIR);
        if !store_dir.exists() {
            eyre::bail!("No .ontograph directory found. Run 'og init' first.");
        }

        let db = Connection::open(store_dir.join(DB_FILE)).context("Failed to open SQLite database")?;
        let storage = Self { db };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Storage that lives only as long as the handle.
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let storage = Self { db };
        storage.init_schema()?;
        Ok(storage)
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.db.execute_batch(sql).context("Failed to execute SQL")
    }

    /// Initialize SQLite schema.
    fn init_schema(&self) -> Result<()> {
        self.db
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kinds (
                    position INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    schema_json TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS entities (
                    kind TEXT NOT NULL REFERENCES kinds(name),
                    id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    cultural_context TEXT NOT NULL,
                    definition TEXT NOT NULL,
                    attributes_json TEXT NOT NULL,
                    PRIMARY KEY (kind, id)
                );

                CREATE TABLE IF NOT EXISTS relations (
                    id INTEGER PRIMARY KEY,
                    source_kind TEXT NOT NULL,
                    source_id INTEGER NOT NULL,
                    target_kind TEXT NOT NULL,
                    target_id INTEGER NOT NULL,
                    relation_type TEXT NOT NULL,
                    strength REAL NOT NULL CHECK (strength BETWEEN 0.0 AND 1.0),
                    cultural_specificity TEXT,
                    logical_necessity TEXT NOT NULL CHECK (logical_necessity IN ('necessary', 'contingent', 'unknown')),
                    temporal_stability TEXT NOT NULL CHECK (temporal_stability IN ('eternal', 'historical', 'contextual', 'unknown')),
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_relations_source ON relations(source_kind, source_id);
                CREATE INDEX IF NOT EXISTS idx_relations_target ON relations(target_kind, target_id);

                CREATE TABLE IF NOT EXISTS contradictions (
                    id INTEGER PRIMARY KEY,
                    first_kind TEXT NOT NULL,
                    first_id INTEGER NOT NULL,
                    second_kind TEXT NOT NULL,
                    second_id INTEGER NOT NULL,
                    contradiction_type TEXT,
                    resolution_attempts TEXT,
                    unresolved BOOLEAN NOT NULL DEFAULT TRUE,
                    philosopher_comments TEXT
                );

                CREATE TABLE IF NOT EXISTS cultural_interpretations (
                    id INTEGER PRIMARY KEY,
                    base_kind TEXT NOT NULL,
                    base_id INTEGER NOT NULL,
                    culture TEXT NOT NULL,
                    interpretation TEXT,
                    emphasis_points TEXT,
                    unique_aspects TEXT,
                    historical_evolution TEXT
                );

                CREATE TABLE IF NOT EXISTS meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
            "#,
            )
            .context("Failed to initialize schema")?;

        self.db
            .execute(
                "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?)",
                params![SCHEMA_VERSION.to_string()],
            )
            .context("Failed to record schema version")?;

        Ok(())
    }

    /// Persist a newly registered kind.
    pub fn insert_kind(&mut self, name: &str, schema: &KindSchema) -> Result<()> {
        let schema_json = serde_json::to_string(schema).context("Failed to serialize kind schema")?;

        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT INTO kinds (name, schema_json) VALUES (?, ?)",
            params![name, schema_json],
        )
        .with_context(|| format!("Failed to persist kind '{}'", name))?;
        tx.commit()?;

        Ok(())
    }

    /// Persist an entity.
    pub fn insert_entity(&mut self, entity: &Entity) -> Result<()> {
        let attributes_json =
            serde_json::to_string(&entity.attributes).context("Failed to serialize attributes")?;

        let tx = self.db.transaction()?;
        tx.execute(
            r#"
            INSERT INTO entities (kind, id, name, cultural_context, definition, attributes_json)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                entity.kind,
                entity.id as i64,
                entity.name,
                entity.cultural_context,
                entity.definition,
                attributes_json,
            ],
        )
        .with_context(|| format!("Failed to persist entity {}", entity.reference()))?;
        tx.commit()?;

        Ok(())
    }

    /// Persist a relation.
    pub fn insert_relation(&mut self, relation: &Relation) -> Result<()> {
        let tx = self.db.transaction()?;
        tx.execute(
            r#"
            INSERT INTO relations (id, source_kind, source_id, target_kind, target_id, relation_type,
                                   strength, cultural_specificity, logical_necessity, temporal_stability, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                relation.id as i64,
                relation.source.kind,
                relation.source.id as i64,
                relation.target.kind,
                relation.target.id as i64,
                relation.relation_type,
                relation.strength,
                relation.cultural_specificity,
                relation.logical_necessity.as_str(),
                relation.temporal_stability.as_str(),
                relation.created_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to persist relation {}", relation.id))?;
        tx.commit()?;

        Ok(())
    }

    /// Persist a contradiction.
    pub fn insert_contradiction(&mut self, c: &Contradiction) -> Result<()> {
        let tx = self.db.transaction()?;
        tx.execute(
            r#"
            INSERT INTO contradictions (id, first_kind, first_id, second_kind, second_id,
                                        contradiction_type, resolution_attempts, unresolved, philosopher_comments)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                c.id as i64,
                c.first.kind,
                c.first.id as i64,
                c.second.kind,
                c.second.id as i64,
                c.contradiction_type,
                c.resolution_attempts,
                c.unresolved,
                c.philosopher_comments,
            ],
        )
        .context("Failed to persist contradiction")?;
        tx.commit()?;

        Ok(())
    }

    /// Persist a cultural interpretation.
    pub fn insert_interpretation(&mut self, i: &CulturalInterpretation) -> Result<()> {
        let tx = self.db.transaction()?;
        tx.execute(
            r#"
            INSERT INTO cultural_interpretations (id, base_kind, base_id, culture, interpretation,
                                                  emphasis_points, unique_aspects, historical_evolution)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                i.id as i64,
                i.base.kind,
                i.base.id as i64,
                i.culture,
                i.interpretation,
                i.emphasis_points,
                i.unique_aspects,
                i.historical_evolution,
            ],
        )
        .context("Failed to persist cultural interpretation")?;
        tx.commit()?;

        Ok(())
    }

    /// Registered kinds, in registration order.
    pub fn load_kinds(&self) -> Result<Vec<(String, KindSchema)>> {
        let mut stmt = self
            .db
            .prepare("SELECT name, schema_json FROM kinds ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let schema_json: String = row.get(1)?;
            let schema = serde_json::from_str(&schema_json).map_err(|e| conversion_error(1, e))?;
            Ok((name, schema))
        })?;

        Ok(collect_rows(rows, "kind"))
    }

    /// All entities, ordered by kind and id.
    pub fn load_entities(&self) -> Result<Vec<Entity>> {
        let mut stmt = self.db.prepare(
            r#"
            SELECT kind, id, name, cultural_context, definition, attributes_json
            FROM entities
            ORDER BY kind, id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let attributes_json: String = row.get(5)?;
            Ok(Entity {
                kind: row.get(0)?,
                id: row.get::<_, i64>(1)? as u64,
                name: row.get(2)?,
                cultural_context: row.get(3)?,
                definition: row.get(4)?,
                attributes: serde_json::from_str(&attributes_json).map_err(|e| conversion_error(5, e))?,
            })
        })?;

        Ok(collect_rows(rows, "entity"))
    }

    /// All relations, in id order.
    pub fn load_relations(&self) -> Result<Vec<Relation>> {
        let mut stmt = self.db.prepare(
            r#"
            SELECT id, source_kind, source_id, target_kind, target_id, relation_type,
                   strength, cultural_specificity, logical_necessity, temporal_stability, created_at
            FROM relations
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], Self::row_to_relation)?;

        Ok(collect_rows(rows, "relation"))
    }

    pub fn load_contradictions(&self) -> Result<Vec<Contradiction>> {
        let mut stmt = self.db.prepare(
            r#"
            SELECT id, first_kind, first_id, second_kind, second_id,
                   contradiction_type, resolution_attempts, unresolved, philosopher_comments
            FROM contradictions
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Contradiction {
                id: row.get::<_, i64>(0)? as u64,
                first: entity_ref(row, 1)?,
                second: entity_ref(row, 3)?,
                contradiction_type: row.get(5)?,
                resolution_attempts: row.get(6)?,
                unresolved: row.get(7)?,
                philosopher_comments: row.get(8)?,
            })
        })?;

        Ok(collect_rows(rows, "contradiction"))
    }

    pub fn load_interpretations(&self) -> Result<Vec<CulturalInterpretation>> {
        let mut stmt = self.db.prepare(
            r#"
            SELECT id, base_kind, base_id, culture, interpretation,
                   emphasis_points, unique_aspects, historical_evolution
            FROM cultural_interpretations
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CulturalInterpretation {
                id: row.get::<_, i64>(0)? as u64,
                base: entity_ref(row, 1)?,
                culture: row.get(3)?,
                interpretation: row.get(4)?,
                emphasis_points: row.get(5)?,
                unique_aspects: row.get(6)?,
                historical_evolution: row.get(7)?,
            })
        })?;

        Ok(collect_rows(rows, "cultural interpretation"))
    }

    /// Convert a database row to a Relation.
    fn row_to_relation(row: &Row) -> rusqlite::Result<Relation> {
        let necessity: String = row.get(8)?;
        let stability: String = row.get(9)?;
        let created_at_str: String = row.get(10)?;

        Ok(Relation {
            id: row.get::<_, i64>(0)? as u64,
            source: entity_ref(row, 1)?,
            target: entity_ref(row, 3)?,
            relation_type: row.get(5)?,
            strength: row.get(6)?,
            cultural_specificity: row.get(7)?,
            logical_necessity: necessity.parse().map_err(|e| conversion_error(8, e))?,
            temporal_stability: stability.parse().map_err(|e| conversion_error(9, e))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

/// Read a (kind, id) column pair starting at `idx`.
fn entity_ref(row: &Row, idx: usize) -> rusqlite::Result<EntityRef> {
    Ok(EntityRef::new(
        row.get::<_, String>(idx)?,
        row.get::<_, i64>(idx + 1)? as u64,
    ))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Collect mapped rows, logging and skipping the ones that fail to decode.
fn collect_rows<T>(rows: impl Iterator<Item = rusqlite::Result<T>>, what: &str) -> Vec<T> {
    let mut out = Vec::new();
    for (idx, row) in rows.enumerate() {
        match row {
            Ok(value) => out.push(value),
            Err(e) => log::warn!("Skipping unreadable {} row {}: {}", what, idx + 1, e),
        }
    }
    out
}
