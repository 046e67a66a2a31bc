//! Ontograph: a knowledge base of metaphysical concepts across cultures.
//!
//! Concepts are typed entities (existence, nothingness, divine, ...) with
//! per-kind attribute schemas. Relations connect any two entities by
//! [`EntityRef`] and carry a strength, a cultural specificity and modal
//! qualifiers. State is kept in memory and persisted to SQLite.
//!
//! # Example
//!
//! ```no_run
//! use ontograph::{KnowledgeBase, NewRelation, ParadoxQuery, StoreBuilderExt};
//! use std::path::Path;
//!
//! let mut kb = KnowledgeBase::init(Path::new(".")).unwrap();
//! kb.register_builtin_kinds().unwrap();
//!
//! let wu = kb
//!     .build("nothingness", "無")
//!     .culture("daoist")
//!     .attr("type", "daoist_wu")
//!     .attr("relation_to_existence", "generates being")
//!     .attr("paradox_level", 8)
//!     .create()
//!     .unwrap();
//! let being = kb
//!     .build("existence", "有")
//!     .culture("buddhist")
//!     .attr("abstraction_level", 9)
//!     .attr("temporal_aspect", true)
//!     .attr("spatial_aspect", true)
//!     .create()
//!     .unwrap();
//!
//! kb.add_relation(NewRelation::new(wu, being, "generates").strength(0.9)).unwrap();
//!
//! let rows = kb.query().paradoxes(&ParadoxQuery::nothingness_existence(7)).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

mod storage;
mod store;

pub mod annotations;
pub mod batch;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod query;
pub mod relation;
pub mod seed;
pub mod types;

// Re-export public API
pub use annotations::{Annotations, Contradiction, CulturalInterpretation, NewContradiction, NewInterpretation};
pub use batch::{BatchCreateResult, BatchRelateResult, ConceptSpec, StoreBatchExt};
pub use builder::{ConceptBuilder, StoreBuilderExt};
pub use config::Config;
pub use entity::EntityStore;
pub use error::GraphError;
pub use export::ExportDocument;
pub use query::{
    CrossKindRow, CulturalGroup, HubRank, IndependenceQuery, IndependentEntities, NetworkAnalysis, NetworkOptions,
    ParadoxQuery, ParadoxRow, QueryEngine, StrongRelation,
};
pub use relation::RelationGraph;
pub use seed::{SeedFile, SeedReport, load_seed, sample_seed};
pub use storage::{DB_FILE, STORE_DIR};
pub use store::KnowledgeBase;
pub use types::{
    AttrType, AttrValue, Attributes, Entity, EntityRef, FieldSpec, KindSchema, LogicalNecessity, NewRelation,
    Relation, RelationRecord, TemporalStability,
};
