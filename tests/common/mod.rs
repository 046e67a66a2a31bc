//! Shared test infrastructure for ontograph integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use ontograph::{EntityRef, KnowledgeBase, NewRelation, Relation, StoreBuilderExt};
use tempfile::TempDir;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub kb: KnowledgeBase,
}

impl TestEnv {
    /// Create a new test environment with the built-in kinds registered.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut kb = KnowledgeBase::init(temp_dir.path()).expect("Failed to init knowledge base");
        kb.register_builtin_kinds().expect("Failed to register kinds");
        Self { temp_dir, kb }
    }

    /// Drop the in-memory state and load it back from disk.
    pub fn reopen(&mut self) {
        self.kb = KnowledgeBase::open(self.temp_dir.path()).expect("Failed to reopen knowledge base");
    }

    /// Create an existence concept.
    pub fn existence(&mut self, name: &str, culture: &str) -> EntityRef {
        self.kb
            .build("existence", name)
            .culture(culture)
            .attr("abstraction_level", 10)
            .attr("temporal_aspect", true)
            .attr("spatial_aspect", true)
            .create()
            .expect("Failed to create existence concept")
    }

    /// Create a nothingness concept with the given paradox level.
    pub fn nothingness(&mut self, name: &str, culture: &str, paradox_level: i64) -> EntityRef {
        self.kb
            .build("nothingness", name)
            .culture(culture)
            .attr("type", "void")
            .attr("relation_to_existence", "opposes")
            .attr("paradox_level", paradox_level)
            .create()
            .expect("Failed to create nothingness concept")
    }

    /// Create a divine concept.
    pub fn divine(&mut self, name: &str, culture: &str) -> EntityRef {
        self.kb
            .build("divine", name)
            .culture(culture)
            .attr("transcendence_level", 10)
            .attr("immanence_level", 3)
            .attr("personality", true)
            .attr("causality_role", "first_cause")
            .create()
            .expect("Failed to create divine concept")
    }

    /// Create a dao concept.
    pub fn dao(&mut self, name: &str, culture: &str) -> EntityRef {
        self.kb
            .build("dao", name)
            .culture(culture)
            .attr("expressability", false)
            .attr("action_principle", "wu_wei")
            .attr("universality_scope", "cosmic")
            .attr("knowability", "experiential_only")
            .create()
            .expect("Failed to create dao concept")
    }

    /// Relate two entities with the given strength.
    pub fn relate(&mut self, source: &EntityRef, target: &EntityRef, ty: &str, strength: f64) -> Relation {
        self.kb
            .add_relation(NewRelation::new(source.clone(), target.clone(), ty).strength(strength))
            .expect("Failed to add relation")
    }

    /// Relate two entities with a cultural specificity.
    pub fn relate_in(
        &mut self,
        source: &EntityRef,
        target: &EntityRef,
        ty: &str,
        strength: f64,
        culture: &str,
    ) -> Relation {
        self.kb
            .add_relation(
                NewRelation::new(source.clone(), target.clone(), ty)
                    .strength(strength)
                    .cultural_specificity(culture),
            )
            .expect("Failed to add relation")
    }

    pub fn relation_count(&self) -> usize {
        self.kb.relations().len()
    }

    pub fn entity_count(&self) -> usize {
        self.kb.entities().len()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
