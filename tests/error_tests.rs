//! Integration tests for error handling.
//!
//! Tests that every rejected call returns the right error and leaves the
//! knowledge base unchanged, in memory and on disk.

mod common;

use common::TestEnv;
use ontograph::{
    AttrType, Attributes, EntityRef, GraphError, IndependenceQuery, KindSchema, KnowledgeBase, NewRelation,
    ParadoxQuery, RelationRecord,
};
use tempfile::TempDir;

fn graph_error(err: &eyre::Report) -> &GraphError {
    err.downcast_ref::<GraphError>()
        .unwrap_or_else(|| panic!("expected a GraphError, got: {:?}", err))
}

// =============================================================================
// Kind Registration
// =============================================================================

#[test]
fn test_conflicting_schema_fails() {
    let mut env = TestEnv::new();

    let err = env
        .kb
        .register_kind("existence", KindSchema::new().required("abstraction_level", AttrType::Real))
        .unwrap_err();

    assert!(matches!(graph_error(&err), GraphError::Schema { kind } if kind == "existence"));
}

#[test]
fn test_create_unknown_kind_fails() {
    let mut env = TestEnv::new();

    let err = env.kb.create("angel", "Gabriel", "abrahamic", "", Attributes::new()).unwrap_err();
    assert_eq!(graph_error(&err), &GraphError::UnknownKind("angel".to_string()));
    assert_eq!(env.entity_count(), 0);
}

#[test]
fn test_get_with_unknown_kind_fails() {
    let env = TestEnv::new();
    let err = env.kb.get(&EntityRef::new("angel", 1)).unwrap_err();
    assert!(matches!(graph_error(&err), GraphError::UnknownKind(_)));
}

// =============================================================================
// Attribute Validation
// =============================================================================

#[test]
fn test_missing_required_attribute_fails() {
    let mut env = TestEnv::new();

    let mut attrs = Attributes::new();
    attrs.insert("type".to_string(), "daoist_wu".into());
    attrs.insert("relation_to_existence".to_string(), "generates".into());

    let err = env.kb.create("nothingness", "無", "daoist", "", attrs).unwrap_err();
    assert!(matches!(graph_error(&err), GraphError::AttributeSchema { .. }));
    assert_eq!(env.kb.entities().list("nothingness").unwrap().count(), 0);
}

#[test]
fn test_wrong_attribute_type_fails() {
    let mut env = TestEnv::new();

    let mut attrs = Attributes::new();
    attrs.insert("abstraction_level".to_string(), "very high".into());
    attrs.insert("temporal_aspect".to_string(), true.into());
    attrs.insert("spatial_aspect".to_string(), true.into());

    let err = env.kb.create("existence", "存在", "western", "", attrs).unwrap_err();
    assert!(matches!(graph_error(&err), GraphError::AttributeSchema { .. }));
}

#[test]
fn test_empty_name_fails() {
    let mut env = TestEnv::new();
    env.kb.register_kind("karma", KindSchema::new()).unwrap();

    let err = env.kb.create("karma", "  ", "buddhist", "", Attributes::new()).unwrap_err();
    assert!(matches!(graph_error(&err), GraphError::AttributeSchema { .. }));
}

#[test]
fn test_rejected_create_does_not_consume_an_id() {
    let mut env = TestEnv::new();
    env.kb.register_kind("karma", KindSchema::new()).unwrap();

    assert!(env.kb.create("karma", "", "buddhist", "", Attributes::new()).is_err());
    let r = env.kb.create("karma", "業", "buddhist", "", Attributes::new()).unwrap();
    assert_eq!(r.id, 1);
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn test_get_missing_entity_fails() {
    let mut env = TestEnv::new();
    env.existence("存在", "western");

    let err = env.kb.get(&EntityRef::new("existence", 2)).unwrap_err();
    assert_eq!(graph_error(&err), &GraphError::NotFound("existence:2".to_string()));
    assert!(!env.kb.entities().exists(&EntityRef::new("existence", 2)));
}

// =============================================================================
// Relations
// =============================================================================

#[test]
fn test_relation_to_missing_entity_fails() {
    let mut env = TestEnv::new();
    let wu = env.nothingness("無", "daoist", 8);

    let err = env
        .kb
        .add_relation(NewRelation::new(wu, EntityRef::new("existence", 1), "generates"))
        .unwrap_err();

    assert!(matches!(graph_error(&err), GraphError::ReferentialIntegrity(_)));
    assert_eq!(env.relation_count(), 0);
}

#[test]
fn test_relation_from_missing_entity_fails() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");

    let err = env
        .kb
        .add_relation(NewRelation::new(EntityRef::new("divine", 4), being, "creates"))
        .unwrap_err();

    assert!(matches!(graph_error(&err), GraphError::ReferentialIntegrity(_)));
    assert_eq!(env.kb.relations().all().count(), 0);
}

#[test]
fn test_out_of_range_strength_fails() {
    let mut env = TestEnv::new();
    let wu = env.nothingness("無", "daoist", 8);
    let being = env.existence("存在", "western");

    for strength in [1.3, -0.1] {
        let err = env
            .kb
            .add_relation(NewRelation::new(wu.clone(), being.clone(), "generates").strength(strength))
            .unwrap_err();
        assert!(matches!(graph_error(&err), GraphError::ValueRange { field: "strength", .. }));
    }
    assert_eq!(env.relation_count(), 0);
}

#[test]
fn test_invalid_enum_in_record_fails() {
    let mut env = TestEnv::new();
    let wu = env.nothingness("無", "daoist", 8);
    let being = env.existence("存在", "western");

    let record = RelationRecord {
        source_kind: wu.kind.clone(),
        source_id: wu.id,
        target_kind: being.kind.clone(),
        target_id: being.id,
        relation_type: "generates".to_string(),
        strength: 0.9,
        cultural_specificity: None,
        logical_necessity: None,
        temporal_stability: Some("forever".to_string()),
    };

    let err = env.kb.add_relation_record(record).unwrap_err();
    assert!(matches!(
        graph_error(&err),
        GraphError::InvalidEnum { field: "temporal_stability", value, .. } if value == "forever"
    ));
    assert_eq!(env.relation_count(), 0);
}

#[test]
fn test_rejected_relation_leaves_disk_unchanged() {
    let mut env = TestEnv::new();
    let wu = env.nothingness("無", "daoist", 8);
    let being = env.existence("存在", "western");
    env.relate(&wu, &being, "generates", 0.9);

    assert!(
        env.kb
            .add_relation(NewRelation::new(wu, being, "generates").strength(2.0))
            .is_err()
    );

    env.reopen();
    assert_eq!(env.relation_count(), 1);
    assert_eq!(env.entity_count(), 2);
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_query_unknown_kind_fails() {
    let env = TestEnv::new();
    let query = env.kb.query();

    assert!(matches!(
        query.cross_kind_relations("existence", "angel"),
        Err(GraphError::UnknownKind(_))
    ));
    assert!(matches!(
        query.independence(&IndependenceQuery::new("divine").candidate("angel")),
        Err(GraphError::UnknownKind(_))
    ));
    assert!(matches!(
        query.paradoxes(&ParadoxQuery::new("angel", "paradox_level", 7)),
        Err(GraphError::UnknownKind(_))
    ));
}

#[test]
fn test_paradox_on_undeclared_attribute_fails() {
    let env = TestEnv::new();
    let result = env.kb.query().paradoxes(&ParadoxQuery::new("nothingness", "mystery", 1));
    assert!(matches!(result, Err(GraphError::AttributeSchema { .. })));
}

// =============================================================================
// Storage
// =============================================================================

#[test]
fn test_open_without_init_fails() {
    let temp_dir = TempDir::new().unwrap();

    let result = KnowledgeBase::open(temp_dir.path());
    assert!(result.is_err());
}

#[test]
fn test_error_messages_name_the_problem() {
    let mut env = TestEnv::new();
    let wu = env.nothingness("無", "daoist", 8);

    let err = env
        .kb
        .add_relation(NewRelation::new(wu, EntityRef::new("existence", 7), "generates"))
        .unwrap_err();
    assert!(err.to_string().contains("existence:7"), "{}", err);
}
