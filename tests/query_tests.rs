//! Integration tests for the analytical queries.
//!
//! Tests cross-kind relations, independence, paradox detection and
//! network analysis through the KnowledgeBase facade.

mod common;

use common::TestEnv;
use ontograph::{IndependenceQuery, LogicalNecessity, NetworkOptions, NewRelation, ParadoxQuery};

// =============================================================================
// Cross-Kind Relations
// =============================================================================

#[test]
fn test_cross_kind_end_to_end() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    env.relate_in(&wu, &being, "generates", 0.9, "daoist");

    let rows = env.kb.query().cross_kind_relations("existence", "nothingness").unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].endpoint("existence").unwrap().name, "存在");
    assert_eq!(rows[0].endpoint("nothingness").unwrap().name, "無");
    assert_eq!(rows[0].relation_type, "generates");
    assert_eq!(rows[0].strength, 0.9);
}

#[test]
fn test_cross_kind_both_directions_once_each() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let you = env.existence("有", "buddhist");
    let wu = env.nothingness("無", "daoist", 8);
    let kong = env.nothingness("空", "buddhist", 9);

    let forward = env.relate(&wu, &you, "generates", 0.6);
    let backward = env.relate(&being, &kong, "is_empty_of", 0.8);

    let rows = env.kb.query().cross_kind_relations("existence", "nothingness").unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.relation_id).collect();

    assert_eq!(ids, vec![backward.id, forward.id]);
}

#[test]
fn test_cross_kind_is_symmetric_in_arguments() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    env.relate(&wu, &being, "generates", 0.9);
    env.relate(&being, &wu, "negates", 0.3);

    let query = env.kb.query();
    let ab: Vec<u64> = query
        .cross_kind_relations("existence", "nothingness")
        .unwrap()
        .iter()
        .map(|r| r.relation_id)
        .collect();
    let ba: Vec<u64> = query
        .cross_kind_relations("nothingness", "existence")
        .unwrap()
        .iter()
        .map(|r| r.relation_id)
        .collect();

    assert_eq!(ab, ba);
}

#[test]
fn test_cross_kind_ignores_other_kinds() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let god = env.divine("神", "western_christian");
    env.relate(&god, &being, "creates", 0.7);

    let rows = env.kb.query().cross_kind_relations("existence", "nothingness").unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_cross_kind_equal_strength_keeps_insertion_order() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    let first = env.relate(&wu, &being, "generates", 0.5);
    let second = env.relate(&being, &wu, "returns_to", 0.5);

    let rows = env.kb.query().cross_kind_relations("nothingness", "existence").unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.relation_id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

// =============================================================================
// Independence
// =============================================================================

#[test]
fn test_independence_excludes_created_targets() {
    let mut env = TestEnv::new();
    let e1 = env.existence("被造物", "western");
    let e2 = env.existence("自存者", "western");
    let god = env.divine("神", "western_christian");
    env.relate(&god, &e1, "creates", 0.7);

    let query = IndependenceQuery::new("divine")
        .candidate("existence")
        .excluding(["creates", "generates"]);
    let groups = env.kb.query().independence(&query).unwrap();

    assert_eq!(groups.len(), 1);
    let refs: Vec<_> = groups[0].entities.iter().map(|e| e.reference()).collect();
    assert_eq!(refs, vec![e2]);
}

#[test]
fn test_independence_ignores_other_relation_types_and_sources() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    let god = env.divine("神", "western_christian");
    env.relate(&god, &being, "contemplates", 0.4);
    env.relate(&wu, &being, "generates", 0.9);

    let groups = env
        .kb
        .query()
        .independence(&IndependenceQuery::divine_creation())
        .unwrap();

    let existence = groups.iter().find(|g| g.kind == "existence").unwrap();
    assert_eq!(existence.entities.len(), 1);
}

#[test]
fn test_independence_empty_types_exclude_nothing() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let god = env.divine("神", "western_christian");
    env.relate(&god, &being, "creates", 0.7);

    let query = IndependenceQuery::new("divine").candidate("existence");
    let groups = env.kb.query().independence(&query).unwrap();

    assert_eq!(groups[0].entities.len(), 1);
}

#[test]
fn test_independence_empty_kind_yields_empty_group() {
    let mut env = TestEnv::new();
    env.existence("存在", "western");

    let groups = env
        .kb
        .query()
        .independence(&IndependenceQuery::divine_creation())
        .unwrap();

    let kinds: Vec<&str> = groups.iter().map(|g| g.kind.as_str()).collect();
    assert_eq!(kinds, vec!["existence", "nothingness", "dao", "consciousness"]);
    assert!(groups[1].entities.is_empty());
}

// =============================================================================
// Paradoxes
// =============================================================================

#[test]
fn test_paradox_threshold() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let kong = env.nothingness("空", "buddhist", 9);
    let void = env.nothingness("虚無", "western", 5);
    let high = env.relate(&being, &kong, "is_empty_of", 0.8);
    env.relate(&void, &being, "opposes", 0.9);

    let rows = env
        .kb
        .query()
        .paradoxes(&ParadoxQuery::new("nothingness", "paradox_level", 7))
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].relation_id, high.id);
    assert_eq!(rows[0].pivot.name, "空");
    assert_eq!(rows[0].counterpart.name, "存在");
    assert_eq!(rows[0].threshold_value, 9);
}

#[test]
fn test_paradox_one_row_per_relation() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let you = env.existence("有", "buddhist");
    let wu = env.nothingness("無", "daoist", 8);
    env.relate(&wu, &being, "generates", 0.9);
    env.relate(&wu, &you, "generates", 0.6);

    let rows = env
        .kb
        .query()
        .paradoxes(&ParadoxQuery::nothingness_existence(7))
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.pivot.name == "無"));
    assert!(rows[0].strength > rows[1].strength);
}

#[test]
fn test_paradox_sorted_by_level_then_strength() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    let kong = env.nothingness("空", "buddhist", 9);
    env.relate(&wu, &being, "generates", 0.9);
    env.relate(&being, &kong, "is_empty_of", 0.2);
    env.relate(&wu, &being, "returns_to", 0.95);

    let rows = env
        .kb
        .query()
        .paradoxes(&ParadoxQuery::nothingness_existence(7))
        .unwrap();

    let summary: Vec<(i64, f64)> = rows.iter().map(|r| (r.threshold_value, r.strength)).collect();
    assert_eq!(summary, vec![(9, 0.2), (8, 0.95), (8, 0.9)]);
}

#[test]
fn test_paradox_counterpart_filter() {
    let mut env = TestEnv::new();
    let wu = env.nothingness("無", "daoist", 8);
    let dao = env.dao("道", "daoist");
    let being = env.existence("存在", "western");
    env.relate(&dao, &wu, "manifests_through", 0.9);
    env.relate(&wu, &being, "generates", 0.9);

    let query = env.kb.query();
    let with_filter = query.paradoxes(&ParadoxQuery::nothingness_existence(7)).unwrap();
    let any = query
        .paradoxes(&ParadoxQuery::new("nothingness", "paradox_level", 7))
        .unwrap();

    assert_eq!(with_filter.len(), 1);
    assert_eq!(with_filter[0].counterpart.kind, "existence");
    assert_eq!(any.len(), 2);
}

#[test]
fn test_paradox_reports_logical_necessity() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    env.kb
        .add_relation(
            NewRelation::new(wu, being, "generates")
                .strength(0.9)
                .necessity(LogicalNecessity::Necessary),
        )
        .unwrap();

    let rows = env
        .kb
        .query()
        .paradoxes(&ParadoxQuery::nothingness_existence(7))
        .unwrap();
    assert_eq!(rows[0].logical_necessity, LogicalNecessity::Necessary);
}

// =============================================================================
// Network Analysis
// =============================================================================

#[test]
fn test_hub_ranking_sums_to_relation_count() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    let god = env.divine("神", "western_christian");
    env.relate(&wu, &being, "generates", 0.9);
    env.relate(&god, &being, "creates", 0.7);
    env.relate(&god, &wu, "transcends", 0.4);

    let analysis = env.kb.query().network_analysis(NetworkOptions::default());
    let total: usize = analysis.hub_ranking.iter().map(|h| h.connection_count).sum();

    assert_eq!(total, env.relation_count());
    assert_eq!(analysis.hub_ranking[0].kind, "divine");
    assert_eq!(analysis.hub_ranking[0].connection_count, 2);
}

#[test]
fn test_cultural_mean_strength() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    let dao = env.dao("道", "daoist");
    env.relate_in(&wu, &being, "generates", 0.9, "daoist");
    env.relate_in(&dao, &wu, "manifests_through", 0.7, "daoist");
    env.relate(&dao, &being, "pervades", 0.1);

    let groups = env.kb.query().cultural_analysis();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].culture, "daoist");
    assert_eq!(groups[0].count, 2);
    assert!((groups[0].mean_strength - 0.8).abs() < 1e-9);
}

#[test]
fn test_strongest_relations_respects_top_n() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    for strength in [0.1, 0.9, 0.5, 0.7] {
        env.relate(&wu, &being, "generates", strength);
    }

    let analysis = env.kb.query().network_analysis(NetworkOptions { top_n: 2 });
    let strengths: Vec<f64> = analysis.strongest_relations.iter().map(|r| r.strength).collect();

    assert_eq!(strengths, vec![0.9, 0.7]);
    assert_eq!(analysis.strongest_relations[0].source_kind, "nothingness");
}

#[test]
fn test_queries_do_not_mutate() {
    let mut env = TestEnv::new();
    let being = env.existence("存在", "western");
    let wu = env.nothingness("無", "daoist", 8);
    env.relate(&wu, &being, "generates", 0.9);

    let query = env.kb.query();
    let first = query.network_analysis(NetworkOptions::default());
    query.cross_kind_relations("existence", "nothingness").unwrap();
    query.independence(&IndependenceQuery::divine_creation()).unwrap();
    let second = query.network_analysis(NetworkOptions::default());

    assert_eq!(first, second);
    assert_eq!(env.relation_count(), 1);
    assert_eq!(env.entity_count(), 2);
}
