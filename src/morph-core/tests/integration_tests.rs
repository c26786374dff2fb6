//! Integration tests for morph-core
//!
//! These tests cover the cross-module behavior of the store without
//! duplicating the unit tests in individual modules.

use morph_core::testing::{media_ontology, monk_episode};
use morph_core::*;
use proptest::prelude::*;

#[test]
fn test_subclass_supersets() {
    media_ontology();

    let video = ontology::get_class("Video").unwrap();
    let episode = ontology::get_class("Episode").unwrap();

    // D.schema ⊇ C.schema
    for (prop, _) in video.schema().iter() {
        assert!(
            episode.schema().contains(prop),
            "Episode schema is missing inherited '{prop}'"
        );
    }
    // D.valid ⊇ C.valid, D.unique ⊇ C.unique
    assert!(episode.valid().is_superset(video.valid()));
    assert!(episode.unique().is_superset(video.unique()));
}

#[test]
fn test_relation_kinds_for_media_ontology() {
    media_ontology();

    let episode = ontology::get_class("Episode").unwrap();
    let series = ontology::get_class("Series").unwrap();
    let video = ontology::get_class("Video").unwrap();
    let file = ontology::get_class("File").unwrap();
    let subtitle = ontology::get_class("Subtitle").unwrap();

    assert_eq!(
        episode.schema().relation("series"),
        Some(RelationKind::OrderedManyToOne)
    );
    assert_eq!(
        series.schema().relation("episodes"),
        Some(RelationKind::OrderedOneToMany)
    );
    assert_eq!(
        video.schema().relation("files"),
        Some(RelationKind::OrderedOneToMany)
    );
    assert_eq!(
        file.schema().relation("video"),
        Some(RelationKind::OrderedManyToOne)
    );
    assert_eq!(
        subtitle.schema().relation("video"),
        Some(RelationKind::OneToOne)
    );
    assert_eq!(
        video.schema().relation("subtitle"),
        Some(RelationKind::OneToOne)
    );

    // implicit flags: declared forward properties are not implicit, the
    // injected reverses are
    assert!(!episode.schema().is_implicit("series"));
    assert!(series.schema().is_implicit("episodes"));
    assert!(file.schema().is_implicit("video"));
}

#[test]
fn test_linking_fills_both_sides() {
    media_ontology();
    let g = Graph::new();
    let (series, episode) = monk_episode(&g);

    let episodes = series.get_objects("episodes").unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0], episode);

    // removing the link clears both sides atomically
    episode.remove("series").unwrap();
    assert!(series.get_objects("episodes").unwrap().is_empty());
    assert!(episode.get("series").is_none());
}

#[test]
fn test_implicit_properties_are_read_only() {
    media_ontology();
    let g = Graph::new();
    let (series, episode) = monk_episode(&g);

    let err = series.set("episodes", vec![episode]).unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));
}

#[test]
fn test_failed_creation_deletes_the_fresh_node() {
    media_ontology();
    let g = Graph::new();

    // missing the required 'series'/'season'/'number' properties
    let err = g
        .create_object("Episode", [("title", "orphan")])
        .unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));
    assert_eq!(g.node_count(), 0);
}

#[test]
fn test_failed_creation_keeps_preexisting_dependencies() {
    media_ontology();
    let g = Graph::new();
    let series = g.create_object("Series", [("title", "Monk")]).unwrap();

    let err = g
        .create_object("Episode", [("series", PropValue::from(&series))])
        .unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));

    // only the episode node was rolled back, and the series lost the
    // half-made reverse link
    assert_eq!(g.node_count(), 1);
    assert!(series.get_objects("episodes").unwrap().is_empty());
}

#[test]
fn test_incomplete_creation_is_allowed_when_requested() {
    media_ontology();
    let g = Graph::new();
    let episode = g
        .create_object_incomplete("Episode", [("season", 1i64)])
        .unwrap();
    assert_eq!(episode.get_literal("season").unwrap(), Literal::from(1i64));

    // mistyped values are still rejected, before any node is created
    let before = g.node_count();
    let err = g
        .create_object_incomplete("Episode", [("season", true)])
        .unwrap_err();
    assert!(matches!(err, MorphError::TypeMismatch(_)));
    assert_eq!(g.node_count(), before);
}

#[test]
fn test_type_checking_and_conversion() {
    media_ontology();
    let g = Graph::new();
    let (_, episode) = monk_episode(&g);

    // text auto-converts to the declared numeric type
    episode.set("season", "3").unwrap();
    assert_eq!(episode.get_literal("season").unwrap(), Literal::from(3i64));

    let err = episode.set("season", "not a number").unwrap_err();
    assert!(matches!(err, MorphError::TypeMismatch(_)));

    let err = episode.set("season", true).unwrap_err();
    assert!(matches!(err, MorphError::TypeMismatch(_)));
}

#[test]
fn test_converters_produce_extension_literals() {
    media_ontology();
    let g = Graph::new();
    let (_, episode) = monk_episode(&g);
    let video = g.wrap_node_incomplete("Video", episode.node_id()).unwrap();

    let subtitle = g
        .create_object(
            "Subtitle",
            [
                ("video", PropValue::from(&video)),
                ("language", PropValue::from("EN ")),
            ],
        )
        .unwrap();
    assert_eq!(
        subtitle.get_literal("language").unwrap(),
        Literal::custom("language", "en")
    );

    // one-to-one reverse resolves to a single object
    let back = video.get_object("subtitle").unwrap();
    assert_eq!(back.node_id(), subtitle.node_id());
}

#[test]
fn test_setting_a_singular_relation_replaces_the_link() {
    media_ontology();
    let g = Graph::new();
    let (monk, episode) = monk_episode(&g);
    let psych = g.create_object("Series", [("title", "Psych")]).unwrap();

    episode.set("series", &psych).unwrap();

    assert!(monk.get_objects("episodes").unwrap().is_empty());
    let episodes = psych.get_objects("episodes").unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(
        episode.get_object("series").unwrap().node_id(),
        psych.node_id()
    );
}

#[test]
fn test_unique_import_idempotence_end_to_end() {
    media_ontology();

    // initial import
    let tmp1 = Graph::new();
    let (_, ep1) = monk_episode(&tmp1);
    let file1 = tmp1
        .create_object("File", [("filename", "monk_1x01.avi")])
        .unwrap();
    let video1 = tmp1.wrap_node_incomplete("Video", ep1.node_id()).unwrap();
    video1.append("files", &file1).unwrap();

    let collection = Graph::new();
    collection.add_object(&ep1, Match::Unique).unwrap();
    assert_eq!(collection.find_all(Some("Episode"), &[]).unwrap().len(), 1);
    assert_eq!(collection.find_all(Some("Series"), &[]).unwrap().len(), 1);
    assert_eq!(collection.find_all(Some("File"), &[]).unwrap().len(), 1);

    // second import: the same objects built from scratch
    let tmp2 = Graph::new();
    let (_, ep2) = monk_episode(&tmp2);
    let file2 = tmp2
        .create_object("File", [("filename", "monk_1x01.avi")])
        .unwrap();
    let video2 = tmp2.wrap_node_incomplete("Video", ep2.node_id()).unwrap();
    video2.append("files", &file2).unwrap();

    collection.add_object(&ep2, Match::Unique).unwrap();
    collection.add_object(&file2, Match::Unique).unwrap();

    assert_eq!(collection.find_all(Some("Episode"), &[]).unwrap().len(), 1);
    assert_eq!(collection.find_all(Some("Series"), &[]).unwrap().len(), 1);
    assert_eq!(collection.find_all(Some("File"), &[]).unwrap().len(), 1);
}

#[test]
fn test_records_roundtrip_preserves_structure() {
    media_ontology();
    let g = Graph::new();
    let (series, episode) = monk_episode(&g);

    let records = g.to_records();
    let restored = Graph::from_records(&records).unwrap();

    assert_eq!(restored.node_count(), g.node_count());
    assert_eq!(restored.to_records(), records);

    // identity-equivalence: same classes, same literals, same edges
    let restored_series = restored.find_one(Some("Series"), &[]).unwrap();
    assert_eq!(
        restored_series.get_literal("title").unwrap(),
        series.get_literal("title").unwrap()
    );
    let restored_episodes = restored_series.get_objects("episodes").unwrap();
    assert_eq!(restored_episodes.len(), 1);
    assert_eq!(
        restored_episodes[0].get_literal("title").unwrap(),
        episode.get_literal("title").unwrap()
    );
}

#[test]
fn test_dynamic_graph_membership() {
    media_ontology();
    let g = Graph::new_dynamic();

    let node = g
        .create_node(
            vec![("title".to_string(), Literal::from("Monk"))],
            Vec::<String>::new(),
        )
        .unwrap();

    // membership was derived, not assigned
    assert!(g.is_instance(node, "Series").unwrap());
    assert!(g.is_instance(node, ROOT_CLASS).unwrap());

    let series = g.wrap_node("Series", node).unwrap();
    series.set("title", "Psych").unwrap();
    assert!(g.is_instance(node, "Series").unwrap());
}

#[test]
fn test_virtual_class_promotion() {
    media_ontology();
    let g = Graph::new();
    let (_, episode) = monk_episode(&g);

    let video = g.wrap_node_incomplete("Video", episode.node_id()).unwrap();
    assert_eq!(video.class_name(), "Video");
    assert_eq!(video.virtual_class(), "Episode");
    assert_eq!(video.to_virtual().unwrap().class_name(), "Episode");
}

#[test]
fn test_display_renders_nested_objects() {
    media_ontology();
    let g = Graph::new();
    let (_, episode) = monk_episode(&g);

    let rendered = episode.to_string();
    assert!(rendered.starts_with("Episode("));
    assert!(rendered.contains("series=Series(title=Monk)"));
    assert!(rendered.contains("season=1"));

    let fancy = episode.display_string();
    assert!(fancy.starts_with("Episode {"));
    assert!(fancy.contains("season: 1"));
}

#[test]
fn test_follow_paths() {
    media_ontology();
    let g = Graph::new();
    let (series, episode) = monk_episode(&g);

    let titles = episode.follow("series.title");
    assert_eq!(titles, vec![PropValue::from("Monk")]);

    // branches through the collection side as well
    let seasons = series.follow("episodes.season");
    assert_eq!(seasons, vec![PropValue::from(1i64)]);

    assert!(episode.follow("series.nope").is_empty());
    assert!(episode.follow("nope.title").is_empty());
}

#[test]
fn test_ontology_snapshot_isolation() {
    media_ontology();
    ontology::save_snapshot("media");

    ontology::clear();
    assert!(!ontology::is_registered("Episode"));

    ontology::restore_snapshot("media").unwrap();
    assert!(ontology::is_registered("Episode"));
    assert_eq!(
        ontology::get_class("Episode")
            .unwrap()
            .schema()
            .relation("series"),
        Some(RelationKind::OrderedManyToOne)
    );
}

// =========================================================================
// Property-based tests
// =========================================================================

/// Strategy for generating arbitrary Literal instances that roundtrip
/// through JSON. Uses integer-representable floats to avoid precision
/// issues.
fn arb_literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,24}".prop_map(Literal::Text),
        any::<i64>().prop_map(Literal::Int),
        any::<i32>().prop_map(|i| Literal::Float(f64::from(i))),
        any::<bool>().prop_map(Literal::Bool),
        ("[a-z]{1,8}", "[a-z]{0,16}").prop_map(|(t, v)| Literal::custom(t, v)),
    ]
}

proptest! {
    #[test]
    fn test_literal_json_roundtrip(literal in arb_literal()) {
        let json = serde_json::to_string(&literal).unwrap();
        let back: Literal = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, literal);
    }

    #[test]
    fn test_literal_type_always_matches_own_value(literal in arb_literal()) {
        prop_assert!(literal.literal_type().matches(&literal));
    }
}
