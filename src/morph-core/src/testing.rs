//! Testing utilities and fixtures for morph-core.
//!
//! Provides a small media-flavored ontology and graph builders used across
//! unit and integration tests.

use common_error::MorphResult;

use crate::graph::Graph;
use crate::object::{Object, PropValue};
use crate::ontology::{self, ClassDef, ReverseName};
use crate::types::{Literal, LiteralType, PropertyType};

/// Converter turning a plain string into a `language` extension literal.
pub fn str_to_language(s: &str) -> MorphResult<Literal> {
    Ok(Literal::custom("language", s.trim().to_lowercase()))
}

/// Reset the ontology and register the media fixture classes:
/// `File`, `Video` (with ordered `files`), `Series`, `Episode` (a `Video`
/// with a many-to-one `series`), and `Subtitle` (one-to-one `video`, with
/// a `language` extension literal).
pub fn media_ontology() {
    ontology::clear();
    ontology::register_literal_type("language");

    ClassDef::builder("File")
        .property("filename", LiteralType::Text)
        .property("size", LiteralType::Int)
        .valid(["filename"])
        .unique(["filename"])
        .register()
        .unwrap();

    ClassDef::builder("Video")
        .property("files", PropertyType::ordered_list("File"))
        .property("watched", LiteralType::Bool)
        .reverse("files", ReverseName::one("video"))
        .register()
        .unwrap();

    ClassDef::builder("Series")
        .property("title", LiteralType::Text)
        .valid(["title"])
        .unique(["title"])
        .register()
        .unwrap();

    ClassDef::builder("Episode")
        .parent("Video")
        .property("series", PropertyType::object("Series"))
        .property("season", LiteralType::Int)
        .property("number", LiteralType::Int)
        .property("title", LiteralType::Text)
        .reverse("series", ReverseName::ordered_many("episodes"))
        .valid(["series", "season", "number"])
        .display_order(["series", "season", "number", "title"])
        .register()
        .unwrap();

    ClassDef::builder("Subtitle")
        .property("video", PropertyType::object("Video"))
        .property("language", LiteralType::Custom("language".to_string()))
        .reverse("video", ReverseName::one("subtitle"))
        .valid(["video"])
        .unique(["video", "language"])
        .converter("language", str_to_language)
        .register()
        .unwrap();
}

/// Build the standard fixture scenario: the series "Monk" with its first
/// episode. Returns `(series, episode)`.
pub fn monk_episode(graph: &Graph) -> (Object, Object) {
    let series = graph.create_object("Series", [("title", "Monk")]).unwrap();
    let episode = graph
        .create_object(
            "Episode",
            [
                ("series", PropValue::from(&series)),
                ("season", PropValue::from(1i64)),
                ("number", PropValue::from(1i64)),
                ("title", PropValue::from("Mr. Monk and the Candidate")),
            ],
        )
        .unwrap();
    (series, episode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_registers_and_builds() {
        media_ontology();
        assert!(ontology::is_registered("Episode"));

        let g = Graph::new();
        let (series, episode) = monk_episode(&g);
        assert_eq!(
            episode.get_object("series").unwrap().node_id(),
            series.node_id()
        );
    }
}
