//! The query surface: linear scans with predicate and property-path
//! filters.

use common_config::QueryConfig;
use common_error::{MorphError, MorphResult};

use crate::graph::Graph;
use crate::ontology::{self, ROOT_CLASS};
use crate::types::Literal;

use super::{Object, PropValue};

impl Graph {
    /// Find all objects of a class (any class when `None`) whose
    /// properties match the given filters.
    ///
    /// Filter keys are dotted property paths (`"series.title"`) resolved
    /// by repeated property lookup; a missing intermediate property
    /// short-circuits to "no match".
    pub fn find_all(
        &self,
        class: Option<&str>,
        filters: &[(&str, PropValue)],
    ) -> MorphResult<Vec<Object>> {
        self.find_all_filtered(class, |_| true, filters, &QueryConfig::default())
    }

    /// [`Graph::find_all`] with an additional predicate and explicit query
    /// configuration.
    pub fn find_all_filtered(
        &self,
        class: Option<&str>,
        predicate: impl Fn(&Object) -> bool,
        filters: &[(&str, PropValue)],
        config: &QueryConfig,
    ) -> MorphResult<Vec<Object>> {
        let (wrap_class, ids) = match class {
            Some(c) => {
                ontology::get_class(c)?;
                (c, self.nodes_of_class(c))
            }
            None => (ROOT_CLASS, self.node_ids()),
        };

        let mut results = Vec::new();
        for id in ids {
            let object = self.wrap_node_incomplete(wrap_class, id)?;
            if !predicate(&object) {
                continue;
            }
            let matches = filters.iter().all(|(path, expected)| {
                let parts: Vec<&str> = path.split('.').collect();
                follow_values(&object, &parts)
                    .iter()
                    .any(|found| values_match(found, expected, config))
            });
            if matches {
                results.push(object);
            }
        }
        Ok(results)
    }

    /// Find a single matching object, or fail with a not-found error.
    pub fn find_one(
        &self,
        class: Option<&str>,
        filters: &[(&str, PropValue)],
    ) -> MorphResult<Object> {
        self.find_all(class, filters)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                MorphError::node_not_found(format!(
                    "could not find a {} matching the given properties",
                    class.unwrap_or("node")
                ))
            })
    }

    /// Find an object of a class matching the given properties, or create
    /// one from them.
    pub fn find_or_create(&self, class: &str, props: &[(&str, PropValue)]) -> MorphResult<Object> {
        match self.find_one(Some(class), props) {
            Ok(found) => Ok(found),
            Err(MorphError::NodeNotFound(_)) => {
                self.create_object(class, props.iter().map(|(k, v)| (*k, v.clone())))
            }
            Err(err) => Err(err),
        }
    }
}

impl Object {
    /// All values reachable by following a dotted property path from this
    /// object, branching through collection properties. Empty when any
    /// intermediate property is missing.
    pub fn follow(&self, path: &str) -> Vec<PropValue> {
        let parts: Vec<&str> = path.split('.').collect();
        follow_values(self, &parts)
    }
}

/// All terminal values reachable by following a property path, branching
/// through collection properties. Empty when any intermediate is missing.
fn follow_values(object: &Object, parts: &[&str]) -> Vec<PropValue> {
    let Some((first, rest)) = parts.split_first() else {
        return Vec::new();
    };
    let Some(value) = object.get(first) else {
        return Vec::new();
    };
    if rest.is_empty() {
        return vec![value];
    }
    match value {
        PropValue::Literal(_) => Vec::new(),
        PropValue::One(o) => follow_values(&o, rest),
        PropValue::Many(os) => os.iter().flat_map(|o| follow_values(o, rest)).collect(),
    }
}

fn values_match(found: &PropValue, expected: &PropValue, config: &QueryConfig) -> bool {
    match (found, expected) {
        (PropValue::Literal(Literal::Text(a)), PropValue::Literal(Literal::Text(b)))
            if config.case_insensitive =>
        {
            a.eq_ignore_ascii_case(b)
        }
        _ => found == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{media_ontology, monk_episode};

    #[test]
    fn test_find_all_by_class() {
        media_ontology();
        let g = Graph::new();
        monk_episode(&g);

        assert_eq!(g.find_all(Some("Series"), &[]).unwrap().len(), 1);
        assert_eq!(g.find_all(Some("Episode"), &[]).unwrap().len(), 1);
        assert!(g.find_all(None, &[]).unwrap().len() >= 2);
    }

    #[test]
    fn test_find_all_with_property_filter() {
        media_ontology();
        let g = Graph::new();
        monk_episode(&g);
        g.create_object("Series", [("title", "Psych")]).unwrap();

        let found = g
            .find_all(Some("Series"), &[("title", PropValue::from("Monk"))])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].get_literal("title").unwrap(),
            Literal::from("Monk")
        );
    }

    #[test]
    fn test_find_all_with_dotted_path() {
        media_ontology();
        let g = Graph::new();
        monk_episode(&g);

        let found = g
            .find_all(
                Some("Episode"),
                &[("series.title", PropValue::from("Monk"))],
            )
            .unwrap();
        assert_eq!(found.len(), 1);

        let none = g
            .find_all(
                Some("Episode"),
                &[("series.title", PropValue::from("Psych"))],
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_missing_intermediate_short_circuits() {
        media_ontology();
        let g = Graph::new();
        g.create_object("Series", [("title", "Monk")]).unwrap();

        // Series has no 'series' property at all
        let found = g
            .find_all(
                Some("Series"),
                &[("series.title", PropValue::from("Monk"))],
            )
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_find_all_with_predicate() {
        media_ontology();
        let g = Graph::new();
        let (_, episode) = monk_episode(&g);

        let found = g
            .find_all_filtered(
                Some("Episode"),
                |e| e.get_literal("season").is_ok_and(|s| s == Literal::from(1i64)),
                &[],
                &QueryConfig::default(),
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], episode);
    }

    #[test]
    fn test_case_insensitive_matching() {
        media_ontology();
        let g = Graph::new();
        monk_episode(&g);

        let config = QueryConfig {
            case_insensitive: true,
        };
        let found = g
            .find_all_filtered(
                Some("Series"),
                |_| true,
                &[("title", PropValue::from("monk"))],
                &config,
            )
            .unwrap();
        assert_eq!(found.len(), 1);

        let exact = g
            .find_all(Some("Series"), &[("title", PropValue::from("monk"))])
            .unwrap();
        assert!(exact.is_empty());
    }

    #[test]
    fn test_find_one_errors_when_absent() {
        media_ontology();
        let g = Graph::new();
        let err = g.find_one(Some("Series"), &[]).unwrap_err();
        assert!(matches!(err, MorphError::NodeNotFound(_)));
    }

    #[test]
    fn test_find_or_create() {
        media_ontology();
        let g = Graph::new();

        let created = g
            .find_or_create("Series", &[("title", PropValue::from("Monk"))])
            .unwrap();
        assert_eq!(g.find_all(Some("Series"), &[]).unwrap().len(), 1);

        let found = g
            .find_or_create("Series", &[("title", PropValue::from("Monk"))])
            .unwrap();
        assert_eq!(created, found);
        assert_eq!(g.find_all(Some("Series"), &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_filter_by_object_value() {
        media_ontology();
        let g = Graph::new();
        let (series, _) = monk_episode(&g);

        let found = g
            .find_all(Some("Episode"), &[("series", PropValue::from(&series))])
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
