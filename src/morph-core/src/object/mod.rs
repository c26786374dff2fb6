//! The typed view: class-constrained access to one node.
//!
//! An [`Object`] binds a registered class to exactly one node and
//! translates typed get/set calls into node-level literal and edge
//! operations, enforcing schema type checking on the way in. Any number of
//! views, of possibly different classes, can wrap the same node.

mod query;
mod value;

use std::collections::BTreeSet;

use common_error::{MorphError, MorphResult};

use crate::graph::{Graph, NodeId};
use crate::merge;
use crate::ontology::{self, ClassDef, ROOT_CLASS};
use crate::types::{ClassName, Literal, LiteralType, PropertyKey, PropertyType};

pub use value::PropValue;

/// A class-constrained accessor bound to one node.
///
/// Equality is node identity; use [`Object::same_value`] for structural
/// comparison.
#[derive(Debug, Clone)]
pub struct Object {
    class: ClassName,
    graph: Graph,
    node: NodeId,
}

impl Graph {
    /// Create a typed object in this graph from key/value properties.
    ///
    /// Values are type-checked and converted against the class schema;
    /// reference values are linked with their reverse names. If the
    /// resulting node does not satisfy the class's `valid` set, it is
    /// deleted again and a validation error is returned.
    pub fn create_object<I, K, V>(&self, class: &str, props: I) -> MorphResult<Object>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<PropValue>,
    {
        self.create_object_with(class, props, false)
    }

    /// Like [`Graph::create_object`], but tolerating missing `valid`
    /// properties: only the required properties actually present must
    /// satisfy their declared types.
    pub fn create_object_incomplete<I, K, V>(&self, class: &str, props: I) -> MorphResult<Object>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<PropValue>,
    {
        self.create_object_with(class, props, true)
    }

    fn create_object_with<I, K, V>(
        &self,
        class: &str,
        props: I,
        allow_incomplete: bool,
    ) -> MorphResult<Object>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<PropValue>,
    {
        let def = ontology::get_class(class)?;

        let mut literals: Vec<(PropertyKey, Literal)> = Vec::new();
        let mut links: Vec<(PropertyKey, Vec<NodeId>, String)> = Vec::new();
        for (name, value) in props {
            let name = name.into();
            if def.schema().is_implicit(&name) {
                return Err(MorphError::validation(format!(
                    "implicit properties are read-only ({class}.{name})"
                )));
            }
            match check_value(self, &def, &name, value.into())? {
                PropValue::Literal(l) => literals.push((name, l)),
                PropValue::One(o) => {
                    let reverse = def.reverse_name(&name);
                    links.push((name, vec![o.node_id()], reverse));
                }
                PropValue::Many(os) => {
                    let reverse = def.reverse_name(&name);
                    let targets = os.iter().map(Object::node_id).collect();
                    links.push((name, targets, reverse));
                }
            }
        }

        let classes: BTreeSet<ClassName> = ontology::parent_classes(class)?.into_iter().collect();
        let node = self.create_node(literals, classes)?;
        for (name, targets, reverse) in &links {
            for &target in targets {
                if let Err(err) = self.add_link_with(node, name, target, reverse, false) {
                    let _ = self.delete_node(node);
                    return Err(err);
                }
            }
        }
        self.update_valid_classes(node)?;
        for (_, targets, _) in &links {
            for &target in targets {
                self.update_valid_classes(target)?;
            }
        }

        let satisfied = if allow_incomplete {
            self.satisfies_present_valid_props(node, &def)?
        } else {
            self.is_valid_instance(node, &def)?
        };
        if !satisfied {
            // Build the message before deleting: unlinking loses context.
            let problems = self.invalid_properties(node, &def)?;
            self.delete_node(node)?;
            return Err(MorphError::validation(format!(
                "cannot create a valid instance of {class}:\n{problems}"
            )));
        }

        log::debug!("created {class} object on node {node}");
        Ok(Object {
            class: class.to_string(),
            graph: self.clone(),
            node,
        })
    }

    /// View an existing node of this graph as an instance of a class.
    ///
    /// Fails when the node does not currently satisfy the class. The node
    /// is never deleted: it existed before this call.
    pub fn wrap_node(&self, class: &str, node: NodeId) -> MorphResult<Object> {
        let def = ontology::get_class(class)?;
        if !self.contains(node) {
            return Err(MorphError::node_not_found(format!(
                "node {node} is not in this graph"
            )));
        }
        if !self.is_instance(node, class)? {
            let problems = self.invalid_properties(node, &def)?;
            return Err(MorphError::validation(format!(
                "node {node} is not a valid instance of {class}:\n{problems}"
            )));
        }
        Ok(Object {
            class: class.to_string(),
            graph: self.clone(),
            node,
        })
    }

    /// View an existing node as an instance of a class without checking
    /// class membership.
    pub fn wrap_node_incomplete(&self, class: &str, node: NodeId) -> MorphResult<Object> {
        ontology::get_class(class)?;
        if !self.contains(node) {
            return Err(MorphError::node_not_found(format!(
                "node {node} is not in this graph"
            )));
        }
        Ok(Object {
            class: class.to_string(),
            graph: self.clone(),
            node,
        })
    }
}

impl Object {
    /// The class this view reads the node through.
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// The wrapped node.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The graph owning the wrapped node.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn def(&self) -> MorphResult<ClassDef> {
        ontology::get_class(&self.class)
    }

    /// Get a property, or `None` when it is not set.
    ///
    /// A literal property comes back as a literal; a reference property
    /// resolves to one or many further views, singular or collection
    /// according to the schema's relation kind, wrapped in the schema's
    /// declared target class.
    pub fn get(&self, name: &str) -> Option<PropValue> {
        if let Ok(value) = self.graph.literal(self.node, name) {
            return Some(PropValue::Literal(value));
        }
        let is_edge = self
            .graph
            .with_node(self.node, |n| n.is_edge(name))
            .unwrap_or(false);
        if !is_edge {
            return None;
        }
        let endpoints = self.graph.edge_endpoints(self.node, Some(name)).ok()?;
        let def = self.def().ok()?;
        let target_class = def
            .schema()
            .target_class(name)
            .unwrap_or(ROOT_CLASS)
            .to_string();
        let objects: Vec<Object> = endpoints
            .into_iter()
            .filter_map(|id| self.graph.wrap_node_incomplete(&target_class, id).ok())
            .collect();
        let singular = def
            .schema()
            .relation(name)
            .map(|kind| kind.is_singular())
            .unwrap_or(false);
        if singular {
            objects.into_iter().next().map(PropValue::One)
        } else {
            Some(PropValue::Many(objects))
        }
    }

    /// Get a literal property.
    pub fn get_literal(&self, name: &str) -> MorphResult<Literal> {
        self.graph.literal(self.node, name)
    }

    /// Get a singular reference property.
    pub fn get_object(&self, name: &str) -> MorphResult<Object> {
        match self.get(name) {
            Some(PropValue::One(o)) => Ok(o),
            Some(PropValue::Many(os)) => os.into_iter().next().ok_or_else(|| {
                MorphError::property_not_found(format!("property '{name}' has no value"))
            }),
            Some(PropValue::Literal(_)) => Err(MorphError::type_mismatch(format!(
                "property '{name}' is a literal, not a reference"
            ))),
            None => Err(MorphError::property_not_found(format!(
                "no property '{name}' on this {}",
                self.class
            ))),
        }
    }

    /// Get a collection reference property.
    pub fn get_objects(&self, name: &str) -> MorphResult<Vec<Object>> {
        match self.get(name) {
            Some(PropValue::Many(os)) => Ok(os),
            Some(PropValue::One(o)) => Ok(vec![o]),
            Some(PropValue::Literal(_)) => Err(MorphError::type_mismatch(format!(
                "property '{name}' is a literal, not a reference"
            ))),
            None => Ok(Vec::new()),
        }
    }

    /// Whether the node has the property set.
    pub fn has(&self, name: &str) -> bool {
        self.graph
            .with_node(self.node, |n| n.has_property(name))
            .unwrap_or(false)
    }

    /// All property names currently set on the node.
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.graph.keys(self.node).unwrap_or_default()
    }

    /// Property names set on the node, excluding implicit ones.
    pub fn explicit_keys(&self) -> Vec<PropertyKey> {
        let implicit = self
            .def()
            .map(|def| def.schema().implicit().clone())
            .unwrap_or_default();
        self.keys()
            .into_iter()
            .filter(|k| !implicit.contains(k))
            .collect()
    }

    /// Set a property, revalidating class membership afterwards.
    ///
    /// Implicit (reverse-injected) properties are read-only. Setting a
    /// reference property replaces any previous links under that name.
    pub fn set(&self, name: &str, value: impl Into<PropValue>) -> MorphResult<()> {
        self.apply_set(name, value.into(), true)
    }

    /// Append to a collection reference property.
    pub fn append(&self, name: &str, value: impl Into<PropValue>) -> MorphResult<()> {
        let def = self.def()?;
        if def.schema().is_implicit(name) {
            return Err(MorphError::validation(format!(
                "implicit properties are read-only ({}.{name})",
                self.class
            )));
        }
        let value = check_value(&self.graph, &def, name, value.into())?;
        let targets = match value {
            PropValue::Literal(_) => {
                return Err(MorphError::type_mismatch(format!(
                    "cannot append a literal to property '{name}'"
                )))
            }
            PropValue::One(o) => vec![o.node_id()],
            PropValue::Many(os) => os.iter().map(Object::node_id).collect(),
        };
        let reverse = def.reverse_name(name);
        for target in &targets {
            self.graph
                .add_link_with(self.node, name, *target, &reverse, false)?;
        }
        self.revalidate_after_link_change(&targets)
    }

    /// Bulk-update properties, revalidating class membership once at the
    /// end.
    pub fn update<I, K, V>(&self, props: I) -> MorphResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<PropValue>,
    {
        for (name, value) in props {
            let name: PropertyKey = name.into();
            self.apply_set(&name, value.into(), false)?;
        }
        self.graph.update_valid_classes(self.node)
    }

    /// Remove a property: a literal is dropped, a reference property is
    /// unlinked on both sides.
    pub fn remove(&self, name: &str) -> MorphResult<()> {
        let def = self.def()?;
        if def.schema().is_implicit(name) {
            return Err(MorphError::validation(format!(
                "implicit properties are read-only ({}.{name})",
                self.class
            )));
        }
        let is_edge = self.graph.with_node(self.node, |n| n.is_edge(name))?;
        if is_edge {
            let old = self.unlink_all(name, &def)?;
            self.revalidate_after_link_change(&old)
        } else {
            self.graph.remove_literal(self.node, name)?;
            Ok(())
        }
    }

    fn apply_set(&self, name: &str, value: PropValue, revalidate: bool) -> MorphResult<()> {
        let def = self.def()?;
        if def.schema().is_implicit(name) {
            return Err(MorphError::validation(format!(
                "implicit properties are read-only ({}.{name})",
                self.class
            )));
        }
        let value = check_value(&self.graph, &def, name, value)?;
        let mut touched: Vec<NodeId> = Vec::new();
        match value {
            PropValue::Literal(l) => {
                let is_edge = self.graph.with_node(self.node, |n| n.is_edge(name))?;
                if is_edge {
                    touched.extend(self.unlink_all(name, &def)?);
                }
                self.graph.set_literal_with(self.node, name, l, false)?;
            }
            PropValue::One(o) => {
                touched.extend(self.unlink_all(name, &def)?);
                let reverse = def.reverse_name(name);
                self.graph
                    .add_link_with(self.node, name, o.node_id(), &reverse, false)?;
                touched.push(o.node_id());
            }
            PropValue::Many(os) => {
                touched.extend(self.unlink_all(name, &def)?);
                let reverse = def.reverse_name(name);
                for o in &os {
                    self.graph
                        .add_link_with(self.node, name, o.node_id(), &reverse, false)?;
                    touched.push(o.node_id());
                }
            }
        }
        if revalidate {
            self.graph.update_valid_classes(self.node)?;
            for target in touched {
                self.graph.update_valid_classes(target)?;
            }
        }
        Ok(())
    }

    /// Remove every link under `name`, returning the former endpoints.
    fn unlink_all(&self, name: &str, def: &ClassDef) -> MorphResult<Vec<NodeId>> {
        let old = self.graph.edge_endpoints(self.node, Some(name))?;
        let reverse = def.reverse_name(name);
        for &target in &old {
            self.graph
                .remove_link_with(self.node, name, target, &reverse, false)?;
        }
        Ok(old)
    }

    fn revalidate_after_link_change(&self, targets: &[NodeId]) -> MorphResult<()> {
        self.graph.update_valid_classes(self.node)?;
        for &target in targets {
            self.graph.update_valid_classes(target)?;
        }
        Ok(())
    }

    /// The most specific registered class this node satisfies.
    pub fn virtual_class(&self) -> ClassName {
        let classes = self.graph.node_classes(self.node).unwrap_or_default();
        ontology::most_specific(&classes)
    }

    /// A view of the same node through its most specific class.
    pub fn to_virtual(&self) -> MorphResult<Object> {
        let class = self.virtual_class();
        self.graph.wrap_node_incomplete(&class, self.node)
    }

    /// The values of the class's `unique` properties, `None` for unset
    /// entries.
    pub fn unique_key(&self) -> MorphResult<Vec<Option<PropValue>>> {
        let def = self.def()?;
        Ok(def.unique().iter().map(|p| self.get(p)).collect())
    }

    /// Whether all `unique` properties are set.
    pub fn is_unique(&self) -> MorphResult<bool> {
        let def = self.def()?;
        Ok(def.unique().iter().all(|p| self.has(p)))
    }

    /// Property names in display order: the class's `display_order` hint
    /// first, then the remaining properties.
    pub fn ordered_properties(&self) -> MorphResult<Vec<PropertyKey>> {
        let def = self.def()?;
        let mut names = self.keys();
        let mut ordered = Vec::with_capacity(names.len());
        for hint in def.display_order() {
            if let Some(pos) = names.iter().position(|n| n == hint) {
                ordered.push(names.remove(pos));
            }
        }
        ordered.extend(names);
        Ok(ordered)
    }

    /// Structural equality: explicit properties pairwise equal, recursing
    /// into references. Safe on cyclic graphs.
    pub fn same_value(&self, other: &Object) -> bool {
        merge::structural_equal(
            &self.graph,
            self.node,
            &other.graph,
            other.node,
            &mut std::collections::HashSet::new(),
        )
    }

    fn render(&self, recurse_limit: usize) -> String {
        let Ok(def) = self.def() else {
            return format!("{}(?)", self.class);
        };
        let names = self.ordered_properties().unwrap_or_default();
        let mut parts = Vec::new();
        for name in names {
            // only explicitly declared schema properties are rendered
            if !def.schema().contains(&name) || def.schema().is_implicit(&name) {
                continue;
            }
            let Some(value) = self.get(&name) else {
                continue;
            };
            match value {
                PropValue::Literal(l) => parts.push(format!(
                    "{name}={}",
                    common_display::truncate_string(&l.to_string(), 48)
                )),
                PropValue::One(o) => {
                    if recurse_limit > 0 {
                        parts.push(format!("{name}={}", o.render(recurse_limit - 1)));
                    } else {
                        parts.push(format!("{name}=[...]"));
                    }
                }
                PropValue::Many(os) => {
                    if recurse_limit > 0 {
                        let rendered: Vec<String> =
                            os.iter().map(|o| o.render(recurse_limit - 1)).collect();
                        parts.push(format!("{name}=[{}]", rendered.join(", ")));
                    } else {
                        parts.push(format!("{name}=[...]"));
                    }
                }
            }
        }
        format!("{}({})", self.class, parts.join(", "))
    }

    /// Multi-line rendering with one property per line.
    pub fn display_string(&self) -> String {
        let implicit = self
            .def()
            .map(|def| def.schema().implicit().clone())
            .unwrap_or_default();
        let names = self.ordered_properties().unwrap_or_default();
        let mut lines = Vec::new();
        for name in names {
            if implicit.contains(&name) {
                continue;
            }
            if let Some(value) = self.get(&name) {
                let rendered = match value {
                    PropValue::Literal(l) => l.to_string(),
                    PropValue::One(o) => o.render(1),
                    PropValue::Many(os) => {
                        let rendered: Vec<String> = os.iter().map(|o| o.render(0)).collect();
                        format!("[{}]", rendered.join(", "))
                    }
                };
                lines.push(format!("{name}: {rendered}"));
            }
        }
        format!(
            "{} {{\n{}\n}}",
            self.class,
            common_display::indent(&lines.join("\n"), "    ")
        )
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph && self.node == other.node
    }
}

impl std::fmt::Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(2))
    }
}

/// Check a value against the class schema, applying converters and the
/// text-to-numeric auto-conversion, and normalizing collection shapes.
fn check_value(
    graph: &Graph,
    def: &ClassDef,
    name: &str,
    value: PropValue,
) -> MorphResult<PropValue> {
    // Converter first: it may turn a plain string into an extension type.
    let value = match (&value, def.converter(name)) {
        (PropValue::Literal(Literal::Text(s)), Some(conv)) => PropValue::Literal(conv(s)?),
        _ => value,
    };

    for o in value.objects() {
        if o.graph() != graph {
            return Err(MorphError::graph(format!(
                "value for '{name}' lives in a different graph; import it with \
                 add_object first"
            )));
        }
    }

    let Some(expected) = def.schema().get(name) else {
        // Not constrained by the schema: stored as-is.
        return Ok(value);
    };

    match (expected, value) {
        (PropertyType::Literal(lt), PropValue::Literal(l)) => {
            if lt.matches(&l) {
                return Ok(PropValue::Literal(l));
            }
            // Text auto-converts to the numeric types.
            if let Literal::Text(s) = &l {
                match lt {
                    LiteralType::Int => {
                        if let Ok(i) = s.trim().parse::<i64>() {
                            return Ok(PropValue::Literal(Literal::Int(i)));
                        }
                    }
                    LiteralType::Float => {
                        if let Ok(f) = s.trim().parse::<f64>() {
                            return Ok(PropValue::Literal(Literal::Float(f)));
                        }
                    }
                    _ => {}
                }
            }
            Err(MorphError::type_mismatch(format!(
                "the '{name}' attribute of '{}' is of type '{lt}' but was \
                 assigned a '{}'",
                def.name(),
                l.literal_type()
            )))
        }
        (PropertyType::Object(target), PropValue::One(o)) => {
            check_target(graph, name, &o, target)?;
            Ok(PropValue::One(o))
        }
        (PropertyType::OrderedList(target) | PropertyType::UnorderedSet(target), value) => {
            let objects = match value {
                PropValue::One(o) => vec![o],
                PropValue::Many(os) => os,
                PropValue::Literal(l) => {
                    return Err(MorphError::type_mismatch(format!(
                        "the '{name}' attribute of '{}' is a collection of \
                         '{target}' but was assigned a '{}' literal",
                        def.name(),
                        l.literal_type()
                    )))
                }
            };
            for o in &objects {
                check_target(graph, name, o, target)?;
            }
            Ok(PropValue::Many(objects))
        }
        (expected, value) => Err(MorphError::type_mismatch(format!(
            "the '{name}' attribute of '{}' is of type '{expected}' but was \
             assigned an incompatible {}",
            def.name(),
            match value {
                PropValue::Literal(l) => format!("'{}' literal", l.literal_type()),
                PropValue::One(_) => "object".to_string(),
                PropValue::Many(_) => "collection".to_string(),
            }
        ))),
    }
}

fn check_target(graph: &Graph, name: &str, o: &Object, target: &str) -> MorphResult<()> {
    if target == ROOT_CLASS {
        return Ok(());
    }
    if !graph.is_instance(o.node_id(), target)? {
        return Err(MorphError::type_mismatch(format!(
            "the '{name}' attribute expects an instance of '{target}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{media_ontology, monk_episode};

    #[test]
    fn test_wrap_node_validates_membership() {
        media_ontology();
        let g = Graph::new();
        let (series, _) = monk_episode(&g);

        let wrapped = g.wrap_node("Series", series.node_id()).unwrap();
        assert_eq!(wrapped, series);

        let err = g.wrap_node("Episode", series.node_id()).unwrap_err();
        assert!(matches!(err, MorphError::Validation(_)));
        // the pre-existing node is untouched
        assert!(g.contains(series.node_id()));
    }

    #[test]
    fn test_cross_graph_values_are_rejected() {
        media_ontology();
        let g1 = Graph::new();
        let g2 = Graph::new();
        let series = g1.create_object("Series", [("title", "Monk")]).unwrap();

        let err = g2
            .create_object(
                "Episode",
                [
                    ("series", PropValue::from(&series)),
                    ("season", 1i64.into()),
                    ("number", 1i64.into()),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, MorphError::GraphError(_)));
        assert_eq!(g2.node_count(), 0);
    }

    #[test]
    fn test_get_singular_and_collection() {
        media_ontology();
        let g = Graph::new();
        let (series, episode) = monk_episode(&g);

        // many-to-one resolves to a single view
        match episode.get("series") {
            Some(PropValue::One(o)) => assert_eq!(o.node_id(), series.node_id()),
            other => panic!("expected a singular value, got {other:?}"),
        }
        // one-to-many resolves to a collection
        match series.get("episodes") {
            Some(PropValue::Many(os)) => assert_eq!(os.len(), 1),
            other => panic!("expected a collection, got {other:?}"),
        }
    }

    #[test]
    fn test_unique_key() {
        media_ontology();
        let g = Graph::new();
        let (_, episode) = monk_episode(&g);

        assert!(episode.is_unique().unwrap());
        let key = episode.unique_key().unwrap();
        // unique = {number, season, series}
        assert_eq!(key.len(), 3);
        assert!(key.iter().all(Option::is_some));

        let bare = g.create_object("Series", [("title", "Psych")]).unwrap();
        assert!(bare.is_unique().unwrap());
    }

    #[test]
    fn test_bulk_update() {
        media_ontology();
        let g = Graph::new();
        let (_, episode) = monk_episode(&g);

        episode
            .update([("season", 2i64), ("number", 7i64)])
            .unwrap();
        assert_eq!(episode.get_literal("season").unwrap(), Literal::from(2i64));
        assert_eq!(episode.get_literal("number").unwrap(), Literal::from(7i64));
    }

    #[test]
    fn test_ordered_properties_follow_display_order() {
        media_ontology();
        let g = Graph::new();
        let (_, episode) = monk_episode(&g);

        let ordered = episode.ordered_properties().unwrap();
        let series_pos = ordered.iter().position(|p| p == "series").unwrap();
        let title_pos = ordered.iter().position(|p| p == "title").unwrap();
        assert!(series_pos < title_pos);
    }

    #[test]
    fn test_explicit_keys_exclude_implicit() {
        media_ontology();
        let g = Graph::new();
        let (series, _) = monk_episode(&g);

        assert!(series.keys().contains(&"episodes".to_string()));
        assert!(!series.explicit_keys().contains(&"episodes".to_string()));
    }
}
