//! The class registry and its registration algorithm.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use common_error::{MorphError, MorphResult};

use crate::graph::GraphData;
use crate::types::{ClassName, LiteralType, PropertyKey, PropertyType};

use super::{ClassDef, ClassDefBuilder, RelationKind, ReverseName, ROOT_CLASS};

/// Snapshot of the registry's class state, stored under a tag.
#[derive(Debug, Clone)]
struct Snapshot {
    classes: BTreeMap<ClassName, ClassDef>,
    literal_types: BTreeSet<String>,
}

/// Process-wide table of registered classes.
///
/// Holds the classes, an explicit children-of-class index for subclass
/// sweeps, the registered extension literal types, named snapshots, and
/// non-owning references to every live graph (so that registering a class
/// can revalidate dynamic graphs synchronously).
#[derive(Debug, Default)]
pub(crate) struct Registry {
    classes: BTreeMap<ClassName, ClassDef>,
    children: BTreeMap<ClassName, BTreeSet<ClassName>>,
    literal_types: BTreeSet<String>,
    snapshots: BTreeMap<String, Snapshot>,
    graphs: Vec<Weak<RefCell<GraphData>>>,
}

impl Registry {
    /// Fresh registry containing only the root class, with the pristine
    /// state saved under the `origin` snapshot tag.
    pub(crate) fn bootstrap() -> Self {
        let mut registry = Self::default();
        registry.classes.insert(
            ROOT_CLASS.to_string(),
            ClassDef {
                name: ROOT_CLASS.to_string(),
                parent: None,
                schema: super::Schema::empty(),
                reverse_lookup: BTreeMap::new(),
                valid: BTreeSet::new(),
                unique: BTreeSet::new(),
                display_order: Vec::new(),
                converters: BTreeMap::new(),
            },
        );
        registry.rebuild_children();
        registry.save_snapshot(super::ORIGIN_SNAPSHOT);
        registry
    }

    pub(crate) fn get(&self, name: &str) -> MorphResult<ClassDef> {
        self.classes.get(name).cloned().ok_or_else(|| {
            MorphError::class_not_found(format!("class '{name}' has not been registered"))
        })
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub(crate) fn class_names(&self) -> Vec<ClassName> {
        self.classes.keys().cloned().collect()
    }

    pub(crate) fn class_defs(&self) -> Vec<ClassDef> {
        self.classes.values().cloned().collect()
    }

    /// `name` and all of its transitive subclasses, via the children index.
    pub(crate) fn subclasses(&self, name: &str) -> MorphResult<Vec<ClassName>> {
        if !self.classes.contains_key(name) {
            return Err(MorphError::class_not_found(format!(
                "class '{name}' has not been registered"
            )));
        }
        Ok(subclasses_in(&self.children, name))
    }

    /// `name` and all of its ancestors, up to the root class.
    pub(crate) fn parent_classes(&self, name: &str) -> MorphResult<Vec<ClassName>> {
        let mut chain = Vec::new();
        let mut current = self.get(name)?;
        chain.push(current.name.clone());
        while let Some(parent) = current.parent.clone() {
            current = self.get(&parent)?;
            chain.push(parent);
        }
        Ok(chain)
    }

    pub(crate) fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return self.classes.contains_key(sub);
        }
        let mut current = sub.to_string();
        while let Some(def) = self.classes.get(&current) {
            match &def.parent {
                Some(parent) if parent == sup => return true,
                Some(parent) => current = parent.clone(),
                None => return false,
            }
        }
        false
    }

    pub(crate) fn register_literal_type(&mut self, name: &str) {
        self.literal_types.insert(name.to_string());
    }

    pub(crate) fn literal_type_registered(&self, name: &str) -> bool {
        self.literal_types.contains(name)
    }

    pub(crate) fn save_snapshot(&mut self, tag: &str) {
        log::info!("saving current ontology as '{tag}'");
        self.snapshots.insert(
            tag.to_string(),
            Snapshot {
                classes: self.classes.clone(),
                literal_types: self.literal_types.clone(),
            },
        );
    }

    pub(crate) fn restore_snapshot(&mut self, tag: &str) -> MorphResult<()> {
        let snapshot = self.snapshots.get(tag).cloned().ok_or_else(|| {
            MorphError::SnapshotNotFound(format!("no ontology snapshot named '{tag}'"))
        })?;
        log::info!("restoring ontology snapshot '{tag}'");
        self.classes = snapshot.classes;
        self.literal_types = snapshot.literal_types;
        self.rebuild_children();
        Ok(())
    }

    pub(crate) fn register_graph(&mut self, graph: Weak<RefCell<GraphData>>) {
        self.graphs.retain(|g| g.strong_count() > 0);
        self.graphs.push(graph);
    }

    /// Strong handles to every graph still alive, pruning the dead ones.
    pub(crate) fn live_graphs(&mut self) -> Vec<Rc<RefCell<GraphData>>> {
        self.graphs.retain(|g| g.strong_count() > 0);
        self.graphs.iter().filter_map(Weak::upgrade).collect()
    }

    fn rebuild_children(&mut self) {
        self.children.clear();
        for def in self.classes.values() {
            self.children.entry(def.name.clone()).or_default();
            if let Some(parent) = &def.parent {
                self.children
                    .entry(parent.clone())
                    .or_default()
                    .insert(def.name.clone());
            }
        }
    }

    /// Validate a class definition and commit it.
    ///
    /// All checks and the implicit-property injection run against a staged
    /// copy of the class table; the registry is only replaced on success,
    /// so a failed registration leaves it untouched. Returns `false` when
    /// the class name was already registered (the definition is ignored).
    pub(crate) fn register(&mut self, decl: ClassDefBuilder) -> MorphResult<bool> {
        let name = decl.name.clone();
        if name.is_empty() {
            return Err(MorphError::schema_definition("class name must not be empty"));
        }
        if self.classes.contains_key(&name) {
            log::warn!("ignoring redefinition of already registered class '{name}'");
            return Ok(false);
        }
        if !decl.extra_parents.is_empty() {
            return Err(MorphError::schema_definition(format!(
                "'{name}' declares multiple parent classes ('{}', '{}'): \
                 single inheritance only",
                decl.parent.as_deref().unwrap_or(ROOT_CLASS),
                decl.extra_parents.join("', '"),
            )));
        }

        let parent_name = decl
            .parent
            .clone()
            .unwrap_or_else(|| ROOT_CLASS.to_string());
        let mut staged = self.classes.clone();
        let parent = staged.get(&parent_name).cloned().ok_or_else(|| {
            MorphError::schema_definition(format!(
                "'{name}': parent class '{parent_name}' is not registered"
            ))
        })?;

        // Merge: parent schema (already carrying the parent's implicit
        // properties and relations) overlaid with the declared one.
        let mut schema = parent.schema.clone();
        for (prop, prop_type) in &decl.schema {
            if schema.insert_declared(prop.clone(), prop_type.clone()) {
                log::warn!("'{name}' redefines inherited property '{prop}'");
            }
        }
        let mut reverse_lookup = parent.reverse_lookup.clone();
        for (prop, rev) in &decl.reverse_lookup {
            reverse_lookup.insert(prop.clone(), rev.clone());
        }

        // Validate property types and classify relation kinds.
        let entries: Vec<(PropertyKey, PropertyType)> = schema
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (prop, prop_type) in &entries {
            match prop_type {
                PropertyType::Literal(LiteralType::Custom(type_name)) => {
                    if !self.literal_types.contains(type_name) {
                        return Err(MorphError::schema_definition(format!(
                            "in '{name}': property '{prop}' uses unregistered \
                             literal type '{type_name}'"
                        )));
                    }
                }
                PropertyType::Literal(_) => {}
                reference => {
                    let target = reference.target_class().unwrap_or_default();
                    if target != name && !staged.contains_key(target) {
                        return Err(MorphError::schema_definition(format!(
                            "in '{name}': property '{prop}' references \
                             unregistered class '{target}'"
                        )));
                    }
                }
            }
            if !schema.is_implicit(prop) {
                if let Some(kind) =
                    RelationKind::classify(&name, prop, prop_type, reverse_lookup.get(prop))?
                {
                    schema.set_relation(prop.clone(), kind);
                }
            }
        }

        // Every non-implicit reference property needs exactly one reverse
        // name, and vice versa.
        let object_props: BTreeSet<PropertyKey> = entries
            .iter()
            .filter(|(p, t)| t.is_reference() && !schema.is_implicit(p))
            .map(|(p, _)| p.clone())
            .collect();
        let reverse_keys: BTreeSet<PropertyKey> = reverse_lookup
            .keys()
            .filter(|p| !schema.is_implicit(p))
            .cloned()
            .collect();
        let diff: Vec<PropertyKey> = object_props
            .symmetric_difference(&reverse_keys)
            .cloned()
            .collect();
        if !diff.is_empty() {
            return Err(MorphError::schema_definition(format!(
                "in '{name}': exactly one reverse name is required for each \
                 reference property in the schema; mismatched: '{}'",
                diff.join("', '"),
            )));
        }

        // Stage the new class so the injection sweep below also reaches it
        // when it is itself a subclass of a referenced class.
        staged.insert(
            name.clone(),
            ClassDef {
                name: name.clone(),
                parent: Some(parent_name.clone()),
                schema,
                reverse_lookup,
                valid: decl.valid,
                unique: decl.unique,
                display_order: decl.display_order,
                converters: decl.converters,
            },
        );
        let staged_children = children_index(&staged);

        // Inject each declared reverse as an implicit property of the
        // referenced class and every currently-registered subclass of it.
        for (prop, rev) in &decl.reverse_lookup {
            let (forward_type, forward_kind) = {
                let def = &staged[&name];
                let Some(t) = def.schema.get(prop).cloned() else {
                    continue; // caught by the symmetric-difference check
                };
                let Some(kind) = def.schema.relation(prop) else {
                    continue;
                };
                (t, kind)
            };
            let Some(target) = forward_type.target_class().map(str::to_string) else {
                continue;
            };
            let implicit_name = rev.name().to_string();
            let implicit_type = rev.implicit_type(&name);
            let reciprocal = forward_kind.reciprocal();
            let back_reverse = match &forward_type {
                PropertyType::Object(_) => ReverseName::one(prop.clone()),
                PropertyType::OrderedList(_) => ReverseName::ordered_many(prop.clone()),
                PropertyType::UnorderedSet(_) => ReverseName::unordered_many(prop.clone()),
                PropertyType::Literal(_) => continue,
            };

            for class_name in subclasses_in(&staged_children, &target) {
                let Some(def) = staged.get_mut(&class_name) else {
                    continue;
                };
                if def.schema.contains(&implicit_name) && !def.schema.is_implicit(&implicit_name)
                {
                    return Err(MorphError::schema_definition(format!(
                        "in '{name}': reverse name '{implicit_name}' for property \
                         '{prop}' conflicts with an explicit property of class \
                         '{class_name}'"
                    )));
                }
                def.schema.insert_implicit(
                    implicit_name.clone(),
                    implicit_type.clone(),
                    reciprocal,
                );
                def.reverse_lookup
                    .insert(implicit_name.clone(), back_reverse.clone());
            }
        }

        // valid/unique/display_order constraints, on the post-injection
        // schema. `unique` defaults to `valid` eagerly, once, here.
        {
            let def = staged
                .get_mut(&name)
                .ok_or_else(|| MorphError::internal("staged class disappeared"))?;
            for prop in &def.valid {
                if !def.schema.contains(prop) {
                    return Err(MorphError::schema_definition(format!(
                        "in '{name}': 'valid' uses '{prop}', which is not in the schema"
                    )));
                }
            }
            if !def.valid.is_superset(&parent.valid) {
                return Err(MorphError::schema_definition(format!(
                    "in '{name}': 'valid' must be a superset of parent '{parent_name}''s"
                )));
            }
            for prop in &def.unique {
                if !def.schema.contains(prop) {
                    return Err(MorphError::schema_definition(format!(
                        "in '{name}': 'unique' uses '{prop}', which is not in the schema"
                    )));
                }
            }
            if !def.unique.is_superset(&parent.unique) {
                return Err(MorphError::schema_definition(format!(
                    "in '{name}': 'unique' must be a superset of parent '{parent_name}''s"
                )));
            }
            if def.unique.is_empty() {
                def.unique = def.valid.clone();
            }
            for prop in &def.display_order {
                if !def.schema.contains(prop) {
                    return Err(MorphError::schema_definition(format!(
                        "in '{name}': 'display_order' uses '{prop}', which is not \
                         in the schema"
                    )));
                }
            }
            for prop in def.converters.keys() {
                if !def.schema.contains(prop) {
                    return Err(MorphError::schema_definition(format!(
                        "in '{name}': converter declared for unknown property '{prop}'"
                    )));
                }
            }
        }

        self.classes = staged;
        self.rebuild_children();
        log::info!("registered ontology class '{name}'");
        Ok(true)
    }
}

/// `name` plus all transitive subclasses, from a children index.
fn subclasses_in(children: &BTreeMap<ClassName, BTreeSet<ClassName>>, name: &str) -> Vec<ClassName> {
    let mut result = vec![name.to_string()];
    let mut queue = vec![name.to_string()];
    while let Some(current) = queue.pop() {
        if let Some(kids) = children.get(&current) {
            for kid in kids {
                result.push(kid.clone());
                queue.push(kid.clone());
            }
        }
    }
    result
}

fn children_index(
    classes: &BTreeMap<ClassName, ClassDef>,
) -> BTreeMap<ClassName, BTreeSet<ClassName>> {
    let mut children: BTreeMap<ClassName, BTreeSet<ClassName>> = BTreeMap::new();
    for def in classes.values() {
        children.entry(def.name.clone()).or_default();
        if let Some(parent) = &def.parent {
            children
                .entry(parent.clone())
                .or_default()
                .insert(def.name.clone());
        }
    }
    children
}
