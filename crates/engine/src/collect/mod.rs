//! Field collection.
//!
//! Flattens a selection set (and every fragment it references) into the
//! ordered list of response keys to resolve, before any resolver runs.
//! `@skip`/`@include` are not evaluated here; each collected field node
//! carries a [`VisibilityCondition`] that the resolution step checks against
//! the variables.

use async_graphql_parser::{
    types::{Field, Selection, SelectionSet},
    Positioned,
};
use indexmap::IndexMap;

use crate::{
    registry::{MetaType, Registry},
    ServerError, ServerResult, ValidationMode,
};

mod fragments;
mod visibility;

pub use fragments::FragmentIndex;
pub use visibility::VisibilityCondition;

/// One field node reached during collection, with the condition under which
/// it contributes to the response.
#[derive(Debug, Clone)]
pub struct CollectedFieldNode<'a> {
    pub field: &'a Positioned<Field>,
    pub visibility: VisibilityCondition<'a>,
}

/// Everything collected under one response key, in the order the first node
/// appeared. Nodes beyond the first come from duplicate selections of the
/// same field and are merged at resolution time.
#[derive(Debug)]
pub struct FieldSelection<'a> {
    pub response_key: &'a str,
    pub nodes: Vec<CollectedFieldNode<'a>>,
}

impl<'a> FieldSelection<'a> {
    /// The schema field name, identical across all merged nodes.
    pub fn field_name(&self) -> &'a str {
        self.nodes[0].field.node.name.node.as_str()
    }

    pub fn primary(&self) -> &'a Positioned<Field> {
        self.nodes[0].field
    }
}

/// Collect the fields selected on `ty` across `selection_sets`, expanding
/// fragment spreads and inline fragments whose type condition matches.
///
/// Several selection sets come in when a composite field was selected more
/// than once under the same response key.
pub fn collect_fields<'a>(
    registry: &'a Registry,
    fragments: &'a FragmentIndex,
    mode: ValidationMode,
    ty: &'a MetaType,
    selection_sets: &[&'a Positioned<SelectionSet>],
) -> ServerResult<Vec<FieldSelection<'a>>> {
    let mut collector = Collector {
        registry,
        fragments,
        mode,
        ty,
        output: IndexMap::new(),
        spread_stack: Vec::new(),
    };
    for selection_set in selection_sets {
        collector.walk(selection_set, &VisibilityCondition::Visible)?;
    }
    Ok(collector.output.into_values().collect())
}

struct Collector<'a> {
    registry: &'a Registry,
    fragments: &'a FragmentIndex,
    mode: ValidationMode,
    ty: &'a MetaType,
    output: IndexMap<&'a str, FieldSelection<'a>>,
    spread_stack: Vec<&'a str>,
}

impl<'a> Collector<'a> {
    fn walk(
        &mut self,
        selection_set: &'a Positioned<SelectionSet>,
        inherited: &VisibilityCondition<'a>,
    ) -> ServerResult<()> {
        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => self.add_field(field, inherited)?,
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let Some(fragment) = self.fragments.get(name) else {
                        // Lenient mode assumes upstream validation and
                        // contributes nothing for the spread.
                        if self.mode.is_strict() {
                            return Err(ServerError::new(
                                format!("Unknown fragment \"{name}\""),
                                Some(spread.pos),
                            ));
                        }
                        continue;
                    };
                    if self.spread_stack.contains(&name) {
                        return Err(ServerError::new(
                            format!("Cannot spread fragment \"{name}\" within itself"),
                            Some(spread.pos),
                        ));
                    }
                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    if !self.registry.type_condition_matches(self.ty, condition) {
                        continue;
                    }
                    let visibility = inherited
                        .clone()
                        .and(VisibilityCondition::of_directives(&spread.node.directives)?);
                    self.spread_stack.push(name);
                    self.walk(&fragment.node.selection_set, &visibility)?;
                    self.spread_stack.pop();
                }
                Selection::InlineFragment(inline) => {
                    if let Some(condition) = &inline.node.type_condition {
                        if !self
                            .registry
                            .type_condition_matches(self.ty, condition.node.on.node.as_str())
                        {
                            continue;
                        }
                    }
                    let visibility = inherited
                        .clone()
                        .and(VisibilityCondition::of_directives(&inline.node.directives)?);
                    self.walk(&inline.node.selection_set, &visibility)?;
                }
            }
        }
        Ok(())
    }

    fn add_field(&mut self, field: &'a Positioned<Field>, inherited: &VisibilityCondition<'a>) -> ServerResult<()> {
        let name = field.node.name.node.as_str();

        // `__typename` is valid on every composite type and never has a
        // field definition. Everything else, including the introspection
        // roots, must exist on the type.
        if name != "__typename" && self.ty.field_by_name(name).is_none() {
            return Err(ServerError::new(
                format!("Cannot query field \"{name}\" on type \"{}\"", self.ty.name()),
                Some(field.pos),
            ));
        }

        let visibility = inherited
            .clone()
            .and(VisibilityCondition::of_directives(&field.node.directives)?);
        let node = CollectedFieldNode { field, visibility };

        let response_key = field.node.response_key().node.as_str();
        match self.output.get_mut(response_key) {
            None => {
                self.output.insert(
                    response_key,
                    FieldSelection {
                        response_key,
                        nodes: vec![node],
                    },
                );
            }
            Some(existing) if existing.field_name() == name => {
                // Merged occurrences must agree on arguments, otherwise the
                // later ones would silently lose theirs.
                if self.mode.is_strict() && !same_arguments(existing.primary(), field) {
                    return Err(ServerError::new(
                        format!("Fields \"{response_key}\" conflict because they have differing arguments"),
                        Some(field.pos),
                    ));
                }
                existing.nodes.push(node);
            }
            Some(existing) => {
                // Same response key, different field. Lenient keeps the
                // first selection.
                if self.mode.is_strict() {
                    return Err(ServerError::new(
                        format!(
                            "Fields \"{response_key}\" conflict because \"{}\" and \"{name}\" are different fields",
                            existing.field_name(),
                        ),
                        Some(field.pos),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Argument order does not matter, names and values do.
fn same_arguments(a: &Positioned<Field>, b: &Positioned<Field>) -> bool {
    a.node.arguments.len() == b.node.arguments.len()
        && a.node.arguments.iter().all(|(name, value)| {
            b.node
                .arguments
                .iter()
                .any(|(other_name, other_value)| name.node == other_name.node && value.node == other_value.node)
        })
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::{parse_query, types::DocumentOperations};

    use super::*;
    use crate::registry::{InterfaceType, MetaField, ObjectType, UnionType};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.insert_type(
            InterfaceType::new("Node", [MetaField::new("id", "ID!")]).with_possible_type("User"),
        );
        registry.insert_type(
            ObjectType::new(
                "User",
                [
                    MetaField::new("id", "ID!"),
                    MetaField::new("name", "String"),
                    MetaField::new("friends", "[User]"),
                ],
            )
            .implements("Node"),
        );
        registry.insert_type(ObjectType::new("Bot", [MetaField::new("id", "ID!")]));
        registry.insert_type(UnionType::new("Actor", ["User", "Bot"]));
        registry
    }

    fn collect<'a>(
        registry: &'a Registry,
        fragments: &'a FragmentIndex,
        doc: &'a async_graphql_parser::types::ExecutableDocument,
        ty: &'a str,
    ) -> ServerResult<Vec<FieldSelection<'a>>> {
        let DocumentOperations::Single(operation) = &doc.operations else {
            panic!("expected a single operation")
        };
        let ty = registry.lookup_type(ty).unwrap();
        collect_fields(
            registry,
            fragments,
            ValidationMode::Strict,
            ty,
            &[&operation.node.selection_set],
        )
    }

    fn index_of(doc: &async_graphql_parser::types::ExecutableDocument) -> FragmentIndex {
        doc.fragments
            .iter()
            .map(|(name, fragment)| (name.clone(), fragment.clone()))
            .collect()
    }

    #[test]
    fn aliases_and_order() {
        let registry = registry();
        let doc = parse_query("{ me: name id name }").unwrap();
        let fragments = FragmentIndex::new();

        let fields = collect(&registry, &fragments, &doc, "User").unwrap();
        let keys = fields.iter().map(|f| f.response_key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["me", "id", "name"]);
        assert_eq!(fields[0].field_name(), "name");
    }

    #[test]
    fn fragments_expand_in_place() {
        let registry = registry();
        let doc = parse_query("{ id ...details } fragment details on User { name friends { id } }").unwrap();
        let fragments = index_of(&doc);

        let fields = collect(&registry, &fragments, &doc, "User").unwrap();
        let keys = fields.iter().map(|f| f.response_key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["id", "name", "friends"]);
    }

    #[test]
    fn non_matching_type_conditions_are_skipped() {
        let registry = registry();
        let doc = parse_query("{ ... on Node { id } ... on Bot { id name: id } }").unwrap();
        let fragments = FragmentIndex::new();

        let fields = collect(&registry, &fragments, &doc, "User").unwrap();
        let keys = fields.iter().map(|f| f.response_key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["id"]);
    }

    #[test]
    fn unknown_field_is_fatal() {
        let registry = registry();
        let doc = parse_query("{ id nickname }").unwrap();
        let fragments = FragmentIndex::new();

        let err = collect(&registry, &fragments, &doc, "User").unwrap_err();
        assert_eq!(err.message, "Cannot query field \"nickname\" on type \"User\"");
    }

    #[test]
    fn only_typename_is_allowed_on_unions() {
        let registry = registry();
        let doc = parse_query("{ __typename }").unwrap();
        let fragments = FragmentIndex::new();
        assert!(collect(&registry, &fragments, &doc, "Actor").is_ok());

        let doc = parse_query("{ id }").unwrap();
        let err = collect(&registry, &fragments, &doc, "Actor").unwrap_err();
        assert_eq!(err.message, "Cannot query field \"id\" on type \"Actor\"");
    }

    #[test]
    fn fragment_cycles_are_detected() {
        let registry = registry();
        let doc = parse_query(
            "{ ...a } fragment a on User { id ...b } fragment b on User { name ...a }",
        )
        .unwrap();
        let fragments = index_of(&doc);

        let err = collect(&registry, &fragments, &doc, "User").unwrap_err();
        assert_eq!(err.message, "Cannot spread fragment \"a\" within itself");
    }

    #[test]
    fn duplicate_selections_merge() {
        let registry = registry();
        let doc = parse_query("{ friends { id } friends { name } }").unwrap();
        let fragments = FragmentIndex::new();

        let fields = collect(&registry, &fragments, &doc, "User").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].nodes.len(), 2);
    }

    #[test]
    fn conflicting_keys_fail_in_strict_mode() {
        let registry = registry();
        let doc = parse_query("{ name: id name }").unwrap();
        let fragments = FragmentIndex::new();

        let err = collect(&registry, &fragments, &doc, "User").unwrap_err();
        assert_eq!(
            err.message,
            "Fields \"name\" conflict because \"id\" and \"name\" are different fields"
        );

        let DocumentOperations::Single(operation) = &doc.operations else {
            panic!("expected a single operation")
        };
        let ty = registry.lookup_type("User").unwrap();
        let fields = collect_fields(
            &registry,
            &fragments,
            ValidationMode::Lenient,
            ty,
            &[&operation.node.selection_set],
        )
        .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name(), "id");
    }

    #[test]
    fn differing_arguments_conflict_in_strict_mode() {
        let registry = registry();
        let fragments = FragmentIndex::new();

        let doc = parse_query("{ friends(first: 1) { id } friends(first: 2) { name } }").unwrap();
        let err = collect(&registry, &fragments, &doc, "User").unwrap_err();
        assert_eq!(
            err.message,
            "Fields \"friends\" conflict because they have differing arguments"
        );

        // Identical arguments still merge, order notwithstanding.
        let doc =
            parse_query("{ friends(first: 1, after: \"a\") { id } friends(after: \"a\", first: 1) { name } }").unwrap();
        let fields = collect(&registry, &fragments, &doc, "User").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].nodes.len(), 2);
    }

    #[test]
    fn visibility_conditions_accumulate_through_fragments() {
        let registry = registry();
        let doc = parse_query(
            "{ ...a @include(if: $x) } fragment a on User { id @skip(if: $y) }",
        )
        .unwrap();
        let fragments = index_of(&doc);

        let fields = collect(&registry, &fragments, &doc, "User").unwrap();
        let visibility = &fields[0].nodes[0].visibility;

        let vars = |x: bool, y: bool| {
            async_graphql_value::Variables::from_json(serde_json::json!({"x": x, "y": y}))
        };
        assert!(visibility.is_visible(&vars(true, false)).unwrap());
        assert!(!visibility.is_visible(&vars(true, true)).unwrap());
        assert!(!visibility.is_visible(&vars(false, false)).unwrap());
    }
}
