//! The type registry: everything the engine knows about a schema.
//!
//! A [`Registry`] is built by the host (or a schema layer above this crate),
//! then frozen inside the schema. Execution only ever reads from it.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_graphql_parser::types::{DirectiveLocation, OperationType};
use indexmap::{IndexMap, IndexSet};

mod fields;
pub mod resolvers;
pub mod scalars;
mod type_names;

pub use fields::{Deprecation, DirectiveInvocation, MetaField, MetaInputValue};
pub use type_names::{InputValueType, MetaFieldType, NamedType, WrappingType, WrappingTypeIter};

#[derive(Debug)]
pub struct Registry {
    pub types: BTreeMap<String, MetaType>,
    pub directives: BTreeMap<String, MetaDirective>,
    /// interface name -> names of the types implementing it
    pub implements: HashMap<String, HashSet<String>>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub disable_introspection: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Registry {
            types: Default::default(),
            directives: Default::default(),
            implements: Default::default(),
            query_type: "Query".to_string(),
            mutation_type: None,
            subscription_type: None,
            disable_introspection: false,
        };
        registry.add_builtins();
        registry
    }

    fn add_builtins(&mut self) {
        for name in ["String", "ID", "Int", "Float", "Boolean"] {
            self.insert_type(ScalarType::new(name));
        }

        self.insert_directive(MetaDirective {
            name: "include".to_string(),
            description: Some(
                "Directs the executor to include this field or fragment only when the `if` argument is true."
                    .to_string(),
            ),
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            args: [(
                "if".to_string(),
                MetaInputValue::new("if", "Boolean!").with_description("Included when true."),
            )]
            .into_iter()
            .collect(),
            is_repeatable: false,
        });

        self.insert_directive(MetaDirective {
            name: "skip".to_string(),
            description: Some(
                "Directs the executor to skip this field or fragment when the `if` argument is true.".to_string(),
            ),
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            args: [(
                "if".to_string(),
                MetaInputValue::new("if", "Boolean!").with_description("Skipped when true."),
            )]
            .into_iter()
            .collect(),
            is_repeatable: false,
        });

        self.insert_directive(MetaDirective {
            name: "deprecated".to_string(),
            description: Some("Marks an element of a GraphQL schema as no longer supported.".to_string()),
            locations: vec![DirectiveLocation::FieldDefinition, DirectiveLocation::EnumValue],
            args: [(
                "reason".to_string(),
                MetaInputValue::new("reason", "String")
                    .with_default(async_graphql_value::ConstValue::String("No longer supported".to_string())),
            )]
            .into_iter()
            .collect(),
            is_repeatable: false,
        });
    }

    pub fn insert_type(&mut self, ty: impl Into<MetaType>) {
        let ty = ty.into();
        if let MetaType::Object(object) = &ty {
            for interface in &object.implements {
                self.implements
                    .entry(interface.clone())
                    .or_default()
                    .insert(object.name.clone());
            }
        }
        self.types.insert(ty.name().to_string(), ty);
    }

    pub fn insert_directive(&mut self, directive: MetaDirective) {
        self.directives.insert(directive.name.clone(), directive);
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn root_type(&self, operation_type: OperationType) -> Option<&MetaType> {
        let name = match operation_type {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }?;
        self.types.get(name)
    }

    /// Whether `ty` satisfies a fragment type condition naming `condition`.
    ///
    /// True when the names match, when `ty` implements the interface, or when
    /// `ty` is a member of the union.
    pub fn type_condition_matches(&self, ty: &MetaType, condition: &str) -> bool {
        if ty.name() == condition {
            return true;
        }
        if let Some(implementers) = self.implements.get(condition) {
            if implementers.contains(ty.name()) {
                return true;
            }
        }
        match self.types.get(condition) {
            Some(MetaType::Union(union)) => union.possible_types.contains(ty.name()),
            Some(MetaType::Interface(interface)) => interface.possible_types.contains(ty.name()),
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(inner) => &inner.name,
            MetaType::Object(inner) => &inner.name,
            MetaType::Interface(inner) => &inner.name,
            MetaType::Union(inner) => &inner.name,
            MetaType::Enum(inner) => &inner.name,
            MetaType::InputObject(inner) => &inner.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            MetaType::Scalar(inner) => inner.description.as_deref(),
            MetaType::Object(inner) => inner.description.as_deref(),
            MetaType::Interface(inner) => inner.description.as_deref(),
            MetaType::Union(inner) => inner.description.as_deref(),
            MetaType::Enum(inner) => inner.description.as_deref(),
            MetaType::InputObject(inner) => inner.description.as_deref(),
        }
    }

    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        match self {
            MetaType::Object(inner) => Some(&inner.fields),
            MetaType::Interface(inner) => Some(&inner.fields),
            _ => None,
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields().and_then(|fields| fields.get(name))
    }

    /// Objects, interfaces and unions take a sub-selection.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_)
        )
    }

    /// Scalars and enums terminate the selection.
    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self,
            MetaType::Scalar(_) | MetaType::Enum(_) | MetaType::InputObject(_)
        )
    }
}

#[derive(Clone, Debug)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            specified_by_url: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    /// Names of the interfaces this object implements.
    pub implements: Vec<String>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.into_iter().map(|field| (field.name.clone(), field)).collect(),
            implements: Vec::new(),
        }
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    pub possible_types: IndexSet<String>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.into_iter().map(|field| (field.name.clone(), field)).collect(),
            possible_types: Default::default(),
        }
    }

    #[must_use]
    pub fn with_possible_type(mut self, ty: impl Into<String>) -> Self {
        self.possible_types.insert(ty.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: IndexSet<String>,
}

impl UnionType {
    pub fn new(name: impl Into<String>, possible_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            possible_types: possible_types.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub enum_values: IndexMap<String, MetaEnumValue>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enum_values: values
                .into_iter()
                .map(|value| {
                    let value = MetaEnumValue::new(value.into());
                    (value.name.clone(), value)
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MetaEnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Deprecation,
}

impl MetaEnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation: Default::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub input_fields: IndexMap<String, MetaInputValue>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>, input_fields: impl IntoIterator<Item = MetaInputValue>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields: input_fields
                .into_iter()
                .map(|input| (input.name.clone(), input))
                .collect(),
        }
    }
}

macro_rules! meta_type_from {
    ($($variant:ident => $ty:ident),*$(,)?) => {
        $(
            impl From<$ty> for MetaType {
                fn from(ty: $ty) -> Self {
                    MetaType::$variant(ty)
                }
            }
        )*
    };
}

meta_type_from! {
    Scalar => ScalarType,
    Object => ObjectType,
    Interface => InterfaceType,
    Union => UnionType,
    Enum => EnumType,
    InputObject => InputObjectType,
}

#[derive(Clone, Debug)]
pub struct MetaDirective {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub args: IndexMap<String, MetaInputValue>,
    pub is_repeatable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry.insert_type(InterfaceType::new("Node", [MetaField::new("id", "ID!")]).with_possible_type("User"));
        registry.insert_type(
            ObjectType::new(
                "User",
                [MetaField::new("id", "ID!"), MetaField::new("name", "String")],
            )
            .implements("Node"),
        );
        registry.insert_type(ObjectType::new("Bot", [MetaField::new("id", "ID!")]));
        registry.insert_type(UnionType::new("Actor", ["User", "Bot"]));
        registry
    }

    #[test]
    fn builtin_directives_are_registered() {
        let registry = Registry::new();
        assert!(registry.directives.contains_key("skip"));
        assert!(registry.directives.contains_key("include"));
        assert_eq!(registry.directives["skip"].args["if"].ty.as_str(), "Boolean!");
    }

    #[test]
    fn type_condition_matching() {
        let registry = sample_registry();
        let user = registry.lookup_type("User").unwrap();
        let bot = registry.lookup_type("Bot").unwrap();

        assert!(registry.type_condition_matches(user, "User"));
        assert!(registry.type_condition_matches(user, "Node"));
        assert!(registry.type_condition_matches(user, "Actor"));
        assert!(registry.type_condition_matches(bot, "Actor"));
        assert!(!registry.type_condition_matches(bot, "Node"));
    }
}
