use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use super::{resolvers::Resolver, InputValueType, MetaFieldType};

/// A field on an object or interface type.
#[derive(Clone, Debug)]
pub struct MetaField {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: MetaFieldType,
    pub deprecation: Deprecation,
    pub resolver: Resolver,
    /// Opt this field out of parallel execution with its siblings.
    pub serial: bool,
    /// Directives attached to the field definition in the schema. Matching
    /// directive middleware runs for every occurrence of the field.
    pub directives: Vec<DirectiveInvocation>,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: impl Into<MetaFieldType>) -> MetaField {
        MetaField {
            name: name.into(),
            ty: ty.into(),
            description: None,
            args: Default::default(),
            deprecation: Default::default(),
            resolver: Default::default(),
            serial: false,
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_argument(mut self, arg: MetaInputValue) -> Self {
        self.args.insert(arg.name.clone(), arg);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn serial(mut self) -> Self {
        self.serial = true;
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveInvocation) -> Self {
        self.directives.push(directive);
        self
    }
}

/// An argument of a field or directive, or a field of an input object.
#[derive(Clone, Debug)]
pub struct MetaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: InputValueType,
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<InputValueType>) -> MetaInputValue {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default_value: ConstValue) -> Self {
        self.default_value = Some(default_value);
        self
    }
}

/// A directive applied to a field definition, e.g. `@uppercase` declared in
/// the schema rather than written in the query.
#[derive(Clone, Debug)]
pub struct DirectiveInvocation {
    pub name: String,
    pub arguments: IndexMap<String, ConstValue>,
}

impl DirectiveInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Default::default(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Deprecation {
    #[default]
    NoDeprecated,
    Deprecated {
        reason: Option<String>,
    },
}

impl Deprecation {
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Deprecation::Deprecated { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::NoDeprecated => None,
            Deprecation::Deprecated { reason } => reason.as_deref(),
        }
    }
}
