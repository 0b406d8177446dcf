//! Various types for working with GraphQL type names

use std::borrow::Cow;

use async_graphql_value::Name;
use serde::{Deserialize, Serialize};

/// Defines basic string conversion functionality for a string wrapper.
///
/// We've a few of them in this file, so this is handy.
macro_rules! def_string_conversions {
    ($ty:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> $ty {
                $ty(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> $ty {
                $ty(value)
            }
        }
    };
}

/// The type of a field, as it appears in the schema: a named type with any
/// number of list & non-null wrappers around it (`[Int!]!`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaFieldType(String);

def_string_conversions!(MetaFieldType);

impl MetaFieldType {
    pub fn is_non_null(&self) -> bool {
        self.0.ends_with('!')
    }

    pub fn is_nullable(&self) -> bool {
        !self.is_non_null()
    }

    pub fn is_list(&self) -> bool {
        // A `[Int]!` is a list, `Int!` is not, so we look at the first char.
        self.0.starts_with('[')
    }

    pub fn named_type(&self) -> NamedType<'_> {
        NamedType(Cow::Borrowed(named_type_from_type_str(&self.0)))
    }

    pub fn wrapping_types(&self) -> WrappingTypeIter<'_> {
        WrappingTypeIter(self.0.chars())
    }
}

/// The type of an input value (argument, variable or input-object field).
///
/// Same wrapping rules as [`MetaFieldType`], kept distinct so the two don't
/// get mixed up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputValueType(String);

def_string_conversions!(InputValueType);

impl InputValueType {
    pub fn is_non_null(&self) -> bool {
        self.0.ends_with('!')
    }

    pub fn is_list(&self) -> bool {
        self.0.starts_with('[')
    }

    pub fn named_type(&self) -> NamedType<'_> {
        NamedType(Cow::Borrowed(named_type_from_type_str(&self.0)))
    }
}

/// A named GraphQL type without any non-null or list wrappers
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType<'a>(Cow<'a, str>);

impl NamedType<'_> {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_primitive_type(&self) -> bool {
        matches!(self.0.as_ref(), "String" | "Float" | "Boolean" | "ID" | "Int")
    }
}

impl From<String> for NamedType<'static> {
    fn from(value: String) -> Self {
        NamedType(Cow::Owned(value))
    }
}

impl<'a> From<&'a str> for NamedType<'a> {
    fn from(value: &'a str) -> Self {
        NamedType(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a Name> for NamedType<'a> {
    fn from(value: &'a Name) -> Self {
        NamedType(Cow::Borrowed(value.as_str()))
    }
}

impl std::fmt::Display for NamedType<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strips the NonNull and List wrappers from a type string to get the
/// named type within.
fn named_type_from_type_str(meta: &str) -> &str {
    let meta = meta.strip_suffix('!').unwrap_or(meta);
    match meta.strip_prefix('[').and_then(|m| m.strip_suffix(']')) {
        Some(inner) => named_type_from_type_str(inner),
        None => meta,
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WrappingType {
    NonNull,
    List,
}

/// Iterates the wrappers of a type string from the outside in.
pub struct WrappingTypeIter<'a>(std::str::Chars<'a>);

impl Iterator for WrappingTypeIter<'_> {
    type Item = WrappingType;

    fn next(&mut self) -> Option<Self::Item> {
        match self.0.next_back()? {
            '!' => Some(WrappingType::NonNull),
            ']' => Some(WrappingType::List),
            _ => None,
        }
    }
}
