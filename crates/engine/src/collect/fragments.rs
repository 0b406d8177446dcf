use std::collections::HashMap;

use async_graphql_parser::{types::FragmentDefinition, Positioned};
use async_graphql_value::Name;

use crate::{ServerError, ValidationMode};

/// The fragment definitions of a prepared document, indexed by name.
///
/// Registration is last-wins; duplicates are recorded so strict validation
/// can reject the document afterwards.
#[derive(Debug, Default)]
pub struct FragmentIndex {
    fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    duplicates: Vec<Name>,
}

impl FragmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: Name, fragment: Positioned<FragmentDefinition>) {
        if self.fragments.insert(name.clone(), fragment).is_some() {
            self.duplicates.push(name);
        }
    }

    /// Validate the index against `mode`. Called once at document
    /// preparation time.
    pub fn check(&self, mode: ValidationMode) -> Result<(), ServerError> {
        if mode.is_strict() {
            if let Some(name) = self.duplicates.first() {
                return Err(ServerError::new(
                    format!("There can be only one fragment named \"{name}\""),
                    Some(self.fragments[name].pos),
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Positioned<FragmentDefinition>> {
        self.fragments.get(name)
    }
}

impl FromIterator<(Name, Positioned<FragmentDefinition>)> for FragmentIndex {
    fn from_iter<I: IntoIterator<Item = (Name, Positioned<FragmentDefinition>)>>(iter: I) -> Self {
        let mut index = FragmentIndex::new();
        for (name, fragment) in iter {
            index.register(name, fragment);
        }
        index
    }
}
