use std::sync::Arc;

use query_path::QueryPathSegment;
use serde_json::Value;

/// The value flowing between resolvers.
///
/// Cheap to clone and to take sub-copies of: the JSON blob is shared behind
/// an `Arc` and a sub-copy only records the path into it.
#[derive(Debug, Clone)]
pub struct ResolvedValue {
    /// The root of the JSON blob that contains this value.
    data_root: Arc<Value>,
    /// The path to this value inside `data_root`.
    ///
    /// Lets us hand a child value to a nested resolver without cloning the
    /// entire blob.
    data_path: Vec<QueryPathSegment>,
}

impl ResolvedValue {
    pub fn new(value: Value) -> Self {
        Self {
            data_root: Arc::new(value),
            data_path: vec![],
        }
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    pub fn data_resolved(&self) -> &Value {
        self.data_path.iter().fold(self.data_root.as_ref(), |value, segment| {
            match segment {
                QueryPathSegment::Field(field) => value.get(field.as_str()),
                QueryPathSegment::Index(index) => value.get(*index),
            }
            .expect("data_path to be validated before ResolvedValue construction")
        })
    }

    pub fn is_null(&self) -> bool {
        self.data_resolved().is_null()
    }

    /// Returns a new value pointing at the given field, assuming this is an
    /// object and the field exists.
    pub fn get_field(&self, name: &str) -> Option<ResolvedValue> {
        self.data_resolved().get(name)?;

        let mut data_path = self.data_path.clone();
        data_path.push(QueryPathSegment::Field(name.to_string()));

        Some(ResolvedValue {
            data_root: Arc::clone(&self.data_root),
            data_path,
        })
    }

    /// Returns a new value pointing at the given index, assuming this is a
    /// list and the index exists.
    pub fn get_index(&self, index: usize) -> Option<ResolvedValue> {
        self.data_resolved().get(index)?;

        let mut data_path = self.data_path.clone();
        data_path.push(QueryPathSegment::Index(index));

        Some(ResolvedValue {
            data_root: Arc::clone(&self.data_root),
            data_path,
        })
    }

    /// Takes the inner value.
    ///
    /// Avoids cloning when we are the sole owner of the blob.
    pub fn take(mut self) -> Value {
        match Arc::try_unwrap(self.data_root) {
            Ok(value) => self.data_path.iter().fold(value, |mut value, segment| match segment {
                QueryPathSegment::Field(field) => {
                    value.get_mut(field.as_str()).expect("data_path to be validated").take()
                }
                QueryPathSegment::Index(index) => value.get_mut(*index).expect("data_path to be validated").take(),
            }),
            Err(arc) => {
                self.data_root = arc;
                self.data_resolved().clone()
            }
        }
    }

    /// If this value is an array, returns an iterator over its items.
    pub fn item_iter(&self) -> Option<impl Iterator<Item = ResolvedValue> + '_> {
        match self.data_resolved() {
            Value::Array(array) => Some((0..array.len()).map(|index| {
                let mut data_path = self.data_path.clone();
                data_path.push(QueryPathSegment::Index(index));

                ResolvedValue {
                    data_root: Arc::clone(&self.data_root),
                    data_path,
                }
            })),
            _ => None,
        }
    }
}

impl Default for ResolvedValue {
    fn default() -> Self {
        Self::null()
    }
}
