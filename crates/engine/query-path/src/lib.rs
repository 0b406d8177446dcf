//! The path of a field in a GraphQL response.
//!
//! Paths are built up during execution, one segment per response key or
//! list index, and attached to errors so clients can locate the field the
//! error applies to.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A path from the response root to a field, as serialized in the `path`
/// entry of a GraphQL error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryPath(Vec<QueryPathSegment>);

impl QueryPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of this path with one more segment at the end.
    #[must_use]
    pub fn child(&self, segment: impl Into<QueryPathSegment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn push(&mut self, segment: impl Into<QueryPathSegment>) {
        self.0.push(segment.into());
    }

    pub fn last(&self) -> Option<&QueryPathSegment> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryPathSegment> {
        self.0.iter()
    }
}

impl<Segment> FromIterator<Segment> for QueryPath
where
    Segment: Into<QueryPathSegment>,
{
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl PartialEq<Vec<QueryPathSegment>> for QueryPath {
    fn eq(&self, other: &Vec<QueryPathSegment>) -> bool {
        self.0 == *other
    }
}

impl Display for QueryPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            segment.fmt(f)?;
        }
        Ok(())
    }
}

/// One step in a [`QueryPath`]: a response key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryPathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for QueryPathSegment {
    fn from(name: &str) -> Self {
        QueryPathSegment::Field(name.to_string())
    }
}

impl From<String> for QueryPathSegment {
    fn from(name: String) -> Self {
        QueryPathSegment::Field(name)
    }
}

impl From<usize> for QueryPathSegment {
    fn from(index: usize) -> Self {
        QueryPathSegment::Index(index)
    }
}

impl Display for QueryPathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            QueryPathSegment::Field(name) => f.write_str(name),
            QueryPathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_dot_joined() {
        let path = QueryPath::empty().child("viewer").child("friends").child(1).child("name");
        assert_eq!(path.to_string(), "viewer.friends.1.name");
        assert_eq!(QueryPath::empty().to_string(), "");
    }

    #[test]
    fn serializes_as_a_flat_array() {
        let path = QueryPath::empty().child("words").child(1);
        assert_eq!(serde_json::to_value(&path).unwrap(), serde_json::json!(["words", 1]));

        let back: QueryPath = serde_json::from_value(serde_json::json!(["words", 1])).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn push_and_last() {
        let mut path = QueryPath::empty();
        assert!(path.is_empty());
        path.push("viewer");
        path.push(0);
        assert_eq!(path.last(), Some(&QueryPathSegment::Index(0)));
        assert!(!path.is_empty());
    }
}
