use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
};

/// A type-indexed bag of values shared with resolvers and middleware.
///
/// There is one on the schema for host services (database pools, clients)
/// and one per request for session state.
#[derive(Default)]
pub struct Data(HashMap<TypeId, Box<dyn Any + Send + Sync>>);

impl Data {
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }

    pub fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.0.get(&TypeId::of::<D>()).and_then(|d| d.downcast_ref::<D>())
    }

    pub fn remove<D: Any + Send + Sync>(&mut self) -> Option<D> {
        self.0
            .remove(&TypeId::of::<D>())
            .and_then(|d| d.downcast::<D>().ok())
            .map(|d| *d)
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_type() {
        struct Pool(u32);

        let mut data = Data::default();
        data.insert(Pool(3));
        data.insert("hello");

        assert_eq!(data.get::<Pool>().unwrap().0, 3);
        assert_eq!(*data.get::<&str>().unwrap(), "hello");
        assert!(data.get::<String>().is_none());

        assert_eq!(data.remove::<Pool>().unwrap().0, 3);
        assert!(data.get::<Pool>().is_none());
    }
}
