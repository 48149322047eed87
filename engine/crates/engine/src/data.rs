use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
};

/// Values of arbitrary types, at most one per type.
///
/// Schemas, multiplexes and requests each carry one. Resolvers read them through
/// [`crate::ResolverContext::data`], which looks at the request first and the schema last.
#[derive(Default)]
pub struct Data(HashMap<TypeId, Box<dyn Any>>);

impl Data {
    /// Insert data, replacing any previous value of the same type.
    pub fn insert<D: Any>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }

    pub fn get<D: Any>(&self) -> Option<&D> {
        self.0.get(&TypeId::of::<D>()).and_then(|data| data.downcast_ref::<D>())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Data").field(&self.0.len()).finish()
    }
}
