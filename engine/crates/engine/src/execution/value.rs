use dataloader::{Lazy, LazyTree};

use crate::FieldError;

/// What a resolver returns for a field.
///
/// Lists of object types can be returned as [`FieldValue::List`] so that each element may be
/// deferred on its own. A [`FieldValue::Lazy`] is completed once the engine gets back to it,
/// after the batches of the current wave have been loaded.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Value(serde_json::Value),
    List(Vec<FieldValue>),
    Lazy(Lazy<FieldValue, FieldError>),
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Value(serde_json::Value::Null)
    }

    /// Defers `thunk` until the next wave.
    pub fn lazy<T: Into<FieldValue>>(thunk: impl FnOnce() -> Result<T, FieldError> + 'static) -> Self {
        FieldValue::Lazy(Lazy::new(move || thunk().map(Into::into)))
    }

    /// Wraps any lazy, typically one returned by [`dataloader::Source::load`].
    pub fn from_lazy<T, E>(lazy: &Lazy<T, E>) -> Self
    where
        T: Into<FieldValue> + Clone + 'static,
        E: Into<FieldError> + Clone + 'static,
    {
        FieldValue::Lazy(lazy.then(|result| result.map(Into::into).map_err(Into::into)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Value(serde_json::Value::Null))
    }

    /// Forces every lazy in this value.
    pub fn resolve(self) -> Result<FieldValue, FieldError> {
        Lazy::resolve_deep(self)
    }

    /// The JSON form of a value without lazies.
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            FieldValue::Value(value) => Some(value),
            FieldValue::List(items) => items
                .into_iter()
                .map(FieldValue::into_json)
                .collect::<Option<Vec<_>>>()
                .map(serde_json::Value::Array),
            FieldValue::Lazy(_) => None,
        }
    }
}

impl LazyTree<FieldError> for FieldValue {
    fn into_lazy(self) -> Result<Lazy<Self, FieldError>, Self> {
        match self {
            FieldValue::Lazy(lazy) => Ok(lazy),
            other => Err(other),
        }
    }

    fn try_map_children(self, f: &mut dyn FnMut(Self) -> Result<Self, FieldError>) -> Result<Self, FieldError> {
        match self {
            FieldValue::List(items) => Ok(FieldValue::List(items.into_iter().map(f).collect::<Result<_, _>>()?)),
            other => Ok(other),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Value(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Value(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Value(value.into())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(value.into())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(FieldValue::null, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Lazy<FieldValue, FieldError>> for FieldValue {
    fn from(lazy: Lazy<FieldValue, FieldError>) -> Self {
        FieldValue::Lazy(lazy)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_nested_lazies() {
        let calls = Rc::new(Cell::new(0));
        let counted = |value: i32| {
            let calls = calls.clone();
            FieldValue::lazy(move || {
                calls.set(calls.get() + 1);
                Ok(FieldValue::lazy(move || Ok(value)))
            })
        };

        let value = FieldValue::List(vec![counted(1), FieldValue::from(vec![counted(2)]), "x".into()]);
        assert_eq!(calls.get(), 0);
        assert_eq!(value.clone().into_json(), None);

        let resolved = value.resolve().unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(resolved.into_json(), Some(json!([1, [2], "x"])));
    }

    #[test]
    fn errors_surface_from_any_depth() {
        let value = FieldValue::from(vec![FieldValue::lazy(|| Err::<i32, _>(FieldError::new("nope")))]);
        let Err(FieldError::Graphql(error)) = value.resolve() else {
            unreachable!("the lazy fails");
        };
        assert_eq!(error.message, "nope");
    }

    #[test]
    fn conversions() {
        assert!(FieldValue::from(None::<i32>).is_null());
        assert_eq!(FieldValue::from(Some("a")).into_json(), Some(json!("a")));

        let lazy = Lazy::<Option<i32>, String>::ready(Ok(Some(4)));
        let value = FieldValue::from_lazy(&lazy);
        assert_eq!(value.resolve().unwrap().into_json(), Some(json!(4)));
    }
}
