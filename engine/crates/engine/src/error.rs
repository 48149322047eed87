use std::{borrow::Cow, sync::Arc};

use engine_parser::Pos;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::ErrorPath;

pub type GraphqlResult<T> = Result<T, GraphqlError>;

/// An error as it appears in the `errors` of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlError {
    pub message: Cow<'static, str>,
    pub locations: Vec<Pos>,
    pub path: Option<ErrorPath>,
    // Serialized as a map, but kept as a Vec for efficiency.
    pub extensions: Vec<(Cow<'static, str>, serde_json::Value)>,
}

impl GraphqlError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        GraphqlError {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Pos) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Pos>) -> Self {
        self.locations.extend(locations);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<ErrorPath>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        self.extensions.push((key, value.into()));
        self
    }

    #[must_use]
    pub fn with_extensions(
        mut self,
        extensions: impl IntoIterator<Item = (impl Into<Cow<'static, str>>, impl Into<serde_json::Value>)>,
    ) -> Self {
        for (key, value) in extensions {
            self.extensions.push((key.into(), value.into()));
        }
        self
    }

    pub(crate) fn invalid_null(parent_type: &str, field: &str, path: &ErrorPath) -> Self {
        let message = if path.is_list_element() {
            format!("Cannot return null for non-nullable element of {parent_type}.{field}")
        } else {
            format!("Cannot return null for non-nullable field {parent_type}.{field}")
        };
        GraphqlError::new(message)
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for GraphqlError {}

impl Serialize for GraphqlError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Extensions<'a>(&'a [(Cow<'static, str>, serde_json::Value)]);

        impl Serialize for Extensions<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
            }
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", &self.message)?;
        if !self.locations.is_empty() {
            map.serialize_entry("locations", &self.locations)?;
        }
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        if !self.extensions.is_empty() {
            map.serialize_entry("extensions", &Extensions(&self.extensions))?;
        }
        map.end()
    }
}

impl From<engine_parser::Error> for GraphqlError {
    fn from(error: engine_parser::Error) -> Self {
        let location = error.pos();
        GraphqlError::new(error.to_string()).with_location(location)
    }
}

/// The error a resolver can return.
///
/// A [`FieldError::Graphql`] only affects the field it was raised for: the field becomes `null`
/// and the error is reported with the response. A [`FieldError::Internal`] aborts the whole
/// multiplex.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FieldError {
    #[error(transparent)]
    Graphql(#[from] GraphqlError),
    #[error("{0}")]
    Internal(Arc<anyhow::Error>),
}

impl FieldError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        FieldError::Graphql(GraphqlError::new(message))
    }

    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        FieldError::Internal(Arc::new(error.into()))
    }
}

impl From<anyhow::Error> for FieldError {
    fn from(error: anyhow::Error) -> Self {
        FieldError::Internal(Arc::new(error))
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        FieldError::new(message)
    }
}

impl From<&'static str> for FieldError {
    fn from(message: &'static str) -> Self {
        FieldError::new(message)
    }
}

/// A failure that is not tied to a single field. The results of every query of the multiplex
/// are discarded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MultiplexError {
    #[error("internal error: {0}")]
    Internal(Arc<anyhow::Error>),
}

/// The types handed to a [`crate::SchemaBuilder`] do not form a valid schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("The {operation} root type {name} is not registered")]
    MissingRootType { operation: &'static str, name: String },
    #[error("The {operation} root type {name} must be an object type")]
    InvalidRootType { operation: &'static str, name: String },
    #[error("{owner}.{field} refers to the unknown type {ty}")]
    UnknownType { owner: String, field: String, ty: String },
    #[error("{owner}.{field} must return an output type but {ty} is an input object")]
    NotAnOutputType { owner: String, field: String, ty: String },
    #[error("Argument {argument} of {owner}.{field} must be an input type but {ty} is not")]
    NotAnInputType {
        owner: String,
        field: String,
        argument: String,
        ty: String,
    },
    #[error("{object} implements {interface}, which is not a registered interface")]
    UnknownInterface { object: String, interface: String },
    #[error("Union {union} includes {member}, which is not a registered object type")]
    InvalidUnionMember { union: String, member: String },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::ErrorPathSegment;

    #[test]
    fn serializes_to_the_response_error_shape() {
        let error = GraphqlError::new("boom")
            .with_location(Pos::new(1, 3))
            .with_path(vec![ErrorPathSegment::from("thing"), ErrorPathSegment::from(0)])
            .with_extension("code", "BAD");

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "boom",
                "locations": [{"line": 1, "column": 3}],
                "path": ["thing", 0],
                "extensions": {"code": "BAD"}
            })
        );

        assert_eq!(serde_json::to_value(GraphqlError::new("plain")).unwrap(), json!({"message": "plain"}));
    }

    #[test]
    fn parse_errors_keep_their_location() {
        let error = GraphqlError::from(engine_parser::parse_query("{ a").unwrap_err());
        assert_eq!(error.message, "Unexpected end of document");
        assert_eq!(error.locations, vec![Pos::new(1, 4)]);
    }
}
