use indexmap::IndexMap;
use serde::Serialize;

use crate::GraphqlError;

/// The result of one query.
///
/// `data` is absent when the query failed before it began, in which case `errors` explains
/// why. A query without any operation has neither.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,

    /// Values resolvers added through `ResolverContext::add_extension`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Response {
    pub fn from_errors(errors: Vec<GraphqlError>) -> Self {
        Response {
            errors,
            ..Default::default()
        }
    }

    /// Returns `true` if the response has no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_json(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn omits_empty_members() {
        assert_eq!(Response::default().into_json(), json!({}));
        assert_eq!(
            Response::from_errors(vec![GraphqlError::new("bad")]).into_json(),
            json!({"errors": [{"message": "bad"}]})
        );

        let response = Response {
            data: Some(json!({"a": null})),
            errors: Vec::new(),
            extensions: IndexMap::from([("cost".to_string(), json!(3))]),
        };
        assert!(response.is_ok());
        assert_eq!(response.into_json(), json!({"data": {"a": null}, "extensions": {"cost": 3}}));
    }
}
