use serde::Deserialize;

/// Execution limits and switches of a schema.
///
/// ```toml
/// maxComplexity = 200
/// maxDepth = 10
/// introspectTypename = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Queries whose complexity exceeds this are rejected before they begin.
    pub max_complexity: Option<usize>,
    /// Queries nested deeper than this are rejected before they begin.
    pub max_depth: Option<usize>,
    /// Whether `__typename` can be selected on composite types.
    pub introspect_typename: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            max_complexity: None,
            max_depth: None,
            introspect_typename: true,
        }
    }
}

impl ExecutionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reads_toml() {
        let config = ExecutionConfig::from_toml_str("maxComplexity = 20\nintrospectTypename = false").unwrap();
        assert_eq!(
            config,
            ExecutionConfig {
                max_complexity: Some(20),
                max_depth: None,
                introspect_typename: false,
            }
        );

        assert_eq!(ExecutionConfig::from_toml_str("").unwrap(), ExecutionConfig::default());
        assert!(ExecutionConfig::from_toml_str("maxComplexty = 1").is_err());
    }
}
