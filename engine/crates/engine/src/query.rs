//! Everything that happens to a request before its first resolver runs.

use engine_parser::{
    parse_query, parse_query_with_filename,
    types::{Document, OperationDefinition},
    Positioned,
};
use engine_value::Variables;

use crate::{input::coerce_variables, rewrite::rewrite, GraphqlError, Irep, Request, Schema};

/// A request that is ready to begin.
pub(crate) struct PreparedQuery {
    pub irep: Irep,
    pub variables: Variables,
}

/// Parses the query of `request`, picks its operation, coerces its variables and rewrites its
/// selections. `None` means the document has no operation at all.
pub(crate) fn prepare(schema: &Schema, request: &Request) -> Result<Option<PreparedQuery>, Vec<GraphqlError>> {
    if request.query.trim().is_empty() {
        return Err(vec![GraphqlError::new("No query string was present")]);
    }

    let document = match &request.filename {
        Some(filename) => parse_query_with_filename(&request.query, filename),
        None => parse_query(&request.query),
    }
    .map_err(|error| vec![GraphqlError::from(error)])?;

    let Some(operation) = select_operation(&document, request.operation_name.as_deref())? else {
        return Ok(None);
    };

    let registry = schema.registry();
    let config = schema.config();
    let variables = coerce_variables(registry, &operation.node.variable_definitions, &request.variables)?;
    let irep = rewrite(
        registry,
        &document,
        &operation.node,
        &variables,
        config.introspect_typename,
    )?;

    if let Some(max_complexity) = config.max_complexity {
        let complexity = irep.complexity();
        if complexity > max_complexity {
            return Err(vec![complexity_error(complexity, max_complexity)]);
        }
    }
    if let Some(max_depth) = config.max_depth {
        let depth = irep.depth();
        if depth > max_depth {
            return Err(vec![GraphqlError::new(format!(
                "Query has depth of {depth}, which exceeds max depth of {max_depth}"
            ))]);
        }
    }

    Ok(Some(PreparedQuery { irep, variables }))
}

pub(crate) fn complexity_error(complexity: usize, max_complexity: usize) -> GraphqlError {
    GraphqlError::new(format!(
        "Query has complexity of {complexity}, which exceeds max complexity of {max_complexity}"
    ))
}

fn select_operation<'a>(
    document: &'a Document,
    operation_name: Option<&str>,
) -> Result<Option<&'a Positioned<OperationDefinition>>, Vec<GraphqlError>> {
    if let Some(name) = operation_name {
        return document
            .operations()
            .find(|operation| operation.node.name.as_ref().is_some_and(|op_name| op_name.node == name))
            .map(Some)
            .ok_or_else(|| vec![GraphqlError::new(format!("No operation named \"{name}\""))]);
    }

    let mut operations = document.operations();
    match (operations.next(), operations.next()) {
        (None, _) => Ok(None),
        (Some(operation), None) => Ok(Some(operation)),
        (Some(_), Some(_)) => Err(vec![GraphqlError::new("An operation name is required")]),
    }
}
