//! Coercion of variables, arguments and directive conditions against their declared types.

use std::convert::Infallible;

use engine_parser::{
    types::{BaseType, Directive, Field, Type, VariableDefinition},
    Positioned,
};
use engine_value::{ConstValue, Name, Value, Variables};
use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::json;

use crate::{
    registry::{MetaField, MetaType, Registry},
    GraphqlError,
};

/// Coerces `value` to `ty`. The error explains what is wrong with the value.
pub fn coerce_input_value(registry: &Registry, ty: &Type, value: ConstValue) -> Result<ConstValue, String> {
    if value.is_null() {
        return if ty.nullable {
            Ok(ConstValue::Null)
        } else {
            Err(format!("Expected value of type \"{ty}\", found null"))
        };
    }

    let name = match &ty.base {
        BaseType::List(inner) => {
            return match value {
                ConstValue::List(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        coerce_input_value(registry, inner, item).map_err(|error| format!("At index {index}: {error}"))
                    })
                    .collect::<Result<_, _>>()
                    .map(ConstValue::List),
                // A single value is accepted where a list is expected.
                item => Ok(ConstValue::List(vec![coerce_input_value(registry, inner, item)?])),
            };
        }
        BaseType::Named(name) => name,
    };

    match registry.lookup(name) {
        Some(MetaType::Scalar(scalar)) => match scalar.builtin {
            Some(builtin) => builtin.parse(value),
            None => Ok(value),
        },
        Some(MetaType::Enum(enum_type)) => match value {
            ConstValue::Enum(variant) if enum_type.values.contains(variant.as_str()) => Ok(ConstValue::Enum(variant)),
            ConstValue::String(variant) if enum_type.values.contains(&variant) => {
                Ok(ConstValue::Enum(Name::new(variant)))
            }
            other => Err(format!("Enum \"{name}\" cannot represent value: {other}")),
        },
        Some(MetaType::InputObject(input)) => {
            let mut fields = match value {
                ConstValue::Object(fields) => fields,
                other => return Err(format!("Expected type \"{name}\" to be an object, found {other}")),
            };
            if let Some(unknown) = fields.keys().find(|key| !input.fields.contains_key(key.as_str())) {
                return Err(format!("Field \"{unknown}\" is not defined by type \"{name}\""));
            }

            let mut coerced = IndexMap::with_capacity(input.fields.len());
            for (field_name, definition) in &input.fields {
                let value = match fields.shift_remove(field_name.as_str()) {
                    Some(value) => coerce_input_value(registry, &definition.ty, value)
                        .map_err(|error| format!("In field \"{field_name}\": {error}"))?,
                    None => match &definition.default_value {
                        Some(default_value) => default_value.clone(),
                        None if !definition.ty.nullable => {
                            return Err(format!(
                                "Field \"{field_name}\" of required type \"{}\" was not provided",
                                definition.ty
                            ))
                        }
                        None => continue,
                    },
                };
                coerced.insert(Name::new(field_name), value);
            }
            Ok(ConstValue::Object(coerced))
        }
        _ => Err(format!("\"{name}\" is not an input type")),
    }
}

/// Coerces the variables of a request against the definitions of the operation. Absent
/// variables take their default value.
pub(crate) fn coerce_variables(
    registry: &Registry,
    definitions: &[Positioned<VariableDefinition>],
    provided: &Variables,
) -> Result<Variables, Vec<GraphqlError>> {
    let mut variables = Variables::default();
    let mut errors = Vec::new();

    for definition in definitions {
        let name = &definition.node.name.node;
        let ty = &definition.node.var_type.node;

        if !registry.lookup(ty.named_type()).is_some_and(MetaType::is_input) {
            errors.push(
                GraphqlError::new(format!("{} isn't a defined input type (on ${name})", ty.named_type()))
                    .with_location(definition.pos),
            );
            continue;
        }

        let value = match (provided.get(name), &definition.node.default_value) {
            (Some(value), _) => value.clone(),
            (None, Some(default_value)) => default_value.node.clone(),
            (None, None) if ty.nullable => continue,
            (None, None) => ConstValue::Null,
        };

        match coerce_input_value(registry, ty, value) {
            Ok(value) => {
                variables.insert(name.clone(), value);
            }
            Err(explanation) => errors.push(
                GraphqlError::new(format!("Variable ${name} of type {ty} was provided invalid value"))
                    .with_location(definition.pos)
                    .with_extension("problems", json!([{ "explanation": explanation }])),
            ),
        }
    }

    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

/// Builds the arguments passed to the resolver of `field`.
///
/// An argument given as a variable that the request left out counts as absent.
pub(crate) fn coerce_arguments(
    registry: &Registry,
    field: &MetaField,
    ast: &Positioned<Field>,
    variables: &Variables,
) -> Result<IndexMap<Name, ConstValue>, GraphqlError> {
    if let Some((name, _)) = ast
        .node
        .arguments
        .iter()
        .find(|(name, _)| !field.args.contains_key(name.node.as_str()))
    {
        return Err(GraphqlError::new(format!(
            "Field '{}' doesn't accept argument '{}'",
            field.name, name.node
        ))
        .with_location(name.pos));
    }

    let mut arguments = IndexMap::with_capacity(field.args.len());
    let mut missing = Vec::new();

    for (name, definition) in &field.args {
        let value = match ast.node.get_argument(name) {
            Some(Positioned {
                node: Value::Variable(variable),
                ..
            }) if !variables.contains_key(variable) => None,
            Some(value) => Some(value),
            None => None,
        };

        let Some(value) = value else {
            match &definition.default_value {
                Some(default_value) => {
                    arguments.insert(Name::new(name), default_value.clone());
                }
                None if !definition.ty.nullable => missing.push(name.as_str()),
                None => {}
            }
            continue;
        };

        let coerced = coerce_input_value(registry, &definition.ty, substitute(&value.node, variables)).map_err(
            |explanation| {
                GraphqlError::new(format!(
                    "Argument '{name}' on Field '{}' has an invalid value ({}). Expected type '{}'.",
                    field.name, value.node, definition.ty
                ))
                .with_location(value.pos)
                .with_extension("problems", json!([{ "explanation": explanation }]))
            },
        )?;
        arguments.insert(Name::new(name), coerced);
    }

    if !missing.is_empty() {
        return Err(GraphqlError::new(format!(
            "Field '{}' is missing required arguments: {}",
            field.name,
            missing.iter().join(", ")
        ))
        .with_location(ast.pos));
    }

    Ok(arguments)
}

/// Whether `@skip` or `@include` remove the selection carrying `directives`.
pub(crate) fn is_excluded(directives: &[Positioned<Directive>], variables: &Variables) -> Result<bool, GraphqlError> {
    for directive in directives {
        let skip_when = match directive.node.name.node.as_str() {
            "skip" => true,
            "include" => false,
            _ => continue,
        };
        if condition(directive, variables)? == skip_when {
            return Ok(true);
        }
    }
    Ok(false)
}

fn condition(directive: &Positioned<Directive>, variables: &Variables) -> Result<bool, GraphqlError> {
    let name = &directive.node.name.node;
    let Some(value) = directive.node.get_argument("if") else {
        return Err(
            GraphqlError::new(format!("Directive '{name}' is missing required arguments: if"))
                .with_location(directive.pos),
        );
    };

    match substitute(&value.node, variables) {
        ConstValue::Boolean(condition) => Ok(condition),
        _ => Err(GraphqlError::new(format!(
            "Argument 'if' on Directive '{name}' has an invalid value ({}). Expected type 'Boolean!'.",
            value.node
        ))
        .with_location(value.pos)),
    }
}

/// Replaces variables with their values. Variables the request did not provide become `null`.
fn substitute(value: &Value, variables: &Variables) -> ConstValue {
    value
        .clone()
        .into_const_with(|name| Ok::<_, Infallible>(variables.get(&name).cloned().unwrap_or_default()))
        .unwrap_or_else(|never| match never {})
}
