use std::rc::Rc;

use dataloader::Lazy;
use engine_parser::types::{BaseType, Type};

use super::{
    context::QueryEnv,
    response_tree::{NodeId, ResponseTree},
    FieldValue, Next, ResolverContext,
};
use crate::{
    input::coerce_arguments,
    registry::MetaType,
    rewrite::{Irep, IrepChildren, IrepNode},
    ErrorPath, FieldError, GraphqlError, MultiplexError, Response,
};

/// Where a value being completed belongs.
struct Frame {
    field: Rc<IrepNode>,
    /// The type of the value, which is the field type or, inside lists, an element type.
    ty: Type,
    path: ErrorPath,
}

struct Deferred {
    node: NodeId,
    frame: Frame,
    lazy: Lazy<FieldValue, FieldError>,
}

/// The execution of one query.
///
/// [`QueryExecution::begin`] runs every resolver it can reach without forcing a lazy value.
/// Lazy values are put aside and completed by [`QueryExecution::resolve_wave`], one wave at a
/// time, which may in turn put aside new ones.
pub(crate) struct QueryExecution {
    env: Rc<QueryEnv>,
    irep: Irep,
    tree: ResponseTree,
    errors: Vec<GraphqlError>,
    pending: Vec<Deferred>,
}

impl QueryExecution {
    pub fn new(env: QueryEnv, irep: Irep) -> Self {
        QueryExecution {
            env: Rc::new(env),
            irep,
            tree: ResponseTree::new(),
            errors: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn begin(&mut self) -> Result<(), MultiplexError> {
        let root_type = self.irep.root_type.clone();
        let serial = self.irep.operation_type.is_mutation();
        let root_value = serde_json::Value::Object(serde_json::Map::new());

        let fields = self.irep.children.values().cloned().collect::<Vec<_>>();
        let nodes = self.tree.set_object(
            ResponseTree::ROOT,
            fields
                .iter()
                .map(|field| (field.name.to_string(), field.return_type.nullable)),
        );

        for (node, field) in nodes.into_iter().zip(&fields) {
            let path = ErrorPath::default().child(field.name.as_str());
            self.execute_field(node, &root_type, &root_value, field, path)?;

            // Mutation fields run one after the other, side effects included.
            if serial {
                while self.has_pending() {
                    self.resolve_wave()?;
                }
            }
            if !self.tree.is_live(ResponseTree::ROOT) {
                break;
            }
        }

        Ok(())
    }

    pub fn complexity(&self) -> usize {
        self.irep.complexity()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Completes every lazy value put aside so far.
    pub fn resolve_wave(&mut self) -> Result<(), MultiplexError> {
        let pending = std::mem::take(&mut self.pending);
        tracing::debug!(lazies = pending.len(), "resolving lazy values");

        for Deferred { node, frame, lazy } in pending {
            if !self.tree.is_live(node) {
                continue;
            }
            match lazy.value() {
                Ok(value) => self.complete(node, frame, value)?,
                Err(error) => self.fail(node, &frame, error)?,
            }
        }

        Ok(())
    }

    pub fn finish(self) -> Response {
        Response {
            data: Some(self.tree.into_json()),
            errors: self.errors,
            extensions: self.env.extensions.take(),
        }
    }

    fn execute_selection(
        &mut self,
        node: NodeId,
        object_type: &str,
        parent: &serde_json::Value,
        children: &IrepChildren,
        path: &ErrorPath,
    ) -> Result<(), MultiplexError> {
        let nodes = self.tree.set_object(
            node,
            children
                .iter()
                .map(|(key, child)| (key.to_string(), child.return_type.nullable)),
        );

        for (child_node, child) in nodes.into_iter().zip(children.values()) {
            self.execute_field(child_node, object_type, parent, child, path.child(child.name.as_str()))?;
            if !self.tree.is_live(node) {
                break;
            }
        }

        Ok(())
    }

    fn execute_field(
        &mut self,
        node: NodeId,
        object_type: &str,
        parent: &serde_json::Value,
        field: &Rc<IrepNode>,
        path: ErrorPath,
    ) -> Result<(), MultiplexError> {
        let frame = Frame {
            field: Rc::clone(field),
            ty: field.return_type.clone(),
            path,
        };

        if field.is_typename() {
            return self.complete(node, frame, FieldValue::from(object_type));
        }

        let env = Rc::clone(&self.env);
        let registry = &env.schema.registry;
        let (Some(definition), Some(item)) = (
            registry.field(object_type, &field.definition_name),
            field.ast_nodes.first(),
        ) else {
            let message = format!("Field '{}' doesn't exist on type '{object_type}'", field.definition_name);
            self.field_error(node, &frame, GraphqlError::new(message));
            return Ok(());
        };

        let args = match coerce_arguments(registry, definition, item, &env.variables) {
            Ok(args) => args,
            Err(error) => {
                self.field_error(node, &frame, error);
                return Ok(());
            }
        };

        let ctx = ResolverContext {
            parent_type: object_type,
            field: definition,
            parent,
            args: &args,
            path: &frame.path,
            item,
            env: &env,
        };
        let result = Next::new(&env.schema.middleware, &resolve_field).run(&ctx);

        match result {
            Ok(value) => self.complete(node, frame, value),
            Err(error) => self.fail(node, &frame, error),
        }
    }

    fn complete(&mut self, node: NodeId, frame: Frame, value: FieldValue) -> Result<(), MultiplexError> {
        if let FieldValue::Lazy(lazy) = value {
            self.pending.push(Deferred { node, frame, lazy });
            return Ok(());
        }

        if value.is_null() {
            if frame.ty.nullable {
                self.tree.set_null(node);
            } else {
                let error = GraphqlError::invalid_null(&frame.field.owner_type, &frame.field.definition_name, &frame.path);
                self.field_error(node, &frame, error);
            }
            return Ok(());
        }

        match frame.ty.base.clone() {
            BaseType::List(item_type) => self.complete_list(node, frame, &item_type, value),
            BaseType::Named(name) => self.complete_named(node, frame, &name, value),
        }
    }

    fn complete_list(
        &mut self,
        node: NodeId,
        frame: Frame,
        item_type: &Type,
        value: FieldValue,
    ) -> Result<(), MultiplexError> {
        let items = match value {
            FieldValue::List(items) => items,
            FieldValue::Value(serde_json::Value::Array(items)) => items.into_iter().map(FieldValue::Value).collect(),
            FieldValue::Value(other) => {
                let message = format!("Encountered a {} where we expected a list", json_kind(&other));
                self.field_error(node, &frame, GraphqlError::new(message));
                return Ok(());
            }
            lazy @ FieldValue::Lazy(_) => return self.complete(node, frame, lazy),
        };

        // A null element of a nullable list stays in place, whatever the element type says.
        let item_nodes = self.tree.set_list(node, items.len(), item_type.nullable || frame.ty.nullable);
        for (index, (item_node, item)) in item_nodes.into_iter().zip(items).enumerate() {
            let item_frame = Frame {
                field: Rc::clone(&frame.field),
                ty: item_type.clone(),
                path: frame.path.child(index),
            };
            self.complete(item_node, item_frame, item)?;
            if !self.tree.is_live(node) {
                break;
            }
        }

        Ok(())
    }

    fn complete_named(&mut self, node: NodeId, frame: Frame, name: &str, value: FieldValue) -> Result<(), MultiplexError> {
        let env = Rc::clone(&self.env);
        let registry = &env.schema.registry;

        match registry.lookup(name) {
            Some(MetaType::Scalar(scalar)) => {
                let Some(value) = value.into_json() else {
                    let message = format!("{name} cannot represent a list of deferred values");
                    self.field_error(node, &frame, GraphqlError::new(message));
                    return Ok(());
                };
                let serialized = match scalar.builtin {
                    Some(builtin) => builtin.serialize(value),
                    None => Ok(value),
                };
                match serialized {
                    Ok(value) => self.tree.set_leaf(node, value),
                    Err(message) => self.field_error(node, &frame, GraphqlError::new(message)),
                }
            }
            Some(MetaType::Enum(enum_type)) => match value {
                FieldValue::Value(serde_json::Value::String(variant)) if enum_type.values.contains(&variant) => {
                    self.tree.set_leaf(node, serde_json::Value::String(variant));
                }
                other => {
                    let shown = other.into_json().map_or_else(|| "a list".to_string(), |value| value.to_string());
                    let message = format!("Enum \"{name}\" cannot represent value: {shown}");
                    self.field_error(node, &frame, GraphqlError::new(message));
                }
            },
            Some(ty) if ty.is_composite() => {
                let FieldValue::Value(object) = value else {
                    let message = format!("Encountered a list where we expected a value of type {name}");
                    self.field_error(node, &frame, GraphqlError::new(message));
                    return Ok(());
                };
                let field = Rc::clone(&frame.field);
                let children = registry
                    .resolve_concrete_type(name, &object)
                    .and_then(|concrete| Some((field.children(&concrete)?, concrete)));
                match children {
                    Some((children, concrete)) => {
                        self.execute_selection(node, &concrete, &object, children, &frame.path)?;
                    }
                    None => {
                        let message = format!(
                            "Abstract type {name} must resolve to an object type at runtime for field {}.{}",
                            field.owner_type, field.definition_name
                        );
                        self.field_error(node, &frame, GraphqlError::new(message));
                    }
                }
            }
            _ => {
                let message = format!("{name} is not an output type");
                self.field_error(node, &frame, GraphqlError::new(message));
            }
        }

        Ok(())
    }

    fn fail(&mut self, node: NodeId, frame: &Frame, error: FieldError) -> Result<(), MultiplexError> {
        match error {
            FieldError::Graphql(error) => {
                self.field_error(node, frame, error);
                Ok(())
            }
            FieldError::Internal(error) => Err(MultiplexError::Internal(error)),
        }
    }

    /// Records `error` for the field and nulls its value.
    fn field_error(&mut self, node: NodeId, frame: &Frame, mut error: GraphqlError) {
        if error.locations.is_empty() {
            error.locations.extend(frame.field.ast_nodes.first().map(|field| field.pos));
        }
        if error.path.is_none() {
            error.path = Some(frame.path.clone());
        }
        self.errors.push(error);
        self.tree.set_null(node);
    }
}

fn resolve_field(ctx: &ResolverContext<'_>) -> Result<FieldValue, FieldError> {
    match &ctx.field.resolver {
        Some(resolver) => resolver.call(ctx),
        None => Ok(ctx
            .parent
            .get(&ctx.field.name)
            .cloned()
            .map_or_else(FieldValue::null, FieldValue::Value)),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "object",
    }
}
