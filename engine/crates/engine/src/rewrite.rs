//! Turns the selections of an operation into the plan the executor walks.
//!
//! For every object type a composite field can resolve to, the selections that apply to that
//! type are collected through fragment spreads and inline fragments, `@skip` and `@include` are
//! evaluated, and fields sharing a response key are merged into one [`IrepNode`].

use std::rc::Rc;

use engine_parser::{
    types::{BaseType, Document, Field, OperationDefinition, OperationType, Selection, SelectionSet, Type},
    Positioned,
};
use engine_value::{Name, Variables};
use indexmap::IndexMap;

use crate::{input::is_excluded, registry::Registry, GraphqlError};

pub const TYPENAME: &str = "__typename";

/// Response key to node, in selection order.
pub type IrepChildren = IndexMap<Name, Rc<IrepNode>>;

/// The rewritten selections of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Irep {
    pub operation_type: OperationType,
    pub root_type: Name,
    pub children: IrepChildren,
}

/// All the fields of a selection that share a response key on one object type.
#[derive(Debug, Clone, PartialEq)]
pub struct IrepNode {
    /// The response key.
    pub name: Name,
    /// The name of the field in the type system.
    pub definition_name: Name,
    /// The object type the field is selected on.
    pub owner_type: Name,
    pub return_type: Type,
    /// Every field of the document merged into this node.
    pub ast_nodes: Vec<Positioned<Field>>,
    /// The sub-selections for each object type the field can return.
    pub typed_children: IndexMap<Name, IrepChildren>,
}

impl IrepNode {
    /// The fields of the sub-selection that apply to `object_type`.
    pub fn children(&self, object_type: &str) -> Option<&IrepChildren> {
        self.typed_children.get(object_type)
    }

    pub fn is_typename(&self) -> bool {
        self.definition_name == TYPENAME
    }

    pub(crate) fn complexity(&self) -> usize {
        1 + self
            .typed_children
            .values()
            .map(|children| children.values().map(|child| child.complexity()).sum::<usize>())
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn depth(&self) -> usize {
        1 + self
            .typed_children
            .values()
            .flat_map(|children| children.values())
            .map(|child| child.depth())
            .max()
            .unwrap_or(0)
    }
}

impl Irep {
    /// Every field counts for one. For abstract types the most expensive object type counts.
    pub fn complexity(&self) -> usize {
        self.children.values().map(|child| child.complexity()).sum()
    }

    pub fn depth(&self) -> usize {
        self.children.values().map(|child| child.depth()).max().unwrap_or(0)
    }
}

/// Rewrites `operation`, taken from `document`, with the given coerced variables.
pub fn rewrite(
    registry: &Registry,
    document: &Document,
    operation: &OperationDefinition,
    variables: &Variables,
    introspect_typename: bool,
) -> Result<Irep, Vec<GraphqlError>> {
    let Some(root_type) = registry.root_type(operation.ty) else {
        let message = format!("Schema is not configured for {}s", operation.ty);
        return Err(vec![GraphqlError::new(message).with_location(operation.selection_set.pos)]);
    };

    let mut rewriter = Rewriter {
        registry,
        document,
        variables,
        introspect_typename,
        fragment_stack: Vec::new(),
        errors: Vec::new(),
    };
    let children = rewriter.children(root_type, [&operation.selection_set.node]);

    if rewriter.errors.is_empty() {
        Ok(Irep {
            operation_type: operation.ty,
            root_type: Name::new(root_type),
            children,
        })
    } else {
        Err(rewriter.errors)
    }
}

struct Rewriter<'a> {
    registry: &'a Registry,
    document: &'a Document,
    variables: &'a Variables,
    introspect_typename: bool,
    fragment_stack: Vec<&'a str>,
    errors: Vec<GraphqlError>,
}

impl<'a> Rewriter<'a> {
    fn children(
        &mut self,
        object_type: &str,
        selection_sets: impl IntoIterator<Item = &'a SelectionSet>,
    ) -> IrepChildren {
        let mut grouped: IndexMap<&'a Name, Vec<&'a Positioned<Field>>> = IndexMap::new();
        for selection_set in selection_sets {
            self.collect_fields(object_type, selection_set, &mut grouped);
        }

        grouped
            .into_iter()
            .filter_map(|(key, fields)| {
                let node = self.node(object_type, key, &fields)?;
                Some((key.clone(), Rc::new(node)))
            })
            .collect()
    }

    fn collect_fields(
        &mut self,
        object_type: &str,
        selection_set: &'a SelectionSet,
        grouped: &mut IndexMap<&'a Name, Vec<&'a Positioned<Field>>>,
    ) {
        for selection in &selection_set.items {
            match is_excluded(selection.directives(), self.variables) {
                Ok(false) => {}
                Ok(true) => continue,
                Err(error) => {
                    self.errors.push(error);
                    continue;
                }
            }

            match selection {
                Selection::Field(field) => grouped.entry(&field.node.response_key().node).or_default().push(field),
                Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.node.type_condition {
                        Some(condition) => self.condition_applies(&condition.node.on, object_type),
                        None => true,
                    };
                    if applies {
                        self.collect_fields(object_type, &fragment.node.selection_set.node, grouped);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let Some(fragment) = self.document.fragment(name) else {
                        self.errors.push(
                            GraphqlError::new(format!("Fragment {name} was used, but not defined"))
                                .with_location(spread.pos),
                        );
                        continue;
                    };
                    if self.fragment_stack.contains(&name) {
                        self.errors.push(
                            GraphqlError::new(format!("Fragment {name} contains an infinite loop"))
                                .with_location(spread.pos),
                        );
                        continue;
                    }
                    if !self.condition_applies(&fragment.node.type_condition.node.on, object_type) {
                        continue;
                    }

                    self.fragment_stack.push(name);
                    self.collect_fields(object_type, &fragment.node.selection_set.node, grouped);
                    self.fragment_stack.pop();
                }
            }
        }
    }

    fn condition_applies(&mut self, condition: &Positioned<Name>, object_type: &str) -> bool {
        if self.registry.lookup(&condition.node).is_none() {
            self.errors.push(
                GraphqlError::new(format!(
                    "No such type {}, so it can't be a fragment condition",
                    condition.node
                ))
                .with_location(condition.pos),
            );
            return false;
        }
        condition.node == object_type || self.registry.is_possible_type(&condition.node, object_type)
    }

    fn node(&mut self, object_type: &str, key: &Name, fields: &[&'a Positioned<Field>]) -> Option<IrepNode> {
        let registry = self.registry;
        let first = fields.first()?;
        let name = &first.node.name;

        let return_type = if name.node == TYPENAME && self.introspect_typename {
            Type::required(BaseType::named("String"))
        } else if let Some(definition) = registry.field(object_type, &name.node) {
            definition.ty.clone()
        } else {
            self.errors.push(
                GraphqlError::new(format!("Field '{}' doesn't exist on type '{object_type}'", name.node))
                    .with_location(first.pos),
            );
            return None;
        };

        let named_type = return_type.named_type().as_str();
        let composite = registry.lookup(named_type).is_some_and(|ty| ty.is_composite());
        let has_selections = fields.iter().any(|field| !field.node.selection_set.node.is_empty());

        let mut typed_children = IndexMap::new();
        if composite {
            if !has_selections {
                self.errors.push(
                    GraphqlError::new(format!(
                        "Field must have selections (field '{}' returns {named_type} but has no selections. Did you mean '{} {{ ... }}'?)",
                        name.node, name.node
                    ))
                    .with_location(first.pos),
                );
                return None;
            }
            for possible_type in registry.possible_types(named_type) {
                let selection_sets = fields.iter().map(|field| &field.node.selection_set.node);
                let children = self.children(possible_type, selection_sets);
                typed_children.insert(Name::new(possible_type), children);
            }
        } else if has_selections {
            self.errors.push(
                GraphqlError::new(format!(
                    "Selections can't be made on scalars (field '{}' returns {named_type} but has selections)",
                    name.node
                ))
                .with_location(first.pos),
            );
            return None;
        }

        Some(IrepNode {
            name: key.clone(),
            definition_name: name.node.clone(),
            owner_type: Name::new(object_type),
            return_type,
            ast_nodes: fields.iter().map(|field| (*field).clone()).collect(),
            typed_children,
        })
    }
}
