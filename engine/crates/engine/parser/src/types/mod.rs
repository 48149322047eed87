//! GraphQL types.
//!
//! The root type is [`Document`], holding the operations and fragments of an executable query
//! as well as any type-system definitions.
//!
//! This follows the [October 2021 edition of the GraphQL spec](https://spec.graphql.org/October2021/).

mod executable;
mod service;

use std::{
    fmt::{self, Display, Formatter, Write},
    sync::Arc,
};

use engine_value::{ConstValue, Name, Value};
pub use executable::*;
use serde::{Deserialize, Serialize};
pub use service::*;

use crate::pos::Positioned;

/// A parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// The definitions, in source order.
    pub definitions: Vec<Definition>,
    /// The file the document was read from, if any.
    pub filename: Option<Arc<str>>,
}

/// A top-level definition of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Operation(Positioned<OperationDefinition>),
    Fragment(Positioned<FragmentDefinition>),
    Schema(Positioned<SchemaDefinition>),
    Type(Positioned<TypeDefinition>),
    Directive(Positioned<DirectiveDefinition>),
}

impl Document {
    /// The operations of the document, in source order.
    pub fn operations(&self) -> impl Iterator<Item = &Positioned<OperationDefinition>> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            _ => None,
        })
    }

    /// The fragments of the document, in source order.
    pub fn fragments(&self) -> impl Iterator<Item = &Positioned<FragmentDefinition>> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some(fragment),
            _ => None,
        })
    }

    /// Find a named fragment.
    pub fn fragment(&self, name: &str) -> Option<&Positioned<FragmentDefinition>> {
        self.fragments()
            .find(|fragment| fragment.name.as_ref().is_some_and(|fragment_name| fragment_name.node == name))
    }

    /// The type-system definitions of the document.
    pub fn type_definitions(&self) -> impl Iterator<Item = &Positioned<TypeDefinition>> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Type(ty) => Some(ty),
            _ => None,
        })
    }
}

/// The type of an operation; `query`, `mutation` or `subscription`.
///
/// [Reference](https://spec.graphql.org/October2021/#OperationType).
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A query.
    Query,
    /// A mutation.
    Mutation,
    /// A subscription.
    Subscription,
}

impl OperationType {
    /// Operation type as str
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    /// Returns `true` if the operation type is [`Mutation`].
    ///
    /// [`Mutation`]: OperationType::Mutation
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Mutation)
    }
}

impl AsRef<str> for OperationType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// A GraphQL type, for example `String` or `[String!]!`.
///
/// [Reference](https://spec.graphql.org/October2021/#Type).
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Type {
    /// The base type.
    pub base: BaseType,
    /// Whether the type is nullable.
    pub nullable: bool,
}

impl Type {
    /// Create a type from the type string.
    #[must_use]
    pub fn new(ty: &str) -> Option<Self> {
        let (nullable, ty) = ty.strip_suffix('!').map_or((true, ty), |rest| (false, rest));

        Some(Self {
            base: if let Some(ty) = ty.strip_prefix('[') {
                BaseType::List(Box::new(Self::new(ty.strip_suffix(']')?)?))
            } else {
                BaseType::Named(Name::new(ty))
            },
            nullable,
        })
    }

    /// Create a required Type
    pub fn required(base: BaseType) -> Self {
        Type { base, nullable: false }
    }

    /// Create a nullable Type
    pub fn nullable(base: BaseType) -> Self {
        Type { base, nullable: true }
    }

    /// The type without its outermost non-null wrapper.
    #[must_use]
    pub fn as_nullable(&self) -> Self {
        Type {
            base: self.base.clone(),
            nullable: true,
        }
    }

    /// The name of the innermost named type, e.g. `User` for `[User!]!`.
    pub fn named_type(&self) -> &Name {
        self.base.named_type()
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.base.fmt(f)?;
        if !self.nullable {
            f.write_char('!')?;
        }
        Ok(())
    }
}

/// A GraphQL base type, for example `String` or `[String!]`. This does not include whether the
/// type is nullable; for that see [Type](struct.Type.html).
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum BaseType {
    /// A named type, such as `String`.
    Named(Name),
    /// A list type, such as `[String]`.
    List(Box<Type>),
}

impl BaseType {
    /// Create a new named BaseType
    pub fn named(name: &str) -> BaseType {
        BaseType::Named(Name::new(name))
    }

    /// Create a new list BaseType
    pub fn list(ty: Type) -> BaseType {
        BaseType::List(Box::new(ty))
    }

    /// Check the base type is a list
    pub fn is_list(&self) -> bool {
        matches!(self, BaseType::List(_))
    }

    fn named_type(&self) -> &Name {
        match self {
            BaseType::Named(name) => name,
            BaseType::List(ty) => ty.base.named_type(),
        }
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(ty) => write!(f, "[{ty}]"),
        }
    }
}

/// A const GraphQL directive, such as `@deprecated(reason: "Use the other field)`. This differs
/// from [`Directive`](struct.Directive.html) in that it uses [`ConstValue`](enum.ConstValue.html)
/// instead of [`Value`](enum.Value.html).
///
/// [Reference](https://spec.graphql.org/October2021/#Directive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDirective {
    /// The name of the directive.
    pub name: Positioned<Name>,
    /// The arguments to the directive.
    pub arguments: Vec<(Positioned<Name>, Positioned<ConstValue>)>,
}

impl ConstDirective {
    /// Convert this `ConstDirective` into a `Directive`.
    #[must_use]
    pub fn into_directive(self) -> Directive {
        Directive {
            name: self.name,
            arguments: self
                .arguments
                .into_iter()
                .map(|(name, value)| (name, value.map(ConstValue::into_value)))
                .collect(),
        }
    }

    /// Get the argument with the given name.
    #[must_use]
    pub fn get_argument(&self, name: &str) -> Option<&Positioned<ConstValue>> {
        self.arguments
            .iter()
            .find(|item| item.0.node == name)
            .map(|item| &item.1)
    }
}

/// A GraphQL directive, such as `@deprecated(reason: "Use the other field")`.
///
/// [Reference](https://spec.graphql.org/October2021/#Directive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The name of the directive.
    pub name: Positioned<Name>,
    /// The arguments to the directive.
    pub arguments: Vec<(Positioned<Name>, Positioned<Value>)>,
}

impl Directive {
    /// Attempt to convert this `Directive` into a `ConstDirective`.
    #[must_use]
    pub fn into_const(self) -> Option<ConstDirective> {
        Some(ConstDirective {
            name: self.name,
            arguments: self
                .arguments
                .into_iter()
                .map(|(name, value)| Some((name, Positioned::new(value.node.into_const()?, value.pos))))
                .collect::<Option<_>>()?,
        })
    }

    /// Get the argument with the given name.
    #[must_use]
    pub fn get_argument(&self, name: &str) -> Option<&Positioned<Value>> {
        self.arguments
            .iter()
            .find(|item| item.0.node == name)
            .map(|item| &item.1)
    }
}
