//! The type system the engine executes against.
//!
//! A [`Registry`] is built by the application, handed to a [`crate::SchemaBuilder`] and only
//! read afterwards. Field values come from [`Resolver`] callbacks; fields without one read the
//! same-named key of their parent object.

mod scalars;

use std::{fmt, rc::Rc};

use engine_parser::types::{BaseType, OperationType, Type};
use engine_value::ConstValue;
use indexmap::{IndexMap, IndexSet};

pub use self::scalars::BuiltinScalar;
use crate::{FieldError, FieldValue, ResolverContext, SchemaError};

/// Computes the value of a field.
#[derive(Clone)]
pub struct Resolver(Rc<dyn Fn(&ResolverContext<'_>) -> Result<FieldValue, FieldError>>);

impl Resolver {
    pub fn new(resolver: impl Fn(&ResolverContext<'_>) -> Result<FieldValue, FieldError> + 'static) -> Self {
        Resolver(Rc::new(resolver))
    }

    pub fn call(&self, ctx: &ResolverContext<'_>) -> Result<FieldValue, FieldError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}

/// Picks the object type of a value returned for an interface or a union.
#[derive(Clone)]
pub struct TypeResolver(Rc<dyn Fn(&serde_json::Value) -> Option<String>>);

impl TypeResolver {
    pub fn new(resolver: impl Fn(&serde_json::Value) -> Option<String> + 'static) -> Self {
        TypeResolver(Rc::new(resolver))
    }
}

impl fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeResolver")
    }
}

/// Parses a type reference such as `[User!]!`. Malformed references become a named type that
/// the schema check reports as unknown.
fn type_ref(ty: &str) -> Type {
    Type::new(ty).unwrap_or_else(|| Type::nullable(BaseType::named(ty)))
}

#[derive(Clone, Debug)]
pub struct MetaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: &str) -> Self {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: type_ref(ty),
            default_value: None,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        MetaInputValue {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_default(self, default_value: impl Into<ConstValue>) -> Self {
        MetaInputValue {
            default_value: Some(default_value.into()),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct MetaField {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: Type,
    pub resolver: Option<Resolver>,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: &str) -> MetaField {
        MetaField {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            ty: type_ref(ty),
            resolver: None,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        MetaField {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    #[must_use]
    pub fn resolver(
        self,
        resolver: impl Fn(&ResolverContext<'_>) -> Result<FieldValue, FieldError> + 'static,
    ) -> Self {
        MetaField {
            resolver: Some(Resolver::new(resolver)),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    pub implements: IndexSet<String>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            implements: IndexSet::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: MetaField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.insert(interface.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    pub resolve_type: Option<TypeResolver>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            resolve_type: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: MetaField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn resolve_type(self, resolver: impl Fn(&serde_json::Value) -> Option<String> + 'static) -> Self {
        InterfaceType {
            resolve_type: Some(TypeResolver::new(resolver)),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: IndexSet<String>,
    pub resolve_type: Option<TypeResolver>,
}

impl UnionType {
    pub fn new(name: impl Into<String>) -> Self {
        UnionType {
            name: name.into(),
            description: None,
            possible_types: IndexSet::new(),
            resolve_type: None,
        }
    }

    #[must_use]
    pub fn member(mut self, object: impl Into<String>) -> Self {
        self.possible_types.insert(object.into());
        self
    }

    #[must_use]
    pub fn resolve_type(self, resolver: impl Fn(&serde_json::Value) -> Option<String> + 'static) -> Self {
        UnionType {
            resolve_type: Some(TypeResolver::new(resolver)),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexSet<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A scalar. The builtin ones coerce values, custom ones pass them through untouched.
#[derive(Clone, Debug)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub builtin: Option<BuiltinScalar>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        ScalarType {
            name: name.into(),
            description: None,
            builtin: None,
        }
    }
}

impl From<BuiltinScalar> for ScalarType {
    fn from(scalar: BuiltinScalar) -> Self {
        ScalarType {
            name: scalar.to_string(),
            description: None,
            builtin: Some(scalar),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaInputValue>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        InputObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: MetaInputValue) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

#[derive(Clone, Debug)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(scalar) => &scalar.name,
            MetaType::Object(object) => &object.name,
            MetaType::Interface(interface) => &interface.name,
            MetaType::Union(union) => &union.name,
            MetaType::Enum(enum_type) => &enum_type.name,
            MetaType::InputObject(input) => &input.name,
        }
    }

    pub fn field(&self, name: &str) -> Option<&MetaField> {
        match self {
            MetaType::Object(object) => object.fields.get(name),
            MetaType::Interface(interface) => interface.fields.get(name),
            _ => None,
        }
    }

    /// Object, interface or union.
    pub fn is_composite(&self) -> bool {
        matches!(self, MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_) | MetaType::InputObject(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }
}

impl From<ScalarType> for MetaType {
    fn from(ty: ScalarType) -> Self {
        MetaType::Scalar(ty)
    }
}

impl From<ObjectType> for MetaType {
    fn from(ty: ObjectType) -> Self {
        MetaType::Object(ty)
    }
}

impl From<InterfaceType> for MetaType {
    fn from(ty: InterfaceType) -> Self {
        MetaType::Interface(ty)
    }
}

impl From<UnionType> for MetaType {
    fn from(ty: UnionType) -> Self {
        MetaType::Union(ty)
    }
}

impl From<EnumType> for MetaType {
    fn from(ty: EnumType) -> Self {
        MetaType::Enum(ty)
    }
}

impl From<InputObjectType> for MetaType {
    fn from(ty: InputObjectType) -> Self {
        MetaType::InputObject(ty)
    }
}

#[derive(Clone, Debug)]
pub struct Registry {
    pub types: IndexMap<String, MetaType>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Registry {
            types: IndexMap::new(),
            query_type: "Query".to_string(),
            mutation_type: None,
            subscription_type: None,
        };
        for scalar in BuiltinScalar::ALL {
            registry.insert_type(ScalarType::from(scalar));
        }
        registry
    }
}

impl Registry {
    /// Adds a type, replacing any type of the same name.
    pub fn insert_type(&mut self, ty: impl Into<MetaType>) {
        let ty = ty.into();
        self.types.insert(ty.name().to_string(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&MetaField> {
        self.lookup(type_name)?.field(field_name)
    }

    pub fn root_type(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    /// The object types a value of type `name` can have at runtime, in registration order.
    pub fn possible_types<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        match self.lookup(name) {
            Some(MetaType::Object(object)) => vec![object.name.as_str()],
            Some(MetaType::Interface(_)) => self
                .types
                .values()
                .filter_map(|ty| match ty {
                    MetaType::Object(object) if object.implements.contains(name) => Some(object.name.as_str()),
                    _ => None,
                })
                .collect(),
            Some(MetaType::Union(union)) => union.possible_types.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_possible_type(&self, name: &str, object: &str) -> bool {
        match self.lookup(name) {
            Some(MetaType::Object(_)) => name == object,
            Some(MetaType::Interface(_)) => {
                matches!(self.lookup(object), Some(MetaType::Object(ty)) if ty.implements.contains(name))
            }
            Some(MetaType::Union(union)) => union.possible_types.contains(object),
            _ => false,
        }
    }

    /// The object type of `value`, returned for a field of type `name`.
    ///
    /// Interfaces and unions ask their [`TypeResolver`], or read the `__typename` key of the value
    /// when they have none. The answer must be one of the possible types.
    pub fn resolve_concrete_type(&self, name: &str, value: &serde_json::Value) -> Option<String> {
        let resolver = match self.lookup(name)? {
            MetaType::Object(object) => return Some(object.name.clone()),
            MetaType::Interface(interface) => interface.resolve_type.as_ref(),
            MetaType::Union(union) => union.resolve_type.as_ref(),
            _ => return None,
        };

        let concrete = match resolver {
            Some(resolver) => (resolver.0)(value),
            None => value.get("__typename").and_then(|name| name.as_str()).map(str::to_string),
        };
        concrete.filter(|object| self.is_possible_type(name, object))
    }

    /// Checks that every referenced type is registered and has the right kind.
    pub(crate) fn check(&self) -> Result<(), SchemaError> {
        self.check_root("query", Some(&self.query_type))?;
        self.check_root("mutation", self.mutation_type.as_ref())?;
        self.check_root("subscription", self.subscription_type.as_ref())?;

        for ty in self.types.values() {
            match ty {
                MetaType::Object(object) => {
                    for interface in &object.implements {
                        if !matches!(self.lookup(interface), Some(MetaType::Interface(_))) {
                            return Err(SchemaError::UnknownInterface {
                                object: object.name.clone(),
                                interface: interface.clone(),
                            });
                        }
                    }
                    self.check_fields(&object.name, &object.fields)?;
                }
                MetaType::Interface(interface) => self.check_fields(&interface.name, &interface.fields)?,
                MetaType::Union(union) => {
                    for member in &union.possible_types {
                        if !matches!(self.lookup(member), Some(MetaType::Object(_))) {
                            return Err(SchemaError::InvalidUnionMember {
                                union: union.name.clone(),
                                member: member.clone(),
                            });
                        }
                    }
                }
                MetaType::InputObject(input) => {
                    for field in input.fields.values() {
                        self.check_input(&input.name, &field.name, None, &field.ty)?;
                    }
                }
                MetaType::Scalar(_) | MetaType::Enum(_) => {}
            }
        }

        Ok(())
    }

    fn check_root(&self, operation: &'static str, name: Option<&String>) -> Result<(), SchemaError> {
        let Some(name) = name else {
            return Ok(());
        };
        match self.lookup(name) {
            Some(MetaType::Object(_)) => Ok(()),
            Some(_) => Err(SchemaError::InvalidRootType {
                operation,
                name: name.clone(),
            }),
            None => Err(SchemaError::MissingRootType {
                operation,
                name: name.clone(),
            }),
        }
    }

    fn check_fields(&self, owner: &str, fields: &IndexMap<String, MetaField>) -> Result<(), SchemaError> {
        for field in fields.values() {
            let ty = field.ty.named_type().as_str();
            match self.lookup(ty) {
                None => {
                    return Err(SchemaError::UnknownType {
                        owner: owner.to_string(),
                        field: field.name.clone(),
                        ty: ty.to_string(),
                    })
                }
                Some(MetaType::InputObject(_)) => {
                    return Err(SchemaError::NotAnOutputType {
                        owner: owner.to_string(),
                        field: field.name.clone(),
                        ty: ty.to_string(),
                    })
                }
                Some(_) => {}
            }
            for argument in field.args.values() {
                self.check_input(owner, &field.name, Some(&argument.name), &argument.ty)?;
            }
        }
        Ok(())
    }

    fn check_input(&self, owner: &str, field: &str, argument: Option<&str>, ty: &Type) -> Result<(), SchemaError> {
        let name = ty.named_type().as_str();
        match self.lookup(name) {
            Some(ty) if ty.is_input() => Ok(()),
            Some(_) => Err(SchemaError::NotAnInputType {
                owner: owner.to_string(),
                field: field.to_string(),
                argument: argument.unwrap_or(field).to_string(),
                ty: name.to_string(),
            }),
            None => Err(SchemaError::UnknownType {
                owner: owner.to_string(),
                field: field.to_string(),
                ty: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry.insert_type(InterfaceType::new("Node").field(MetaField::new("id", "ID!")));
        registry.insert_type(
            ObjectType::new("User")
                .implements("Node")
                .field(MetaField::new("id", "ID!"))
                .field(MetaField::new("friends", "[User!]")),
        );
        registry.insert_type(ObjectType::new("Post").implements("Node").field(MetaField::new("id", "ID!")));
        registry.insert_type(UnionType::new("SearchResult").member("Post").member("User"));
        registry.insert_type(ObjectType::new("Query").field(MetaField::new("node", "Node")));
        registry
    }

    #[test]
    fn possible_types() {
        let registry = registry();
        assert_eq!(registry.possible_types("Node"), vec!["User", "Post"]);
        assert_eq!(registry.possible_types("SearchResult"), vec!["Post", "User"]);
        assert_eq!(registry.possible_types("User"), vec!["User"]);
        assert!(registry.possible_types("Int").is_empty());

        assert!(registry.is_possible_type("Node", "Post"));
        assert!(!registry.is_possible_type("Node", "Query"));
        assert!(registry.is_possible_type("User", "User"));
    }

    #[test]
    fn concrete_types_default_to_typename() {
        let registry = registry();
        assert_eq!(
            registry.resolve_concrete_type("Node", &json!({"__typename": "Post"})),
            Some("Post".to_string())
        );
        assert_eq!(registry.resolve_concrete_type("Node", &json!({"__typename": "Query"})), None);
        assert_eq!(registry.resolve_concrete_type("Node", &json!({})), None);
        assert_eq!(
            registry.resolve_concrete_type("User", &json!({})),
            Some("User".to_string())
        );
    }

    #[test]
    fn custom_type_resolver() {
        let mut registry = registry();
        registry.insert_type(UnionType::new("SearchResult").member("Post").member("User").resolve_type(|value| {
            Some(if value.get("title").is_some() { "Post" } else { "User" }.to_string())
        }));
        assert_eq!(
            registry.resolve_concrete_type("SearchResult", &json!({"title": "Hi"})),
            Some("Post".to_string())
        );
    }

    #[test]
    fn check_reports_unknown_types() {
        let mut registry = registry();
        assert_eq!(registry.check(), Ok(()));

        registry.insert_type(ObjectType::new("Broken").field(MetaField::new("list", "[Missing")));
        assert_eq!(
            registry.check(),
            Err(SchemaError::UnknownType {
                owner: "Broken".into(),
                field: "list".into(),
                ty: "[Missing".into(),
            })
        );
    }

    #[test]
    fn check_reports_bad_roots_and_arguments() {
        let mut registry = registry();
        registry.mutation_type = Some("Node".into());
        assert_eq!(
            registry.check(),
            Err(SchemaError::InvalidRootType {
                operation: "mutation",
                name: "Node".into()
            })
        );

        let mut registry = self::registry();
        registry.insert_type(
            ObjectType::new("Query").field(MetaField::new("node", "Node").argument(MetaInputValue::new("of", "User"))),
        );
        assert_eq!(
            registry.check(),
            Err(SchemaError::NotAnInputType {
                owner: "Query".into(),
                field: "node".into(),
                argument: "of".into(),
                ty: "User".into(),
            })
        );
    }
}
