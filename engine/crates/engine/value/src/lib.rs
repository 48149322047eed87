//! Value types for GraphQL.
//!
//! [`Value`] is a literal as it appears in a document and may reference variables,
//! [`ConstValue`] is a fully resolved value as handed to resolvers.

mod name;
mod variables;

use std::fmt::{self, Display, Formatter, Write};

use indexmap::IndexMap;
pub use name::Name;
pub use serde_json::Number;
pub use variables::Variables;

/// A resolved GraphQL value, for example `1`, `"foo"` or `{ a: [1, 2] }`.
///
/// [Reference](https://spec.graphql.org/October2021/#Value).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConstValue {
    /// `null`.
    #[default]
    Null,
    /// A number, either an integer or a float.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value, written without quotes.
    Enum(Name),
    /// A list of values.
    List(Vec<ConstValue>),
    /// An object. Keys keep their declaration order.
    Object(IndexMap<Name, ConstValue>),
}

/// A GraphQL literal, which may contain variables.
///
/// [Reference](https://spec.graphql.org/October2021/#Value).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    /// A variable, written `$name`.
    Variable(Name),
    /// `null`.
    #[default]
    Null,
    /// A number, either an integer or a float.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value, written without quotes.
    Enum(Name),
    /// A list of values.
    List(Vec<Value>),
    /// An object. Keys keep their declaration order.
    Object(IndexMap<Name, Value>),
}

/// A variable referenced by a [`Value`] could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Variable ${0} is not defined")]
pub struct UnknownVariable(pub Name);

impl Value {
    /// Replaces every variable with its value from `variables`.
    pub fn into_const_with<E>(self, mut f: impl FnMut(Name) -> Result<ConstValue, E>) -> Result<ConstValue, E> {
        self.into_const_with_mut(&mut f)
    }

    fn into_const_with_mut<E>(self, f: &mut impl FnMut(Name) -> Result<ConstValue, E>) -> Result<ConstValue, E> {
        Ok(match self {
            Self::Variable(name) => f(name)?,
            Self::Null => ConstValue::Null,
            Self::Number(num) => ConstValue::Number(num),
            Self::String(s) => ConstValue::String(s),
            Self::Boolean(b) => ConstValue::Boolean(b),
            Self::Enum(v) => ConstValue::Enum(v),
            Self::List(items) => ConstValue::List(
                items
                    .into_iter()
                    .map(|item| item.into_const_with_mut(f))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Object(map) => ConstValue::Object(
                map.into_iter()
                    .map(|(key, value)| Ok((key, value.into_const_with_mut(f)?)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Resolves every variable against `variables`. Variables that are not present fail.
    pub fn into_const_with_variables(self, variables: &Variables) -> Result<ConstValue, UnknownVariable> {
        self.into_const_with(|name| variables.get(&name).cloned().ok_or(UnknownVariable(name)))
    }

    /// Attempt to convert the value into a const value, failing on the first variable.
    #[must_use]
    pub fn into_const(self) -> Option<ConstValue> {
        self.into_const_with(|_| Err(())).ok()
    }

    /// Whether the value references any variable, at any depth.
    pub fn has_variables(&self) -> bool {
        match self {
            Self::Variable(_) => true,
            Self::List(items) => items.iter().any(Value::has_variables),
            Self::Object(map) => map.values().any(Value::has_variables),
            _ => false,
        }
    }
}

impl ConstValue {
    /// Convert this `ConstValue` into a `Value`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Number(num) => Value::Number(num),
            Self::String(s) => Value::String(s),
            Self::Boolean(b) => Value::Boolean(b),
            Self::Enum(v) => Value::Enum(v),
            Self::List(items) => Value::List(items.into_iter().map(ConstValue::into_value).collect()),
            Self::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, v.into_value())).collect()),
        }
    }

    /// Converts a JSON value. Object keys become names as-is.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (Name::new(k), Self::from_json(v))).collect())
            }
        }
    }

    /// Converts into JSON. Enum values become strings.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Number(n) => serde_json::Value::Number(n),
            Self::String(s) => serde_json::Value::String(s),
            Self::Boolean(b) => serde_json::Value::Bool(b),
            Self::Enum(v) => serde_json::Value::String(v.to_string()),
            Self::List(items) => serde_json::Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Object(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k.to_string(), v.into_json())).collect())
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The integer held by this value, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for ConstValue {
    fn from(value: serde_json::Value) -> Self {
        ConstValue::from_json(value)
    }
}

impl From<ConstValue> for serde_json::Value {
    fn from(value: ConstValue) -> Self {
        value.into_json()
    }
}

impl From<&str> for ConstValue {
    fn from(s: &str) -> Self {
        ConstValue::String(s.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(s: String) -> Self {
        ConstValue::String(s)
    }
}

impl From<bool> for ConstValue {
    fn from(b: bool) -> Self {
        ConstValue::Boolean(b)
    }
}

impl From<i32> for ConstValue {
    fn from(n: i32) -> Self {
        ConstValue::Number(n.into())
    }
}

impl From<i64> for ConstValue {
    fn from(n: i64) -> Self {
        ConstValue::Number(n.into())
    }
}

impl From<f64> for ConstValue {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(ConstValue::Null, ConstValue::Number)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Variable(name) => write!(f, "${name}"),
            Value::Null => f.write_str("null"),
            Value::Number(num) => write!(f, "{num}"),
            Value::String(s) => write_quoted(s, f),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Enum(name) => write!(f, "{name}"),
            Value::List(items) => write_list(items, f),
            Value::Object(map) => write_object(map, f),
        }
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Number(num) => write!(f, "{num}"),
            ConstValue::String(s) => write_quoted(s, f),
            ConstValue::Boolean(b) => write!(f, "{b}"),
            ConstValue::Enum(name) => write!(f, "{name}"),
            ConstValue::List(items) => write_list(items, f),
            ConstValue::Object(map) => write_object(map, f),
        }
    }
}

/// Writes `s` as a GraphQL string literal, escaping what needs to be escaped.
pub fn write_quoted(s: &str, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '\r' => f.write_str("\\r"),
            '\n' => f.write_str("\\n"),
            '\t' => f.write_str("\\t"),
            '"' => f.write_str("\\\""),
            '\\' => f.write_str("\\\\"),
            c if c.is_control() => write!(f, "\\u{:04X}", c as u32),
            c => f.write_char(c),
        }?;
    }
    f.write_char('"')
}

fn write_list<T: Display>(list: impl IntoIterator<Item = T>, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('[')?;
    for (i, item) in list.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    f.write_char(']')
}

fn write_object<K: Display, V: Display>(
    object: impl IntoIterator<Item = (K, V)>,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    f.write_char('{')?;
    for (i, (name, value)) in object.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}: {value}")?;
    }
    f.write_char('}')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_escapes_strings() {
        let value = ConstValue::String("say \"hi\"\n\u{1}".into());
        assert_eq!(value.to_string(), r#""say \"hi\"\n\u0001""#);
    }

    #[test]
    fn variables_are_substituted() {
        let mut variables = Variables::default();
        variables.insert(Name::new("id"), ConstValue::from(4));

        let value = Value::List(vec![Value::Variable(Name::new("id")), Value::Boolean(true)]);
        assert_eq!(
            value.into_const_with_variables(&variables),
            Ok(ConstValue::List(vec![ConstValue::from(4), ConstValue::Boolean(true)]))
        );

        let missing = Value::Variable(Name::new("other"));
        assert_eq!(
            missing.into_const_with_variables(&variables),
            Err(UnknownVariable(Name::new("other")))
        );
    }

    #[test]
    fn json_conversion_keeps_key_order() {
        let json = serde_json::json!({"b": 1, "a": [true, null], "c": {"d": 1.5}});
        let value = ConstValue::from_json(json.clone());
        assert_eq!(value.to_string(), "{b: 1, a: [true, null], c: {d: 1.5}}");
        assert_eq!(value.into_json(), json);
    }
}
