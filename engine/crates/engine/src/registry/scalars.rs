use engine_value::ConstValue;
use serde_json::{Number, Value};

/// The scalars every registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display, strum::AsRefStr)]
pub enum BuiltinScalar {
    Int,
    Float,
    String,
    Boolean,
    #[strum(serialize = "ID")]
    Id,
}

impl BuiltinScalar {
    pub const ALL: [BuiltinScalar; 5] = [
        BuiltinScalar::Int,
        BuiltinScalar::Float,
        BuiltinScalar::String,
        BuiltinScalar::Boolean,
        BuiltinScalar::Id,
    ];

    /// Coerces an argument or variable value.
    pub fn parse(self, value: ConstValue) -> Result<ConstValue, String> {
        match (self, value) {
            (BuiltinScalar::Int, ConstValue::Number(number)) if as_i32(&number).is_some() => {
                Ok(ConstValue::Number(number))
            }
            (BuiltinScalar::Float, ConstValue::Number(number)) => Ok(ConstValue::Number(number)),
            (BuiltinScalar::String, ConstValue::String(string)) => Ok(ConstValue::String(string)),
            (BuiltinScalar::Boolean, ConstValue::Boolean(boolean)) => Ok(ConstValue::Boolean(boolean)),
            (BuiltinScalar::Id, ConstValue::String(string)) => Ok(ConstValue::String(string)),
            (BuiltinScalar::Id, ConstValue::Number(number)) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            (scalar, value) => Err(scalar.invalid(&value)),
        }
    }

    /// Coerces a value returned by a resolver.
    pub fn serialize(self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (BuiltinScalar::Int, Value::Number(number)) => match as_i32(&number) {
                Some(int) => Ok(Value::from(int)),
                None => Err(self.invalid(&number)),
            },
            (BuiltinScalar::Float, Value::Number(number)) => Ok(Value::Number(number)),
            (BuiltinScalar::String | BuiltinScalar::Id, Value::String(string)) => Ok(Value::String(string)),
            (BuiltinScalar::String, Value::Number(number)) => Ok(Value::String(number.to_string())),
            (BuiltinScalar::String, Value::Bool(boolean)) => Ok(Value::String(boolean.to_string())),
            (BuiltinScalar::Id, Value::Number(number)) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string()))
            }
            (BuiltinScalar::Boolean, Value::Bool(boolean)) => Ok(Value::Bool(boolean)),
            (scalar, value) => Err(scalar.invalid(&value)),
        }
    }

    fn invalid(self, value: &dyn std::fmt::Display) -> String {
        match self {
            BuiltinScalar::Int => format!("Int cannot represent non 32-bit signed integer value: {value}"),
            BuiltinScalar::Float => format!("Float cannot represent non numeric value: {value}"),
            BuiltinScalar::String => format!("String cannot represent a non string value: {value}"),
            BuiltinScalar::Boolean => format!("Boolean cannot represent a non boolean value: {value}"),
            BuiltinScalar::Id => format!("ID cannot represent a non-string and non-integer value: {value}"),
        }
    }
}

/// Integral numbers within the 32 bit range, including floats without a fractional part.
fn as_i32(number: &Number) -> Option<i32> {
    if let Some(int) = number.as_i64() {
        return i32::try_from(int).ok();
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float >= f64::from(i32::MIN) && float <= f64::from(i32::MAX) {
        return Some(float as i32);
    }
    None
}
