//! Value converters: string literals to typed attribute values and back.
//!
//! The kernel only asks a converter for two things: the value of a default
//! literal and the intrinsic default of its type. Serializers use the same
//! converters for attribute text.

use std::fmt;

use crate::{Error, Result, Value};

/// Converts between string literals and values of one data type.
pub trait ValueConverter {
    /// Parse a literal into a value.
    fn from_literal(&self, literal: &str) -> Result<Value>;

    /// Render a value as a literal.
    fn to_literal(&self, value: &Value) -> Result<String>;

    /// The value a feature of this type has when it declares no default literal.
    fn intrinsic_default(&self) -> Value {
        Value::Null
    }
}

/// Built-in converters for the primitive package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    String,
    Int,
    Long,
    Boolean,
    Double,
    Float,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::String,
        Primitive::Int,
        Primitive::Long,
        Primitive::Boolean,
        Primitive::Double,
        Primitive::Float,
    ];

    /// The data type name this converter is registered under.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::String => "String",
            Primitive::Int => "Int",
            Primitive::Long => "Long",
            Primitive::Boolean => "Boolean",
            Primitive::Double => "Double",
            Primitive::Float => "Float",
        }
    }

    fn unsupported(self, value: &Value) -> Error {
        Error::UnsupportedValue {
            type_name: self.name().to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ValueConverter for Primitive {
    fn from_literal(&self, literal: &str) -> Result<Value> {
        match self {
            Primitive::String => Ok(Value::String(literal.to_string())),
            Primitive::Int => literal
                .trim()
                .parse::<i32>()
                .map(Value::from)
                .map_err(|e| Error::conversion(self.name(), literal, e.to_string())),
            Primitive::Long => literal
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| Error::conversion(self.name(), literal, e.to_string())),
            Primitive::Boolean => match literal.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(Error::conversion(
                    self.name(),
                    literal,
                    "expected 'true' or 'false'",
                )),
            },
            Primitive::Double | Primitive::Float => literal
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| Error::conversion(self.name(), literal, e.to_string())),
        }
    }

    fn to_literal(&self, value: &Value) -> Result<String> {
        match (self, value) {
            (Primitive::String, Value::String(s)) => Ok(s.clone()),
            (Primitive::Int | Primitive::Long, Value::Integer(i)) => Ok(i.to_string()),
            (Primitive::Boolean, Value::Bool(b)) => Ok(b.to_string()),
            (Primitive::Double | Primitive::Float, Value::Float(x)) => Ok(x.to_string()),
            (Primitive::Double | Primitive::Float, Value::Integer(i)) => Ok(i.to_string()),
            _ => Err(self.unsupported(value)),
        }
    }

    fn intrinsic_default(&self) -> Value {
        match self {
            Primitive::String => Value::Null,
            Primitive::Int | Primitive::Long => Value::Integer(0),
            Primitive::Boolean => Value::Bool(false),
            Primitive::Double | Primitive::Float => Value::Float(0.0),
        }
    }
}
