//! Typed parameter values.
//!
//! A parameter always holds one of eight concrete shapes: four scalars and
//! four homogeneous arrays. There is no "unset" value; a parameter that made
//! it into a store has a type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type codes shared with `rcl_interfaces/msg/ParameterType`.
pub mod parameter_type {
    pub const BOOL: u8 = 1;
    pub const INTEGER: u8 = 2;
    pub const DOUBLE: u8 = 3;
    pub const STRING: u8 = 4;
    pub const BOOL_ARRAY: u8 = 6;
    pub const INTEGER_ARRAY: u8 = 7;
    pub const DOUBLE_ARRAY: u8 = 8;
    pub const STRING_ARRAY: u8 = 9;
}

/// The type of a parameter value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Bool,
    Integer,
    Double,
    String,
    BoolArray,
    IntegerArray,
    DoubleArray,
    StringArray,
}

impl ParameterType {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Bool => parameter_type::BOOL,
            Self::Integer => parameter_type::INTEGER,
            Self::Double => parameter_type::DOUBLE,
            Self::String => parameter_type::STRING,
            Self::BoolArray => parameter_type::BOOL_ARRAY,
            Self::IntegerArray => parameter_type::INTEGER_ARRAY,
            Self::DoubleArray => parameter_type::DOUBLE_ARRAY,
            Self::StringArray => parameter_type::STRING_ARRAY,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            parameter_type::BOOL => Some(Self::Bool),
            parameter_type::INTEGER => Some(Self::Integer),
            parameter_type::DOUBLE => Some(Self::Double),
            parameter_type::STRING => Some(Self::String),
            parameter_type::BOOL_ARRAY => Some(Self::BoolArray),
            parameter_type::INTEGER_ARRAY => Some(Self::IntegerArray),
            parameter_type::DOUBLE_ARRAY => Some(Self::DoubleArray),
            parameter_type::STRING_ARRAY => Some(Self::StringArray),
            _ => None,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::BoolArray | Self::IntegerArray | Self::DoubleArray | Self::StringArray
        )
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(std::string::String),
    BoolArray(Vec<bool>),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<std::string::String>),
}

impl ParameterValue {
    /// Returns the parameter type of this value.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Integer(_) => ParameterType::Integer,
            Self::Double(_) => ParameterType::Double,
            Self::String(_) => ParameterType::String,
            Self::BoolArray(_) => ParameterType::BoolArray,
            Self::IntegerArray(_) => ParameterType::IntegerArray,
            Self::DoubleArray(_) => ParameterType::DoubleArray,
            Self::StringArray(_) => ParameterType::StringArray,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool_array(&self) -> Option<&[bool]> {
        match self {
            Self::BoolArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integer_array(&self) -> Option<&[i64]> {
        match self {
            Self::IntegerArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double_array(&self) -> Option<&[f64]> {
        match self {
            Self::DoubleArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[std::string::String]> {
        match self {
            Self::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    item: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item(f, v)?;
    }
    f.write_str("]")
}

/// Renders values the way they would be written back into a parameter file:
/// doubles keep their decimal point and strings are quoted.
impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{:?}", v),
            Self::String(v) => write!(f, "{:?}", v),
            Self::BoolArray(v) => write_list(f, v, |f, x| write!(f, "{}", x)),
            Self::IntegerArray(v) => write_list(f, v, |f, x| write!(f, "{}", x)),
            Self::DoubleArray(v) => write_list(f, v, |f, x| write!(f, "{:?}", x)),
            Self::StringArray(v) => write_list(f, v, |f, x| write!(f, "{:?}", x)),
        }
    }
}
