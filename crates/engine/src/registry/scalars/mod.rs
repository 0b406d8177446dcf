use async_graphql_value::ConstValue;

use crate::{Error, InputValueResult};

mod boolean;
mod float;
mod id;
mod int;
mod string;

pub use boolean::BooleanScalar;
pub use float::FloatScalar;
pub use id::IDScalar;
pub use int::IntScalar;
pub use string::StringScalar;

/// Coercion contract for a scalar.
///
/// `parse` performs input coercion (query literal or variable into the
/// wire representation), `is_valid` is the cheap check used during
/// validation, and `to_value` performs result coercion (resolver output
/// into the response value).
pub trait DynamicParse {
    /// Parse a scalar value and execute an input coercion.
    fn parse(value: ConstValue) -> InputValueResult<serde_json::Value>;

    /// Checks for a valid scalar value.
    fn is_valid(value: &ConstValue) -> bool;

    /// Result coercion: convert resolver data into the response shape.
    ///
    /// Can fail if the data can't be coerced.
    fn to_value(value: serde_json::Value) -> Result<ConstValue, Error>;
}

/// Dispatches to the built-in scalar implementations by type name.
///
/// Custom scalars that aren't known here pass through unchanged, which is
/// the behaviour of a `PassThrough` scalar parser.
pub struct PossibleScalar;

impl PossibleScalar {
    pub fn parse(type_name: &str, value: ConstValue) -> InputValueResult<serde_json::Value> {
        match type_name {
            "String" => StringScalar::parse(value),
            "ID" => IDScalar::parse(value),
            "Int" => IntScalar::parse(value),
            "Float" => FloatScalar::parse(value),
            "Boolean" => BooleanScalar::parse(value),
            _ => value
                .into_json()
                .map_err(|err| crate::InputValueError::custom(err.to_string())),
        }
    }

    pub fn is_valid(type_name: &str, value: &ConstValue) -> bool {
        match type_name {
            "String" => StringScalar::is_valid(value),
            "ID" => IDScalar::is_valid(value),
            "Int" => IntScalar::is_valid(value),
            "Float" => FloatScalar::is_valid(value),
            "Boolean" => BooleanScalar::is_valid(value),
            _ => true,
        }
    }

    pub fn to_value(type_name: &str, value: serde_json::Value) -> Result<ConstValue, Error> {
        if value.is_null() {
            return Ok(ConstValue::Null);
        }
        match type_name {
            "String" => StringScalar::to_value(value),
            "ID" => IDScalar::to_value(value),
            "Int" => IntScalar::to_value(value),
            "Float" => FloatScalar::to_value(value),
            "Boolean" => BooleanScalar::to_value(value),
            _ => ConstValue::from_json(value).map_err(Error::from),
        }
    }
}
