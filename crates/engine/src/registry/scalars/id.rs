use async_graphql_value::ConstValue;

use super::DynamicParse;
use crate::{Error, InputValueError, InputValueResult};

pub struct IDScalar;

impl DynamicParse for IDScalar {
    fn is_valid(value: &ConstValue) -> bool {
        // IDs serialize as strings but accept int literals as input.
        match value {
            ConstValue::String(_) => true,
            ConstValue::Number(n) => !n.is_f64(),
            _ => false,
        }
    }

    fn to_value(value: serde_json::Value) -> Result<ConstValue, Error> {
        match value {
            serde_json::Value::String(v) => Ok(ConstValue::String(v)),
            serde_json::Value::Number(v) => Ok(ConstValue::String(v.to_string())),
            _ => Err(Error::new("Data violation: Cannot coerce the initial value to an ID")),
        }
    }

    fn parse(value: ConstValue) -> InputValueResult<serde_json::Value> {
        match value {
            ConstValue::String(v) => Ok(serde_json::Value::String(v)),
            ConstValue::Number(v) if !v.is_f64() => Ok(serde_json::Value::String(v.to_string())),
            _ => Err(InputValueError::ty_custom("ID", "Cannot parse into an ID")),
        }
    }
}
