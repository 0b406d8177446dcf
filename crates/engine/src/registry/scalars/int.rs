use async_graphql_value::ConstValue;

use super::DynamicParse;
use crate::{Error, InputValueError, InputValueResult};

pub struct IntScalar;

impl DynamicParse for IntScalar {
    fn is_valid(value: &ConstValue) -> bool {
        match value {
            ConstValue::Number(v) => !v.is_f64(),
            _ => false,
        }
    }

    fn to_value(value: serde_json::Value) -> Result<ConstValue, Error> {
        match value {
            serde_json::Value::Number(v) if !v.is_f64() => Ok(ConstValue::Number(v)),
            _ => Err(Error::new("Data violation: Cannot coerce the initial value to an Int")),
        }
    }

    fn parse(value: ConstValue) -> InputValueResult<serde_json::Value> {
        match value {
            ConstValue::Number(v) if !v.is_f64() => Ok(serde_json::Value::Number(v)),
            _ => Err(InputValueError::ty_custom("Int", "Cannot parse into an Int")),
        }
    }
}
