use async_graphql_value::ConstValue;

use super::DynamicParse;
use crate::{Error, InputValueError, InputValueResult};

pub struct BooleanScalar;

impl DynamicParse for BooleanScalar {
    fn is_valid(value: &ConstValue) -> bool {
        matches!(value, ConstValue::Boolean(_))
    }

    fn to_value(value: serde_json::Value) -> Result<ConstValue, Error> {
        match value {
            serde_json::Value::Bool(v) => Ok(ConstValue::Boolean(v)),
            _ => Err(Error::new(
                "Data violation: Cannot coerce the initial value to a Boolean",
            )),
        }
    }

    fn parse(value: ConstValue) -> InputValueResult<serde_json::Value> {
        match value {
            ConstValue::Boolean(v) => Ok(serde_json::Value::Bool(v)),
            _ => Err(InputValueError::ty_custom("Boolean", "Cannot parse into a Boolean")),
        }
    }
}
