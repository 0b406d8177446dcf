use async_graphql_value::ConstValue;

use super::DynamicParse;
use crate::{Error, InputValueError, InputValueResult};

pub struct FloatScalar;

impl DynamicParse for FloatScalar {
    fn is_valid(value: &ConstValue) -> bool {
        // Int literals are accepted wherever a Float is expected.
        matches!(value, ConstValue::Number(_))
    }

    fn to_value(value: serde_json::Value) -> Result<ConstValue, Error> {
        match value {
            serde_json::Value::Number(v) => Ok(ConstValue::Number(v)),
            _ => Err(Error::new(
                "Data violation: Cannot coerce the initial value to a Float",
            )),
        }
    }

    fn parse(value: ConstValue) -> InputValueResult<serde_json::Value> {
        match value {
            ConstValue::Number(v) => Ok(serde_json::Value::Number(v)),
            _ => Err(InputValueError::ty_custom("Float", "Cannot parse into a Float")),
        }
    }
}
