#![allow(dead_code)]

use engine::{
    registry::{resolvers::Resolver, MetaField, MetaInputValue, ObjectType, Registry},
    ConstValue, Error, Schema,
};
use serde_json::json;

/// A small social-graph schema used across the integration tests. Root
/// fields carry custom resolvers returning fixed data; nested fields use
/// the default property selection.
pub fn registry() -> Registry {
    let mut registry = Registry::new();

    registry.insert_type(ObjectType::new(
        "User",
        [
            MetaField::new("id", "ID!"),
            MetaField::new("name", "String!"),
            MetaField::new("nickname", "String"),
            MetaField::new("friends", "[User!]"),
        ],
    ));

    registry.insert_type(ObjectType::new(
        "Query",
        [
            MetaField::new("greet", "String!")
                .with_argument(
                    MetaInputValue::new("name", "String").with_default(ConstValue::String("world".to_string())),
                )
                .with_resolver(Resolver::custom(|rctx| {
                    let name = match rctx.ctx.get_argument("name") {
                        Some(ConstValue::String(name)) => name.clone(),
                        _ => "world".to_string(),
                    };
                    Box::pin(async move { Ok(json!(format!("Hello, {name}!"))) })
                })),
            MetaField::new("viewer", "User").with_resolver(Resolver::custom(|_| {
                Box::pin(async {
                    Ok(json!({
                        "id": "1",
                        "name": "Alice",
                        "nickname": null,
                        "friends": [
                            {"id": "2", "name": "Bob"},
                            {"id": "3", "name": "Carol"},
                        ],
                    }))
                })
            })),
            MetaField::new("numbers", "[Int!]!")
                .with_argument(MetaInputValue::new("values", "[Int!]"))
                .with_resolver(Resolver::custom(|rctx| {
                    let values = rctx
                        .ctx
                        .get_argument("values")
                        .cloned()
                        .map(|values| values.into_json().unwrap_or(json!([1, 2, 3])))
                        .unwrap_or(json!([1, 2, 3]));
                    Box::pin(async move { Ok(values) })
                })),
            MetaField::new("fail", "String").with_resolver(Resolver::custom(|_| {
                Box::pin(async { Err(Error::new("query error 1")) })
            })),
            MetaField::new("failRequired", "String!").with_resolver(Resolver::custom(|_| {
                Box::pin(async { Err(Error::new("required failure")) })
            })),
            MetaField::new("broken", "String").with_resolver(Resolver::custom(|_| {
                Box::pin(async { Err(Error::unexpected("index out of bounds")) })
            })),
        ],
    ));

    registry
}

pub fn schema() -> Schema {
    Schema::build(registry()).finish().expect("valid test schema")
}
