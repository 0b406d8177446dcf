mod common;

use engine::Schema;
use serde_json::json;

#[tokio::test]
async fn typename_on_any_composite() {
    let response = common::schema().execute("{ __typename viewer { __typename } }").await;

    assert_eq!(
        response.to_json()["data"],
        json!({"__typename": "Query", "viewer": {"__typename": "User"}})
    );
}

#[tokio::test]
async fn schema_meta_field() {
    let response = common::schema()
        .execute("{ __schema { queryType { name } mutationType { name } } }")
        .await;

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.to_json()["data"],
        json!({"__schema": {"queryType": {"name": "Query"}, "mutationType": null}})
    );
}

#[tokio::test]
async fn schema_types_include_the_registry() {
    let response = common::schema().execute("{ __schema { types { name kind } } }").await;

    assert!(response.is_ok(), "{:?}", response.errors);
    let types = response.to_json()["data"]["__schema"]["types"].clone();
    let names: Vec<_> = types
        .as_array()
        .unwrap()
        .iter()
        .map(|ty| ty["name"].as_str().unwrap().to_string())
        .collect();

    for expected in ["Query", "User", "String", "Int", "__Schema", "__Type"] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }
}

#[tokio::test]
async fn type_meta_field() {
    let response = common::schema()
        .execute("{ __type(name: \"User\") { kind name fields { name type { kind name } } } }")
        .await;

    assert!(response.is_ok(), "{:?}", response.errors);
    let user = response.to_json()["data"]["__type"].clone();
    assert_eq!(user["kind"], "OBJECT");
    assert_eq!(user["name"], "User");

    let fields = user["fields"].as_array().unwrap().clone();
    assert_eq!(fields[0]["name"], "id");
    assert_eq!(
        fields[0]["type"],
        json!({"kind": "NON_NULL", "name": null})
    );
    assert_eq!(fields[2]["name"], "nickname");
    assert_eq!(
        fields[2]["type"],
        json!({"kind": "SCALAR", "name": "String"})
    );
}

#[tokio::test]
async fn unknown_type_resolves_to_null() {
    let response = common::schema().execute("{ __type(name: \"Nope\") { name } }").await;

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.to_json()["data"], json!({"__type": null}));
}

#[tokio::test]
async fn introspection_can_be_disabled() {
    let schema = Schema::build(common::registry())
        .disable_introspection()
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ __schema { queryType { name } } }").await;
    assert_eq!(
        response.errors[0].message,
        "Cannot query field \"__schema\" on type \"Query\""
    );

    // __typename keeps working.
    let response = schema.execute("{ __typename }").await;
    assert_eq!(response.to_json()["data"], json!({"__typename": "Query"}));
}

#[tokio::test]
async fn directives_are_listed() {
    let response = common::schema()
        .execute("{ __schema { directives { name args { name type { kind } } } } }")
        .await;

    assert!(response.is_ok(), "{:?}", response.errors);
    let directives = response.to_json()["data"]["__schema"]["directives"].clone();
    let skip = directives
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "skip")
        .expect("skip is a builtin")
        .clone();
    assert_eq!(skip["args"][0]["name"], "if");
    assert_eq!(skip["args"][0]["type"]["kind"], "NON_NULL");
}
