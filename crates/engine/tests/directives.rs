mod common;

use async_graphql_parser::types::DirectiveLocation;
use async_trait::async_trait;
use engine::{
    registry::{resolvers::ResolvedValue, MetaDirective, MetaInputValue},
    ContextField, DirectiveArguments, DirectiveMiddleware, Error, ExecutionOptions, Request, ResolveNext, Schema,
    ValidationMode, Variables,
};
use serde_json::json;

#[tokio::test]
async fn skip_and_include() {
    let cases = [
        ("{ greet @skip(if: true) viewer { id } }", json!({"viewer": {"id": "1"}})),
        (
            "{ greet @skip(if: false) viewer { id } }",
            json!({"greet": "Hello, world!", "viewer": {"id": "1"}}),
        ),
        ("{ greet @include(if: true) }", json!({"greet": "Hello, world!"})),
        ("{ greet @include(if: false) }", json!({})),
        // Skip wins over include when both apply.
        ("{ greet @skip(if: true) @include(if: true) }", json!({})),
    ];

    for (query, expected) in cases {
        let response = common::schema().execute(query).await;
        assert!(response.is_ok(), "{query}: {:?}", response.errors);
        assert_eq!(response.to_json()["data"], expected, "{query}");
    }
}

#[tokio::test]
async fn skip_and_include_on_fragments() {
    let query = r"
        {
            viewer {
                ... @include(if: false) { name }
                ...ids @skip(if: false)
            }
        }
        fragment ids on User { id }
    ";
    let response = common::schema().execute(query).await;

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.to_json()["data"], json!({"viewer": {"id": "1"}}));
}

#[tokio::test]
async fn conditions_take_variables() {
    let query = "query($yes: Boolean!) { greet @include(if: $yes) }";

    let request = Request::new(query).variables(Variables::from_json(json!({"yes": true})));
    let response = common::schema().execute(request).await;
    assert_eq!(response.to_json()["data"], json!({"greet": "Hello, world!"}));

    let request = Request::new(query).variables(Variables::from_json(json!({"yes": false})));
    let response = common::schema().execute(request).await;
    assert_eq!(response.to_json()["data"], json!({}));
}

#[tokio::test]
async fn skip_requires_the_if_argument() {
    let response = common::schema().execute("{ greet @skip }").await;
    assert_eq!(
        response.errors[0].message,
        "Directive @skip requires an \"if\" argument"
    );
}

struct Uppercase;

#[async_trait]
impl DirectiveMiddleware for Uppercase {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        _directive: &DirectiveArguments,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error> {
        let resolved = next.run(ctx, parent).await?;
        match resolved.data_resolved() {
            serde_json::Value::String(text) => Ok(ResolvedValue::new(json!(text.to_uppercase()))),
            _ => Ok(resolved),
        }
    }
}

struct Suffix;

#[async_trait]
impl DirectiveMiddleware for Suffix {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        directive: &DirectiveArguments,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error> {
        let suffix = match directive.get("text") {
            Some(engine::ConstValue::String(text)) => text.clone(),
            _ => String::new(),
        };
        let resolved = next.run(ctx, parent).await?;
        match resolved.data_resolved() {
            serde_json::Value::String(text) => Ok(ResolvedValue::new(json!(format!("{text}{suffix}")))),
            _ => Ok(resolved),
        }
    }
}

fn schema_with_directives() -> Schema {
    let mut registry = common::registry();
    registry.insert_directive(MetaDirective {
        name: "uppercase".to_string(),
        description: None,
        locations: vec![DirectiveLocation::Field],
        args: Default::default(),
        is_repeatable: false,
    });
    registry.insert_directive(MetaDirective {
        name: "suffix".to_string(),
        description: None,
        locations: vec![DirectiveLocation::Field],
        args: [("text".to_string(), MetaInputValue::new("text", "String!"))]
            .into_iter()
            .collect(),
        is_repeatable: true,
    });
    Schema::build(registry)
        .directive_middleware("uppercase", Uppercase)
        .directive_middleware("suffix", Suffix)
        .finish()
        .expect("valid test schema")
}

#[tokio::test]
async fn directive_middleware_transforms_the_result() {
    let response = schema_with_directives().execute("{ greet @uppercase }").await;
    assert_eq!(response.to_json()["data"], json!({"greet": "HELLO, WORLD!"}));
}

#[tokio::test]
async fn directive_middleware_receives_coerced_arguments() {
    let response = schema_with_directives()
        .execute("{ greet @suffix(text: \" :)\") }")
        .await;
    assert_eq!(response.to_json()["data"], json!({"greet": "Hello, world! :)"}));
}

#[tokio::test]
async fn directive_middleware_runs_in_query_order() {
    // uppercase wraps suffix, so the suffix is uppercased too.
    let response = schema_with_directives()
        .execute("{ greet @uppercase @suffix(text: \"!\") }")
        .await;
    assert_eq!(response.to_json()["data"], json!({"greet": "HELLO, WORLD!!"}));
}

#[tokio::test]
async fn directive_middleware_applies_to_meta_fields() {
    let response = schema_with_directives().execute("{ __typename @uppercase }").await;
    assert_eq!(response.to_json()["data"], json!({"__typename": "QUERY"}));
}

#[tokio::test]
async fn unknown_directive_fails_in_strict_mode() {
    let response = common::schema().execute("{ greet @nope }").await;
    assert_eq!(response.errors[0].message, "Unknown directive \"@nope\"");
    assert_eq!(response.to_json()["data"], serde_json::Value::Null);
}

#[tokio::test]
async fn unknown_directive_is_ignored_in_lenient_mode() {
    let schema = Schema::build(common::registry())
        .options(ExecutionOptions {
            validation_mode: ValidationMode::Lenient,
            ..Default::default()
        })
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ greet @nope }").await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.to_json()["data"], json!({"greet": "Hello, world!"}));
}

#[tokio::test]
async fn invalid_condition_value_is_reported() {
    let response = common::schema().execute("{ greet @skip(if: 3) }").await;
    assert_eq!(
        response.errors[0].message,
        "Invalid value for argument \"if\", expected type \"Boolean!\""
    );
}
