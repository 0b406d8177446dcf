mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use engine::{
    registry::resolvers::ResolvedValue, ContextField, Error, FieldMiddleware, ResolveNext, Schema,
};
use serde_json::json;

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    tag: &'static str,
    log: Log,
}

#[async_trait]
impl FieldMiddleware for Recorder {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error> {
        self.log.lock().unwrap().push(format!("{}:{}", self.tag, ctx.field.name));
        next.run(ctx, parent).await
    }
}

#[tokio::test]
async fn middleware_runs_in_registration_order() {
    let log: Log = Default::default();
    let schema = Schema::build(common::registry())
        .use_middleware(Recorder { tag: "outer", log: log.clone() })
        .use_middleware(Recorder { tag: "inner", log: log.clone() })
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ greet }").await;

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(*log.lock().unwrap(), vec!["outer:greet", "inner:greet"]);
}

#[tokio::test]
async fn middleware_sees_every_nested_field() {
    let log: Log = Default::default();
    let schema = Schema::build(common::registry())
        .use_middleware(Recorder { tag: "m", log: log.clone() })
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ viewer { id name } }").await;

    assert!(response.is_ok(), "{:?}", response.errors);
    let mut log = log.lock().unwrap().clone();
    log.sort_unstable();
    assert_eq!(log, vec!["m:id", "m:name", "m:viewer"]);
}

struct ShortCircuit;

#[async_trait]
impl FieldMiddleware for ShortCircuit {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error> {
        if ctx.field.name == "greet" {
            return Ok(ResolvedValue::new(json!("intercepted")));
        }
        next.run(ctx, parent).await
    }
}

#[tokio::test]
async fn middleware_can_short_circuit_the_resolver() {
    let schema = Schema::build(common::registry())
        .use_middleware(ShortCircuit)
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ greet viewer { id } }").await;

    assert_eq!(
        response.to_json()["data"],
        json!({"greet": "intercepted", "viewer": {"id": "1"}})
    );
}

struct DenyAll;

#[async_trait]
impl FieldMiddleware for DenyAll {
    async fn resolve(
        &self,
        _ctx: &ContextField<'_>,
        _parent: &ResolvedValue,
        _next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error> {
        Err(Error::new("denied"))
    }
}

#[tokio::test]
async fn meta_fields_bypass_schema_middleware() {
    let schema = Schema::build(common::registry())
        .use_middleware(DenyAll)
        .finish()
        .expect("valid test schema");

    // Regular fields are denied, the meta fields are not.
    let response = schema.execute("{ viewer { id } __typename }").await;

    assert_eq!(
        response.to_json()["data"],
        json!({"viewer": null, "__typename": "Query"})
    );
    assert_eq!(response.errors[0].message, "denied");
}

#[tokio::test]
async fn middleware_errors_are_field_errors() {
    let schema = Schema::build(common::registry())
        .use_middleware(DenyAll)
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ fail: greet }").await;

    // greet is String!, the denial climbs to the root.
    assert_eq!(response.to_json()["data"], serde_json::Value::Null);
    assert_eq!(response.errors[0].message, "denied");
    assert!(!response.errors[0].path.is_empty());
}

#[derive(Clone)]
struct RequestTag(&'static str);

struct Tagger;

#[async_trait]
impl FieldMiddleware for Tagger {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error> {
        ctx.set_local_state(RequestTag("stamped"));
        next.run(ctx, parent).await
    }
}

#[tokio::test]
async fn middleware_hands_local_state_to_the_resolver() {
    use engine::registry::{resolvers::Resolver, MetaField, ObjectType, Registry};

    let mut registry = Registry::new();
    registry.insert_type(ObjectType::new(
        "Query",
        [MetaField::new("tag", "String").with_resolver(Resolver::custom(|rctx| {
            let tag = rctx.ctx.get_local_state::<RequestTag>().map(|t| t.0);
            Box::pin(async move { Ok(serde_json::Value::from(tag)) })
        }))],
    ));
    let schema = Schema::build(registry)
        .use_middleware(Tagger)
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ tag }").await;
    assert_eq!(response.to_json()["data"], json!({"tag": "stamped"}));
}

struct StashedGreeting(String);

#[tokio::test]
async fn resolvers_read_schema_data() {
    use engine::registry::{resolvers::Resolver, MetaField, ObjectType};

    let mut registry = common::registry();
    registry.insert_type(ObjectType::new(
        "Query",
        [MetaField::new("stashed", "String").with_resolver(Resolver::custom(|rctx| {
            let stashed = rctx.ctx.data::<StashedGreeting>().map(|s| s.0.clone());
            Box::pin(async move { stashed.map(serde_json::Value::String) })
        }))],
    ));
    let schema = Schema::build(registry)
        .data(StashedGreeting("from the schema".to_string()))
        .finish()
        .expect("valid test schema");

    let response = schema.execute("{ stashed }").await;
    assert_eq!(response.to_json()["data"], json!({"stashed": "from the schema"}));
}
