mod common;

use engine::{
    registry::{resolvers::Resolver, MetaField, MetaInputValue, ObjectType, Registry},
    ConstValue, Error, Request, Schema,
};
use futures::StreamExt;
use serde_json::json;

fn schema_with_subscriptions() -> Schema {
    let mut registry = common::registry();

    registry.insert_type(ObjectType::new(
        "Subscription",
        [
            MetaField::new("ticks", "Int!")
                .with_argument(MetaInputValue::new("limit", "Int"))
                .with_resolver(Resolver::subscription(|rctx| {
                    let limit = match rctx.ctx.get_argument("limit") {
                        Some(ConstValue::Number(limit)) => limit.as_u64().unwrap_or(3),
                        _ => 3,
                    };
                    Box::pin(async move {
                        Ok(futures::stream::iter((1..=limit).map(|i| Ok(json!(i)))).boxed())
                    })
                })),
            MetaField::new("flaky", "Int").with_resolver(Resolver::subscription(|_| {
                Box::pin(async {
                    Ok(futures::stream::iter(vec![Ok(json!(1)), Err(Error::new("lost event")), Ok(json!(2))]).boxed())
                })
            })),
            MetaField::new("silent", "Int"),
        ],
    ));
    registry.subscription_type = Some("Subscription".to_string());
    Schema::build(registry).finish().expect("valid test schema")
}

#[tokio::test]
async fn each_event_yields_a_response() {
    let responses: Vec<_> = schema_with_subscriptions()
        .execute_stream("subscription { ticks(limit: 3) }")
        .collect()
        .await;

    assert_eq!(responses.len(), 3);
    for (i, response) in responses.iter().enumerate() {
        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(response.to_json()["data"], json!({"ticks": i + 1}));
    }
}

#[tokio::test]
async fn event_errors_do_not_end_the_stream() {
    let responses: Vec<_> = schema_with_subscriptions()
        .execute_stream("subscription { flaky }")
        .collect()
        .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].to_json()["data"], json!({"flaky": 1}));
    assert_eq!(responses[1].errors[0].message, "lost event");
    assert_eq!(responses[2].to_json()["data"], json!({"flaky": 2}));
}

#[tokio::test]
async fn subscriptions_select_a_single_field() {
    let responses: Vec<_> = schema_with_subscriptions()
        .execute_stream("subscription { ticks flaky }")
        .collect()
        .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(
        responses[0].errors[0].message,
        "Subscriptions must select exactly one top-level field"
    );
}

#[tokio::test]
async fn field_without_a_stream_is_rejected() {
    let responses: Vec<_> = schema_with_subscriptions()
        .execute_stream("subscription { silent }")
        .collect()
        .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(
        responses[0].errors[0].message,
        "Field \"silent\" is not backed by an event stream"
    );
}

#[tokio::test]
async fn queries_work_through_execute_stream() {
    let responses: Vec<_> = schema_with_subscriptions().execute_stream("{ greet }").collect().await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].to_json()["data"], json!({"greet": "Hello, world!"}));
}

#[tokio::test]
async fn subscriptions_are_rejected_by_execute() {
    let response = schema_with_subscriptions().execute("subscription { ticks }").await;
    assert_eq!(
        response.errors[0].message,
        "Subscriptions must be executed with execute_stream"
    );
}

#[tokio::test]
async fn aborting_ends_the_stream() {
    use tokio_util::sync::CancellationToken;

    let token = CancellationToken::new();
    let mut stream = schema_with_subscriptions()
        .execute_stream(Request::new("subscription { ticks(limit: 1000000) }").abort_on(token.clone()));

    let first = stream.next().await.expect("one event before the abort");
    assert_eq!(first.to_json()["data"], json!({"ticks": 1}));

    token.cancel();
    // The stream ends; at most the event already in flight comes through.
    let remaining: Vec<_> = stream.collect().await;
    assert!(remaining.len() <= 1, "stream kept going: {} events", remaining.len());
}

#[tokio::test]
async fn aliases_apply_to_events() {
    let responses: Vec<_> = schema_with_subscriptions()
        .execute_stream("subscription { count: ticks(limit: 1) }")
        .collect()
        .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].to_json()["data"], json!({"count": 1}));
}
