#![cfg(feature = "context")]

use ferrous_kit::{AppError, ErrorHandler, KitError, RequestContext};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, PartialEq)]
struct TenantId(String);

async fn current_tenant() -> Option<String> {
    tokio::task::yield_now().await;
    RequestContext::current()?
        .get::<TenantId>("tenant")
        .map(|t| t.0.clone())
}

#[tokio::test]
async fn test_context_visible_across_awaits() {
    let ctx = RequestContext::with_request_id("req-1");
    ctx.insert("tenant", TenantId("acme".into()));

    let tenant = ctx
        .scope(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            current_tenant().await
        })
        .await;

    assert_eq!(tenant.as_deref(), Some("acme"));
    assert!(RequestContext::current().is_none());
}

#[tokio::test]
async fn test_values_set_inside_scope_are_visible_to_caller() {
    let ctx = RequestContext::new();
    ctx.clone()
        .scope(async {
            RequestContext::try_current()
                .unwrap()
                .insert("user", 7u64);
        })
        .await;

    assert_eq!(ctx.get::<u64>("user").as_deref(), Some(&7));
}

#[tokio::test]
async fn test_nested_scope_shadows_and_restores() {
    let outer = RequestContext::with_request_id("outer");
    outer
        .scope(async {
            let inner_id = RequestContext::with_request_id("inner")
                .scope(async { RequestContext::current().unwrap().request_id().to_string() })
                .await;
            assert_eq!(inner_id, "inner");
            assert_eq!(RequestContext::current().unwrap().request_id(), "outer");
        })
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_requests_are_isolated() {
    let mut handles = Vec::new();
    for i in 0..8 {
        let ctx = RequestContext::with_request_id(format!("req-{i}"));
        ctx.insert("tenant", TenantId(format!("tenant-{i}")));
        handles.push(tokio::spawn(ctx.scope(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            (i, current_tenant().await)
        })));
    }

    for handle in handles {
        let (i, tenant) = handle.await.unwrap();
        assert_eq!(tenant, Some(format!("tenant-{i}")));
    }
}

#[tokio::test]
async fn test_plain_spawn_does_not_inherit_but_context_spawn_does() {
    let ctx = RequestContext::with_request_id("parent");
    ctx.scope(async {
        let plain = tokio::spawn(async { RequestContext::current().is_none() })
            .await
            .unwrap();
        assert!(plain);

        let inherited = RequestContext::spawn(async {
            RequestContext::current().map(|c| c.request_id().to_string())
        })
        .await
        .unwrap();
        assert_eq!(inherited.as_deref(), Some("parent"));
    })
    .await;
}

#[tokio::test]
async fn test_try_current_outside_scope() {
    assert_eq!(RequestContext::try_current().unwrap_err(), KitError::NoActiveContext);
}

#[tokio::test]
async fn test_error_listener_sees_request_id() {
    let handler = ErrorHandler::new();
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    handler.subscribe_fn(move |_: &AppError| {
        *sink.lock().unwrap() = RequestContext::current().map(|c| c.request_id().to_string());
    });

    RequestContext::with_request_id("req-err")
        .scope(async {
            handler.handle(AppError::bad_request("bad"));
        })
        .await;

    assert_eq!(seen.lock().unwrap().as_deref(), Some("req-err"));
}
