use ferrous_kit::{AppError, ErrorHandler, ErrorHandlerSettings, ErrorListener, HttpStatus, LoggingListener};
use std::error::Error as StdError;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(u16, String)>>,
}

impl ErrorListener for Recorder {
    fn on_error(&self, error: &AppError) {
        self.seen
            .lock()
            .unwrap()
            .push((error.status().as_u16(), error.message().to_string()));
    }
}

#[test]
fn test_app_errors_pass_through_unchanged() {
    let handler = ErrorHandler::new();
    let err = handler.handle(AppError::forbidden("not your tenant"));

    assert_eq!(err.status(), HttpStatus::Forbidden);
    assert_eq!(err.message(), "not your tenant");
    assert!(err.is_operational());
}

#[test]
fn test_unknown_errors_are_hidden_by_default() {
    let handler = ErrorHandler::new();
    let err = handler.handle(io::Error::new(io::ErrorKind::Other, "password=hunter2"));

    assert_eq!(err.status(), HttpStatus::InternalServerError);
    assert_eq!(err.message(), "Internal Server Error");
    assert!(!err.is_operational());
    // The original error is still reachable for server-side logging
    assert_eq!(err.source().unwrap().to_string(), "password=hunter2");
}

#[test]
fn test_handled_cause_keeps_its_type() {
    let handler = ErrorHandler::new();
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let seen = kinds.clone();
    handler.subscribe_fn(move |err: &AppError| {
        if let Some(io_err) = err.source().and_then(|s| s.downcast_ref::<io::Error>()) {
            seen.lock().unwrap().push(io_err.kind());
        }
    });

    let err = handler.handle(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
    let cause = err
        .source()
        .and_then(|s| s.downcast_ref::<io::Error>())
        .expect("handled cause should downcast to io::Error");
    assert_eq!(cause.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(*kinds.lock().unwrap(), vec![io::ErrorKind::ConnectionReset]);
}

#[test]
fn test_custom_internal_message() {
    let handler = ErrorHandler::with_settings(ErrorHandlerSettings {
        internal_message: "Something went wrong".to_string(),
        ..Default::default()
    });
    assert_eq!(handler.handle("boom").message(), "Something went wrong");
}

#[test]
fn test_listeners_notified_in_order() {
    let handler = ErrorHandler::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let order = order.clone();
        handler.subscribe_fn(move |_: &AppError| order.lock().unwrap().push(name));
    }

    handler.handle(AppError::bad_request("x"));
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_unsubscribed_listener_not_notified() {
    let handler = ErrorHandler::new();
    let recorder = Arc::new(Recorder::default());
    let id = handler.subscribe(recorder.clone());

    handler.handle(AppError::not_found("a"));
    handler.unsubscribe(id);
    handler.handle(AppError::not_found("b"));

    assert_eq!(*recorder.seen.lock().unwrap(), vec![(404, "a".to_string())]);
}

#[test]
fn test_normalize_does_not_notify() {
    let handler = ErrorHandler::new();
    let recorder = Arc::new(Recorder::default());
    handler.subscribe(recorder.clone());

    let err = AppError::conflict("dup");
    let normalized = handler.normalize(&err);

    assert_eq!(normalized.status(), HttpStatus::Conflict);
    assert!(recorder.seen.lock().unwrap().is_empty());
}

#[test]
fn test_listener_may_subscribe_during_notification() {
    let handler = Arc::new(ErrorHandler::new());
    let inner = handler.clone();
    handler.subscribe_fn(move |_: &AppError| {
        inner.subscribe_fn(|_: &AppError| {});
    });

    handler.handle(AppError::bad_request("x"));
    assert_eq!(handler.listener_count(), 2);
}

#[test]
fn test_catch_normalizes_errors_and_panics() {
    let handler = ErrorHandler::with_settings(ErrorHandlerSettings {
        expose_internal_messages: true,
        ..Default::default()
    });
    let recorder = Arc::new(Recorder::default());
    handler.subscribe(recorder.clone());

    let ok: Result<i32, AppError> = handler.catch(|| Ok::<_, io::Error>(3));
    assert_eq!(ok.unwrap(), 3);

    let failed = handler.catch(|| -> Result<(), io::Error> { Err(io::Error::new(io::ErrorKind::NotFound, "cfg missing")) });
    assert_eq!(failed.unwrap_err().message(), "cfg missing");

    let panicked = handler.catch(|| -> Result<(), AppError> { panic!("invariant broken") });
    let err = panicked.unwrap_err();
    assert_eq!(err.message(), "panic: invariant broken");
    assert!(!err.is_operational());

    let typed_panic = handler.catch(|| -> Result<(), AppError> {
        std::panic::panic_any(AppError::unauthorized("token expired"))
    });
    assert_eq!(typed_panic.unwrap_err().status(), HttpStatus::Unauthorized);

    assert_eq!(recorder.seen.lock().unwrap().len(), 3);
}

#[test]
fn test_is_trusted() {
    let handler = ErrorHandler::new();
    assert!(handler.is_trusted(&AppError::bad_request("x")));
    assert!(!handler.is_trusted(&AppError::internal("x")));
    assert!(!handler.is_trusted(&io::Error::new(io::ErrorKind::Other, "x")));
}

#[test]
fn test_logging_listener_with_subscriber() {
    let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
    tracing::subscriber::with_default(subscriber, || {
        let handler = ErrorHandler::new();
        handler.subscribe(Arc::new(LoggingListener));
        handler.handle(AppError::not_found("logged at warn"));
        handler.handle(AppError::internal("logged at error"));
    });
}

#[cfg(feature = "serde")]
#[test]
fn test_error_body_json() {
    let body = AppError::unprocessable("email is invalid").to_body();
    let json = serde_json::to_string(&body).unwrap();
    assert_eq!(
        json,
        r#"{"status":422,"error":"Unprocessable Entity","message":"email is invalid"}"#
    );
}
