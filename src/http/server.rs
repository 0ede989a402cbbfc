//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (handler and write timeouts, panic guard, request log)

use std::any::Any;

use axum::{
    body::Body,
    http::{header, StatusCode},
    middleware,
    response::Response,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    timeout::{ResponseBodyTimeoutLayer, TimeoutLayer},
};

use crate::config::ListenerConfig;
use crate::http::middleware::{log_requests, RequestLog};
use crate::http::routes;
use crate::net::ListenerKind;

/// Build the request-serving endpoint for one listener.
pub fn build_router(kind: ListenerKind, config: &ListenerConfig) -> Router {
    with_guards(routes::router(), kind, config)
}

/// Wrap `routes` in the per-request guards.
///
/// Layers, innermost first: handler timeout (503, empty body), response
/// write timeout, panic guard and, when `log_requests` is set, the request
/// log.
pub(crate) fn with_guards(routes: Router, kind: ListenerKind, config: &ListenerConfig) -> Router {
    let router = routes
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            config.handler_timeout,
        ))
        .layer(ResponseBodyTimeoutLayer::new(config.write_timeout))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(kind, panic)
        }));

    if config.log_requests {
        router.layer(middleware::from_fn_with_state(RequestLog::new(kind), log_requests))
    } else {
        router
    }
}

fn panic_response(kind: ListenerKind, panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(handler = %kind, error = %message, "request handler panicked");

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, header::HeaderValue::from_static("0"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::routes::INDEX_HTML;
    use crate::observability::capture::Capture;
    use axum::{
        body::{to_bytes, Bytes},
        http::Request,
        routing::get,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn config(log_requests: bool) -> ListenerConfig {
        ListenerConfig {
            log_requests,
            ..ListenerConfig::default()
        }
    }

    fn get_root() -> Request<Body> {
        Request::builder()
            .uri("/")
            .header(header::HOST, "localhost:3000")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_static_html() {
        let response = build_router(ListenerKind::Http, &config(false))
            .oneshot(get_root())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, INDEX_HTML.as_bytes());
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
        let response = build_router(ListenerKind::Http, &config(false))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn slow_handler_gets_503_with_empty_body() {
        let slow = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let config = ListenerConfig {
            handler_timeout: Duration::from_millis(50),
            ..ListenerConfig::default()
        };

        let response = with_guards(slow, ListenerKind::Http, &config)
            .oneshot(get_root())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn stalled_response_body_is_cut_off() {
        let stalled = Router::new().route(
            "/",
            get(|| async {
                Body::from_stream(futures_util::stream::pending::<Result<Bytes, std::io::Error>>())
            }),
        );
        let config = ListenerConfig {
            write_timeout: Duration::from_millis(100),
            ..ListenerConfig::default()
        };

        let response = with_guards(stalled, ListenerKind::Http, &config)
            .oneshot(get_root())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let begin = std::time::Instant::now();
        let body = tokio::time::timeout(
            Duration::from_secs(5),
            to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .unwrap();
        assert!(body.is_err());
        assert!(begin.elapsed() < Duration::from_secs(2));
    }

    async fn explode() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn panic_becomes_500_and_is_logged() {
        let capture = Capture::default();
        let _guard = tracing::dispatcher::set_default(&capture.dispatch());

        let app = Router::new().route("/", get(explode));

        let response = with_guards(app, ListenerKind::Https, &config(false))
            .oneshot(get_root())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let logs = capture.contents();
        assert!(logs.contains("request handler panicked"), "{logs}");
        assert!(logs.contains("handler=https"), "{logs}");
        assert!(logs.contains("error=boom"), "{logs}");
    }

    #[tokio::test]
    async fn request_log_is_opt_in() {
        let capture = Capture::default();
        let _guard = tracing::dispatcher::set_default(&capture.dispatch());

        build_router(ListenerKind::Http, &config(false))
            .oneshot(get_root())
            .await
            .unwrap();
        assert!(!capture.contents().contains("uri=/"));

        build_router(ListenerKind::Http, &config(true))
            .oneshot(get_root())
            .await
            .unwrap();
        let logs = capture.contents();
        assert!(logs.contains("handler=http"), "{logs}");
        assert!(logs.contains("status=200"), "{logs}");
    }
}
