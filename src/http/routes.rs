//! Static routes.

use axum::{response::Html, routing::get, Router};

/// Body served at `/`.
pub const INDEX_HTML: &str = "<!doctype html><title>Test</title><h1>Test</h1>";

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
