use axum::{body::Body, http::Request};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info_span};
use uuid::Uuid;

pub type RequestSpanFn = fn(&Request<Body>) -> Span;

pub fn create_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_trace() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpanFn> {
    TraceLayer::new_for_http().make_span_with(request_span as RequestSpanFn)
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = Uuid::new_v4();
    info_span!(
        "http_request",
        %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}
