use crate::core::state::AppState;
use crate::routes::{auth, proxy};
use axum::{
    extract::{MatchedPath, Request},
    http::{header, HeaderValue},
    routing::{any, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info_span;

const ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

pub(crate) fn routes(state: AppState) -> Router {
    // /api/...
    let api_router = Router::new()
        .route("/proxy", any(proxy::forward))
        .route("/auth", get(auth::status));

    // CORS headers go on every response, errors and fallbacks included.
    // CorsLayer won't pair a wildcard origin with credentials.
    Router::new()
        .route("/", get(|| async { "ShearStream proxy" }))
        .nest("/api", api_router)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    HeaderValue::from_static("true"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                )),
        )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::config::{defaults, Args, StrategyKind};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Response, StatusCode};
    use tower::ServiceExt;

    pub(crate) fn args(strategy: StrategyKind, api_url: &str, token_url: &str) -> Args {
        let mut args = defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Args>()
            .unwrap();
        args.auth_strategy = strategy;
        args.api_url = api_url.to_string();
        args.token_url = token_url.to_string();
        args.request_timeout = 5;
        args
    }

    pub(crate) fn assert_cors(response: &Response<Body>) {
        let headers = response.headers();

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        let args = args(
            StrategyKind::PassThrough,
            "http://127.0.0.1:9/api/v1/",
            "http://127.0.0.1:9/token",
        );

        routes(AppState::new(&args).unwrap())
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/proxy?path=project/413")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_cors_on_unknown_route() {
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_cors(&response);
    }

    #[tokio::test]
    async fn test_cors_on_error_envelope() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/proxy?path=project/413")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No credentials configured");
    }

    #[tokio::test]
    async fn test_root_is_alive() {
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
    }
}
