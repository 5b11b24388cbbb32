use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CoreConfig;
use crate::resolver::resolve;
use crate::types::{ProbabilityResult, ResponseFormat};

const UNKNOWN_EVENT: &str = "unknown event";

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<CoreConfig>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum LegacyProbability {
    Value(f64),
    Message(&'static str),
}

#[derive(Debug, Serialize)]
struct LegacyResponse {
    probability: LegacyProbability,
}

#[derive(Debug, Serialize)]
struct TaggedResponse {
    known: bool,
    probability: Option<f64>,
}

pub fn router(state: ApiState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/calculate", post(calculate))
        .with_state(state)
        .layer(cors)
}

pub async fn serve<F>(config: Arc<CoreConfig>, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.api_addr.as_str()).await?;
    info!(
        "listening on {} (response format: {})",
        listener.local_addr()?,
        config.response_format.as_str()
    );

    let app = router(ApiState { config });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn calculate(State(state): State<ApiState>, body: Bytes) -> Response {
    let event = event_label(&body).to_lowercase();
    let result = resolve(&event);
    debug!("resolved event {:?} -> {:?}", event, result);

    match state.config.response_format {
        ResponseFormat::Legacy => Json(legacy_response(result)).into_response(),
        ResponseFormat::Tagged => Json(tagged_response(result)).into_response(),
    }
}

/// Pulls the `event` string out of a request body, defaulting to empty for
/// anything that is not a JSON object with a string `event` field.
fn event_label(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(document) => document
            .get("event")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        Err(error) => {
            debug!("request body is not valid JSON: {}", error);
            String::new()
        }
    }
}

fn legacy_response(result: ProbabilityResult) -> LegacyResponse {
    let probability = match result {
        ProbabilityResult::Known(value) => LegacyProbability::Value(value),
        ProbabilityResult::Unknown => LegacyProbability::Message(UNKNOWN_EVENT),
    };
    LegacyResponse { probability }
}

fn tagged_response(result: ProbabilityResult) -> TaggedResponse {
    TaggedResponse {
        known: matches!(result, ProbabilityResult::Known(_)),
        probability: result.value(),
    }
}

fn cors_layer(config: &CoreConfig) -> CorsLayer {
    let cors = if config.allows_any_origin() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    cors.allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    fn state_with(config: CoreConfig) -> ApiState {
        ApiState {
            config: Arc::new(config),
        }
    }

    async fn post_calculate(state: ApiState, body: &'static str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/calculate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn dice_roll_returns_one_sixth() {
        let (status, body) = post_calculate(state_with(CoreConfig::default()), r#"{"event": "Dice Roll"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"probability":0.16666666666666666}"#);
    }

    #[tokio::test]
    async fn mega_lottery_returns_jackpot_odds() {
        let (_, body) = post_calculate(state_with(CoreConfig::default()), r#"{"event": "Mega Lottery"}"#).await;
        assert_eq!(body, r#"{"probability":3.4246575342465753e-9}"#);
        let value = parse(&body);
        assert_eq!(value, json!({ "probability": 3.4246575342465754e-09 }));
        assert_eq!(value["probability"].as_f64(), Some(1.0 / 292_000_000.0));
    }

    #[tokio::test]
    async fn missing_event_is_unknown() {
        let (status, body) = post_calculate(state_with(CoreConfig::default()), "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body), json!({ "probability": "unknown event" }));
    }

    #[tokio::test]
    async fn coin_wins_when_several_keywords_match() {
        let (_, body) = post_calculate(state_with(CoreConfig::default()), r#"{"event": "COIN and dice"}"#).await;
        assert_eq!(parse(&body), json!({ "probability": 0.5 }));
    }

    #[tokio::test]
    async fn malformed_bodies_degrade_to_unknown() {
        for body in ["", "not json", "[\"coin\"]", r#"{"event": 42}"#, r#"{"event": null}"#] {
            let (status, response) = post_calculate(state_with(CoreConfig::default()), body).await;
            assert_eq!(status, StatusCode::OK, "body {:?}", body);
            assert_eq!(parse(&response), json!({ "probability": "unknown event" }));
        }
    }

    #[tokio::test]
    async fn tagged_format_uses_consistent_shape() {
        let config = CoreConfig {
            response_format: ResponseFormat::Tagged,
            ..CoreConfig::default()
        };

        let (_, body) = post_calculate(state_with(config.clone()), r#"{"event": "coin toss"}"#).await;
        assert_eq!(parse(&body), json!({ "known": true, "probability": 0.5 }));

        let (_, body) = post_calculate(state_with(config), r#"{"event": "rain"}"#).await;
        assert_eq!(parse(&body), json!({ "known": false, "probability": null }));
    }

    #[tokio::test]
    async fn any_origin_is_allowed_by_default() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/calculate")
            .header(header::ORIGIN, "http://example.test")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = router(state_with(CoreConfig::default()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn listed_origins_are_echoed() {
        let config = CoreConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..CoreConfig::default()
        };
        let request = Request::builder()
            .method(Method::POST)
            .uri("/calculate")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::from(r#"{"event": "dice"}"#))
            .unwrap();
        let response = router(state_with(config)).oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:5173"))
        );
    }

    #[tokio::test]
    async fn serve_binds_host_names() {
        let config = CoreConfig {
            api_addr: "localhost:0".to_string(),
            ..CoreConfig::default()
        };
        let result = serve(Arc::new(config), async {}).await;
        assert!(result.is_ok(), "{:?}", result.err().map(|error| error.to_string()));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = router(state_with(CoreConfig::default()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
