//! Protected handlers forwarding to the content API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_TYPE, HOST},
        HeaderMap, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::security::auth::verify_bearer;
use crate::upstream::client::{ContentApi, UpstreamError};

pub const UNAUTHORIZED_BODY: &str = "Unauthorized";

#[derive(Clone)]
pub struct ProxyState {
    pub api: Arc<dyn ContentApi>,
    pub upstream: UpstreamConfig,
    pub bearer_token: String,
    /// Substring of the request URL selecting the dev site.
    pub dev_marker: String,
}

impl ProxyState {
    /// Base URL of the site serving this request.
    pub fn site_url(&self, headers: &HeaderMap, uri: &Uri) -> &str {
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or_default();
        let full_url = format!("{}{}", host, uri);

        if !self.dev_marker.is_empty() && full_url.contains(&self.dev_marker) {
            &self.upstream.dev_base_url
        } else {
            &self.upstream.live_base_url
        }
    }

    fn stats_url(&self) -> String {
        format!("{}?admin_keys={}", self.upstream.stats_url, self.upstream.stats_admin_key)
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/welcome", get(welcome))
        .route("/api/v1/{request_type}/{request_id}/{args_id}", get(data_request))
        .route("/post/api/v1/{request_type}", post(post_request))
        .route("/v1/api/player-stat/{event_id}/{game_id}", get(player_stat))
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello 7000"
}

async fn welcome() -> &'static str {
    "Welcome Stat Platform"
}

async fn data_request(
    State(state): State<ProxyState>,
    Path((request_type, request_id, args_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Value>, AppError> {
    let url = if request_type == "stats" {
        state.stats_url()
    } else {
        format!(
            "{}/wp-json/app-data-request/v1/{}/{}/{}",
            state.site_url(&headers, &uri),
            request_type,
            request_id,
            args_id
        )
    };

    let data = state.api.get(&url).await?;
    Ok(Json(data))
}

async fn post_request(
    State(state): State<ProxyState>,
    Path(request_type): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Result<Response, AppError> {
    // The body is parsed before authorization; a malformed JSON body is an
    // unhandled error even for an unauthorized caller.
    let payload = json_payload(&headers, &body)?;

    if !verify_bearer(&headers, &state.bearer_token) {
        return Ok((StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response());
    }

    let url = format!(
        "{}/wp-json/app-post-request/v1/{}",
        state.site_url(&headers, &uri),
        request_type
    );
    let data = state.api.post(&url, payload).await?;
    Ok(Json(data).into_response())
}

/// JSON body of a POST. Only `application/json` bodies are parsed; anything
/// else, and an empty body, forwards as an empty object.
fn json_payload(headers: &HeaderMap, body: &Bytes) -> Result<Value, AppError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

    if !is_json || body.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_slice(body)?)
}

async fn player_stat(
    State(state): State<ProxyState>,
    Path((event_id, game_id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AppError> {
    let url = format!(
        "{}/wp-json/get-player-stats/v1/{}/{}",
        state.site_url(&headers, &uri),
        event_id,
        game_id
    );

    match state.api.get(&url).await {
        Ok(data) => Ok(Json(data).into_response()),
        // The upstream's own error answer is relayed as is.
        Err(UpstreamError::Status { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok((status, body).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct NoApi;

    #[async_trait::async_trait]
    impl ContentApi for NoApi {
        async fn get(&self, _url: &str) -> Result<Value, UpstreamError> {
            Err(UpstreamError::Unreachable("none".into()))
        }
        async fn post(&self, _url: &str, _body: Value) -> Result<Value, UpstreamError> {
            Err(UpstreamError::Unreachable("none".into()))
        }
    }

    fn state() -> ProxyState {
        ProxyState {
            api: Arc::new(NoApi),
            upstream: UpstreamConfig {
                stats_admin_key: "k1".into(),
                ..UpstreamConfig::default()
            },
            bearer_token: "secret".into(),
            dev_marker: "dev.".into(),
        }
    }

    #[test]
    fn test_site_url_by_host() {
        let state = state();
        let uri = Uri::from_static("/v1/api/player-stat/1/2");

        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("dev.statplatform.example.com:8080"));
        assert_eq!(state.site_url(&headers, &uri), "https://dev.sportspassports.com");

        headers.insert(HOST, HeaderValue::from_static("statplatform.example.com"));
        assert_eq!(state.site_url(&headers, &uri), "https://sportspassports.com");
    }

    #[test]
    fn test_site_url_marker_in_path() {
        let state = state();
        let uri = Uri::from_static("/api/v1/events/dev.1/2");
        assert_eq!(state.site_url(&HeaderMap::new(), &uri), "https://dev.sportspassports.com");
    }

    #[test]
    fn test_json_payload_by_content_type() {
        let mut headers = HeaderMap::new();
        let body = Bytes::from_static(b"{not json");
        assert_eq!(json_payload(&headers, &body).unwrap(), serde_json::json!({}));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(matches!(json_payload(&headers, &body), Err(AppError::InvalidBody(_))));
        assert_eq!(
            json_payload(&headers, &Bytes::from_static(b"{\"a\":1}")).unwrap(),
            serde_json::json!({"a": 1})
        );
        assert_eq!(json_payload(&headers, &Bytes::new()).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_stats_url_carries_admin_key() {
        assert_eq!(
            state().stats_url(),
            "https://sportspassports.com/features/v1/stat-leaderboard/?admin_keys=k1"
        );
    }
}
