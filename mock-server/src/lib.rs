//! In-process stand-in for the two CircleCI API flavours.
//!
//! Workflows are stored as ready-made response bodies: transit for the
//! query API and JSON for REST v2. The server never re-encodes them, so the
//! client's decoding is checked against exactly what was stored.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

pub const TRANSIT_CONTENT_TYPE: &str = "application/transit+json; charset=UTF-8";

/// Id of the workflow seeded by [`MockState::with_fixtures`].
pub const FIXTURE_WORKFLOW_ID: &str = "5034460f-c7c4-4c43-9457-de07e2029e7b";

const FIXTURE_TRANSIT: &str = include_str!("../../test-vectors/workflow.transit.json");
const FIXTURE_JSON: &str = include_str!("../../test-vectors/workflow.json");

#[derive(Clone, Debug, Default)]
pub struct MockState {
    pub session_token: String,
    pub token: String,
    /// Workflow id to transit response body.
    pub transit_workflows: HashMap<String, String>,
    /// Workflow id to JSON response body.
    pub json_workflows: HashMap<String, String>,
    /// Held before answering, for exercising client cancellation.
    pub delay: Option<Duration>,
}

impl MockState {
    pub fn new(session_token: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Seed the fixture workflow from `test-vectors/` under
    /// [`FIXTURE_WORKFLOW_ID`].
    pub fn with_fixtures(mut self) -> Self {
        self.insert_workflow(FIXTURE_WORKFLOW_ID, FIXTURE_TRANSIT.trim(), FIXTURE_JSON);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert_workflow(&mut self, id: &str, transit: &str, json: &str) {
        self.transit_workflows.insert(id.to_string(), transit.to_string());
        self.json_workflows.insert(id.to_string(), json.to_string());
    }
}

type Shared = Arc<MockState>;

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/query-api", post(query))
        .route("/api/v2/workflow/{id}", get(rest_workflow))
        .with_state(Arc::new(state))
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "\"unauthorized\"").into_response()
}

/// Value of cookie `name`, if the request carries one.
fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

fn authorized(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    !expected.is_empty() && cookie(headers, name) == Some(expected)
}

/// The `:run/id` of a `:get-workflow-status` request. Only the uncached
/// array-map shape the client sends is understood.
fn requested_run_id(body: &[u8]) -> Result<String, &'static str> {
    let value: Value = serde_json::from_slice(body).map_err(|_| "body is not json")?;
    let entries = map_entries(&value).ok_or("body is not a transit map")?;
    match lookup(&entries, "~:type").and_then(Value::as_str) {
        Some("~:get-workflow-status") => {}
        Some(_) => return Err("unsupported query type"),
        None => return Err("missing query type"),
    }
    let params = lookup(&entries, "~:params")
        .and_then(map_entries)
        .ok_or("missing params")?;
    lookup(&params, "~:run/id")
        .and_then(Value::as_str)
        .and_then(|id| id.strip_prefix("~u"))
        .map(str::to_string)
        .ok_or("missing run id")
}

fn map_entries(value: &Value) -> Option<Vec<(&str, &Value)>> {
    let items = value.as_array()?;
    if items.first()?.as_str()? != "^ " || items.len() % 2 != 1 {
        return None;
    }
    items[1..]
        .chunks_exact(2)
        .map(|pair| Some((pair[0].as_str()?, &pair[1])))
        .collect()
}

fn lookup<'a>(entries: &[(&str, &'a Value)], key: &str) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

async fn hold(state: &MockState) {
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
}

async fn query(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    hold(&state).await;
    if !authorized(&headers, "ring-session", &state.session_token) {
        return unauthorized();
    }
    let id = match requested_run_id(&body) {
        Ok(id) => id,
        Err(reason) => return (StatusCode::BAD_REQUEST, reason).into_response(),
    };
    match state.transit_workflows.get(&id) {
        Some(transit) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TRANSIT_CONTENT_TYPE)],
            transit.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "\"workflow not found\"").into_response(),
    }
}

async fn rest_workflow(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    hold(&state).await;
    if !authorized(&headers, "token", &state.token) {
        return unauthorized();
    }
    match state.json_workflows.get(&id) {
        Some(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json.clone(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"message":"Workflow not found"}"#,
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_run_id_from_client_request() {
        let body = br#"["^ ","~:type","~:get-workflow-status","~:params",["^ ","~:run/id","~uabc-123"]]"#;
        assert_eq!(requested_run_id(body).unwrap(), "abc-123");
    }

    #[test]
    fn rejects_other_query_types() {
        let body = br#"["^ ","~:type","~:get-pipeline","~:params",["^ ","~:run/id","~uabc"]]"#;
        assert_eq!(requested_run_id(body).unwrap_err(), "unsupported query type");
    }

    #[test]
    fn rejects_non_transit_bodies() {
        assert_eq!(requested_run_id(b"{}").unwrap_err(), "body is not a transit map");
        assert_eq!(requested_run_id(b"nope").unwrap_err(), "body is not json");
        assert_eq!(
            requested_run_id(br#"["^ ","~:type","~:get-workflow-status"]"#).unwrap_err(),
            "missing params"
        );
    }

    #[test]
    fn reads_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("a=1; ring-session=s3; b=2"));
        assert_eq!(cookie(&headers, "ring-session"), Some("s3"));
        assert_eq!(cookie(&headers, "token"), None);
    }

    #[test]
    fn empty_expected_credential_never_authorizes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert!(!authorized(&headers, "token", ""));
    }

    #[test]
    fn fixtures_are_seeded() {
        let state = MockState::new("s", "t").with_fixtures();
        assert!(state.transit_workflows.contains_key(FIXTURE_WORKFLOW_ID));
        assert!(state.json_workflows.contains_key(FIXTURE_WORKFLOW_ID));
    }
}
