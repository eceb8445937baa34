//! The CircleCI API client.
//!
//! # Design
//! `Client<E>` carries configuration only and never mutates after `build()`.
//! Each operation is split the same way as the rest of the crate: a pure
//! `build_*` method that produces an `HttpRequest`, a pure `parse_*` method
//! that consumes an `HttpResponse`, and an async method that runs both around
//! one transport round trip. `execute` is the shared primitive; the encoding
//! parameter picks the wire format and the credential.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::Credentials;
use crate::encoding::{Encoding, Json, Transit};
use crate::error::{ApiError, ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::logging::{Level, Logger, TracingLogger};
use crate::transit;
use crate::transport::{ReqwestTransport, Transport, TransportError};
use crate::types::Workflow;

/// The only status treated as success.
pub const SUCCESS_STATUS: u16 = 200;

/// Client for the session-authenticated, transit-speaking query API.
pub type QueryClient = Client<Transit>;

/// Client for the token-authenticated REST v2 API.
pub type RestClient = Client<Json>;

/// CircleCI API client, parameterised by the wire [`Encoding`] it speaks.
#[derive(Debug, Clone)]
pub struct Client<E> {
    base_url: String,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
    encoding: PhantomData<E>,
}

/// Construction options, applied in call order. Setting the same option
/// twice keeps the last value.
#[derive(Debug)]
pub struct ClientBuilder<E> {
    base_url: Option<String>,
    credentials: Credentials,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn Logger>>,
    debug: bool,
    encoding: PhantomData<E>,
}

impl<E: Encoding> Default for ClientBuilder<E> {
    fn default() -> Self {
        Self {
            base_url: None,
            credentials: Credentials::default(),
            transport: None,
            logger: None,
            debug: false,
            encoding: PhantomData,
        }
    }
}

impl<E: Encoding> ClientBuilder<E> {
    /// Override the API root. An empty value falls back to the default.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// API token, sent as the `token` cookie by [`RestClient`].
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.credentials.token = Some(token.into());
        self
    }

    /// Browser session token, sent as the `ring-session` cookie by [`QueryClient`].
    pub fn session_token(mut self, session_token: impl Into<String>) -> Self {
        self.credentials.session_token = Some(session_token.into());
        self
    }

    /// Replace the shared reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the default logger. `debug_logging` has no effect on a
    /// logger supplied here.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Raise the default logger from INFO to DEBUG.
    pub fn debug_logging(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn build(self) -> Client<E> {
        let base_url = self
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| E::DEFAULT_BASE_URL.to_string());
        let transport = self
            .transport
            .unwrap_or_else(|| ReqwestTransport::shared().into());
        let debug = self.debug;
        let logger = self.logger.unwrap_or_else(|| {
            let level = if debug { Level::DEBUG } else { Level::INFO };
            Arc::new(TracingLogger::new(level))
        });

        Client {
            base_url,
            credentials: self.credentials,
            transport,
            logger,
            encoding: PhantomData,
        }
    }
}

impl<E: Encoding> Default for Client<E> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<E: Encoding> Client<E> {
    pub fn builder() -> ClientBuilder<E> {
        ClientBuilder::default()
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// `path` is appended verbatim; callers format it and escape anything
    /// that needs escaping.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Describe a request without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        payload: Option<&E::Payload>,
        path: &str,
    ) -> Result<HttpRequest> {
        let body = payload
            .map(E::encode)
            .transpose()
            .map_err(ClientError::EncodeRequest)?;

        let mut headers = vec![
            ("Cookie".to_string(), E::AUTH.cookie(&self.credentials)),
            ("Accept".to_string(), E::ACCEPT.to_string()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), E::CONTENT_TYPE.to_string()));
        }

        Ok(HttpRequest {
            method,
            url: self.url(path),
            headers,
            body,
        })
    }

    /// Classify a response: the body on 200, an `ApiError` otherwise.
    pub fn check_response(&self, response: HttpResponse) -> Result<Vec<u8>> {
        if response.status != SUCCESS_STATUS {
            return Err(ApiError::new(response.url, response.status, response.body).into());
        }
        Ok(response.body)
    }

    /// Perform one request and return the raw response body.
    ///
    /// Cancelling `cancel` drops the in-flight request and returns
    /// [`ClientError::Cancelled`].
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        method: HttpMethod,
        payload: Option<&E::Payload>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let request = self.build_request(method, payload, path)?;
        let url = request.url.clone();

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            outcome = self.transport.execute(request) => outcome,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(TransportError::Build(e)) => return Err(ClientError::CreateRequest(e)),
            Err(TransportError::Send(e)) => return Err(ClientError::Request(e)),
            Err(TransportError::Body { status, source }) => {
                self.logger.log(
                    Level::WARN,
                    "error reading body",
                    &[("method", &method), ("path", &url), ("status_code", &status)],
                );
                return Err(ClientError::ReadBody(source));
            }
        };

        if self.logger.enabled(Level::DEBUG) {
            let body = String::from_utf8_lossy(&response.body);
            self.logger.log(
                Level::DEBUG,
                "api call finished",
                &[
                    ("method", &method),
                    ("path", &url),
                    ("status_code", &response.status),
                    ("body", &body),
                ],
            );
        }

        self.check_response(response)
    }

    pub async fn get(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<u8>> {
        self.execute(cancel, HttpMethod::Get, None, path).await
    }

    pub async fn post(
        &self,
        cancel: &CancellationToken,
        payload: &E::Payload,
        path: &str,
    ) -> Result<Vec<u8>> {
        self.execute(cancel, HttpMethod::Post, Some(payload), path).await
    }
}

/// `{:type :get-workflow-status, :params {:run/id #uuid "<id>"}}`
///
/// The id goes out verbatim under the uuid tag; it is not validated.
pub fn workflow_status_query(workflow_id: &str) -> transit::Value {
    use transit::Value;

    Value::Map(vec![
        (Value::keyword("type"), Value::keyword("get-workflow-status")),
        (
            Value::keyword("params"),
            Value::Map(vec![(
                Value::keyword("run/id"),
                Value::Tagged("u".to_string(), Box::new(Value::String(workflow_id.to_string()))),
            )]),
        ),
    ])
}

impl Client<Transit> {
    pub fn build_get_workflow(&self, workflow_id: &str) -> Result<HttpRequest> {
        self.build_request(HttpMethod::Post, Some(&workflow_status_query(workflow_id)), "")
    }

    pub fn parse_get_workflow(&self, response: HttpResponse) -> Result<Workflow> {
        let body = self
            .check_response(response)
            .map_err(|e| ClientError::Post(Box::new(e)))?;
        Ok(Transit::decode(&body)?)
    }

    /// Fetch a workflow's status. Requires a session token.
    ///
    /// The query API selects the operation from the body, so the request
    /// goes to the base URL itself.
    pub async fn get_workflow(
        &self,
        cancel: &CancellationToken,
        workflow_id: &str,
    ) -> Result<Workflow> {
        let body = self
            .post(cancel, &workflow_status_query(workflow_id), "")
            .await
            .map_err(|e| ClientError::Post(Box::new(e)))?;
        Ok(Transit::decode(&body)?)
    }
}

impl Client<Json> {
    pub fn build_get_workflow(&self, workflow_id: &str) -> Result<HttpRequest> {
        self.build_request(HttpMethod::Get, None, &format!("/workflow/{workflow_id}"))
    }

    pub fn parse_get_workflow(&self, response: HttpResponse) -> Result<Workflow> {
        let body = self
            .check_response(response)
            .map_err(|e| ClientError::Get(Box::new(e)))?;
        Ok(Json::decode(&body)?)
    }

    /// Fetch a workflow through REST v2. Requires an API token.
    pub async fn get_workflow(
        &self,
        cancel: &CancellationToken,
        workflow_id: &str,
    ) -> Result<Workflow> {
        let body = self
            .get(cancel, &format!("/workflow/{workflow_id}"))
            .await
            .map_err(|e| ClientError::Get(Box::new(e)))?;
        Ok(Json::decode(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeStage;
    use crate::logging::NoopLogger;

    const WORKFLOW_JSON: &str = r#"{"id":"5034460f-c7c4-4c43-9457-de07e2029e7b","name":"build","status":"success","created_at":"2024-01-15T10:30:00Z"}"#;

    fn query_client() -> QueryClient {
        QueryClient::builder()
            .base_url("http://localhost:3000/query-api")
            .session_token("sess")
            .logger(Arc::new(NoopLogger))
            .build()
    }

    fn rest_client() -> RestClient {
        RestClient::builder()
            .base_url("http://localhost:3000/api/v2")
            .token("tok")
            .build()
    }

    fn response(url: &str, status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            url: url.to_string(),
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn defaults_apply_without_options() {
        assert_eq!(QueryClient::new().base_url(), "https://circleci.com/query-api");
        assert_eq!(RestClient::new().base_url(), "https://circleci.com/api/v2");
    }

    #[test]
    fn later_option_wins() {
        let client = QueryClient::builder()
            .base_url("http://first")
            .session_token("one")
            .base_url("http://second")
            .session_token("two")
            .build();
        assert_eq!(client.base_url(), "http://second");
        assert_eq!(client.credentials().session_token.as_deref(), Some("two"));
    }

    #[test]
    fn empty_base_url_falls_back_to_default() {
        let client = RestClient::builder().base_url("").build();
        assert_eq!(client.base_url(), "https://circleci.com/api/v2");
    }

    #[test]
    fn base_url_is_joined_as_given() {
        let client = QueryClient::builder().base_url("http://localhost:3000/query-api/").build();
        let req = client.build_get_workflow("abc").unwrap();
        assert_eq!(req.url, "http://localhost:3000/query-api/");
        let client = RestClient::builder().base_url("http://localhost:3000/api/v2/").build();
        let req = client.build_get_workflow("abc").unwrap();
        assert_eq!(req.url, "http://localhost:3000/api/v2//workflow/abc");
    }

    #[test]
    fn build_query_get_workflow_produces_transit_post() {
        let req = query_client().build_get_workflow("abc-123").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/query-api");
        assert_eq!(
            req.headers,
            vec![
                ("Cookie".to_string(), "ring-session=sess".to_string()),
                (
                    "Accept".to_string(),
                    "application/transit+json; charset=UTF-8".to_string()
                ),
                ("Content-Type".to_string(), "application/transit+json".to_string()),
            ]
        );
        assert_eq!(
            req.body.as_deref(),
            Some(r#"["^ ","~:type","~:get-workflow-status","~:params",["^ ","~:run/id","~uabc-123"]]"#)
        );
    }

    #[test]
    fn build_rest_get_workflow_produces_json_get() {
        let req = rest_client().build_get_workflow("abc-123").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/v2/workflow/abc-123");
        assert_eq!(req.header("cookie"), Some("token=tok"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), None);
        assert!(req.body.is_none());
    }

    #[test]
    fn json_post_sets_content_type() {
        let payload = serde_json::json!({"name": "x"});
        let req = rest_client()
            .build_request(HttpMethod::Post, Some(&payload), "/thing")
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"x"}"#));
    }

    #[test]
    fn parse_rest_get_workflow_success() {
        let client = rest_client();
        let workflow = client
            .parse_get_workflow(response("http://h/workflow/x", 200, WORKFLOW_JSON))
            .unwrap();
        assert_eq!(workflow.name, "build");
    }

    #[test]
    fn non_200_success_codes_are_errors() {
        let err = rest_client()
            .parse_get_workflow(response("http://h/workflow/x", 201, WORKFLOW_JSON))
            .unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status(), 201);
        assert_eq!(api.url(), "http://h/workflow/x");
        assert_eq!(api.body(), WORKFLOW_JSON.as_bytes());
    }

    #[test]
    fn parse_query_get_workflow_unauthorized() {
        let err = query_client()
            .parse_get_workflow(response("http://h/query-api", 401, "\"unauthorized\""))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("401"), "{message}");
        assert!(message.contains("unauthorized"), "{message}");
        assert!(message.starts_with("issue posting: "), "{message}");
    }

    #[test]
    fn parse_query_get_workflow_bad_body() {
        let err = query_client()
            .parse_get_workflow(response("http://h/query-api", 200, "<html>"))
            .unwrap_err();
        assert_eq!(err.decode_stage(), Some(DecodeStage::DecodeTransit));
        assert!(err.to_string().starts_with("issue decoding transit: "));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        // nothing listens on port 9; the cancelled branch wins before the
        // transport is polled
        let client = QueryClient::builder().base_url("http://127.0.0.1:9").build();
        let err = client.get_workflow(&cancel, "abc").await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
