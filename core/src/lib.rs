//! Client for the CircleCI API.
//!
//! # Overview
//! Fetches workflow status by id from one of two API flavours:
//!
//! - [`QueryClient`] talks to the query API with transit+json bodies and a
//!   `ring-session` cookie.
//! - [`RestClient`] talks to REST v2 with plain JSON and a `token` cookie.
//!
//! # Design
//! - Both are `Client<E>` with a different [`Encoding`]; request execution,
//!   authentication, logging and status handling are shared.
//! - Every operation has pure `build_*` / `parse_*` halves around an
//!   [`HttpRequest`] / [`HttpResponse`], so the HTTP contract is testable
//!   without a network. The async methods run those halves over a
//!   [`Transport`].
//! - One request per call: no retries, no caching, no internal timeouts.
//!   Cancellation comes from the caller's `CancellationToken`.

pub mod auth;
pub mod client;
pub mod encoding;
pub mod error;
pub mod http;
pub mod logging;
pub mod transit;
pub mod transport;
pub mod types;

pub use auth::{AuthScheme, Credentials};
pub use client::{workflow_status_query, Client, ClientBuilder, QueryClient, RestClient};
pub use encoding::{Encoding, Json, Transit};
pub use error::{ApiError, ClientError, DecodeError, DecodeStage};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use logging::{Level, Logger, NoopLogger, TracingLogger};
pub use tokio_util::sync::CancellationToken;
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{Job, Workflow, WorkflowStatus};
