use mock_server::{MockState, FIXTURE_WORKFLOW_ID};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let session_token =
        std::env::var("CIRCLECI_SESSION_TOKEN").unwrap_or_else(|_| "local-session".to_string());
    let token = std::env::var("CIRCLECI_TOKEN").unwrap_or_else(|_| "local-token".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, workflow_id = FIXTURE_WORKFLOW_ID, "listening");
    mock_server::run(listener, MockState::new(session_token, token).with_fixtures()).await
}
