//! Request interceptors
//!
//! Each interceptor has the shape `handle(request, next)` and is stacked per
//! route with an ordered `tower::ServiceBuilder` in [`crate::create_router`].

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tracing::info;

use crate::config::AuthSettings;
use crate::error::UNAUTHORIZED_MESSAGE;

/// Log method, path, peer and elapsed time once the inner service returns.
///
/// Runs for every outcome, including 401 and 500 responses.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let start = Instant::now();
    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        remote_addr = %remote_addr,
        elapsed = ?start.elapsed(),
        "request handled"
    );

    response
}

/// Reject requests without the configured Basic credentials.
pub async fn require_basic_auth(
    State(auth): State<Arc<AuthSettings>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .typed_get::<Authorization<Basic>>()
        .map(|Authorization(basic)| auth.matches(basic.username(), basic.password()))
        .unwrap_or(false);

    if !authorized {
        return unauthorized(&auth.realm);
    }

    next.run(request).await
}

fn unauthorized(realm: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", realm))],
        UNAUTHORIZED_MESSAGE,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_router, AppState};
    use async_trait::async_trait;
    use axum::body::Body;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use storage::{Record, RecordStore, StorageError};
    use tower::ServiceExt;
    use tracing::instrument::WithSubscriber;
    use tracing_subscriber::fmt::MakeWriter;

    /// Shared buffer the fmt subscriber writes into
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl RecordStore for UnreachableStore {
        async fn list_records(&self) -> Result<Vec<Record>, StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn append_record(&self, _: &str, _: &str, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }
    }

    /// Send one request through the full router, returning status and log output
    async fn send_logged(request: axum::http::Request<Body>) -> (StatusCode, String) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let app = create_router(
            AppState::new(Arc::new(UnreachableStore)),
            AuthSettings::default(),
        );
        let response = app
            .oneshot(request)
            .with_subscriber(subscriber)
            .await
            .unwrap();

        (response.status(), logs.contents())
    }

    fn access_lines(logs: &str) -> Vec<&str> {
        logs.lines()
            .filter(|line| line.contains("request handled"))
            .collect()
    }

    #[tokio::test]
    async fn test_rejected_login_is_logged() {
        let request = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let (status, logs) = send_logged(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let lines = access_lines(&logs);
        assert_eq!(lines.len(), 1, "logs: {logs}");
        assert!(lines[0].contains("method=GET"));
        assert!(lines[0].contains("path=/"));
        assert!(lines[0].contains("remote_addr=-"));
    }

    #[tokio::test]
    async fn test_failed_api_call_is_logged() {
        let request = axum::http::Request::builder()
            .uri("/api/devices")
            .body(Body::empty())
            .unwrap();
        let (status, logs) = send_logged(request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let lines = access_lines(&logs);
        assert_eq!(lines.len(), 1, "logs: {logs}");
        assert!(lines[0].contains("method=GET"));
        assert!(lines[0].contains("path=/api/devices"));
    }

    #[tokio::test]
    async fn test_unknown_path_goes_through_guard_and_logger() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/favicon.ico")
            .body(Body::empty())
            .unwrap();
        let (status, logs) = send_logged(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let lines = access_lines(&logs);
        assert_eq!(lines.len(), 1, "logs: {logs}");
        assert!(lines[0].contains("method=POST"));
        assert!(lines[0].contains("path=/favicon.ico"));
    }

    #[test]
    fn test_unauthorized_challenge() {
        let response = unauthorized("Restricted Access");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Restricted Access\""
        );
    }
}
