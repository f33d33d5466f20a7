use std::time::Instant;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reject::Rejection;
use warp::reply::{Reply, Response};
use warp::Filter;

/// Wraps a route so every request is logged on the way in and its status
/// and latency on the way out.
pub fn with_request_logging<F, T>(
    filter: F,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone
where
    F: Filter<Extract = (T,), Error = Rejection> + Clone + Send + Sync + 'static,
    T: Reply,
{
    warp::any()
        .and(warp::path::full())
        .and(warp::method())
        .map(|path: FullPath, method: Method| {
            tracing::debug!(path = %path.as_str(), method = %method, "incoming request");
            RequestStart {
                at: Instant::now(),
                path: path.as_str().to_string(),
                method: method.to_string(),
            }
        })
        .and(filter)
        .map(|start: RequestStart, reply: T| {
            let response = reply.into_response();
            log_response(
                response.status(),
                &start.path,
                &start.method,
                start.at.elapsed().as_millis(),
            );
            response
        })
}

struct RequestStart {
    at: Instant,
    path: String,
    method: String,
}

pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u128) {
    if status.is_server_error() {
        tracing::error!(
            status = status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            status = status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "client error"
        );
    } else {
        tracing::info!(
            status = status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "response sent"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[tokio::test]
    async fn logs_request_and_status() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        let _guard = tracing::subscriber::set_default(registry);

        let route = with_request_logging(
            warp::path!("ping")
                .and(warp::get())
                .map(|| warp::reply::json(&"pong")),
        );

        let response = warp::test::request()
            .method("GET")
            .path("/ping")
            .reply(&route)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let sent = subscriber.with_message("response sent");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].level, Level::INFO);
        assert_eq!(sent[0].field("status"), Some("200"));
        assert_eq!(sent[0].field("path"), Some("/ping"));
        assert_eq!(subscriber.with_message("incoming request").len(), 1);
    }

    #[test]
    fn client_errors_are_warnings() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());

        tracing::subscriber::with_default(registry, || {
            log_response(StatusCode::NOT_FOUND, "/api/sessions/nope", "GET", 3);
        });

        let entries = subscriber.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::WARN);
        assert_eq!(entries[0].field("status"), Some("404"));
    }

    #[test]
    fn server_errors_are_errors() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());

        tracing::subscriber::with_default(registry, || {
            log_response(StatusCode::INTERNAL_SERVER_ERROR, "/api/sessions", "GET", 1);
        });

        assert_eq!(subscriber.entries()[0].level, Level::ERROR);
    }
}
