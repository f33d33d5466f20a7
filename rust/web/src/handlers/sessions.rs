use crate::errors::IntoErrorResponse;
use crate::session::SessionManager;
use std::sync::Arc;
use warp::reply::{self, Response};
use warp::Reply;

/// Lists every session of the process.
///
/// # HTTP Method and Path
/// - **Method**: GET
/// - **Path**: `/api/sessions`
///
/// # Response Format
/// - **Success (200 OK)**: sessions ordered by id
/// ```json
/// [{ "sessionId": "g1", "participants": 2, "status": "in_progress" }]
/// ```
/// - **Error (500)**: `session_storage_error`
pub async fn list_sessions(sessions: Arc<SessionManager>) -> Response {
    match sessions.list() {
        Ok(list) => reply::json(&list).into_response(),
        Err(err) => err.into_http_response(),
    }
}

/// Public snapshot of one session: roster with card counts, round, board,
/// status and heist progress. Private hands are never included.
///
/// # HTTP Method and Path
/// - **Method**: GET
/// - **Path**: `/api/sessions/{session_id}`
///
/// # Response Format
/// - **Success (200 OK)**: the snapshot
/// - **Error (404 Not Found)**: `session_not_found`
pub async fn get_session(sessions: Arc<SessionManager>, session_id: String) -> Response {
    match sessions.snapshot(&session_id) {
        Ok(snapshot) => reply::json(&snapshot).into_response(),
        Err(err) => err.into_http_response(),
    }
}
