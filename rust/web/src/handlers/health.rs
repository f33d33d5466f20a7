use serde::Serialize;
use warp::reply::Json;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe; answers as long as the server task is running.
pub fn health() -> Json {
    warp::reply::json(&HealthBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
