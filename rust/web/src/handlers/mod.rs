pub mod health;
pub mod sessions;
pub mod ws;

pub use health::health;
pub use sessions::{get_session, list_sessions};
pub use ws::serve_connection;
