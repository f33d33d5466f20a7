//! Websocket transport for the cardcrew engine.
//!
//! Clients connect to `/ws`, send JSON commands and receive JSON events.
//! [`SessionManager`] applies commands one at a time against the engine's
//! registry and hands the resulting notifications to the [`EventBus`], which
//! delivers them to a session's room or to a single connection.

pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod session;
pub mod settings;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{ConnectionEvents, ConnectionId, EventBus};
pub use logging::{init_logging, init_test_logging, LogEntry, TestLogSubscriber};
pub use middleware::{log_response, with_request_logging};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use session::{SessionError, SessionManager, SessionSnapshot, SessionSummary};
pub use settings::{Overrides, ResolvedSettings, Settings, SettingsError, ValueSource};
