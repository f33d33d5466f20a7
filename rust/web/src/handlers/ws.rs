use crate::events::ConnectionEvents;
use crate::session::{SessionError, SessionManager};
use cardcrew_engine::commands::Command;
use cardcrew_engine::events::GameEvent;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

/// Drives one websocket for its whole life: registers it on the event bus,
/// forwards bus events as JSON text frames and feeds every inbound frame to
/// the session manager. Ends with the connection leaving every session.
pub async fn serve_connection(socket: WebSocket, sessions: Arc<SessionManager>) {
    let connection_id = Uuid::new_v4().to_string();
    let bus = sessions.event_bus();
    let events = bus.register(connection_id.clone());
    let (sink, mut stream) = socket.split();

    tracing::info!(connection_id = %connection_id, "websocket connected");

    let writer = tokio::spawn(forward_events(events, sink));

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(connection_id = %connection_id, error = %err, "websocket read failed");
                break;
            }
        };
        if message.is_close() {
            break;
        }
        let Ok(text) = message.to_str() else {
            // pings, pongs and binary frames carry no commands
            continue;
        };

        let command = match serde_json::from_str::<Command>(text) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(connection_id = %connection_id, error = %err, "malformed command");
                bus.send_to(
                    &connection_id,
                    GameEvent::CommandRejected {
                        message: format!("malformed command: {err}"),
                    },
                );
                continue;
            }
        };

        if let Err(SessionError::StoragePoisoned) = sessions.handle(&connection_id, command) {
            tracing::error!(connection_id = %connection_id, "session storage poisoned, closing connection");
            break;
        }
    }

    if let Err(err) = sessions.disconnect(&connection_id) {
        tracing::error!(connection_id = %connection_id, error = %err, "failed to remove connection");
    }
    writer.abort();
    bus.unregister(&connection_id);
    tracing::info!(connection_id = %connection_id, "websocket closed");
}

async fn forward_events(mut events: ConnectionEvents, mut sink: SplitSink<WebSocket, Message>) {
    while let Some(event) = events.receiver.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(
                    connection_id = %events.connection_id(),
                    event = event.name(),
                    error = %err,
                    "failed to encode event"
                );
                continue;
            }
        };
        if sink.send(Message::text(text)).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}
