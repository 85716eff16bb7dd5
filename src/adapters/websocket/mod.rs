//! WebSocket adapter - the live session transport.
//!
//! Clients connect to `/ws/{session_id}`, join that session's room, and
//! receive every progress event the workflow emits for it. Inbound frames
//! carry the user's next message and trigger a turn.

mod bridge;
mod handler;
mod messages;
mod rooms;

pub use bridge::RoomProgressPublisher;
pub use handler::{ws_handler, WebSocketState};
pub use messages::{ClientMessage, WireEvent};
pub use rooms::{ClientId, RoomManager};
