//! Live device sessions: WebSocket transport, session state, and the
//! event hub that relays application events into attached sessions.

pub mod handler;
pub mod hub;
pub mod session;
