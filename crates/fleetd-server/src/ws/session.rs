//! Device session state and the frame-writing contract.

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Errors from writing a frame to a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session's outbound channel is full; the frame was dropped.
    #[error("session send buffer full")]
    Backpressure,

    /// The transport is gone; no further frames can be written.
    #[error("session closed")]
    Closed,
}

/// One live device session, as seen by the event hub.
///
/// The hub only ever identifies a session, names its owning device, and
/// writes text frames to it; the wire transport stays behind this trait.
pub trait SessionSink: Send + Sync {
    /// Unique id of this session.
    fn id(&self) -> &str;

    /// Serial of the device holding the session.
    fn device_serial(&self) -> &str;

    /// Write one text frame to the session.
    fn write_text(&self, frame: String) -> Result<(), SessionError>;
}

/// A connected device session backed by the WebSocket write channel.
pub struct DeviceSession {
    id: String,
    device_serial: String,
    tx: mpsc::Sender<String>,
}

impl DeviceSession {
    /// Create a session for `device_serial` writing into `tx`.
    pub fn new(device_serial: impl Into<String>, tx: mpsc::Sender<String>) -> Self {
        Self {
            id: format!("sess_{}", Uuid::now_v7()),
            device_serial: device_serial.into(),
            tx,
        }
    }
}

impl SessionSink for DeviceSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_serial(&self) -> &str {
        &self.device_serial
    }

    fn write_text(&self, frame: String) -> Result<(), SessionError> {
        self.tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SessionError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session() -> (DeviceSession, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(4);
        (DeviceSession::new("3b59c1ab0f3c2a91", tx), rx)
    }

    #[test]
    fn ids_are_unique() {
        let (a, _rx_a) = make_session();
        let (b, _rx_b) = make_session();
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("sess_"));
    }

    #[test]
    fn names_its_device() {
        let (session, _rx) = make_session();
        assert_eq!(session.device_serial(), "3b59c1ab0f3c2a91");
    }

    #[tokio::test]
    async fn write_text_delivers_frame() {
        let (session, mut rx) = make_session();
        session.write_text("hello".into()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn write_to_full_buffer_is_backpressure() {
        let (tx, _rx) = mpsc::channel(1);
        let session = DeviceSession::new("d1", tx);
        session.write_text("one".into()).unwrap();
        assert_eq!(
            session.write_text("two".into()),
            Err(SessionError::Backpressure)
        );
    }

    #[tokio::test]
    async fn write_to_closed_transport_fails() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let session = DeviceSession::new("d1", tx);
        assert_eq!(session.write_text("x".into()), Err(SessionError::Closed));
    }
}
