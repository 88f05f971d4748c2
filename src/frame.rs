//! Frame: one discrete message unit on the duplex transport.
//!
//! The bridge passes frames through opaquely; payload schema is owned by the
//! adapter layer (see [`crate::protocol`]).

// ============================================================================
// Imports
// ============================================================================

use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Frame
// ============================================================================

/// One message unit exchanged over the duplex transport.
///
/// Maps 1:1 onto WebSocket text/binary messages. Control messages
/// (ping/pong/close) are handled inside the transport layer and never
/// surface as frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload (typically a single JSON object).
    Text(String),
    /// Raw binary payload (e.g. an encoded video frame).
    Binary(Vec<u8>),
}

// ============================================================================
// Constructors
// ============================================================================

impl Frame {
    /// Creates a text frame.
    #[inline]
    #[must_use]
    pub fn text(payload: impl Into<String>) -> Self {
        Self::Text(payload.into())
    }

    /// Creates a binary frame.
    #[inline]
    #[must_use]
    pub fn binary(payload: impl Into<Vec<u8>>) -> Self {
        Self::Binary(payload.into())
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Frame {
    /// Returns the text payload, or `None` for binary frames.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the payload as raw bytes regardless of variant.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns `true` for text frames.
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Wire Conversion
// ============================================================================

impl Frame {
    /// Converts the frame into a WebSocket message for the write half.
    pub(crate) fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::Text(text.into()),
            Self::Binary(bytes) => Message::Binary(bytes.into()),
        }
    }

    /// Converts an incoming WebSocket message into a frame.
    ///
    /// Returns `None` for control messages (ping/pong/close/raw), which the
    /// transport layer handles itself.
    pub(crate) fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(Self::Text(text.as_str().to_owned())),
            Message::Binary(bytes) => Some(Self::Binary(bytes.to_vec())),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frame_accessors() {
        let frame = Frame::text("hello");
        assert!(frame.is_text());
        assert_eq!(frame.as_text(), Some("hello"));
        assert_eq!(frame.as_bytes(), b"hello");
        assert_eq!(frame.len(), 5);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_binary_frame_accessors() {
        let frame = Frame::binary(vec![1u8, 2, 3]);
        assert!(!frame.is_text());
        assert_eq!(frame.as_text(), None);
        assert_eq!(frame.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_message_round_trip_text() {
        let frame = Frame::text("payload");
        let message = frame.clone().into_message();
        assert_eq!(Frame::from_message(message), Some(frame));
    }

    #[test]
    fn test_message_round_trip_binary() {
        let frame = Frame::binary(vec![0u8, 255]);
        let message = frame.clone().into_message();
        assert_eq!(Frame::from_message(message), Some(frame));
    }

    #[test]
    fn test_control_messages_filtered() {
        assert_eq!(Frame::from_message(Message::Ping(Vec::new().into())), None);
        assert_eq!(Frame::from_message(Message::Pong(Vec::new().into())), None);
        assert_eq!(Frame::from_message(Message::Close(None)), None);
    }
}
