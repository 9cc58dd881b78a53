//! Wire framing for the classification backend.
//!
//! # Responsibilities
//! - Encode an outbound command exchange (`command` immediately followed by
//!   `payload`, no separator, no length prefix)
//! - Decode one terminator-delimited response frame
//! - Enforce a maximum frame size while scanning for the terminator
//!
//! # Design Decisions
//! - The backend emits exactly one textual frame per request, ended by the
//!   first `}` byte. A `}` inside the response body ends the frame early;
//!   the deployed backend never produces one before its intended end, and
//!   changing the framing would break compatibility with it.
//! - The terminator and size limit live here so a different framing is a
//!   one-file change.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Byte that ends a backend response frame. Included in the decoded frame.
pub const RESPONSE_TERMINATOR: u8 = b'}';

/// Maximum bytes buffered while waiting for the terminator.
/// The backend reads at most 32 KiB per request and answers in kind.
pub const MAX_FRAME_SIZE: usize = 32 * 1024;

/// One outbound exchange: the command selector and its opaque payload.
///
/// Neither field is inspected or validated; the backend parses the boundary
/// from the message structure itself.
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub command: &'a str,
    pub payload: &'a str,
}

/// Error type for framing operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No terminator seen within [`MAX_FRAME_SIZE`] bytes.
    #[error("response frame too large: {size} bytes without terminator (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Response bytes were not valid UTF-8.
    #[error("response frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Underlying socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codec for the backend's plaintext protocol.
///
/// Decodes response frames up to and including the first
/// [`RESPONSE_TERMINATOR`]; encodes [`CommandRequest`]s as raw concatenated
/// bytes.
#[derive(Debug, Default)]
pub struct BackendCodec;

impl BackendCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for BackendCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|&b| b == RESPONSE_TERMINATOR) {
            Some(idx) => {
                // Split inclusive of the terminator byte.
                let frame = src.split_to(idx + 1);
                Ok(Some(String::from_utf8(frame.to_vec())?))
            }
            None => {
                if src.len() > MAX_FRAME_SIZE {
                    return Err(FrameError::FrameTooLarge {
                        size: src.len(),
                        max: MAX_FRAME_SIZE,
                    });
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<CommandRequest<'_>> for BackendCodec {
    type Error = FrameError;

    fn encode(&mut self, req: CommandRequest<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(req.command.len() + req.payload.len());
        dst.put(req.command.as_bytes());
        dst.put(req.payload.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_complete_frame_includes_terminator() {
        let mut codec = BackendCodec::new();
        let mut buf = BytesMut::from(&br#"{"label":"cat"}"#[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, r#"{"label":"cat"}"#);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_terminator() {
        let mut codec = BackendCodec::new();
        let mut buf = BytesMut::from(&b"{\"label\":\"ca"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"t\"}");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, r#"{"label":"cat"}"#);
    }

    #[test]
    fn decode_stops_at_first_terminator() {
        // Compatibility pin: an early `}` truncates the frame.
        let mut codec = BackendCodec::new();
        let mut buf = BytesMut::from(&b"{\"a\":1}trailing"[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, r#"{"a":1}"#);
        assert_eq!(&buf[..], b"trailing");
    }

    #[test]
    fn decode_rejects_oversized_frame() {
        let mut codec = BackendCodec::new();
        let mut buf = BytesMut::from(vec![b'x'; MAX_FRAME_SIZE + 1].as_slice());

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { .. }));
    }

    #[test]
    fn encode_is_exact_concatenation() {
        let mut codec = BackendCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(
                CommandRequest {
                    command: "classify",
                    payload: r#"{"x":1}"#,
                },
                &mut buf,
            )
            .unwrap();

        assert_eq!(&buf[..], br#"classify{"x":1}"#);
    }
}
