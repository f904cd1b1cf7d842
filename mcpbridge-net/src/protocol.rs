//! Framed JSON protocol (§4.7). Frames are not length-prefixed: a frame
//! is simply "the next complete JSON object in the stream", found by
//! re-parsing the accumulated buffer after every read. This mirrors
//! what a client speaking plain `socket.send(json.dumps(...))` actually
//! puts on the wire — there is no length header to rely on.

use mcpbridge_types::Request;

use crate::error::ProtocolError;

/// Read chunk size for one `TcpStream::read` call.
pub const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Hard cap on an in-flight, not-yet-complete frame. A legitimate
/// request never approaches this; it exists to bound memory when a
/// client sends garbage that never closes its JSON object.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Accumulates bytes across reads and peels off complete JSON objects
/// one at a time, leaving any remainder (the start of the next frame,
/// per §8's concatenated-requests property) in the buffer.
#[derive(Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Appends newly read bytes. Errs once the buffered, still-incomplete
    /// frame would exceed [`MAX_FRAME_BYTES`].
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > MAX_FRAME_BYTES {
            return Err(ProtocolError::FrameTooLarge);
        }
        Ok(())
    }

    /// Pulls one complete request out of the buffer, if one is there.
    ///
    /// `Ok(None)` means the buffer holds only a partial object (or is
    /// empty/whitespace) and the caller should read more bytes before
    /// asking again. Anything that parses but isn't well-formed JSON at
    /// all is a [`ProtocolError::Malformed`], which the caller treats as
    /// fatal for the connection.
    pub fn try_take_frame(&mut self) -> Result<Option<Request>, ProtocolError> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
            return Ok(None);
        }

        let mut stream = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Request>();
        match stream.next() {
            Some(Ok(request)) => {
                let consumed = stream.byte_offset();
                self.buffer.drain(..consumed);
                Ok(Some(request))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(ProtocolError::Malformed(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_frame_yields_none() {
        let mut r = FrameReader::new();
        r.feed(br#"{"type":"get_session"#).unwrap();
        assert!(r.try_take_frame().unwrap().is_none());
    }

    #[test]
    fn complete_frame_parses_and_drains_buffer() {
        let mut r = FrameReader::new();
        r.feed(br#"{"type":"stop_playback","params":{}}"#).unwrap();
        let req = r.try_take_frame().unwrap().unwrap();
        assert_eq!(req.request_type, "stop_playback");
        assert!(r.try_take_frame().unwrap().is_none());
    }

    #[test]
    fn split_across_feeds_matches_whole_send() {
        let whole = br#"{"type":"get_session_info","params":{}}"#;
        let mut split = FrameReader::new();
        split.feed(&whole[..10]).unwrap();
        assert!(split.try_take_frame().unwrap().is_none());
        split.feed(&whole[10..]).unwrap();
        let req = split.try_take_frame().unwrap().unwrap();
        assert_eq!(req.request_type, "get_session_info");
    }

    #[test]
    fn concatenated_requests_yield_one_frame_at_a_time() {
        let mut r = FrameReader::new();
        r.feed(br#"{"type":"stop_playback","params":{}}{"type":"start_playback","params":{}}"#)
            .unwrap();
        let first = r.try_take_frame().unwrap().unwrap();
        assert_eq!(first.request_type, "stop_playback");
        let second = r.try_take_frame().unwrap().unwrap();
        assert_eq!(second.request_type, "start_playback");
        assert!(r.try_take_frame().unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_fatal() {
        let mut r = FrameReader::new();
        r.feed(b"not json at all").unwrap();
        assert!(matches!(r.try_take_frame(), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn oversized_incomplete_frame_is_rejected() {
        let mut r = FrameReader::new();
        let junk = vec![b'['; MAX_FRAME_BYTES + 1];
        assert!(matches!(r.feed(&junk), Err(ProtocolError::FrameTooLarge)));
    }
}
