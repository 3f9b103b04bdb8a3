//! Length-prefixed framing for the wire protocol.
//!
//! Every message is a 4-byte **little-endian** `u32` length prefix followed
//! by that many bytes of payload. JSON frames carry a serialized
//! [`Request`](crate::protocol::Request) or [`Reply`](crate::protocol::Reply);
//! binary frames carry packed floats and always follow a JSON frame that
//! announced them.
//!
//! # Wire format
//!
//! ```text
//! +----------------+------------------+
//! | Length (4B LE) | Payload          |
//! +----------------+------------------+
//! ```

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::protocol::{ClientError, MAX_MESSAGE_SIZE};

/// Read a length-prefixed JSON message from a stream.
///
/// Returns `Ok(None)` if the stream reaches EOF before any bytes are read
/// (clean disconnect). Returns an error if the length prefix or payload
/// cannot be read, the payload exceeds [`MAX_MESSAGE_SIZE`], or the JSON
/// is invalid.
pub fn read_message<T: DeserializeOwned>(
    reader: &mut impl Read,
) -> Result<Option<T>, ClientError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(ClientError::Io(e)),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ClientError::PayloadTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let msg: T = serde_json::from_slice(&payload)?;
    Ok(Some(msg))
}

/// Write a length-prefixed JSON message to a stream.
///
/// Serialises `msg` to JSON, writes the 4-byte little-endian length prefix,
/// then writes the JSON payload. The stream is flushed after writing.
pub fn write_message<T: Serialize>(writer: &mut impl Write, msg: &T) -> Result<(), ClientError> {
    let payload = serde_json::to_vec(msg)?;

    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ClientError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    // MAX_MESSAGE_SIZE (16 MiB) fits in u32.
    let len = u32::try_from(payload.len())
        .map_err(|_| ClientError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        })?
        .to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Write a length-prefixed binary frame to a stream.
///
/// Writes a 4-byte little-endian `u32` length prefix followed by the raw
/// bytes. Flushes the writer after writing.
pub fn write_binary_frame(writer: &mut impl Write, data: &[u8]) -> Result<(), ClientError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ClientError::PayloadTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = u32::try_from(data.len())
        .map_err(|_| ClientError::PayloadTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        })?
        .to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(data)?;
    writer.flush()?;
    Ok(())
}

/// Read a length-prefixed binary frame from a stream.
///
/// Reads the 4-byte little-endian `u32` length prefix, then exactly that
/// many payload bytes. Unlike [`read_message`], EOF here is an error: a
/// binary frame is only ever read after a JSON frame announced it.
pub fn read_binary_frame(reader: &mut impl Read) -> Result<Vec<u8>, ClientError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ClientError::PayloadTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;
    Ok(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::pack_floats;
    use crate::protocol::{Reply, Request};
    use std::io::Cursor;

    #[test]
    fn roundtrip_request() {
        let req = Request::GetScalar { name: "dt".into() };
        let mut buf = Vec::new();
        write_message(&mut buf, &req).unwrap();

        let mut cursor = Cursor::new(&buf);
        let req2: Request = read_message(&mut cursor).unwrap().unwrap();
        assert_eq!(req2, req);
    }

    #[test]
    fn roundtrip_reply() {
        let reply = Reply::Ack;
        let mut buf = Vec::new();
        write_message(&mut buf, &reply).unwrap();

        let mut cursor = Cursor::new(&buf);
        let reply2: Reply = read_message(&mut cursor).unwrap().unwrap();
        assert!(matches!(reply2, Reply::Ack));
    }

    #[test]
    fn length_prefix_is_little_endian() {
        let req = Request::Ping;
        let mut buf = Vec::new();
        write_message(&mut buf, &req).unwrap();

        let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(len, buf.len() - 4);
    }

    #[test]
    fn eof_returns_none() {
        let buf: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&buf);
        let result: Result<Option<Request>, _> = read_message(&mut cursor);
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn oversized_prefix_is_rejected() {
        let fake_len = (u32::try_from(MAX_MESSAGE_SIZE).unwrap() + 1).to_le_bytes();
        let mut cursor = Cursor::new(fake_len.to_vec());
        let result: Result<Option<Request>, _> = read_message(&mut cursor);
        assert!(matches!(
            result.unwrap_err(),
            ClientError::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn invalid_json_returns_error() {
        let garbage = b"not json at all";
        let len = u32::try_from(garbage.len()).unwrap().to_le_bytes();
        let mut data = len.to_vec();
        data.extend_from_slice(garbage);

        let mut cursor = Cursor::new(&data);
        let result: Result<Option<Request>, _> = read_message(&mut cursor);
        assert!(matches!(result, Err(ClientError::Json(_))));
    }

    #[test]
    fn multiple_messages_in_sequence() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Request::Start).unwrap();
        write_message(&mut buf, &Request::Trigger).unwrap();
        write_message(&mut buf, &Request::Stop).unwrap();

        let mut cursor = Cursor::new(&buf);
        assert!(matches!(
            read_message::<Request>(&mut cursor).unwrap().unwrap(),
            Request::Start
        ));
        assert!(matches!(
            read_message::<Request>(&mut cursor).unwrap().unwrap(),
            Request::Trigger
        ));
        assert!(matches!(
            read_message::<Request>(&mut cursor).unwrap().unwrap(),
            Request::Stop
        ));
        assert!(read_message::<Request>(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn json_frame_then_binary_frame() {
        // The wire pattern for vector payloads: header, then packed floats.
        let mut buf = Vec::new();
        write_message(
            &mut buf,
            &Reply::Vector {
                name: "states".into(),
                len: 3,
            },
        )
        .unwrap();
        write_binary_frame(&mut buf, &pack_floats(&[1.0, 2.0, 3.0])).unwrap();

        let mut cursor = Cursor::new(&buf);
        let header: Reply = read_message(&mut cursor).unwrap().unwrap();
        assert!(matches!(header, Reply::Vector { len: 3, .. }));
        let payload = read_binary_frame(&mut cursor).unwrap();
        assert_eq!(payload.len(), 12);
    }

    #[test]
    fn binary_frame_roundtrip_empty() {
        let mut buf = Vec::new();
        write_binary_frame(&mut buf, &[]).unwrap();
        let mut cursor = Cursor::new(&buf);
        assert!(read_binary_frame(&mut cursor).unwrap().is_empty());
    }

    #[test]
    fn binary_frame_truncated_payload_is_error() {
        let mut buf = Vec::new();
        write_binary_frame(&mut buf, &[1, 2, 3, 4]).unwrap();
        buf.truncate(buf.len() - 1);

        let mut cursor = Cursor::new(&buf);
        assert!(matches!(
            read_binary_frame(&mut cursor).unwrap_err(),
            ClientError::Io(_)
        ));
    }
}
