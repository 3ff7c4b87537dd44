use crate::{ChannelError, ChannelResult};
use std::io::{ErrorKind, Read, Write};

/// Largest payload a frame can carry.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Encodes `payload` as a length-prefixed frame.
///
/// # Errors
///
/// Returns `ChannelError::PayloadTooLarge` if the UTF-8 encoding exceeds [`MAX_FRAME_LEN`]
/// bytes. Oversized payloads are never truncated.
pub fn encode_frame(payload: &str) -> ChannelResult<Vec<u8>> {
    let bytes = payload.as_bytes();
    let len = u16::try_from(bytes.len())
        .map_err(|_| ChannelError::PayloadTooLarge { len: bytes.len() })?;

    let mut frame = Vec::with_capacity(2 + bytes.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(bytes);
    Ok(frame)
}

/// Writes one frame. Nothing is written if the payload is too large.
pub fn write_frame<W: Write>(writer: &mut W, payload: &str) -> ChannelResult<()> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Reads exactly one frame.
///
/// # Errors
///
/// Returns `ChannelError::Truncated` if the stream ends inside the frame and
/// `ChannelError::InvalidUtf8` if the payload is not UTF-8.
pub fn read_frame<R: Read>(reader: &mut R) -> ChannelResult<String> {
    let mut len = [0u8; 2];
    read_full(reader, &mut len)?;

    let mut payload = vec![0u8; u16::from_be_bytes(len) as usize];
    read_full(reader, &mut payload)?;

    Ok(String::from_utf8(payload)?)
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> ChannelResult<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => ChannelError::Truncated,
        _ => ChannelError::Io(e),
    })
}
