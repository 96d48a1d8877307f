//! Length-prefixed JSON framing
//!
//! Each frame is a 4-byte little-endian body length followed by the body.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted frame body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Read one frame body
///
/// Returns `Ok(None)` when the peer closes the stream between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("failed to read frame length"),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        bail!("frame of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit");
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .context("failed to read frame body")?;

    Ok(Some(body))
}

/// Serialize `msg` and write it as one frame
pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(msg).context("failed to encode message")?;
    if body.len() > MAX_MESSAGE_LEN {
        bail!("message of {} bytes exceeds the frame limit", body.len());
    }

    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::protocol::Response;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut bytes = (body.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[tokio::test]
    async fn test_read_frame_across_partial_reads() {
        let bytes = frame(br#"{"type":"ping"}"#);
        let mut reader = tokio_test::io::Builder::new()
            .read(&bytes[..2])
            .read(&bytes[2..7])
            .read(&bytes[7..])
            .build();

        let body = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(body, br#"{"type":"ping"}"#);
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_length() {
        let len = (MAX_MESSAGE_LEN as u32 + 1).to_le_bytes();
        let mut reader = tokio_test::io::Builder::new().read(&len).build();

        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_truncated_body_is_an_error() {
        let bytes = frame(b"{\"type\":\"pong\"}");
        let mut reader = tokio_test::io::Builder::new().read(&bytes[..8]).build();

        assert!(read_frame(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_write_message() {
        let expected = frame(br#"{"type":"pong"}"#);
        let mut writer = tokio_test::io::Builder::new()
            .write(&expected[..4])
            .write(&expected[4..])
            .build();

        write_message(&mut writer, &Response::Pong).await.unwrap();
    }
}
