// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Drives the two-phase symmetric handshake over an already-connected
//! reader/writer pair. The server and worker sides run different sequences
//! of the same three moves (challenge, respond, verify) because the server
//! always challenges first and the worker always challenges second.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::{
    auth,
    codec::{Command, FrameReader, FrameWriter, ProtocolError},
};

fn require_arg(
    frame: &crate::protocol::codec::RawFrame,
    expected: Command,
) -> Result<String, ProtocolError> {
    if frame.command != expected {
        return Err(ProtocolError::UnauthenticatedPayload);
    }
    frame
        .arg
        .clone()
        .ok_or_else(|| ProtocolError::MalformedFrame(format!("{expected} with no argument")))
}

/// Coordinator side: challenge first, verify the worker's response, then
/// respond to the worker's own challenge. Only once this returns is the
/// connection ready for task commands.
pub async fn server_handshake<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    secret: &[u8],
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let our_nonce = auth::generate_nonce_hex();
    writer.send_arg(Command::Challenge, &our_nonce).await?;

    let frame = reader.read_frame().await?;
    let their_mac = require_arg(&frame, Command::Auth)?;
    auth::verify_mac_hex(secret, &our_nonce, &their_mac)
        .map_err(|_| ProtocolError::MalformedFrame("auth mismatch".into()))?;

    let frame = reader.read_frame().await?;
    let their_nonce = require_arg(&frame, Command::Challenge)?;
    let our_mac = auth::compute_mac_hex(secret, &their_nonce)
        .map_err(|_| ProtocolError::MalformedFrame("malformed challenge".into()))?;
    writer.send_arg(Command::Auth, &our_mac).await?;

    Ok(())
}

/// Worker side: respond to the server's challenge, send our own, then
/// verify the server's response to it.
pub async fn worker_handshake<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    secret: &[u8],
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let frame = reader.read_frame().await?;
    let their_nonce = require_arg(&frame, Command::Challenge)?;
    let our_mac = auth::compute_mac_hex(secret, &their_nonce)
        .map_err(|_| ProtocolError::MalformedFrame("malformed challenge".into()))?;
    writer.send_arg(Command::Auth, &our_mac).await?;

    let our_nonce = auth::generate_nonce_hex();
    writer.send_arg(Command::Challenge, &our_nonce).await?;

    let frame = reader.read_frame().await?;
    let their_mac = require_arg(&frame, Command::Auth)?;
    auth::verify_mac_hex(secret, &our_nonce, &their_mac)
        .map_err(|_| ProtocolError::MalformedFrame("auth mismatch".into()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn server_and_worker_handshakes_agree() {
        let (server_io, worker_io) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (worker_read, worker_write) = tokio::io::split(worker_io);

        let mut server_reader = FrameReader::new(server_read);
        let mut server_writer = FrameWriter::new(server_write);
        let mut worker_reader = FrameReader::new(worker_read);
        let mut worker_writer = FrameWriter::new(worker_write);

        let secret = b"shared-secret".to_vec();
        let server_secret = secret.clone();
        let server_task = tokio::spawn(async move {
            server_handshake(&mut server_reader, &mut server_writer, &server_secret).await
        });
        let worker_task = tokio::spawn(async move {
            worker_handshake(&mut worker_reader, &mut worker_writer, &secret).await
        });

        let (server_res, worker_res) = tokio::join!(server_task, worker_task);
        server_res.unwrap().unwrap();
        worker_res.unwrap().unwrap();
    }

    #[tokio::test]
    async fn mismatched_secrets_fail_verification() {
        let (server_io, worker_io) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (worker_read, worker_write) = tokio::io::split(worker_io);

        let mut server_reader = FrameReader::new(server_read);
        let mut server_writer = FrameWriter::new(server_write);
        let mut worker_reader = FrameReader::new(worker_read);
        let mut worker_writer = FrameWriter::new(worker_write);

        let server_task = tokio::spawn(async move {
            server_handshake(&mut server_reader, &mut server_writer, b"correct").await
        });
        let worker_task = tokio::spawn(async move {
            worker_handshake(&mut worker_reader, &mut worker_writer, b"wrong").await
        });

        let (server_res, _worker_res) = tokio::join!(server_task, worker_task);
        assert!(server_res.unwrap().is_err());
    }
}
