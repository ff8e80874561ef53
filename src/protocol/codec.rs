// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Frame codec: line-mode command lines alternating with length-mode payload
//! bodies, exactly the terminator-switching scheme worked by the wire
//! protocol. `Command`/`Auth` frames always carry their argument inline;
//! `Map`/`Reduce`/`MapDone`/`ReduceDone` carry it as a following length-mode
//! blob; `Disconnect` carries neither.

use std::{fmt, str::FromStr};

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub const SEPARATOR: char = ':';

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0:?}")]
    MalformedFrame(String),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("payload frame arrived before authentication was complete")]
    UnauthenticatedPayload,
    #[error("connection closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to decode payload: {0}")]
    Encoding(#[from] bincode::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Challenge,
    Auth,
    Disconnect,
    Map,
    Reduce,
    MapDone,
    ReduceDone,
}

impl Command {
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Challenge => "challenge",
            Command::Auth => "auth",
            Command::Disconnect => "disconnect",
            Command::Map => "map",
            Command::Reduce => "reduce",
            Command::MapDone => "mapdone",
            Command::ReduceDone => "reducedone",
        }
    }

    /// True for commands whose ARG is always an inline string, never a
    /// following length-mode payload.
    const fn carries_inline_arg(self) -> bool {
        matches!(self, Command::Challenge | Command::Auth)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "challenge" => Command::Challenge,
            "auth" => Command::Auth,
            "disconnect" => Command::Disconnect,
            "map" => Command::Map,
            "reduce" => Command::Reduce,
            "mapdone" => Command::MapDone,
            "reducedone" => Command::ReduceDone,
            other => return Err(ProtocolError::UnknownCommand(other.to_owned())),
        })
    }
}

/// One fully-received frame: a command, its inline argument (challenge/auth
/// only), and its decoded payload bytes (task commands only).
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub command: Command,
    pub arg: Option<String>,
    pub payload: Option<Bytes>,
}

pub struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    pub async fn read_frame(&mut self) -> Result<RawFrame, ProtocolError> {
        let mut line = String::new();
        let n = self.inner.read_line(&mut line).await?;
        if n == 0 {
            return Err(ProtocolError::Closed);
        }
        let line = line.trim_end_matches(['\n', '\r']);
        let (name, tail) = line
            .split_once(SEPARATOR)
            .ok_or_else(|| ProtocolError::MalformedFrame(line.to_owned()))?;
        let command: Command = name.parse()?;

        if command.carries_inline_arg() {
            return Ok(RawFrame {
                command,
                arg: Some(tail.to_owned()),
                payload: None,
            });
        }

        if tail.is_empty() {
            return Ok(RawFrame {
                command,
                arg: None,
                payload: None,
            });
        }

        let len: usize = tail
            .parse()
            .map_err(|_| ProtocolError::MalformedFrame(line.to_owned()))?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).await?;
        Ok(RawFrame {
            command,
            arg: None,
            payload: Some(Bytes::from(buf)),
        })
    }
}

pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn send_arg(&mut self, command: Command, arg: &str) -> Result<(), ProtocolError> {
        let line = format!("{command}{SEPARATOR}{arg}\n");
        self.inner.write_all(line.as_bytes()).await?;
        Ok(())
    }

    pub async fn send_empty(&mut self, command: Command) -> Result<(), ProtocolError> {
        let line = format!("{command}{SEPARATOR}\n");
        self.inner.write_all(line.as_bytes()).await?;
        Ok(())
    }

    pub async fn send_payload(
        &mut self,
        command: Command,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        let line = format!("{command}{SEPARATOR}{}\n", payload.len());
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_an_inline_arg_frame() {
        let mut buf = Vec::new();
        {
            let mut w = FrameWriter::new(&mut buf);
            w.send_arg(Command::Challenge, "deadbeef").await.unwrap();
        }
        let mut r = FrameReader::new(buf.as_slice());
        let frame = r.read_frame().await.unwrap();
        assert_eq!(frame.command, Command::Challenge);
        assert_eq!(frame.arg.as_deref(), Some("deadbeef"));
        assert!(frame.payload.is_none());
    }

    #[tokio::test]
    async fn round_trips_a_length_mode_payload() {
        let mut buf = Vec::new();
        {
            let mut w = FrameWriter::new(&mut buf);
            w.send_payload(Command::Map, b"hello").await.unwrap();
        }
        let mut r = FrameReader::new(buf.as_slice());
        let frame = r.read_frame().await.unwrap();
        assert_eq!(frame.command, Command::Map);
        assert_eq!(frame.payload.as_deref(), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn empty_tail_dispatches_with_no_payload() {
        let mut buf = Vec::new();
        {
            let mut w = FrameWriter::new(&mut buf);
            w.send_empty(Command::Disconnect).await.unwrap();
        }
        let mut r = FrameReader::new(buf.as_slice());
        let frame = r.read_frame().await.unwrap();
        assert_eq!(frame.command, Command::Disconnect);
        assert!(frame.arg.is_none());
        assert!(frame.payload.is_none());
    }

    #[tokio::test]
    async fn missing_separator_is_malformed() {
        let mut r = FrameReader::new(&b"garbage\n"[..]);
        let err = r.read_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame(_)));
    }

    #[tokio::test]
    async fn unknown_command_is_rejected() {
        let mut r = FrameReader::new(&b"frobnicate:\n"[..]);
        let err = r.read_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(_)));
    }

    #[tokio::test]
    async fn eof_before_any_frame_is_closed() {
        let mut r = FrameReader::new(&b""[..]);
        let err = r.read_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::Closed));
    }
}
