// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! One worker connection channel. Drives the auth handshake, then loops:
//! ask the task manager for work, send it, wait for the matching `*done`
//! reply, feed it back, ask again. Any socket error or protocol violation
//! just closes the connection — the task manager is never told, and the
//! timestamp-based reassignment in [`super::task_manager`] is the only
//! recovery path.

use std::sync::Arc;

use tokio::{
    net::TcpStream,
    sync::{Mutex, Notify},
};
use tracing::{debug, warn};

use crate::{
    coordinator::task_manager::{Assignment, TaskManager},
    protocol::{
        Command, FrameReader, FrameWriter, ProtocolError, handshake::server_handshake, messages,
        messages::{MapDone, ReduceDone},
    },
};

/// Services one accepted connection until it closes or the job finishes on
/// this channel. Never returns an error: every failure mode here is "close
/// the connection", logged and swallowed, per the coordinator's recovery
/// model. `finished` is notified once, when this channel observes the task
/// manager has nothing left to assign, so the listener knows to stop
/// accepting and run the writer.
pub async fn run(
    stream: TcpStream,
    secret: Arc<Vec<u8>>,
    task_manager: Arc<Mutex<TaskManager>>,
    finished: Arc<Notify>,
) {
    let peer = stream.peer_addr().ok();
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);

    if let Err(e) = server_handshake(&mut reader, &mut writer, &secret).await {
        warn!(?peer, error = %e, "auth handshake failed; closing connection");
        return;
    }
    debug!(?peer, "worker authenticated");

    if let Err(e) = task_loop(&mut reader, &mut writer, &task_manager, &finished).await {
        debug!(?peer, error = %e, "connection closed");
    }
}

async fn task_loop(
    reader: &mut FrameReader<tokio::net::tcp::OwnedReadHalf>,
    writer: &mut FrameWriter<tokio::net::tcp::OwnedWriteHalf>,
    task_manager: &Arc<Mutex<TaskManager>>,
    finished: &Arc<Notify>,
) -> Result<(), ProtocolError> {
    loop {
        let assignment = task_manager.lock().await.next_task();
        let Some(assignment) = assignment else {
            let _ = writer.send_empty(Command::Disconnect).await;
            finished.notify_one();
            return Ok(());
        };

        match assignment {
            Assignment::Map(m) => {
                let bytes = messages::encode(&m)?;
                writer.send_payload(Command::Map, &bytes).await?;

                let frame = reader.read_frame().await?;
                match frame.command {
                    Command::MapDone => {
                        let payload = frame
                            .payload
                            .ok_or_else(|| ProtocolError::MalformedFrame("mapdone".into()))?;
                        let done: MapDone = messages::decode(&payload)?;
                        task_manager.lock().await.map_done(done.key, done.output);
                    },
                    Command::Disconnect => return Ok(()),
                    other => {
                        warn!(?other, "unexpected command while awaiting mapdone");
                        return Err(ProtocolError::UnknownCommand(other.as_str().to_owned()));
                    },
                }
            },
            Assignment::Reduce(r) => {
                let bytes = messages::encode(&r)?;
                writer.send_payload(Command::Reduce, &bytes).await?;

                let frame = reader.read_frame().await?;
                match frame.command {
                    Command::ReduceDone => {
                        let payload = frame
                            .payload
                            .ok_or_else(|| ProtocolError::MalformedFrame("reducedone".into()))?;
                        let done: ReduceDone = messages::decode(&payload)?;
                        task_manager
                            .lock()
                            .await
                            .reduce_done(done.key, done.value);
                    },
                    Command::Disconnect => return Ok(()),
                    other => {
                        warn!(?other, "unexpected command while awaiting reducedone");
                        return Err(ProtocolError::UnknownCommand(other.as_str().to_owned()));
                    },
                }
            },
        }
    }
}
