// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The worker side: connect with retries, authenticate, then serve map and
//! reduce assignments until the coordinator disconnects. A user map/reduce
//! panic or error is never caught here — it propagates out of `run` as a
//! worker-process failure, which the coordinator observes only as a dropped
//! connection and recovers from by reassigning the task (§4.4/§4.3 in the
//! design notes).

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use tokio::{net::TcpStream, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    cfg::config::WorkerConfig,
    plugins::Plugins,
    protocol::{
        CONNECTION_WAIT_TIME, Command, FrameReader, FrameWriter, messages,
        messages::{MapAssignment, MapDone, ReduceAssignment, ReduceDone},
        value::Value,
        worker_handshake,
    },
};

pub async fn run(config: &WorkerConfig, plugins: Arc<Plugins>) -> Result<()> {
    let stream = connect_with_retry(&config.address, config.port, config.timeout).await?;
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);
    let secret = config.password.clone().into_bytes();

    worker_handshake(&mut reader, &mut writer, &secret)
        .await
        .context("authentication with coordinator failed")?;
    info!("authenticated with coordinator");

    let mapper = plugins
        .mappers
        .construct(config.mapper.as_deref())
        .context("constructing mapper")?;
    let reducer = plugins
        .reducers
        .construct(config.reducer.as_deref())
        .context("constructing reducer")?;

    loop {
        let frame = reader.read_frame().await?;
        match frame.command {
            Command::Map => {
                let payload = frame
                    .payload
                    .context("map command arrived with no payload")?;
                let assignment: MapAssignment = messages::decode(&payload)?;
                debug!(key = ?assignment.key, "executing map task");

                let pairs = mapper.map(&assignment.key, &assignment.value)?;
                let mut grouped: IndexMap<Value, Vec<Value>> = IndexMap::new();
                for (k, v) in pairs {
                    grouped.entry(k).or_default().push(v);
                }
                let done = MapDone {
                    key: assignment.key,
                    output: Some(grouped.into_iter().collect()),
                };
                let bytes = messages::encode(&done)?;
                writer.send_payload(Command::MapDone, &bytes).await?;
            },
            Command::Reduce => {
                let payload = frame
                    .payload
                    .context("reduce command arrived with no payload")?;
                let assignment: ReduceAssignment = messages::decode(&payload)?;
                debug!(key = ?assignment.key, "executing reduce task");

                let value = reducer.reduce(&assignment.key, &assignment.values)?;
                let done = ReduceDone {
                    key: assignment.key,
                    value,
                };
                let bytes = messages::encode(&done)?;
                writer.send_payload(Command::ReduceDone, &bytes).await?;
            },
            Command::Disconnect => {
                info!("coordinator disconnected; job complete");
                return Ok(());
            },
            other => {
                warn!(?other, "unexpected command from coordinator");
                bail!("unexpected command from coordinator: {other}");
            },
        }
    }
}

async fn connect_with_retry(address: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let deadline = Instant::now() + timeout;
    loop {
        match TcpStream::connect((address, port)).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                if Instant::now() >= deadline {
                    bail!("failed to connect to {address}:{port} within {timeout:?}: {e}");
                }
                warn!(error = %e, %address, port, "connect failed, retrying");
                tokio::time::sleep(CONNECTION_WAIT_TIME).await;
            },
        }
    }
}
