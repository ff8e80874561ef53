// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The coordinator's entry point: builds the datasource via the configured
//! reader, binds TCP, accepts connections until the task manager has
//! nothing left to assign, then runs the configured writer against the
//! results.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};
use tracing::info;

use crate::{
    cfg::config::CoordinatorConfig,
    coordinator::{channel, task_manager::TaskManager},
    plugins::Plugins,
};

pub async fn run(config: &CoordinatorConfig, plugins: &Arc<Plugins>) -> Result<()> {
    let reader = plugins
        .readers
        .construct(config.reader.as_deref())
        .context("constructing reader")?;
    let datasource = reader.read(&config.input).context("reader failed")?;
    info!(pairs = datasource.len(), "datasource loaded");

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %bind_addr, "coordinator listening");

    let task_manager = Arc::new(Mutex::new(TaskManager::new(
        datasource,
        config.report_interval,
    )));
    let secret = Arc::new(config.password.clone().into_bytes());
    let finished = Arc::new(Notify::new());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.context("accept failed")?;
                info!(%peer, "worker connected");
                let task_manager = task_manager.clone();
                let secret = secret.clone();
                let finished = finished.clone();
                tokio::spawn(async move {
                    channel::run(stream, secret, task_manager, finished).await;
                });
            }
            _ = finished.notified() => {
                info!("job finished; closing listener");
                break;
            }
        }
    }

    let results = task_manager.lock().await;
    let writer = plugins
        .writers
        .construct(config.writer.as_deref())
        .context("constructing writer")?;
    writer
        .write(&config.output, results.results())
        .context("writer failed")?;

    Ok(())
}
