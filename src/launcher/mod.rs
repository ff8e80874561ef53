// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Launch-mode dispatch. Job launchers (MPI, Slurm) are treated as external
//! collaborators reached through a narrow interface: this module starts a
//! coordinator and/or workers, nothing more.

pub mod mpi;
pub mod slurm;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::info;

use crate::{cfg::config::Config, cfg::enums::LaunchMode, coordinator, plugins::Plugins, worker};

pub async fn launch(
    mode: LaunchMode,
    config: &Config,
    plugins: Arc<Plugins>,
    num_clients: u32,
) -> Result<()> {
    match mode {
        LaunchMode::Server => coordinator::listener::run(&config.coordinator, &plugins).await,
        LaunchMode::Client => worker::runtime::run(&config.worker, plugins).await,
        LaunchMode::Local => launch_local(config, plugins, num_clients).await,
        LaunchMode::Mpi => mpi::launch(config, plugins).await,
        LaunchMode::Slurm => slurm::launch(config, plugins, num_clients).await,
    }
}

/// Spawns a coordinator and `num_clients` workers as local tasks, same
/// process. Useful for development and for small single-machine jobs.
async fn launch_local(config: &Config, plugins: Arc<Plugins>, num_clients: u32) -> Result<()> {
    let coordinator_config = config.coordinator.clone();
    let coordinator_plugins = plugins.clone();
    let server = tokio::spawn(async move {
        coordinator::listener::run(&coordinator_config, &coordinator_plugins).await
    });

    // Give the listener a moment to bind before workers start dialing it.
    tokio::time::sleep(Duration::from_millis(200)).await;

    info!(num_clients, "spawning local workers");
    let mut workers = Vec::with_capacity(num_clients as usize);
    for i in 0..num_clients {
        let worker_config = config.worker.clone();
        let worker_plugins = plugins.clone();
        workers.push(tokio::spawn(async move {
            worker::runtime::run(&worker_config, worker_plugins)
                .await
                .with_context(|| format!("worker {i} failed"))
        }));
    }

    for w in workers {
        w.await.context("worker task panicked")??;
    }

    server.await.context("coordinator task panicked")?
}
