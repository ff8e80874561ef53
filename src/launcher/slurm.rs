// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Slurm batch launcher: runs the coordinator locally and submits one
//! `sbatch` job per requested worker, each invoking this same binary with
//! `--launch=client`. A narrow, external-process interface only — the
//! batch scheduler itself is out of scope.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{info, warn};

use crate::{cfg::config::Config, coordinator, plugins::Plugins};

pub async fn launch(config: &Config, plugins: Arc<Plugins>, num_clients: u32) -> Result<()> {
    if num_clients == 0 {
        bail!("num_clients must be positive for slurm launch");
    }

    let address = local_ip_hint();
    let exe = std::env::current_exe().context("resolving current executable path")?;
    let job_name = format!("shuffle-mr-{}", config.coordinator.port);

    info!(%job_name, num_clients, "submitting slurm jobs");
    for i in 0..num_clients {
        let status = Command::new("sbatch")
            .arg(format!("--job-name={job_name}"))
            .arg("--wrap")
            .arg(format!(
                "{} --launch=client --address={address} --port={}",
                exe.display(),
                config.worker.port
            ))
            .status()
            .await
            .context("failed to invoke sbatch")?;
        if !status.success() {
            warn!(job = i, ?status, "sbatch submission failed");
        }
    }

    let result = coordinator::listener::run(&config.coordinator, &plugins).await;

    let _ = Command::new("scancel")
        .arg(format!("--name={job_name}"))
        .status()
        .await;

    result
}

fn local_ip_hint() -> String {
    std::env::var("SHUFFLE_MR_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_owned())
}
