// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MPI launcher: expects this binary to already be running under `mpirun`/
//! `mpiexec -n N`, one process per rank. Rank 0 runs the coordinator; every
//! other rank runs a worker against `config.worker.address`, which the job
//! script is expected to point at rank 0's host. No `mpi4py`-style broadcast
//! of the coordinator's address is attempted here — there is no MPI binding
//! in the dependency stack to do it with, so host discovery is left to the
//! job script, same as the rest of the MPI launch plumbing the scheduler
//! itself is responsible for.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::{cfg::config::Config, coordinator, plugins::Plugins, worker};

pub async fn launch(config: &Config, plugins: Arc<Plugins>) -> Result<()> {
    let rank = mpi_rank().context("launch=mpi requires running under mpirun/mpiexec")?;

    if rank == 0 {
        coordinator::listener::run(&config.coordinator, &plugins).await
    } else {
        worker::runtime::run(&config.worker, plugins).await
    }
}

fn mpi_rank() -> Result<u32> {
    for var in ["OMPI_COMM_WORLD_RANK", "PMI_RANK", "MPI_RANK"] {
        if let Ok(v) = std::env::var(var) {
            return v.parse().with_context(|| format!("{var} is not a valid rank"));
        }
    }
    bail!("no MPI rank environment variable found (OMPI_COMM_WORLD_RANK/PMI_RANK/MPI_RANK)")
}
