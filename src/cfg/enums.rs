// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which role this process should play when it starts up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Spawn a coordinator and `num_clients` workers as local subprocesses.
    Local,
    /// Run only the coordinator.
    Server,
    /// Run only a worker.
    Client,
    /// Submit worker processes through MPI (external collaborator; see
    /// `launcher::mpi`).
    Mpi,
    /// Submit worker processes through a Slurm batch allocation (external
    /// collaborator; see `launcher::slurm`).
    Slurm,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaunchMode::Local => "local",
            LaunchMode::Server => "server",
            LaunchMode::Client => "client",
            LaunchMode::Mpi => "mpi",
            LaunchMode::Slurm => "slurm",
        })
    }
}

/// Where the logger writes formatted events.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationFreq {
    Minutely,
    Hourly,
    Daily,
    Never,
}
