// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::cfg::enums::LaunchMode;

/// The CLI surface in §6: one flat set of options, some coordinator-only,
/// some worker-only, some shared. Which ones apply depends on `launch`.
#[derive(Parser, Debug)]
#[command(name = "shuffle-mr", about = "A single-coordinator MapReduce engine")]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = LaunchMode::Local)]
    pub launch: LaunchMode,

    /// Path to a YAML config file layered beneath these flags.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub mapper: Option<String>,
    #[arg(long)]
    pub reducer: Option<String>,
    #[arg(long)]
    pub reader: Option<String>,
    #[arg(long)]
    pub writer: Option<String>,
    #[arg(long)]
    pub input: Option<String>,
    #[arg(long)]
    pub output: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub password: Option<String>,
    /// Worker reconnect budget, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
    #[arg(long)]
    pub report_interval: Option<u8>,
    #[arg(long)]
    pub loglevel: Option<String>,
    /// Launcher: number of workers to spawn locally.
    #[arg(long, default_value_t = 1)]
    pub num_clients: u32,
}

pub fn resolve_config_path(rel: &Path) -> Result<PathBuf> {
    let abs = if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot get current working dir")?
            .join(rel)
    };

    abs.canonicalize()
        .with_context(|| format!("failed to canonicalize path {abs:?}"))
}
