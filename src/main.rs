// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use clap::Parser;
use shuffle_mr::{
    cfg::{cli::Cli, config::Config, logger::init_logger},
    launcher,
    plugins::default_plugins,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::layered(&cli).context("failed to build configuration")?;

    let _logger_guard = init_logger(&config.logging).context("failed to initialize logger")?;
    info!(launch = %cli.launch, "starting up");

    let plugins = default_plugins();
    launcher::launch(cli.launch, &config, plugins, cli.num_clients).await
}
