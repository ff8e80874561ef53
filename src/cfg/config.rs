// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    cfg::{
        cli::Cli,
        enums::{LogOutput, RotationFreq},
    },
    protocol::DEFAULT_PORT,
};

/// Top-level configuration, covering both roles a process can run: the
/// distinction mirrors how the source kept Login/Runtime parameters
/// separate even though both ship in one file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CoordinatorConfig {
    pub port: u16,
    /// Shared secret used in the HMAC handshake. The default is a
    /// placeholder; operators must override it in production.
    pub password: String,
    pub reader: Option<String>,
    pub writer: Option<String>,
    pub input: String,
    pub output: String,
    /// Percentage step at which map/reduce progress is logged; 0 disables
    /// progress logging.
    pub report_interval: u8,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            password: "changeme".to_owned(),
            reader: None,
            writer: None,
            input: String::new(),
            output: String::new(),
            report_interval: 10,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorkerConfig {
    pub address: String,
    pub port: u16,
    pub password: String,
    pub mapper: Option<String>,
    pub reducer: Option<String>,
    #[serde(with = "serde_secs")]
    pub timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            password: "changeme".to_owned(),
            mapper: None,
            reducer: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub output: LogOutput,
    pub is_show_line: bool,
    pub is_show_module_path: bool,
    pub is_show_target: bool,
    pub file: Option<LogFileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            output: LogOutput::Stdout,
            is_show_line: false,
            is_show_module_path: false,
            is_show_target: true,
            file: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFileConfig {
    pub path: String,
    #[serde(default)]
    pub rotation_frequency: Option<RotationFreq>,
}

impl Config {
    /// Loads defaults, overlays a YAML file if one is given, then overlays
    /// CLI flags. Each layer only overrides fields the layer above it left
    /// at its default.
    pub fn layered(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_cli(cli);
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.mapper {
            self.worker.mapper = Some(v.clone());
        }
        if let Some(v) = &cli.reducer {
            self.worker.reducer = Some(v.clone());
        }
        if let Some(v) = &cli.reader {
            self.coordinator.reader = Some(v.clone());
        }
        if let Some(v) = &cli.writer {
            self.coordinator.writer = Some(v.clone());
        }
        if let Some(v) = &cli.input {
            self.coordinator.input = v.clone();
        }
        if let Some(v) = &cli.output {
            self.coordinator.output = v.clone();
        }
        if let Some(v) = &cli.address {
            self.worker.address = v.clone();
        }
        if let Some(v) = cli.port {
            self.coordinator.port = v;
            self.worker.port = v;
        }
        if let Some(v) = &cli.password {
            self.coordinator.password = v.clone();
            self.worker.password = v.clone();
        }
        if let Some(v) = cli.timeout {
            self.worker.timeout = Duration::from_secs(v);
        }
        if let Some(v) = cli.report_interval {
            self.coordinator.report_interval = v;
        }
        if let Some(v) = &cli.loglevel {
            self.logging.level = v.clone();
        }
    }

    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(self.coordinator.port > 0, "coordinator port must be nonzero");
        ensure!(self.worker.port > 0, "worker port must be nonzero");
        ensure!(
            !self.coordinator.password.is_empty(),
            "coordinator password must not be empty"
        );
        ensure!(
            !self.worker.password.is_empty(),
            "worker password must not be empty"
        );
        ensure!(
            self.coordinator.report_interval <= 100,
            "report_interval must be a percentage between 0 and 100"
        );
        Ok(())
    }
}

/// Serde helper representing `Duration` as a whole number of seconds, the
/// same scheme the source used for its own timer fields.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
