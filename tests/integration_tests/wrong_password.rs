// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, time::Duration};

use shuffle_mr::{
    cfg::config::{CoordinatorConfig, WorkerConfig},
    coordinator, plugins::default_plugins, worker,
};
use tokio::net::TcpListener;

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// A worker with the wrong password must fail the handshake and never run a
/// task; the coordinator keeps listening for a worker that authenticates
/// correctly instead of crashing.
#[tokio::test]
async fn worker_with_wrong_password_is_rejected() {
    let port = free_port().await;
    let dir = std::env::temp_dir().join(format!("shuffle-mr-authfail-{port}"));
    fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("input.txt");
    let output_path = dir.join("output.txt");
    fs::write(&input_path, "hello\n").unwrap();

    let plugins = default_plugins();
    let coordinator_config = CoordinatorConfig {
        port,
        password: "correct-horse".to_owned(),
        reader: None,
        writer: None,
        input: input_path.to_string_lossy().into_owned(),
        output: output_path.to_string_lossy().into_owned(),
        report_interval: 0,
    };

    let server_plugins = plugins.clone();
    let server = tokio::spawn(async move {
        coordinator::listener::run(&coordinator_config, &server_plugins).await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let bad_worker_config = WorkerConfig {
        address: "127.0.0.1".to_owned(),
        port,
        password: "wrong-password".to_owned(),
        mapper: None,
        reducer: None,
        timeout: Duration::from_secs(2),
    };
    let result = worker::runtime::run(&bad_worker_config, plugins.clone()).await;
    assert!(result.is_err(), "worker should have failed authentication");

    let good_worker_config = WorkerConfig {
        password: "correct-horse".to_owned(),
        ..bad_worker_config
    };
    tokio::time::timeout(
        Duration::from_secs(5),
        worker::runtime::run(&good_worker_config, plugins),
    )
    .await
    .expect("second worker timed out")
    .expect("second worker should succeed now that it has the right password");

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("coordinator timed out")
        .expect("coordinator task panicked")
        .expect("coordinator failed");

    let _ = fs::remove_dir_all(&dir);
}
