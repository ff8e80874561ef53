// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, time::Duration};

use shuffle_mr::{
    cfg::config::{Config, CoordinatorConfig, WorkerConfig},
    launcher,
    plugins::default_plugins,
};
use tokio::net::TcpListener;

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Runs a tiny word-count job over two real TCP workers and checks the
/// coordinator's written output matches the expected per-word counts.
#[tokio::test]
async fn word_count_with_two_workers() {
    let port = free_port().await;

    let dir = std::env::temp_dir().join(format!("shuffle-mr-e2e-{port}"));
    fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("input.txt");
    let output_path = dir.join("output.txt");
    fs::write(&input_path, "a b a\nb c\n").unwrap();

    let config = Config {
        coordinator: CoordinatorConfig {
            port,
            password: "secret".to_owned(),
            reader: None,
            writer: None,
            input: input_path.to_string_lossy().into_owned(),
            output: output_path.to_string_lossy().into_owned(),
            report_interval: 0,
        },
        worker: WorkerConfig {
            address: "127.0.0.1".to_owned(),
            port,
            password: "secret".to_owned(),
            mapper: Some("wordcount".to_owned()),
            reducer: Some("sum".to_owned()),
            timeout: Duration::from_secs(5),
        },
        logging: Default::default(),
    };

    let plugins = default_plugins();

    tokio::time::timeout(
        Duration::from_secs(10),
        launcher::launch(shuffle_mr::cfg::enums::LaunchMode::Local, &config, plugins, 2),
    )
    .await
    .expect("job timed out")
    .expect("job failed");

    let output = fs::read_to_string(&output_path).unwrap();
    assert!(output.contains(r#"Str("a"): Int(2)"#), "got: {output}");
    assert!(output.contains(r#"Str("b"): Int(2)"#), "got: {output}");
    assert!(output.contains(r#"Str("c"): Int(1)"#), "got: {output}");

    let _ = fs::remove_dir_all(&dir);
}
