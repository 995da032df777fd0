//! Runs the `hyperglass-hooks` binary the way an external supervisor would.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_hyperglass-hooks");

/// Answers every RESP command on the connection with `+OK`.
fn answer_ok(stream: TcpStream) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let Some(count) = line.trim_end().strip_prefix('*') else {
            continue;
        };
        let count: usize = count.parse().unwrap_or(0);
        for _ in 0..count {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let len: usize = line.trim_end().trim_start_matches('$').parse().unwrap_or(0);
            let mut arg = vec![0u8; len + 2];
            if reader.read_exact(&mut arg).is_err() {
                return;
            }
        }
        if writer.write_all(b"+OK\r\n").is_err() {
            return;
        }
    }
}

/// Starts a stand-in cache server and returns its port.
fn spawn_cache() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            std::thread::spawn(move || answer_ok(stream));
        }
    });
    port
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn run(args: &[&str], metrics_dir: &Path, cache_port: u16) -> Output {
    Command::new(BIN)
        .args(args)
        .env("PROMETHEUS_MULTIPROC_DIR", metrics_dir)
        .env("SASS_BINARY", "hyperglass-no-such-sass-binary")
        .env("CACHE_HOST", "127.0.0.1")
        .env("CACHE_PORT", cache_port.to_string())
        .env("CACHE_DATABASE", "0")
        .env_remove("WORKERS")
        .env_remove("BIND_ADDRESS")
        .env_remove("DEBUG")
        .output()
        .unwrap()
}

#[test]
fn on_starting_prints_env_for_supervisor() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("hyperglass_prometheus");

    let output = run(&["on-starting"], &dir, spawn_cache());

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim_end(),
        format!("prometheus_multiproc_dir={}", dir.display())
    );
    assert!(dir.is_dir());
}

#[test]
fn on_starting_fails_when_cache_is_down() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("hyperglass_prometheus");

    let output = run(&["on-starting"], &dir, closed_port());

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(!dir.exists());
}

#[test]
fn settings_list_worker_env() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("hyperglass_prometheus");

    let output = run(&["settings"], &dir, closed_port());

    assert!(output.status.success());
    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        settings["env"]["prometheus_multiproc_dir"],
        serde_json::Value::String(dir.display().to_string())
    );
    assert_eq!(settings["bind"], "[::1]:8001");
}
