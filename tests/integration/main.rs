//! Integration tests for AuditDog

#![cfg(unix)]

mod support {
    use assert_cmd::Command;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::os::unix::process::CommandExt;
    use std::path::{Path, PathBuf};
    use std::process::{Child, Stdio};
    use std::sync::mpsc::{self, Receiver};
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    pub const HIGH_RISK_BODY: &str = r#"{
        "command": "echo",
        "summary": "Prints its arguments after shell expansion",
        "risk_level": "high",
        "sections": [{"title": "Effect", "content": "Writes to stdout"}]
    }"#;

    /// Isolated home, config, cache and state directories
    pub struct Sandbox {
        pub home: TempDir,
    }

    impl Sandbox {
        pub fn new() -> Self {
            Self {
                home: TempDir::new().unwrap(),
            }
        }

        pub fn path(&self, relative: &str) -> PathBuf {
            self.home.path().join(relative)
        }

        pub fn config_path(&self) -> PathBuf {
            self.path("config/auditdog.toml")
        }

        pub fn auditdog(&self) -> Command {
            Command::from_std(self.std_command())
        }

        /// Plain process handle, for tests that signal the running binary
        pub fn spawn_auditdog(&self, args: &[&str]) -> Child {
            let mut cmd = self.std_command();
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            // Own process group, so the whole job can be signalled like a terminal would
            cmd.process_group(0);
            cmd.spawn().unwrap()
        }

        fn std_command(&self) -> std::process::Command {
            let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_auditdog"));
            cmd.env("HOME", self.home.path())
                .env("XDG_CONFIG_HOME", self.path("config"))
                .env("XDG_CACHE_HOME", self.path("cache"))
                .env("XDG_STATE_HOME", self.path("state"))
                .env("XDG_DATA_HOME", self.path("data"))
                .env("AUDITDOG_CONFIG", self.config_path())
                .env_remove("AUDITDOG_API_URL")
                .env_remove("AUDITDOG_VERBOSE");
            cmd
        }

        /// Store `record` in the on-disk cache under `key`
        pub fn seed_cache(&self, key: &str, record: &str) {
            let dir = self.path("cache/auditdog");
            std::fs::create_dir_all(&dir).unwrap();
            let document = format!("{{{}: {}}}", serde_json::to_string(key).unwrap(), record);
            std::fs::write(dir.join("explanations.json"), document).unwrap();
        }
    }

    /// Send `signal` (e.g. "-INT") to a process, or to a group when `target` is negative
    pub fn kill(signal: &str, target: i64) {
        let status = std::process::Command::new("kill")
            .arg(signal)
            .arg("--")
            .arg(target.to_string())
            .status()
            .unwrap();
        assert!(status.success());
    }

    /// Poll until `path` exists
    pub fn wait_for(path: &Path) {
        let deadline = Instant::now() + Duration::from_secs(20);
        while !path.exists() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", path.display());
            thread::sleep(Duration::from_millis(20));
        }
    }

    /// API that accepts connections and never answers
    pub struct SilentApi {
        pub base_url: String,
        pub accepted: Receiver<()>,
    }

    impl SilentApi {
        pub fn serve() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();
            let (tx, accepted) = mpsc::channel();

            thread::spawn(move || {
                let mut held = Vec::new();
                for stream in listener.incoming() {
                    match stream {
                        Ok(stream) => {
                            held.push(stream);
                            if tx.send(()).is_err() {
                                return;
                            }
                        }
                        Err(_) => return,
                    }
                }
            });

            Self {
                base_url: format!("http://127.0.0.1:{}/api/v1", port),
                accepted,
            }
        }
    }

    /// Minimal HTTP server answering `replies` requests in order, then closing
    pub struct FakeApi {
        pub base_url: String,
        requests: Receiver<String>,
        handle: JoinHandle<()>,
    }

    impl FakeApi {
        pub fn serve(replies: Vec<&'static str>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();
            let (tx, requests) = mpsc::channel();

            let handle = thread::spawn(move || {
                for reply in replies {
                    let (stream, _) = match listener.accept() {
                        Ok(conn) => conn,
                        Err(_) => return,
                    };
                    let mut reader = BufReader::new(stream);

                    let mut content_length = 0;
                    let mut request_line = String::new();
                    reader.read_line(&mut request_line).unwrap();
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).unwrap();
                        if line.trim().is_empty() {
                            break;
                        }
                        if let Some((name, value)) = line.split_once(':') {
                            if name.eq_ignore_ascii_case("content-length") {
                                content_length = value.trim().parse().unwrap();
                            }
                        }
                    }

                    let mut body = vec![0; content_length];
                    reader.read_exact(&mut body).unwrap();
                    tx.send(format!("{}{}", request_line, String::from_utf8_lossy(&body)))
                        .ok();

                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        reply.len(),
                        reply
                    );
                    let mut stream = reader.into_inner();
                    stream.write_all(response.as_bytes()).unwrap();
                    stream.flush().unwrap();
                }
            });

            Self {
                base_url: format!("http://127.0.0.1:{}/api/v1", port),
                requests,
                handle,
            }
        }

        /// Wait for the server to finish and return what it received
        pub fn finish(self) -> Vec<String> {
            self.handle.join().unwrap();
            self.requests.try_iter().collect()
        }
    }

    pub fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }
}

mod cli_tests {
    use super::support::Sandbox;
    use predicates::prelude::*;

    #[test]
    fn help_displays() {
        Sandbox::new()
            .auditdog()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("explain a shell command"))
            .stdout(predicate::str::contains("--clear-cache"));
    }

    #[test]
    fn version_displays() {
        Sandbox::new()
            .auditdog()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("auditdog"));
    }

    #[test]
    fn missing_command_fails() {
        Sandbox::new()
            .auditdog()
            .assert()
            .failure()
            .stderr(predicate::str::contains("No command given"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn completions_generate() {
        Sandbox::new()
            .auditdog()
            .args(["--completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("auditdog"));
    }

    #[test]
    fn clear_cache_without_command() {
        Sandbox::new()
            .auditdog()
            .arg("--clear-cache")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let sandbox = Sandbox::new();
        let path = sandbox.path("broken.toml");
        std::fs::write(&path, "[api]\nmax_attempts = \"many\"\n").unwrap();

        sandbox
            .auditdog()
            .arg("--config")
            .arg(&path)
            .arg("ls")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn init_config_writes_defaults() {
        let sandbox = Sandbox::new();

        sandbox.auditdog().arg("--init-config").assert().success();

        let written = super::support::read(&sandbox.config_path());
        assert!(written.contains("[api]"));
        assert!(written.contains("max_attempts = 5"));
    }
}

mod session_tests {
    use super::support::{read, FakeApi, Sandbox, HIGH_RISK_BODY};
    use predicates::prelude::*;

    #[test]
    fn unreachable_api_exits_one_and_offers_run_anyway() {
        Sandbox::new()
            .auditdog()
            .args(["--api-url", "http://127.0.0.1:1/api/v1", "--max-attempts", "1"])
            .args(["echo", "$((6*7))-ran"])
            .write_stdin("n\n")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Could not explain"))
            .stdout(predicate::str::contains("Run the command anyway?"))
            .stdout(predicate::str::contains("42-ran").not());
    }

    #[test]
    fn run_anyway_executes_but_still_fails() {
        Sandbox::new()
            .auditdog()
            .args(["--api-url", "http://127.0.0.1:1/api/v1", "--max-attempts", "1"])
            .args(["echo", "$((6*7))-ran"])
            .write_stdin("y\n")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("42-ran"));
    }

    #[test]
    fn explained_then_declined() {
        let sandbox = Sandbox::new();
        let api = FakeApi::serve(vec![HIGH_RISK_BODY]);

        sandbox
            .auditdog()
            .args(["--api-url", &api.base_url])
            .args(["echo", "$((6*7))-ran"])
            .write_stdin("n\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("HIGH RISK"))
            .stdout(predicate::str::contains("Prints its arguments"))
            .stdout(predicate::str::contains("42-ran").not());

        let requests = api.finish();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /api/v1/commands/explain"));
        assert!(requests[0].contains(r#""command":"echo""#));
        assert!(requests[0].contains(r#""arguments":"$((6*7))-ran""#));
    }

    #[test]
    fn explained_then_run_with_default_answer() {
        let sandbox = Sandbox::new();
        let api = FakeApi::serve(vec![HIGH_RISK_BODY]);

        sandbox
            .auditdog()
            .args(["--api-url", &api.base_url])
            .args(["echo", "$((6*7))-ran"])
            .write_stdin("\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("42-ran"));

        api.finish();
        let audit = read(&sandbox.path("state/auditdog/audit.log"));
        assert!(audit.contains("command.explained"));
        assert!(audit.contains("command.executed"));
    }

    #[test]
    fn repeat_is_served_from_cache() {
        let sandbox = Sandbox::new();
        let api = FakeApi::serve(vec![HIGH_RISK_BODY]);
        let base_url = api.base_url.clone();

        sandbox
            .auditdog()
            .args(["--api-url", &base_url, "echo", "hi"])
            .write_stdin("n\n")
            .assert()
            .success();
        api.finish();

        // Server is gone; only the cache can answer
        sandbox
            .auditdog()
            .args(["--api-url", &base_url, "--max-attempts", "1", "echo", "  hi "])
            .write_stdin("n\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("(cached)"))
            .stdout(predicate::str::contains("HIGH RISK"));

        let cache = read(&sandbox.path("cache/auditdog/explanations.json"));
        assert!(cache.contains(r#""echo hi""#));
    }

    #[test]
    fn no_cache_always_asks_the_api() {
        let sandbox = Sandbox::new();
        let api = FakeApi::serve(vec![HIGH_RISK_BODY, HIGH_RISK_BODY]);

        for _ in 0..2 {
            sandbox
                .auditdog()
                .args(["--no-cache", "--api-url", &api.base_url, "echo", "hi"])
                .write_stdin("n\n")
                .assert()
                .success()
                .stdout(predicate::str::contains("(cached)").not());
        }

        assert_eq!(api.finish().len(), 2);
        assert!(!sandbox.path("cache/auditdog/explanations.json").exists());
    }

    #[test]
    fn yes_flag_runs_without_prompt() {
        let sandbox = Sandbox::new();
        let api = FakeApi::serve(vec![HIGH_RISK_BODY]);

        sandbox
            .auditdog()
            .args(["-y", "--api-url", &api.base_url, "echo", "$((6*7))-ran"])
            .assert()
            .success()
            .stdout(predicate::str::contains("42-ran"))
            .stdout(predicate::str::contains("Run this command?").not());

        api.finish();
    }
}

mod interrupt_tests {
    use super::support::{kill, wait_for, Sandbox, SilentApi};
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    #[test]
    fn ctrl_c_waits_for_a_running_command() {
        let sandbox = Sandbox::new();
        let started = sandbox.path("started");
        let finished = sandbox.path("finished");
        let script = sandbox.path("stubborn.sh");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\ntrap '' INT\ntouch {}\nsleep 1\ntouch {}\n",
                started.display(),
                finished.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let script_arg = script.display().to_string();
        sandbox.seed_cache(
            &script_arg,
            r#"{"command": "stubborn.sh", "summary": "Sleeps", "risk_level": "low", "sections": []}"#,
        );

        let child = sandbox.spawn_auditdog(&["-y", "--max-attempts", "1", &script_arg]);
        wait_for(&started);
        kill("-INT", -(child.id() as i64));

        let output = child.wait_with_output().unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        assert_eq!(output.status.code(), Some(0), "stderr: {stderr}");
        assert!(finished.exists(), "auditdog exited before the command finished");
        assert!(stdout.contains("(cached)"));
        assert!(!stderr.contains("Interrupted"));
    }

    #[test]
    fn ctrl_c_during_request_exits_130_and_leaves_no_scratch_files() {
        let sandbox = Sandbox::new();
        let api = SilentApi::serve();

        let child = sandbox.spawn_auditdog(&["--api-url", &api.base_url, "echo", "hi"]);
        api.accepted
            .recv_timeout(Duration::from_secs(20))
            .expect("auditdog never connected");
        std::thread::sleep(Duration::from_millis(300));
        kill("-INT", child.id() as i64);

        let output = child.wait_with_output().unwrap();
        let stderr = String::from_utf8_lossy(&output.stderr);

        assert_eq!(output.status.code(), Some(130), "stderr: {stderr}");
        assert!(stderr.contains("Interrupted"));

        let cache_dir = sandbox.path("cache/auditdog");
        let leftovers: Vec<_> = std::fs::read_dir(&cache_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .filter(|name| name != "explanations.json")
                    .collect()
            })
            .unwrap_or_default();
        assert!(leftovers.is_empty(), "scratch files left: {leftovers:?}");
    }
}
