//! Test driver for the clp integration tests.
//!
//! Spawns one of the clp driver binaries with:
//! - stdin: a pipe the test can feed with `feed()`
//! - stdout, stderr: pipes drained by background threads and captured
//!   for assertions

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

/// Path of a driver binary built into the workspace target directory.
pub fn binary(name: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{manifest_dir}/../target/debug/{name}")
}

/// A running driver process.
pub struct TestSession {
    child: Child,
    stdin: Option<ChildStdin>,
    /// Captured stdout, populated by background thread.
    stdout_capture: Arc<Mutex<Vec<u8>>>,
    /// Captured stderr, populated by background thread.
    stderr_capture: Arc<Mutex<Vec<u8>>>,
    _stdout_thread: thread::JoinHandle<()>,
    _stderr_thread: thread::JoinHandle<()>,
}

fn drain<R: Read + Send + 'static>(
    mut pipe: R,
    capture: Arc<Mutex<Vec<u8>>>,
    what: &'static str,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    capture.lock().unwrap().extend_from_slice(&buf[..n]);
                }
                Err(e) => {
                    eprintln!("{what} drain error: {e}");
                    break;
                }
            }
        }
    })
}

impl TestSession {
    /// Spawn `binary` with the given arguments and extra environment.
    pub fn spawn(binary: &str, args: &[&str], env: &[(&str, &str)]) -> std::io::Result<TestSession> {
        let mut cmd = Command::new(binary);
        cmd.args(args);
        cmd.env_remove("RUST_LOG");
        for (k, v) in env {
            cmd.env(k, v);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let stdin = child.stdin.take();

        let stdout_capture = Arc::new(Mutex::new(Vec::new()));
        let stdout_pipe = child.stdout.take().unwrap();
        let stdout_thread = drain(stdout_pipe, Arc::clone(&stdout_capture), "stdout");

        let stderr_capture = Arc::new(Mutex::new(Vec::new()));
        let stderr_pipe = child.stderr.take().unwrap();
        let stderr_thread = drain(stderr_pipe, Arc::clone(&stderr_capture), "stderr");

        Ok(TestSession {
            child,
            stdin,
            stdout_capture,
            stderr_capture,
            _stdout_thread: stdout_thread,
            _stderr_thread: stderr_thread,
        })
    }

    /// Write `text` to the child's stdin.
    pub fn feed(&mut self, text: &str) {
        if let Some(stdin) = self.stdin.as_mut() {
            stdin
                .write_all(text.as_bytes())
                .expect("failed to write to child stdin");
            stdin.flush().expect("failed to flush child stdin");
        }
    }

    /// Close stdin, wait for the child to exit and assert the exit code.
    pub fn wait_exit(mut self, expected_code: i32) -> SessionOutput {
        drop(self.stdin.take());

        let status = self.child.wait().expect("failed to wait for child");
        let code = status.code().unwrap_or(-1);

        let _ = self._stdout_thread.join();
        let _ = self._stderr_thread.join();

        let stdout = String::from_utf8_lossy(&self.stdout_capture.lock().unwrap()).to_string();
        let stderr = String::from_utf8_lossy(&self.stderr_capture.lock().unwrap()).to_string();

        assert_eq!(
            code, expected_code,
            "expected exit code {expected_code}, got {code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );

        SessionOutput { stdout, stderr }
    }
}

/// Run `binary` to completion with no input.
pub fn run(binary: &str, args: &[&str], expected_code: i32) -> SessionOutput {
    TestSession::spawn(binary, args, &[])
        .unwrap_or_else(|e| panic!("failed to spawn {binary}: {e}"))
        .wait_exit(expected_code)
}

/// Output captured from a completed session.
pub struct SessionOutput {
    pub stdout: String,
    pub stderr: String,
}
