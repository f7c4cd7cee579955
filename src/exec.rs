//! Shell command execution with streamed, captured output.
use anyhow::{Context, Result, anyhow};
use std::io::{self, BufRead as _, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::platform::Platform;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Everything the command wrote to stdout.
    pub stdout: String,
    /// Everything the command wrote to stderr.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

/// A shell command to run with streamed output.
#[derive(Debug, Clone)]
pub struct ShellCommand<'a> {
    /// Command string passed to the platform shell.
    pub command: &'a str,
    /// Working directory.
    pub cwd: &'a Path,
    /// Environment overrides layered over the inherited environment.
    pub env: &'a [(String, String)],
}

/// Run a command through the platform shell, echoing its stdout and stderr
/// to the terminal line by line while capturing both.
///
/// A non-zero exit is **not** an error here; callers inspect
/// [`ExecResult::success`].
///
/// # Errors
///
/// Returns an error if the shell cannot be spawned or an output stream
/// cannot be read.
pub fn run_shell_streaming(platform: &Platform, cmd: &ShellCommand<'_>) -> Result<ExecResult> {
    run_streaming(platform, cmd, io::stdout(), io::stderr())
}

/// Like [`run_shell_streaming`] with explicit echo destinations.
///
/// Both pipes are drained by two scoped reader threads so a child that
/// fills one pipe while the parent is blocked on the other cannot deadlock.
/// Per-stream line order is preserved; interleaving between the two streams
/// is not.
///
/// # Errors
///
/// Returns an error if the shell cannot be spawned or an output stream
/// cannot be read.
pub fn run_streaming<O, E>(
    platform: &Platform,
    cmd: &ShellCommand<'_>,
    stdout_echo: O,
    stderr_echo: E,
) -> Result<ExecResult>
where
    O: Write + Send,
    E: Write + Send,
{
    let (shell, flag) = platform.shell();
    let mut child = Command::new(shell)
        .arg(flag)
        .arg(cmd.command)
        .current_dir(cmd.cwd)
        .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute: {}", cmd.command))?;

    let stdout_pipe = child.stdout.take().context("stdout was not captured")?;
    let stderr_pipe = child.stderr.take().context("stderr was not captured")?;

    let (stdout, stderr) = std::thread::scope(|s| {
        let out = s.spawn(move || drain(stdout_pipe, stdout_echo));
        let err = s.spawn(move || drain(stderr_pipe, stderr_echo));
        (
            out.join().map_err(|_| anyhow!("stdout reader panicked")),
            err.join().map_err(|_| anyhow!("stderr reader panicked")),
        )
    });
    let drained = stdout
        .and_then(|r| r.context("reading stdout"))
        .and_then(|out| {
            stderr
                .and_then(|r| r.context("reading stderr"))
                .map(|err| (out, err))
        });
    let (stdout, stderr) = reap_on_error(&mut child, drained)?;

    let status = child
        .wait()
        .with_context(|| format!("waiting for: {}", cmd.command))?;

    Ok(ExecResult {
        stdout,
        stderr,
        success: status.success(),
        code: status.code(),
    })
}

/// Pass `result` through; on error kill and reap `child` first.
fn reap_on_error<T>(child: &mut Child, result: Result<T>) -> Result<T> {
    if result.is_err() {
        child.kill().ok();
        child.wait().ok();
    }
    result
}

/// Copy `pipe` line by line into `echo`, returning everything read.
///
/// Echo failures (e.g. a closed terminal) are ignored so they never hide
/// the captured output.
fn drain<R: Read, W: Write>(pipe: R, mut echo: W) -> io::Result<String> {
    let mut reader = BufReader::new(pipe);
    let mut captured = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        echo.write_all(&line).ok();
        echo.flush().ok();
        captured.push_str(&String::from_utf8_lossy(&line));
    }
    Ok(captured)
}
