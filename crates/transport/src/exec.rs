//! Process execution with concurrent output draining.
//!
//! A child writing more than a pipe buffer's worth to one stream blocks
//! until somebody reads it. Each execution therefore reads stdout and
//! stderr on their own threads (and feeds stdin on a third when input is
//! given), and only waits on the process after both drains have reported
//! back.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::command::{CommandSpec, ExecutionResult, ExitFailure, Input};
use crate::error::{Error, Result};

/// How often the join loop checks the cancel token
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Run `spec` on this machine and capture everything it writes.
///
/// A non-zero exit is not an error here: it is reported through
/// [`ExecutionResult::failure`]. Only a failure to start the process (or to
/// open its input file) returns `Err`.
pub fn execute(spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecutionResult> {
    if cancel.is_cancelled() {
        log::warn!("Not starting cancelled command: {spec}");
        return Ok(ExecutionResult::cancelled());
    }

    let input = open_input(spec)?;

    log::info!("RUN: {spec}");

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| Error::Spawn {
        command: spec.to_string(),
        source,
    })?;

    let (tx, rx) = mpsc::channel();
    spawn_drain(Stream::Stdout, child.stdout.take(), tx.clone());
    spawn_drain(Stream::Stderr, child.stderr.take(), tx);
    let feeder = match (input, child.stdin.take()) {
        (Some(reader), Some(stdin)) => Some(spawn_feeder(reader, stdin)),
        _ => None,
    };

    let mut stdout = None;
    let mut stderr = None;
    let mut killed = false;

    while stdout.is_none() || stderr.is_none() {
        if !killed && cancel.is_cancelled() {
            log::warn!("Cancelling: {spec}");
            kill(&mut child);
            killed = true;
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok((Stream::Stdout, buf)) => stdout = Some(buf),
            Ok((Stream::Stderr, buf)) => stderr = Some(buf),
            Err(RecvTimeoutError::Timeout) => {}
            // a drain thread died without reporting; nothing more will arrive
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let status = child.wait()?;

    if let Some(handle) = feeder {
        if handle.join().is_err() {
            log::debug!("stdin feeder panicked: {spec}");
        }
    }

    let failure = match classify(status) {
        Some(_) if killed => Some(ExitFailure::Cancelled),
        other => other,
    };

    Ok(ExecutionResult {
        stdout: stdout.unwrap_or_default(),
        stderr: stderr.unwrap_or_default(),
        failure,
    })
}

fn open_input(spec: &CommandSpec) -> Result<Option<Box<dyn Read + Send>>> {
    let reader: Box<dyn Read + Send> = match &spec.input {
        None => return Ok(None),
        Some(Input::Bytes(bytes)) => Box::new(io::Cursor::new(bytes.clone())),
        Some(Input::File(path)) => Box::new(File::open(path).map_err(|source| Error::Spawn {
            command: format!("{spec} < {}", path.display()),
            source,
        })?),
    };
    Ok(Some(reader))
}

fn spawn_drain<R>(stream: Stream, pipe: Option<R>, tx: Sender<(Stream, Vec<u8>)>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                log::debug!("Error draining {stream:?}: {e}");
            }
        }
        // the receiver only goes away if the caller panicked
        let _ = tx.send((stream, buf));
    });
}

fn spawn_feeder(mut reader: Box<dyn Read + Send>, mut stdin: ChildStdin) -> JoinHandle<()> {
    thread::spawn(move || {
        match io::copy(&mut reader, &mut stdin) {
            Ok(_) => {}
            // child exited or closed stdin early
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Err(e) => log::warn!("Error writing to stdin: {e}"),
        }
        let _ = stdin.flush();
    })
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        // already exited
        log::debug!("kill failed: {e}");
    }
}

fn classify(status: ExitStatus) -> Option<ExitFailure> {
    if status.success() {
        return None;
    }
    if let Some(code) = status.code() {
        return Some(ExitFailure::Code(code));
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(ExitFailure::Signal(signal));
        }
    }
    Some(ExitFailure::Code(-1))
}
