use std::ffi::OsString;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;
use tokio::sync::watch;

use crate::core::errors::{DecryptPdfError, Result};
use crate::core::traits::interrupt::Interrupt;

/// How a supervised subprocess ended.
#[derive(Debug)]
pub enum Termination {
    /// The process ran to completion. `code` is `None` when it was killed by a signal.
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The deadline passed; the process was killed.
    TimedOut,
    /// The executable could not be started (absent or not executable).
    NotFound(std::io::Error),
}

/// Runs external tools as scoped subprocesses with a deadline.
///
/// Each `run` blocks the calling thread until the child exits, the timeout
/// elapses or an interrupt arrives. The child is spawned with `kill_on_drop`,
/// so every path that abandons the wait (timeout, interrupt, error) kills it.
pub struct ProcessRunner {
    rt: Runtime,
    cancel: Arc<watch::Sender<bool>>,
}

impl ProcessRunner {
    /// Create a runner and start listening for Ctrl-C.
    ///
    /// Once the listener is installed an interrupt no longer kills the
    /// process outright; it cancels the in-flight subprocess instead and
    /// every later `run` returns `DecryptPdfError::Cancelled`.
    pub fn new() -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let cancel = Arc::new(watch::Sender::new(false));
        listen_for_interrupt(Arc::clone(&cancel))?;

        Ok(Self { rt, cancel })
    }

    /// Request cancellation, as an interrupt would.
    #[cfg(test)]
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Run `program` with `args`, feeding `stdin` if given, for at most `timeout`.
    pub fn run(
        &self,
        program: &Path,
        args: &[OsString],
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<Termination> {
        if self.is_cancelled() {
            return Err(DecryptPdfError::Cancelled);
        }

        self.rt.block_on(supervise(
            program,
            args,
            stdin,
            timeout,
            self.cancel.subscribe(),
        ))
    }
}

impl Interrupt for ProcessRunner {
    fn is_interrupted(&self) -> bool {
        self.is_cancelled()
    }
}

/// Wait for Ctrl-C on a dedicated thread, so an interrupt is recorded even
/// while no subprocess is running. Returns once the handler is installed.
fn listen_for_interrupt(cancel: Arc<watch::Sender<bool>>) -> Result<()> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<io::Result<()>>(1);

    thread::Builder::new()
        .name("decrypt-pdf-interrupt".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            rt.block_on(async move {
                let mut interrupts = match interrupt_signal() {
                    Ok(signal) => signal,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                if interrupts.recv().await.is_some() {
                    cancel.send_replace(true);
                }
            });
        })?;

    ready_rx
        .recv()
        .map_err(|_| io::Error::other("interrupt listener exited early"))??;
    Ok(())
}

#[cfg(unix)]
fn interrupt_signal() -> io::Result<tokio::signal::unix::Signal> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn interrupt_signal() -> io::Result<tokio::signal::windows::CtrlC> {
    tokio::signal::windows::ctrl_c()
}

async fn supervise(
    program: &Path,
    args: &[OsString],
    stdin: Option<&[u8]>,
    timeout: Duration,
    mut cancel: watch::Receiver<bool>,
) -> Result<Termination> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            return Ok(Termination::NotFound(e));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(data) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        // The child may exit before reading; its status tells the story.
        let _ = pipe.write_all(data).await;
        drop(pipe);
    }

    tokio::select! {
        waited = tokio::time::timeout(timeout, child.wait_with_output()) => match waited {
            Ok(output) => {
                let output = output?;
                Ok(Termination::Exited {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            Err(_) => Ok(Termination::TimedOut),
        },
        Ok(_) = cancel.wait_for(|cancelled| *cancelled) => Err(DecryptPdfError::Cancelled),
    }
}
