use super::{decode_output, ArgumentMode, Converter};
use crate::error::ImportError;
use crate::request::ConversionRequest;
use config::constants::CONVERTER_TIMEOUT_SECS;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use hkx_geometry::GeometryRecord;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDERR_TAIL_LINES: usize = 5;

/// Converter backed by the external executable.
///
/// Each call spawns one process, reads its whole stdout and waits for it to
/// exit. On Unix the converter leads its own process group; a run that
/// outlives the timeout is killed together with everything it started.
///
/// # Examples
/// ```
/// use hkx_import::converter::{ArgumentMode, ProcessConverter};
/// use hkx_import::ConversionRequest;
///
/// let converter = ProcessConverter::new("/opt/hkx/BlenderConverter");
/// let args = converter.arguments(&ConversionRequest::new("/assets/rock.hksc"));
/// assert_eq!(args, ["/assets/rock.hksc", "250.0", "-5000.0", "0.0", "-4000.0"]);
///
/// let legacy = converter.with_mode(ArgumentMode::PathOnly);
/// assert_eq!(legacy.arguments(&ConversionRequest::new("/assets/rock.hksc")).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ProcessConverter {
    executable: PathBuf,
    timeout: Duration,
    mode: ArgumentMode,
}

impl ProcessConverter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: Duration::from_secs(CONVERTER_TIMEOUT_SECS),
            mode: ArgumentMode::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: ArgumentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Positional arguments for one request. The source path is made
    /// absolute; numbers always carry a decimal point.
    pub fn arguments(&self, request: &ConversionRequest) -> Vec<OsString> {
        let source = std::path::absolute(&request.source_path)
            .unwrap_or_else(|_| request.source_path.clone());

        let mut args = vec![source.into_os_string()];
        if self.mode == ArgumentMode::WithPlacement {
            args.push(format_number(request.tiling_factor).into());
            args.extend(request.offset.iter().map(|&c| OsString::from(format_number(c))));
        }
        args
    }

    fn command(&self, request: &ConversionRequest) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(self.arguments(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    }

    /// Runs the converter and returns its stdout.
    ///
    /// Both pipe readers are joined before this returns, whatever the
    /// outcome.
    fn run(&self, request: &ConversionRequest) -> Result<Vec<u8>, ImportError> {
        let path = &request.source_path;
        let deadline = Instant::now() + self.timeout;

        log::debug!("launching {} for {}", self.executable.display(), path.display());
        let mut child = self
            .command(request)
            .spawn()
            .map_err(|source| ImportError::ConverterLaunch {
                path: path.clone(),
                converter: self.executable.clone(),
                source,
            })?;

        let readers = PipeReaders::start(&mut child);
        let waited = self.wait_for_output(&mut child, &readers, deadline, path);

        // A failed run, or a clean exit that left children holding stderr,
        // takes the whole process group down so the readers can finish.
        if waited.is_err() || !readers.is_drained() {
            terminate(&mut child);
        }
        let diagnostics = readers.finish();
        let (status, output) = waited?;

        if !status.success() {
            let mut message = format!("converter exited with {status}");
            if !diagnostics.is_empty() {
                message.push_str(": ");
                message.push_str(&diagnostics);
            }
            return Err(ImportError::output(path, message));
        }
        if !diagnostics.is_empty() {
            log::debug!("converter stderr for {}: {diagnostics}", path.display());
        }

        Ok(output)
    }

    /// Waits for stdout to close and the process to exit, both within
    /// `deadline`.
    fn wait_for_output(
        &self,
        child: &mut Child,
        readers: &PipeReaders,
        deadline: Instant,
        path: &Path,
    ) -> Result<(ExitStatus, Vec<u8>), ImportError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let output = match readers.stdout.recv_timeout(remaining) {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                let message = format!("failed to read converter output: {err}");
                return Err(ImportError::output(path, message));
            }
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(path)),
            Err(RecvTimeoutError::Disconnected) => {
                let message = "converter output reader stopped unexpectedly";
                return Err(ImportError::output(path, message));
            }
        };

        match wait_until(child, deadline) {
            Ok(Some(status)) => Ok((status, output)),
            Ok(None) => Err(self.timed_out(path)),
            Err(err) => {
                let message = format!("failed to wait for converter: {err}");
                Err(ImportError::output(path, message))
            }
        }
    }

    fn timed_out(&self, path: &Path) -> ImportError {
        ImportError::ConverterTimeout {
            path: path.to_path_buf(),
            timeout: self.timeout,
        }
    }
}

impl Converter for ProcessConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<Vec<GeometryRecord>, ImportError> {
        let started = Instant::now();
        let stdout = self.run(request)?;
        let records = decode_output(&request.source_path, &stdout)?;
        log::info!(
            "converted {} into {} records in {:.2?}",
            request.source_path.display(),
            records.len(),
            started.elapsed()
        );
        Ok(records)
    }
}

/// Threads draining the converter's stdout and stderr, so a chatty stderr
/// cannot block the converter while stdout is being read.
struct PipeReaders {
    stdout: Receiver<io::Result<Vec<u8>>>,
    stdout_thread: JoinHandle<()>,
    stderr_thread: JoinHandle<io::Result<Vec<u8>>>,
}

impl PipeReaders {
    fn start(child: &mut Child) -> Self {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout_tx, stdout_rx) = crossbeam_channel::bounded(1);
        let stdout_thread = thread::spawn(move || {
            let _ = stdout_tx.send(read_all(stdout));
        });
        let stderr_thread = thread::spawn(move || read_all(stderr));

        Self {
            stdout: stdout_rx,
            stdout_thread,
            stderr_thread,
        }
    }

    /// False while something still holds stderr open. Stdout has already
    /// been read to the end whenever this is asked.
    fn is_drained(&self) -> bool {
        self.stderr_thread.is_finished()
    }

    /// Joins both readers and returns the stderr tail. Blocks until every
    /// process holding the pipes is gone.
    fn finish(self) -> String {
        let _ = self.stdout_thread.join();
        self.stderr_thread
            .join()
            .ok()
            .and_then(Result::ok)
            .map(|bytes| stderr_tail(&bytes))
            .unwrap_or_default()
    }
}

/// Debug formatting keeps the decimal point (`250.0`, not `250`).
fn format_number(value: f64) -> String {
    format!("{value:?}")
}

fn read_all<R: Read>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// Polls for exit until `deadline`; `Ok(None)` means still running.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Kills the converter and everything left in its process group, then reaps it.
fn terminate(child: &mut Child) {
    kill_process_group(child);
    if let Err(err) = child.kill() {
        log::debug!("converter already exited: {err}");
    }
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    // The converter was spawned with `process_group(0)`, so its pid is the group id.
    let Ok(group) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: killpg only sends a signal and touches no memory of ours.
    if unsafe { libc::killpg(group, libc::SIGKILL) } != 0 {
        log::debug!("converter process group {group}: {}", io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Last few non-empty stderr lines, joined on one line.
fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_decimal_point() {
        assert_eq!(format_number(250.0), "250.0");
        assert_eq!(format_number(-5000.0), "-5000.0");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn relative_source_is_made_absolute() {
        let converter = ProcessConverter::new("conv").with_mode(ArgumentMode::PathOnly);
        let args = converter.arguments(&ConversionRequest::new("rock.hksc"));
        assert!(Path::new(&args[0]).is_absolute());
        assert!(Path::new(&args[0]).ends_with("rock.hksc"));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let text = b"one\n\ntwo\nthree\nfour\nfive\nsix\n";
        assert_eq!(stderr_tail(text), "two | three | four | five | six");
        assert_eq!(stderr_tail(b""), "");
    }

    #[test]
    fn missing_executable_is_launch_error() {
        let converter = ProcessConverter::new("/definitely/not/a/converter");
        let err = converter.convert(&ConversionRequest::new("rock.hksc")).unwrap_err();
        assert!(matches!(err, ImportError::ConverterLaunch { .. }));
    }
}
