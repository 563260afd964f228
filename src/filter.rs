use std::io::{self, BufWriter, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Failure to run an external filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("empty filter command")]
    EmptyCommand,
    #[error("failed to launch {program:?}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("filter {program:?} I/O error: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("filter {program:?} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// A filter command line: program followed by its arguments.
///
/// Built by splitting on whitespace; there is no quoting, so an argument can
/// never contain a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    program: String,
    args: Vec<String>,
    command_line: String,
}

impl FilterSpec {
    pub fn parse(command_line: &str) -> Result<Self, FilterError> {
        let mut tokens = command_line.split_ascii_whitespace().map(str::to_string);
        let program = tokens.next().ok_or(FilterError::EmptyCommand)?;
        Ok(Self {
            program,
            args: tokens.collect(),
            command_line: command_line.trim().to_string(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The command as the user typed it (trimmed); also the sink name.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Kill the filter and fail if it has not exited after this long.
    pub timeout: Option<Duration>,
}

/// Everything a filter produced.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub status: ExitStatus,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Kills and reaps the child on every exit path.
struct ChildGuard(Child);

impl ChildGuard {
    /// Kill the child and everything it spawned, then reap it.
    ///
    /// Grandchildren inherit the output pipes, so the drainers only see EOF
    /// once the whole process group is gone.
    fn kill(&mut self) {
        #[cfg(unix)]
        {
            if let Ok(pgid) = libc::pid_t::try_from(self.0.id()) {
                // SAFETY: plain syscall; the group was created for this child
                unsafe {
                    libc::killpg(pgid, libc::SIGKILL);
                }
            }
        }
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            self.kill();
        }
    }
}

/// Run `spec` with `lines` on its standard input.
///
/// Input is written (one line plus `\n` each) while stdout and stderr are
/// drained on separate threads, so a filter that produces output before
/// reading all of its input cannot deadlock. A filter that exits without
/// consuming all input is not an error.
pub fn run_filter<S: AsRef<str> + Sync>(
    spec: &FilterSpec,
    lines: &[S],
    options: FilterOptions,
) -> Result<ProcessResult, FilterError> {
    log::debug!("spawning filter {:?} with {} input lines", spec.command_line, lines.len());
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let child = command
        .spawn()
        .map_err(|source| FilterError::Launch {
            program: spec.program.clone(),
            source,
        })?;
    let mut guard = ChildGuard(child);
    let io_err = |source: io::Error| FilterError::Io {
        program: spec.program.clone(),
        source,
    };

    let stdin = guard.0.stdin.take().ok_or_else(|| io_err(io::Error::other("stdin not piped")))?;
    let stdout = guard.0.stdout.take().ok_or_else(|| io_err(io::Error::other("stdout not piped")))?;
    let stderr = guard.0.stderr.take().ok_or_else(|| io_err(io::Error::other("stderr not piped")))?;

    let (status, written, out, err) = thread::scope(|scope| {
        let writer = scope.spawn(|| write_input(stdin, lines));
        let out_reader = scope.spawn(|| drain(stdout));
        let err_reader = scope.spawn(|| drain(stderr));

        let status = wait(&mut guard.0, options.timeout);
        if !matches!(status, Ok(Some(_))) {
            // unblock the I/O threads before joining them
            guard.kill();
        }
        (status, join(writer), join(out_reader), join(err_reader))
    });

    let status = match status.map_err(io_err)? {
        Some(status) => status,
        None => {
            return Err(FilterError::Timeout {
                program: spec.program.clone(),
                timeout: options.timeout.unwrap_or_default(),
            })
        }
    };
    written.map_err(io_err)?;
    let stdout = out.map_err(io_err)?;
    let stderr = err.map_err(io_err)?;
    log::debug!(
        "filter {:?} exited with {status}: {} stdout, {} stderr lines",
        spec.command_line,
        stdout.len(),
        stderr.len()
    );

    Ok(ProcessResult {
        stdout,
        stderr,
        status,
    })
}

fn write_input<S: AsRef<str>>(stdin: ChildStdin, lines: &[S]) -> io::Result<()> {
    let mut writer = BufWriter::new(stdin);
    let result = lines
        .iter()
        .try_for_each(|line| {
            writer.write_all(line.as_ref().as_bytes())?;
            writer.write_all(b"\n")
        })
        .and_then(|()| writer.flush());
    // dropping the writer closes stdin
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            log::debug!("filter closed its input early");
            Ok(())
        }
        other => other,
    }
}

/// Read a pipe to EOF. Output that is not UTF-8 is an error, never
/// silently replaced.
fn drain<R: Read>(mut pipe: R) -> io::Result<Vec<String>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    let text = String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("filter I/O thread panicked")))
}

/// `Ok(None)` means the timeout expired first.
fn wait(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_splits_on_whitespace() {
        let spec = FilterSpec::parse("  sort  -r\t-u ").unwrap();
        assert_eq!(spec.program(), "sort");
        assert_eq!(spec.args(), ["-r".to_string(), "-u".to_string()]);
        assert_eq!(spec.command_line(), "sort  -r\t-u");
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(FilterSpec::parse("   "), Err(FilterError::EmptyCommand)));
    }

    #[test]
    fn missing_program_fails_to_launch() {
        let spec = FilterSpec::parse("linetools-no-such-program-xyz").unwrap();
        let err = run_filter(&spec, &["a"], FilterOptions::default()).unwrap_err();
        assert!(matches!(err, FilterError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn sort_round_trip() {
        let spec = FilterSpec::parse("sort").unwrap();
        let res = run_filter(&spec, &["c", "a", "b"], FilterOptions::default()).unwrap();
        assert!(res.success());
        assert_eq!(res.stdout, vec!["a", "b", "c"]);
        assert!(res.stderr.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn failing_filter_reports_status_and_stderr() {
        let spec = FilterSpec::parse("ls /linetools-no-such-dir").unwrap();
        let res = run_filter(&spec, &[] as &[&str], FilterOptions::default()).unwrap();
        assert!(!res.success());
        assert!(res.stdout.is_empty());
        assert!(!res.stderr.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn large_input_and_output_do_not_deadlock() {
        let lines: Vec<String> = (0..200_000).map(|i| format!("line number {i}")).collect();
        let spec = FilterSpec::parse("cat").unwrap();
        let res = run_filter(&spec, &lines, FilterOptions::default()).unwrap();
        assert!(res.success());
        assert_eq!(res.stdout.len(), lines.len());
        assert_eq!(res.stdout.last(), lines.last());
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_is_not_an_error() {
        let lines: Vec<String> = (0..100_000).map(|i| i.to_string()).collect();
        let spec = FilterSpec::parse("head -n 1").unwrap();
        let res = run_filter(&spec, &lines, FilterOptions::default()).unwrap();
        assert_eq!(res.stdout, vec!["0"]);
    }

    #[cfg(unix)]
    #[test]
    fn hung_filter_times_out() {
        let spec = FilterSpec::parse("sleep 5").unwrap();
        let options = FilterOptions {
            timeout: Some(Duration::from_millis(100)),
        };
        let started = Instant::now();
        let err = run_filter(&spec, &["x"], options).unwrap_err();
        assert!(matches!(err, FilterError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_also_kills_grandchildren() {
        // sh waits on a sleep that holds the output pipes open
        let spec = FilterSpec::parse("sh -c sleep${IFS}4;true").unwrap();
        let options = FilterOptions {
            timeout: Some(Duration::from_millis(100)),
        };
        let started = Instant::now();
        let err = run_filter(&spec, &["x"], options).unwrap_err();
        assert!(matches!(err, FilterError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_output_is_an_error() {
        let spec = FilterSpec::parse(r"printf \377").unwrap();
        let err = run_filter(&spec, &["x"], FilterOptions::default()).unwrap_err();
        match err {
            FilterError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected invalid data, got {other:?}"),
        }
    }
}
