use super::Evaluator;
use crate::core::{Score, TuneError, TuneResult};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

enum RunOutcome {
    Exited { status: ExitStatus, elapsed: Duration },
    TimedOut { elapsed: Duration },
}

/// Runs the tuned executable once per evaluation and times it.
///
/// Output streams are discarded; only wall-clock time from spawn to exit and
/// whether the process could run at all are observed.
#[derive(Debug, Clone)]
pub struct ProcessEvaluator {
    executable: PathBuf,
    fixed_args: Vec<String>,
    timeout: Option<Duration>,
    require_success: bool,
}

impl ProcessEvaluator {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            fixed_args: Vec::new(),
            timeout: None,
            require_success: false,
        }
    }

    /// Arguments placed before the decoded candidate on every invocation.
    pub fn with_fixed_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixed_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Treat a non-zero exit status as a failed evaluation.
    pub fn with_require_success(mut self, require_success: bool) -> Self {
        self.require_success = require_success;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn run(&self, args: &[String]) -> io::Result<RunOutcome> {
        let start = Instant::now();
        let mut child = Command::new(&self.executable)
            .args(&self.fixed_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        match self.timeout {
            None => {
                let status = child.wait()?;
                Ok(RunOutcome::Exited {
                    status,
                    elapsed: start.elapsed(),
                })
            }
            Some(timeout) => self.wait_with_timeout(&mut child, start, timeout),
        }
    }

    /// Poll the child until it exits; kill and reap it once `timeout` has passed.
    fn wait_with_timeout(
        &self,
        child: &mut Child,
        start: Instant,
        timeout: Duration,
    ) -> io::Result<RunOutcome> {
        loop {
            match child.try_wait()? {
                Some(status) => {
                    return Ok(RunOutcome::Exited {
                        status,
                        elapsed: start.elapsed(),
                    });
                }
                None => {
                    let elapsed = start.elapsed();
                    if elapsed >= timeout {
                        // The process may exit between try_wait and kill.
                        let _ = child.kill();
                        let _ = child.wait();
                        return Ok(RunOutcome::TimedOut { elapsed });
                    }
                    std::thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
                }
            }
        }
    }
}

impl Evaluator for ProcessEvaluator {
    fn evaluate(&self, args: &[String]) -> Score {
        match self.run(args) {
            Ok(RunOutcome::Exited { status, elapsed }) => {
                if self.require_success && !status.success() {
                    warn!(?args, %status, "evaluation exited unsuccessfully");
                    return Score::Unusable;
                }
                debug!(?args, seconds = elapsed.as_secs_f64(), "evaluation finished");
                Score::Seconds(elapsed.as_secs_f64())
            }
            Ok(RunOutcome::TimedOut { elapsed }) => {
                warn!(
                    ?args,
                    seconds = elapsed.as_secs_f64(),
                    "evaluation timed out and was killed"
                );
                Score::Unusable
            }
            Err(e) => {
                warn!(?args, error = %e, executable = %self.executable.display(), "evaluation failed to run");
                Score::Unusable
            }
        }
    }

    fn preflight(&self, args: &[String]) -> TuneResult<()> {
        match self.run(args) {
            Ok(RunOutcome::Exited { status, elapsed }) => {
                if !status.success() {
                    warn!(%status, "pre-flight run exited unsuccessfully");
                }
                debug!(seconds = elapsed.as_secs_f64(), "pre-flight run finished");
                Ok(())
            }
            Ok(RunOutcome::TimedOut { elapsed }) => {
                warn!(
                    seconds = elapsed.as_secs_f64(),
                    "pre-flight run timed out; continuing since the executable launched"
                );
                Ok(())
            }
            Err(source) => Err(TuneError::Launch {
                executable: self.executable.clone(),
                source,
            }),
        }
    }
}
