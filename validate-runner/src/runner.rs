// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executing solver runs and aggregating their verdicts.
//!
//! The runner drives the whole pipeline one test at a time: prepare a
//! workspace, run the solver, classify the outcome, update the run
//! statistics, and emit events for the reporter. Execution is strictly
//! sequential; a test's capture files and child handle are released before
//! the next test starts.

use crate::{
    archive::FailedTest,
    classify::{Anomaly, Verdict, classify},
    config::SolverConfig,
    list::{TestCase, TestList},
    reporter::RunEvent,
    stopwatch,
    workspace::TestWorkspace,
};
use chrono::{DateTime, Local};
use std::{
    fs::File,
    process::{Child, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant, SystemTime},
};
use tracing::{debug, warn};

/// How often a child with a configured timeout is polled for exit.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The typed classes of solver exit, per the solver's exit-code contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SolverExit {
    /// Exit code 0: the model loaded and converged.
    Converged,

    /// Exit code 1: the model failed to load.
    LoadFailure,

    /// Exit code 2: the model loaded but failed to converge.
    ConvergenceFailure,

    /// Any exit code outside the contract, including death by signal
    /// (reported as the negated signal number).
    Unrecognized(i32),

    /// The solver process could not be launched at all.
    LaunchFailure,

    /// The solver exceeded the configured time limit and was killed.
    Timeout,
}

impl SolverExit {
    /// Maps a raw exit code to its class.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Converged,
            1 => Self::LoadFailure,
            2 => Self::ConvergenceFailure,
            code => Self::Unrecognized(code),
        }
    }

    /// Applies the stale-success-marker override.
    ///
    /// A success marker written during the run means a reported success
    /// didn't actually succeed, so the run is reclassified as a load
    /// failure. Nonzero exits are never altered.
    pub fn override_stale_marker(self, marker_updated: bool) -> Self {
        match self {
            Self::Converged if marker_updated => Self::LoadFailure,
            exit => exit,
        }
    }
}

fn exit_from_status(status: ExitStatus) -> SolverExit {
    match status.code() {
        Some(code) => SolverExit::from_code(code),
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                SolverExit::Unrecognized(-status.signal().unwrap_or(0))
            }
            #[cfg(not(unix))]
            {
                SolverExit::Unrecognized(-1)
            }
        }
    }
}

/// Information about a single solver run.
#[derive(Copy, Clone, Debug)]
pub struct ExecuteStatus {
    /// The effective exit class, after the stale-marker override.
    pub exit: SolverExit,

    /// The time at which the run started.
    pub start_time: DateTime<Local>,

    /// The time the run took.
    pub time_taken: Duration,
}

/// Statistics for a validation run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests discovered at the start of the run.
    pub initial_count: usize,

    /// The number of tests that finished.
    pub finished_count: usize,

    /// Tests that behaved as their names promised.
    pub passed: usize,

    /// Tests that failed exactly as their names promised.
    pub expected_failures: usize,

    /// Optional tests that behaved unexpectedly.
    pub warnings: usize,

    /// Required tests that behaved contrary to their expectations.
    pub errors: usize,

    /// Tests whose solver run failed outright or broke the exit contract.
    pub exceptions: usize,
}

impl RunStats {
    /// Returns true if the run had no errors and no exceptions.
    pub fn is_success(&self) -> bool {
        self.errors == 0 && self.exceptions == 0
    }

    /// The process exit status for the run: the number of errors plus the
    /// number of exceptions.
    pub fn exit_code(&self) -> i32 {
        (self.errors + self.exceptions) as i32
    }

    fn on_test_finished(&mut self, verdict: Verdict) {
        self.finished_count += 1;
        match verdict {
            Verdict::Success => self.passed += 1,
            Verdict::ExpectedFailure => self.expected_failures += 1,
            Verdict::Warning(_) => self.warnings += 1,
            Verdict::Error(_) => self.errors += 1,
            Verdict::Exception(_) => self.exceptions += 1,
        }
    }
}

/// The record of one finished test.
#[derive(Clone, Debug)]
pub struct TestRecord {
    /// The test that ran.
    pub test: TestCase,

    /// Its verdict.
    pub verdict: Verdict,

    /// Timing and exit details.
    pub status: ExecuteStatus,
}

/// The results of a whole validation run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Aggregated counters.
    pub stats: RunStats,

    /// Per-test records, in execution order.
    pub records: Vec<TestRecord>,

    /// Total wall-clock time for the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Iterates over the failed (error or exception) records in order.
    pub fn failed(&self) -> impl Iterator<Item = &TestRecord> {
        self.records
            .iter()
            .filter(|record| record.verdict.is_failure())
    }

    /// The failed tests in the form the archiver consumes.
    pub fn failed_tests(&self) -> Vec<FailedTest> {
        self.failed()
            .map(|record| FailedTest {
                base_name: record.test.base_name().to_owned(),
                workspace_dir: record.test.workspace_dir(),
            })
            .collect()
    }

    /// The process exit status for the run.
    pub fn exit_code(&self) -> i32 {
        self.stats.exit_code()
    }
}

/// Runs every discovered test sequentially and classifies the outcomes.
pub struct ValidationRunner<'a> {
    config: &'a SolverConfig,
    test_list: &'a TestList,
}

impl<'a> ValidationRunner<'a> {
    /// Creates a runner over a test list.
    pub fn new(config: &'a SolverConfig, test_list: &'a TestList) -> Self {
        Self { config, test_list }
    }

    /// Executes the run, reporting events through `callback`.
    ///
    /// No per-test failure aborts the run; only an error from the callback
    /// itself does.
    pub fn execute<E, F>(&self, mut callback: F) -> Result<RunSummary, E>
    where
        F: FnMut(RunEvent<'_>) -> Result<(), E>,
    {
        let run_stopwatch = stopwatch::stopwatch();
        let mut stats = RunStats {
            initial_count: self.test_list.len(),
            ..RunStats::default()
        };
        let mut records = Vec::with_capacity(self.test_list.len());

        callback(RunEvent::RunStarted {
            test_list: self.test_list,
        })?;

        for test in self.test_list.iter() {
            callback(RunEvent::TestStarted { test })?;

            let (status, verdict) = match TestWorkspace::prepare(test) {
                Ok(workspace) => {
                    let status = self.execute_test(&workspace);
                    (status, classify(test.tags(), status.exit))
                }
                Err(error) => {
                    warn!(
                        "failed to prepare workspace for `{}`: {error}",
                        test.file_name()
                    );
                    let status = ExecuteStatus {
                        exit: SolverExit::LaunchFailure,
                        start_time: Local::now(),
                        time_taken: Duration::ZERO,
                    };
                    (status, Verdict::Exception(Anomaly::WorkspaceSetup))
                }
            };

            stats.on_test_finished(verdict);
            callback(RunEvent::TestFinished {
                test,
                status,
                verdict,
            })?;
            records.push(TestRecord {
                test: test.clone(),
                verdict,
                status,
            });
        }

        let summary = RunSummary {
            stats,
            records,
            elapsed: run_stopwatch.snapshot().duration,
        };
        callback(RunEvent::RunFinished { summary: &summary })?;
        Ok(summary)
    }

    /// Runs the solver once in a prepared workspace.
    fn execute_test(&self, workspace: &TestWorkspace) -> ExecuteStatus {
        let test_stopwatch = stopwatch::stopwatch();

        let exit = self.spawn_and_wait(workspace);
        let snapshot = test_stopwatch.snapshot();

        let marker_updated =
            workspace.marker_updated_since(SystemTime::from(snapshot.start_time));
        ExecuteStatus {
            exit: exit.override_stale_marker(marker_updated),
            start_time: snapshot.start_time,
            time_taken: snapshot.duration,
        }
    }

    fn spawn_and_wait(&self, workspace: &TestWorkspace) -> SolverExit {
        let mut command = match self.config.command(workspace.model_path()) {
            Ok(command) => command,
            Err(error) => {
                warn!("failed to build solver search path: {error}");
                return SolverExit::LaunchFailure;
            }
        };

        let stdout = match File::create(workspace.stdout_path()) {
            Ok(file) => file,
            Err(error) => {
                warn!(
                    "failed to create `{}`: {error}",
                    workspace.stdout_path()
                );
                return SolverExit::LaunchFailure;
            }
        };
        let stderr = match File::create(workspace.stderr_path()) {
            Ok(file) => file,
            Err(error) => {
                warn!(
                    "failed to create `{}`: {error}",
                    workspace.stderr_path()
                );
                return SolverExit::LaunchFailure;
            }
        };

        command
            .current_dir(workspace.dir())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);

        debug!("running solver for `{}`", workspace.model_path());
        match command.spawn() {
            Ok(child) => self.wait_for_exit(child),
            Err(error) => {
                warn!("failed to launch solver: {error}");
                SolverExit::LaunchFailure
            }
        }
    }

    fn wait_for_exit(&self, mut child: Child) -> SolverExit {
        let Some(timeout) = self.config.timeout() else {
            return match child.wait() {
                Ok(status) => exit_from_status(status),
                Err(error) => {
                    warn!("failed to wait for solver: {error}");
                    SolverExit::LaunchFailure
                }
            };
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return exit_from_status(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        // Hung solver: kill it and record a timeout.
                        let _ = child.kill();
                        let _ = child.wait();
                        return SolverExit::Timeout;
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(error) => {
                    warn!("failed to poll solver: {error}");
                    let _ = child.kill();
                    let _ = child.wait();
                    return SolverExit::LaunchFailure;
                }
            }
        }
    }
}
