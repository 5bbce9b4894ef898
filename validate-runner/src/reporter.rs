// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints per-test verdict lines and the run summary.
//!
//! The main structure in this module is [`ValidationReporter`].

use crate::{
    classify::Verdict,
    errors::WriteEventError,
    list::{TestCase, TestList},
    runner::{ExecuteStatus, RunSummary},
};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// An event in a validation run.
///
/// Events are produced by a [`ValidationRunner`](crate::runner::ValidationRunner)
/// and consumed by a [`ValidationReporter`].
#[derive(Copy, Clone, Debug)]
pub enum RunEvent<'a> {
    /// The run started.
    RunStarted {
        /// The tests that will be run.
        test_list: &'a TestList,
    },

    /// A single test started.
    TestStarted {
        /// The test being run.
        test: &'a TestCase,
    },

    /// A single test finished and was classified.
    TestFinished {
        /// The test that ran.
        test: &'a TestCase,

        /// Timing and exit details.
        status: ExecuteStatus,

        /// The verdict.
        verdict: Verdict,
    },

    /// The run finished.
    RunFinished {
        /// The full results of the run.
        summary: &'a RunSummary,
    },
}

/// Builder for [`ValidationReporter`].
#[derive(Debug)]
pub struct ReporterBuilder {
    error_detail: bool,
    verbose: bool,
}

impl Default for ReporterBuilder {
    fn default() -> Self {
        Self {
            error_detail: true,
            verbose: false,
        }
    }
}

impl ReporterBuilder {
    /// Sets whether failure lines carry the anomaly explanation. Defaults to
    /// true.
    pub fn set_error_detail(&mut self, error_detail: bool) -> &mut Self {
        self.error_detail = error_detail;
        self
    }

    /// Sets whether clean tests are reported line by line as well. Defaults
    /// to false.
    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Creates a new reporter.
    pub fn build(&self) -> ValidationReporter {
        ValidationReporter {
            error_detail: self.error_detail,
            verbose: self.verbose,
            styles: Box::default(),
        }
    }
}

/// Reports run events as human-readable lines.
#[derive(Debug)]
pub struct ValidationReporter {
    error_detail: bool,
    verbose: bool,
    styles: Box<Styles>,
}

impl ValidationReporter {
    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Reports a run event to the given writer.
    pub fn report_event(
        &mut self,
        event: RunEvent<'_>,
        writer: impl Write,
    ) -> Result<(), WriteEventError> {
        self.write_event(event, writer).map_err(WriteEventError::Io)
    }

    fn write_event(&mut self, event: RunEvent<'_>, mut writer: impl Write) -> io::Result<()> {
        match event {
            RunEvent::RunStarted { test_list } => {
                writeln!(
                    writer,
                    "{:>12} {} test model files",
                    "Validating".style(self.styles.pass),
                    test_list.len().style(self.styles.count),
                )?;
            }
            RunEvent::TestStarted { test } => {
                if self.verbose {
                    writeln!(
                        writer,
                        "{:>12} {}",
                        "RUN".style(self.styles.count),
                        test.source_path(),
                    )?;
                }
            }
            RunEvent::TestFinished {
                test,
                status,
                verdict,
            } => {
                self.write_test_finished(test, status, verdict, &mut writer)?;
            }
            RunEvent::RunFinished { summary } => {
                self.write_run_finished(summary, &mut writer)?;
            }
        }
        Ok(())
    }

    fn write_test_finished(
        &self,
        test: &TestCase,
        status: ExecuteStatus,
        verdict: Verdict,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        let (word, style) = match verdict {
            Verdict::Success | Verdict::ExpectedFailure => {
                if !self.verbose {
                    return Ok(());
                }
                ("SUCCESS", self.styles.pass)
            }
            Verdict::Warning(_) => ("WARNING", self.styles.warning),
            Verdict::Error(_) => ("ERROR", self.styles.fail),
            Verdict::Exception(_) => ("EXCEPTION", self.styles.fail),
        };

        write!(
            writer,
            "{:>12} [{:>8.2}s] {}",
            word.style(style),
            status.time_taken.as_secs_f64(),
            test.file_name(),
        )?;

        if verdict == Verdict::ExpectedFailure {
            writeln!(writer, ": failed as planned")?;
            return Ok(());
        }
        match verdict.anomaly() {
            Some(anomaly) if self.error_detail || !verdict.is_failure() => {
                writeln!(writer, ": {anomaly}")
            }
            _ => writeln!(writer),
        }
    }

    fn write_run_finished(
        &self,
        summary: &RunSummary,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        let error_style = if summary.stats.errors > 0 {
            self.styles.fail
        } else {
            self.styles.count
        };
        let exception_style = if summary.stats.exceptions > 0 {
            self.styles.fail
        } else {
            self.styles.count
        };
        writeln!(
            writer,
            "Validation detected {} models with errors and {} models with exceptions \
             in {:.2} seconds.",
            summary.stats.errors.style(error_style),
            summary.stats.exceptions.style(exception_style),
            summary.elapsed.as_secs_f64(),
        )?;
        for record in summary.failed() {
            writeln!(writer, " * {}", record.test.source_path())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    warning: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.warning = Style::new().yellow().bold();
    }
}
