// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::ExpectedError,
    output::{OutputContext, OutputOpts},
};
use camino::Utf8PathBuf;
use clap::Parser;
use std::time::Duration;
use tracing::warn;
use validate_runner::{
    archive::{FailureArchiver, TarArchiver},
    config::SolverConfig,
    list::TestList,
    reporter::ReporterBuilder,
    runner::ValidationRunner,
};

/// GridLAB-D autotest validation harness.
///
/// Searches all directories underneath DIR for directories named
/// `autotest`, runs every `test_*.glm` model file found there through the
/// solver, and exits with the number of models that misbehaved.
#[derive(Debug, Parser)]
#[command(version, styles = crate::output::clap_styles::style())]
pub struct GlmValidateApp {
    /// Root directory to scan
    #[arg(value_name = "DIR", default_value = ".")]
    dir: Utf8PathBuf,

    /// Suppress the explanation on error and exception lines
    #[arg(long = "error")]
    no_error_detail: bool,

    /// Reserved; accepted but currently a no-op
    #[arg(long)]
    clean: bool,

    /// Solver executable used to run model files
    #[arg(long, value_name = "PROGRAM")]
    solver: Option<Utf8PathBuf>,

    /// Directory prepended to the solver's executable search path
    #[arg(long, value_name = "DIR")]
    bin_dir: Option<Utf8PathBuf>,

    /// Value for the solver's GLPATH library search variable
    #[arg(long, value_name = "DIR")]
    lib_path: Option<Utf8PathBuf>,

    /// Kill solver runs after this long (e.g. "90s") and record an exception
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    #[command(flatten)]
    output: OutputOpts,
}

impl GlmValidateApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the run, returning the process exit code: the total number
    /// of errors plus exceptions.
    pub fn exec(self, output: OutputContext) -> Result<i32, ExpectedError> {
        if self.clean {
            warn!("--clean is reserved and currently does nothing");
        }

        let mut config = SolverConfig::new();
        if let Some(solver) = self.solver {
            config.set_program(solver);
        }
        if let Some(bin_dir) = self.bin_dir {
            config.set_bin_dir(bin_dir);
        }
        if let Some(lib_path) = self.lib_path {
            config.set_lib_path(lib_path);
        }
        if let Some(timeout) = self.timeout {
            config.set_timeout(timeout);
        }

        let test_list = TestList::discover(&self.dir)?;

        let mut reporter = ReporterBuilder::default()
            .set_error_detail(!self.no_error_detail)
            .set_verbose(output.verbose)
            .build();
        if output.color.should_colorize(supports_color::Stream::Stdout) {
            reporter.colorize();
        }

        let stdout = std::io::stdout();
        let runner = ValidationRunner::new(&config, &test_list);
        let summary = runner.execute(|event| reporter.report_event(event, stdout.lock()))?;

        let failed = summary.failed_tests();
        if !failed.is_empty() {
            // Archiver trouble doesn't change the run's exit status.
            let mut archiver = TarArchiver::new(self.dir.clone());
            if let Err(error) = archiver.archive(&failed) {
                warn!("failed to archive failed tests: {error}");
            }
        }

        Ok(summary.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn app_is_well_formed() {
        GlmValidateApp::command().debug_assert();
    }

    #[test]
    fn flags_are_accepted() {
        let app = GlmValidateApp::try_parse_from([
            "glm-validate",
            "--clean",
            "--error",
            "--timeout",
            "90s",
            "models",
        ])
        .unwrap();
        assert!(app.clean);
        assert!(app.no_error_detail);
        assert_eq!(app.timeout, Some(Duration::from_secs(90)));
        assert_eq!(app.dir, "models");
    }

    #[test]
    fn dir_defaults_to_current_directory() {
        let app = GlmValidateApp::try_parse_from(["glm-validate"]).unwrap();
        assert_eq!(app.dir, ".");
    }
}
