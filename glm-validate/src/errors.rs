// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use validate_runner::errors::{TestListError, WriteEventError};

/// Exit code used when the harness itself fails to set up or report a run.
/// Distinct from the error-plus-exception counts a completed run exits with.
pub const SETUP_ERROR_EXIT_CODE: i32 = 96;

/// An error expected to occur during normal operation: displayed to the
/// user with its source chain rather than as a panic.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to discover tests")]
    TestListError {
        #[from]
        err: TestListError,
    },
    #[error("failed to write output")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        SETUP_ERROR_EXIT_CODE
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error: Option<&dyn Error> = Some(self);
        let mut is_first = true;
        while let Some(error) = next_error {
            if is_first {
                eprintln!("{}: {error}", "error".style(styles.error));
            } else {
                eprintln!("{}: {error}", "caused by".style(styles.warning_text));
            }
            is_first = false;
            next_error = error.source();
        }
    }
}
