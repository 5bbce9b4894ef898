// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure verdict classification for completed solver runs.
//!
//! Classification is a function of exactly two inputs: the expectations
//! parsed from the file name and the effective solver exit. It touches no
//! processes and no filesystem, so the whole decision table is unit-testable
//! on its own.

use crate::{list::ExpectationTags, runner::SolverExit};
use std::fmt;

/// Why a test's behavior was anomalous.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Anomaly {
    /// The model converged although its name promised a convergence failure.
    UnexpectedConvergence,

    /// The model loaded although its name promised a load failure.
    UnexpectedLoad,

    /// The model failed to converge.
    FailedToConverge,

    /// The model failed to load.
    FailedToLoad,

    /// The solver exited with a code outside its contract.
    UnrecognizedExit(i32),

    /// The solver process could not be launched.
    LaunchFailure,

    /// The solver exceeded the configured time limit.
    Timeout,

    /// The test workspace could not be prepared.
    WorkspaceSetup,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::UnexpectedConvergence => write!(f, "converged when it shouldn't have"),
            Anomaly::UnexpectedLoad => write!(f, "loaded when it shouldn't have"),
            Anomaly::FailedToConverge => write!(f, "failed to converge"),
            Anomaly::FailedToLoad => write!(f, "failed to load"),
            Anomaly::UnrecognizedExit(code) => {
                write!(f, "ended with unrecognized return value ({code})")
            }
            Anomaly::LaunchFailure => write!(f, "solver process failed to launch"),
            Anomaly::Timeout => write!(f, "solver run timed out"),
            Anomaly::WorkspaceSetup => write!(f, "test workspace could not be prepared"),
        }
    }
}

/// The outcome of a single test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The test behaved as its name promised.
    Success,

    /// The test failed exactly as its name promised. Counts as a success.
    ExpectedFailure,

    /// An optional test behaved unexpectedly. Does not count as an error.
    Warning(Anomaly),

    /// A required test behaved contrary to its declared expectation.
    Error(Anomaly),

    /// The solver failed to run, crashed, or broke its exit-code contract,
    /// or the harness could not prepare the test.
    Exception(Anomaly),
}

impl Verdict {
    /// Returns true for verdicts that count as clean for reporting.
    pub fn is_clean(self) -> bool {
        matches!(
            self,
            Verdict::Success | Verdict::ExpectedFailure | Verdict::Warning(_)
        )
    }

    /// Returns true for verdicts recorded as failures and handed to the
    /// archiver.
    pub fn is_failure(self) -> bool {
        matches!(self, Verdict::Error(_) | Verdict::Exception(_))
    }

    /// The anomaly carried by warning, error and exception verdicts.
    pub fn anomaly(self) -> Option<Anomaly> {
        match self {
            Verdict::Success | Verdict::ExpectedFailure => None,
            Verdict::Warning(anomaly) | Verdict::Error(anomaly) | Verdict::Exception(anomaly) => {
                Some(anomaly)
            }
        }
    }
}

/// Maps a test's filename expectations and its effective solver exit to a
/// verdict.
///
/// Expected-error tests succeed on a convergence failure; expected-exception
/// tests succeed on a load failure; everything else succeeds on convergence.
/// When a file name carries both tags, the error expectation wins. Exit
/// codes outside the solver's contract are exceptions no matter what the
/// file name promises, and `optional` never softens them.
pub fn classify(tags: ExpectationTags, exit: SolverExit) -> Verdict {
    match exit {
        SolverExit::LaunchFailure => Verdict::Exception(Anomaly::LaunchFailure),
        SolverExit::Timeout => Verdict::Exception(Anomaly::Timeout),
        SolverExit::Unrecognized(code) => Verdict::Exception(Anomaly::UnrecognizedExit(code)),
        SolverExit::Converged => {
            if tags.expect_error {
                soften(tags.optional, Anomaly::UnexpectedConvergence)
            } else if tags.expect_exception {
                soften(tags.optional, Anomaly::UnexpectedLoad)
            } else {
                Verdict::Success
            }
        }
        SolverExit::ConvergenceFailure => {
            if tags.expect_error {
                Verdict::ExpectedFailure
            } else if tags.expect_exception {
                // A load-failure test has no defined meaning for a
                // non-convergence exit; it falls outside the contract.
                Verdict::Exception(Anomaly::UnrecognizedExit(2))
            } else {
                soften(tags.optional, Anomaly::FailedToConverge)
            }
        }
        SolverExit::LoadFailure => {
            if tags.expect_exception && !tags.expect_error {
                Verdict::ExpectedFailure
            } else {
                Verdict::Exception(Anomaly::FailedToLoad)
            }
        }
    }
}

/// Optional tests demote a would-be error to a warning.
fn soften(optional: bool, anomaly: Anomaly) -> Verdict {
    if optional {
        Verdict::Warning(anomaly)
    } else {
        Verdict::Error(anomaly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(expect_error: bool, expect_exception: bool, optional: bool) -> ExpectationTags {
        ExpectationTags {
            expect_error,
            expect_exception,
            optional,
        }
    }

    /// The full decision table over the solver's defined exit codes.
    #[test]
    fn decision_table() {
        use Anomaly::*;
        use SolverExit::*;
        use Verdict::*;

        let cases: &[(ExpectationTags, SolverExit, Verdict)] = &[
            // Expected-error tests.
            (tags(true, false, false), Converged, Error(UnexpectedConvergence)),
            (tags(true, false, true), Converged, Warning(UnexpectedConvergence)),
            (tags(true, false, false), ConvergenceFailure, ExpectedFailure),
            (tags(true, false, true), ConvergenceFailure, ExpectedFailure),
            (tags(true, false, false), LoadFailure, Exception(FailedToLoad)),
            (tags(true, false, true), LoadFailure, Exception(FailedToLoad)),
            // Expected-exception tests.
            (tags(false, true, false), Converged, Error(UnexpectedLoad)),
            (tags(false, true, true), Converged, Warning(UnexpectedLoad)),
            (tags(false, true, false), LoadFailure, ExpectedFailure),
            (tags(false, true, true), LoadFailure, ExpectedFailure),
            (tags(false, true, false), ConvergenceFailure, Exception(UnrecognizedExit(2))),
            (tags(false, true, true), ConvergenceFailure, Exception(UnrecognizedExit(2))),
            // Untagged tests.
            (tags(false, false, false), Converged, Success),
            (tags(false, false, true), Converged, Success),
            (tags(false, false, false), ConvergenceFailure, Error(FailedToConverge)),
            (tags(false, false, true), ConvergenceFailure, Warning(FailedToConverge)),
            (tags(false, false, false), LoadFailure, Exception(FailedToLoad)),
            (tags(false, false, true), LoadFailure, Exception(FailedToLoad)),
            // Both tags: the error expectation takes priority.
            (tags(true, true, false), ConvergenceFailure, ExpectedFailure),
            (tags(true, true, false), LoadFailure, Exception(FailedToLoad)),
            (tags(true, true, false), Converged, Error(UnexpectedConvergence)),
        ];

        for &(tags, exit, expected) in cases {
            assert_eq!(
                classify(tags, exit),
                expected,
                "tags {tags:?}, exit {exit:?}"
            );
        }
    }

    /// Exits outside the contract are exceptions for every flag combination,
    /// and `optional` never softens them.
    #[test]
    fn undefined_exits_are_always_exceptions() {
        let all_tags = (0..8).map(|bits| tags(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0));
        for tags in all_tags {
            assert_eq!(
                classify(tags, SolverExit::Unrecognized(7)),
                Verdict::Exception(Anomaly::UnrecognizedExit(7)),
                "tags {tags:?}"
            );
            assert_eq!(
                classify(tags, SolverExit::LaunchFailure),
                Verdict::Exception(Anomaly::LaunchFailure),
                "tags {tags:?}"
            );
            assert_eq!(
                classify(tags, SolverExit::Timeout),
                Verdict::Exception(Anomaly::Timeout),
                "tags {tags:?}"
            );
        }
    }

    #[test]
    fn verdict_predicates() {
        assert!(Verdict::Success.is_clean());
        assert!(Verdict::ExpectedFailure.is_clean());
        assert!(Verdict::Warning(Anomaly::FailedToConverge).is_clean());
        assert!(!Verdict::Error(Anomaly::FailedToConverge).is_clean());

        assert!(Verdict::Error(Anomaly::UnexpectedLoad).is_failure());
        assert!(Verdict::Exception(Anomaly::FailedToLoad).is_failure());
        assert!(!Verdict::Warning(Anomaly::FailedToConverge).is_failure());

        assert_eq!(Verdict::Success.anomaly(), None);
        assert_eq!(
            Verdict::Error(Anomaly::UnexpectedLoad).anomaly(),
            Some(Anomaly::UnexpectedLoad)
        );
    }
}
