// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validation harness for GridLAB-D autotest model files.
//!
//! Walks a directory tree for `autotest` directories, runs every
//! `test_*.glm` model file through the solver, classifies each outcome
//! against the expectation encoded in the file name, and exits with the
//! total number of errors plus exceptions.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, StderrStyles};
