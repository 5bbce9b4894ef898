// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for glm-validate, the GridLAB-D autotest validation
//! harness.
//!
//! The harness walks a directory tree for `autotest` directories, runs every
//! `test_*.glm` model file it finds through the external solver, classifies
//! each outcome against the expectation encoded in the file name, and
//! aggregates the verdicts into a run summary that drives the process exit
//! code.

pub mod archive;
pub mod classify;
pub mod config;
pub mod errors;
pub mod list;
pub mod reporter;
pub mod runner;
mod stopwatch;
pub mod workspace;
