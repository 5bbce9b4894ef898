// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Solver configuration threaded into the executor.
//!
//! Search paths are explicit values here and scoped to each child process;
//! the harness never mutates its own environment.

use camino::{Utf8Path, Utf8PathBuf};
use std::{
    env::{self, JoinPathsError},
    ffi::OsString,
    process::Command,
    time::Duration,
};

/// Name of the solver executable looked up on the search path by default.
pub const DEFAULT_SOLVER: &str = "gridlabd";

/// Configuration for launching the external solver.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    program: Utf8PathBuf,
    bin_dir: Option<Utf8PathBuf>,
    lib_path: Option<Utf8PathBuf>,
    timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverConfig {
    /// Creates a configuration that runs `gridlabd` from the search path,
    /// with no timeout.
    pub fn new() -> Self {
        Self {
            program: DEFAULT_SOLVER.into(),
            bin_dir: None,
            lib_path: None,
            timeout: None,
        }
    }

    /// Sets the solver executable to run.
    pub fn set_program(&mut self, program: impl Into<Utf8PathBuf>) -> &mut Self {
        self.program = program.into();
        self
    }

    /// Prepends a directory to the child's executable search path.
    pub fn set_bin_dir(&mut self, bin_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.bin_dir = Some(bin_dir.into());
        self
    }

    /// Sets the solver's `GLPATH` shared-library search variable.
    pub fn set_lib_path(&mut self, lib_path: impl Into<Utf8PathBuf>) -> &mut Self {
        self.lib_path = Some(lib_path.into());
        self
    }

    /// Kills solver runs that exceed this duration, recording an exception.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Builds the command line for one model file, with stdio not yet wired
    /// up.
    pub(crate) fn command(&self, model_path: &Utf8Path) -> Result<Command, JoinPathsError> {
        let mut command = Command::new(self.program.as_std_path());
        command.arg(model_path.as_str());
        if let Some(bin_dir) = &self.bin_dir {
            command.env("PATH", prepend_to_path(bin_dir)?);
        }
        if let Some(lib_path) = &self.lib_path {
            command.env("GLPATH", lib_path.as_str());
        }
        Ok(command)
    }
}

/// Prepends `dir` to the current `PATH` value.
fn prepend_to_path(dir: &Utf8Path) -> Result<OsString, JoinPathsError> {
    let existing = env::var_os("PATH").unwrap_or_default();
    env::join_paths(
        std::iter::once(dir.as_std_path().to_path_buf()).chain(env::split_paths(&existing)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn command_passes_model_as_sole_argument() {
        let config = SolverConfig::new();
        let command = config.command(Utf8Path::new("/work/test_a.glm")).unwrap();
        assert_eq!(command.get_program(), OsStr::new(DEFAULT_SOLVER));
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, [OsStr::new("/work/test_a.glm")]);
    }

    #[test]
    fn command_sets_library_path() {
        let mut config = SolverConfig::new();
        config.set_program("mysolver").set_lib_path("/opt/gl/lib");
        let command = config.command(Utf8Path::new("/work/test_a.glm")).unwrap();
        let glpath = command
            .get_envs()
            .find(|(key, _)| *key == OsStr::new("GLPATH"))
            .and_then(|(_, value)| value);
        assert_eq!(glpath, Some(OsStr::new("/opt/gl/lib")));
    }

    #[test]
    fn command_prepends_bin_dir_to_search_path() {
        let mut config = SolverConfig::new();
        config.set_bin_dir("/opt/gl/bin");
        let command = config.command(Utf8Path::new("/work/test_a.glm")).unwrap();
        let path = command
            .get_envs()
            .find(|(key, _)| *key == OsStr::new("PATH"))
            .and_then(|(_, value)| value)
            .expect("PATH is set on the child");
        assert!(
            path.to_string_lossy().starts_with("/opt/gl/bin"),
            "bin dir comes first in {path:?}"
        );
    }
}
