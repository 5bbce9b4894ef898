// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test workspace preparation.
//!
//! Each test runs in an isolated directory next to its model file, named
//! after the file without its extension. The solver's stdout and stderr are
//! captured there, and the solver may leave a `gridlabd.xml` artifact behind
//! that the executor uses to detect runs that claim success without
//! delivering it.

use crate::{errors::WorkspaceSetupError, list::TestCase};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, io, time::SystemTime};
use tracing::debug;

/// Artifact the solver writes during a run. A fresh one alongside exit code
/// 0 means the run did not actually succeed.
pub const SUCCESS_MARKER: &str = "gridlabd.xml";

/// File the solver's stdout is captured to.
pub const STDOUT_FILE: &str = "outfile.txt";

/// File the solver's stderr is captured to.
pub const STDERR_FILE: &str = "errfile.txt";

/// An isolated directory a single test runs in.
#[derive(Clone, Debug)]
pub struct TestWorkspace {
    dir: Utf8PathBuf,
    model_path: Utf8PathBuf,
}

impl TestWorkspace {
    /// Prepares the workspace for a test: creates the directory if it does
    /// not exist, clears any success marker left behind by a prior run, and
    /// copies the model file in.
    pub fn prepare(test: &TestCase) -> Result<Self, WorkspaceSetupError> {
        let dir = test.workspace_dir();
        if dir.exists() {
            let marker = dir.join(SUCCESS_MARKER);
            match fs::remove_file(&marker) {
                Ok(()) => debug!("removed stale success marker `{marker}`"),
                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                Err(error) => {
                    return Err(WorkspaceSetupError::RemoveMarker {
                        path: marker,
                        error,
                    });
                }
            }
        } else {
            fs::create_dir(&dir).map_err(|error| WorkspaceSetupError::CreateDir {
                path: dir.clone(),
                error,
            })?;
        }

        let model_path = dir.join(test.file_name());
        fs::copy(test.source_path(), &model_path).map_err(|error| {
            WorkspaceSetupError::CopyModel {
                from: test.source_path(),
                to: model_path.clone(),
                error,
            }
        })?;
        debug!("prepared workspace `{dir}`");
        Ok(Self { dir, model_path })
    }

    /// The workspace directory.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the copied model file.
    pub fn model_path(&self) -> &Utf8Path {
        &self.model_path
    }

    /// Path the solver's stdout is captured to.
    pub fn stdout_path(&self) -> Utf8PathBuf {
        self.dir.join(STDOUT_FILE)
    }

    /// Path the solver's stderr is captured to.
    pub fn stderr_path(&self) -> Utf8PathBuf {
        self.dir.join(STDERR_FILE)
    }

    /// Returns true if the success marker exists and was modified strictly
    /// after `start`.
    pub fn marker_updated_since(&self, start: SystemTime) -> bool {
        let marker = self.dir.join(SUCCESS_MARKER);
        match fs::metadata(&marker).and_then(|metadata| metadata.modified()) {
            Ok(mtime) => mtime > start,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test(root: &Utf8Path, file_name: &str) -> TestCase {
        let autotest = root.join("autotest");
        fs::create_dir_all(&autotest).unwrap();
        fs::write(autotest.join(file_name), "// model\n").unwrap();
        TestCase::new(autotest, file_name)
    }

    #[test]
    fn prepare_creates_workspace_and_copies_model() {
        let temp = camino_tempfile::tempdir().unwrap();
        let test = make_test(temp.path(), "test_basic.glm");

        let workspace = TestWorkspace::prepare(&test).unwrap();
        assert_eq!(workspace.dir(), test.workspace_dir());
        assert!(workspace.dir().is_dir());
        assert!(workspace.model_path().is_file());
        assert_eq!(
            fs::read_to_string(workspace.model_path()).unwrap(),
            "// model\n"
        );
    }

    #[test]
    fn prepare_reuses_workspace_and_clears_stale_marker() {
        let temp = camino_tempfile::tempdir().unwrap();
        let test = make_test(temp.path(), "test_basic.glm");

        let workspace = TestWorkspace::prepare(&test).unwrap();
        fs::write(workspace.dir().join(SUCCESS_MARKER), "<xml/>").unwrap();

        let workspace = TestWorkspace::prepare(&test).unwrap();
        assert!(workspace.model_path().is_file());
        assert!(!workspace.dir().join(SUCCESS_MARKER).exists());
    }

    #[test]
    fn prepare_fails_when_model_is_missing() {
        let temp = camino_tempfile::tempdir().unwrap();
        let autotest = temp.path().join("autotest");
        fs::create_dir_all(&autotest).unwrap();
        let test = TestCase::new(autotest, "test_gone.glm");

        let result = TestWorkspace::prepare(&test);
        assert!(matches!(
            result,
            Err(WorkspaceSetupError::CopyModel { .. })
        ));
    }

    #[test]
    fn marker_freshness_is_relative_to_start_time() {
        let temp = camino_tempfile::tempdir().unwrap();
        let test = make_test(temp.path(), "test_basic.glm");
        let workspace = TestWorkspace::prepare(&test).unwrap();

        assert!(!workspace.marker_updated_since(SystemTime::UNIX_EPOCH));

        fs::write(workspace.dir().join(SUCCESS_MARKER), "<xml/>").unwrap();
        assert!(workspace.marker_updated_since(SystemTime::UNIX_EPOCH));
        let far_future = SystemTime::now() + std::time::Duration::from_secs(3600);
        assert!(!workspace.marker_updated_since(far_future));
    }
}
