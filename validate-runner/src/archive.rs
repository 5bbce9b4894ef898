// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archiving failed test workspaces.
//!
//! At the end of a run the harness hands the archiver the ordered list of
//! failed tests; how archives are produced is this module's business alone.

use crate::errors::ArchiveError;
use camino::Utf8PathBuf;
use std::fs::File;
use tracing::debug;

/// A failed test to archive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailedTest {
    /// The model file name without its extension.
    pub base_name: String,

    /// The workspace directory the test ran in.
    pub workspace_dir: Utf8PathBuf,
}

/// Collaborator that archives failed test workspaces at the end of a run.
pub trait FailureArchiver {
    /// Archives the given failed tests, in order.
    fn archive(&mut self, failed: &[FailedTest]) -> Result<(), ArchiveError>;
}

/// The default archiver: one uncompressed tar per failed test, holding the
/// test's whole workspace (model copy, captured output, any solver
/// artifacts).
#[derive(Clone, Debug)]
pub struct TarArchiver {
    output_dir: Utf8PathBuf,
}

impl TarArchiver {
    /// Creates an archiver writing `<base_name>.tar` files into
    /// `output_dir`.
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl FailureArchiver for TarArchiver {
    fn archive(&mut self, failed: &[FailedTest]) -> Result<(), ArchiveError> {
        for test in failed {
            let archive_path = self.output_dir.join(format!("{}.tar", test.base_name));
            let file = File::create(&archive_path).map_err(|error| ArchiveError::Create {
                path: archive_path.clone(),
                error,
            })?;
            let mut builder = tar::Builder::new(file);
            builder
                .append_dir_all(&test.base_name, &test.workspace_dir)
                .map_err(|error| ArchiveError::Append {
                    path: archive_path.clone(),
                    dir: test.workspace_dir.clone(),
                    error,
                })?;
            builder.finish().map_err(|error| ArchiveError::Finish {
                path: archive_path.clone(),
                error,
            })?;
            debug!("archived failed test `{}` to `{archive_path}`", test.base_name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn archives_one_tar_per_failed_test() {
        let temp = camino_tempfile::tempdir().unwrap();
        let workspace = temp.path().join("test_exc_bad");
        fs::create_dir(&workspace).unwrap();
        fs::write(workspace.join("test_exc_bad.glm"), "// model\n").unwrap();
        fs::write(workspace.join("outfile.txt"), "out\n").unwrap();
        fs::write(workspace.join("errfile.txt"), "err\n").unwrap();

        let mut archiver = TarArchiver::new(temp.path());
        archiver
            .archive(&[FailedTest {
                base_name: "test_exc_bad".to_owned(),
                workspace_dir: workspace,
            }])
            .unwrap();

        let archive_path = temp.path().join("test_exc_bad.tar");
        let mut archive = tar::Archive::new(File::open(archive_path).unwrap());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|entry| {
                entry
                    .unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert!(
            names.contains(&"test_exc_bad/test_exc_bad.glm".to_owned()),
            "{names:?}"
        );
        assert!(
            names.contains(&"test_exc_bad/outfile.txt".to_owned()),
            "{names:?}"
        );
    }

    #[test]
    fn missing_workspace_is_an_error() {
        let temp = camino_tempfile::tempdir().unwrap();
        let mut archiver = TarArchiver::new(temp.path());
        let result = archiver.archive(&[FailedTest {
            base_name: "test_gone".to_owned(),
            workspace_dir: temp.path().join("test_gone"),
        }]);
        assert!(matches!(result, Err(ArchiveError::Append { .. })));
    }
}
