// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovering test model files and the expectations encoded in their names.

use crate::errors::TestListError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory name marking its contents as a test location.
const AUTOTEST_DIR: &str = "autotest";

/// Filename prefix marking a model file as a test.
const TEST_PREFIX: &str = "test_";

/// File extension for model files.
const MODEL_EXTENSION: &str = ".glm";

/// Expectations encoded in a test model's file name.
///
/// Parsed once at discovery time; nothing downstream re-inspects the file
/// name.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ExpectationTags {
    /// The model is expected to fail to converge (`err_` or `_err`).
    pub expect_error: bool,

    /// The model is expected to fail to load (`exc_` or `_exc`).
    pub expect_exception: bool,

    /// The test is optional (`opt_` or `_opt`): unexpected behavior is a
    /// warning rather than an error.
    pub optional: bool,
}

impl ExpectationTags {
    /// Parses tags from a file name by substring inspection.
    pub fn from_file_name(file_name: &str) -> Self {
        Self {
            expect_error: file_name.contains("err_") || file_name.contains("_err"),
            expect_exception: file_name.contains("exc_") || file_name.contains("_exc"),
            optional: file_name.contains("opt_") || file_name.contains("_opt"),
        }
    }
}

/// A single discovered test model file.
///
/// Identity is the containing autotest directory plus the file name.
/// Immutable after discovery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    autotest_dir: Utf8PathBuf,
    file_name: String,
    tags: ExpectationTags,
}

impl TestCase {
    /// Creates a new test case, parsing expectation tags from the file name.
    pub fn new(autotest_dir: impl Into<Utf8PathBuf>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let tags = ExpectationTags::from_file_name(&file_name);
        Self {
            autotest_dir: autotest_dir.into(),
            file_name,
            tags,
        }
    }

    /// The autotest directory containing the model file.
    pub fn autotest_dir(&self) -> &Utf8Path {
        &self.autotest_dir
    }

    /// The model file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The file name without its extension. Names the test workspace and any
    /// failure archive.
    pub fn base_name(&self) -> &str {
        self.file_name
            .strip_suffix(MODEL_EXTENSION)
            .unwrap_or(&self.file_name)
    }

    /// The expectations parsed from the file name.
    pub fn tags(&self) -> ExpectationTags {
        self.tags
    }

    /// Full path to the model file as discovered.
    pub fn source_path(&self) -> Utf8PathBuf {
        self.autotest_dir.join(&self.file_name)
    }

    /// The directory the test runs in: a sibling of the model file named
    /// after it.
    pub fn workspace_dir(&self) -> Utf8PathBuf {
        self.autotest_dir.join(self.base_name())
    }
}

/// The list of tests discovered under a scan root.
#[derive(Clone, Debug, Default)]
pub struct TestList {
    tests: Vec<TestCase>,
}

impl TestList {
    /// Walks `root`, collecting `test_*.glm` files found directly inside
    /// `autotest` directories.
    ///
    /// Paths are absolutized up front so tests can run from their own
    /// workspace directories. Unreadable subtrees and non-UTF-8 paths are
    /// skipped with a warning; an unreadable or missing scan root is an
    /// error.
    pub fn discover(root: &Utf8Path) -> Result<Self, TestListError> {
        let root = camino::absolute_utf8(root).map_err(|error| TestListError::RootDir {
            path: root.to_owned(),
            error,
        })?;
        let metadata = fs::metadata(&root).map_err(|error| TestListError::RootDir {
            path: root.clone(),
            error,
        })?;
        if !metadata.is_dir() {
            return Err(TestListError::RootNotADirectory { path: root });
        }

        let mut tests = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("skipping unreadable directory entry: {error}");
                    continue;
                }
            };
            if !entry.file_type().is_dir() || entry.file_name() != AUTOTEST_DIR {
                continue;
            }
            let Ok(autotest_dir) = Utf8PathBuf::try_from(entry.path().to_path_buf()) else {
                warn!(
                    "skipping non-UTF-8 autotest directory `{}`",
                    entry.path().display()
                );
                continue;
            };
            debug!("found autotest directory `{autotest_dir}`");
            collect_test_files(&autotest_dir, &mut tests)?;
        }
        Ok(Self { tests })
    }

    /// The number of discovered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no tests were discovered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over the tests in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.iter()
    }
}

/// Collects the test model files directly inside one autotest directory, in
/// sorted order.
fn collect_test_files(
    autotest_dir: &Utf8Path,
    tests: &mut Vec<TestCase>,
) -> Result<(), TestListError> {
    let entries = autotest_dir
        .read_dir_utf8()
        .map_err(|error| TestListError::ReadAutotestDir {
            path: autotest_dir.to_owned(),
            error,
        })?;

    let mut file_names = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("skipping unreadable entry in `{autotest_dir}`: {error}");
                continue;
            }
        };
        let name = entry.file_name();
        if !name.starts_with(TEST_PREFIX) || !name.ends_with(MODEL_EXTENSION) {
            continue;
        }
        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => file_names.push(name.to_owned()),
            Ok(_) => {}
            Err(error) => warn!("skipping `{}`: {error}", entry.path()),
        }
    }

    // read_dir order is platform-dependent.
    file_names.sort_unstable();
    tests.extend(
        file_names
            .into_iter()
            .map(|name| TestCase::new(autotest_dir, name)),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags_from_file_name() {
        let tags = ExpectationTags::from_file_name("test_err_load.glm");
        assert!(tags.expect_error);
        assert!(!tags.expect_exception);
        assert!(!tags.optional);

        let tags = ExpectationTags::from_file_name("test_load_err.glm");
        assert!(tags.expect_error);

        let tags = ExpectationTags::from_file_name("test_exc_bad.glm");
        assert!(!tags.expect_error);
        assert!(tags.expect_exception);

        let tags = ExpectationTags::from_file_name("test_opt_err_ranges.glm");
        assert!(tags.expect_error);
        assert!(tags.optional);

        let tags = ExpectationTags::from_file_name("test_basic.glm");
        assert_eq!(tags, ExpectationTags::default());
    }

    #[test]
    fn test_case_names_and_paths() {
        let test = TestCase::new("/models/autotest", "test_err_load.glm");
        assert_eq!(test.base_name(), "test_err_load");
        assert_eq!(test.source_path(), "/models/autotest/test_err_load.glm");
        assert_eq!(test.workspace_dir(), "/models/autotest/test_err_load");
        assert!(test.tags().expect_error);
    }

    #[test]
    fn discover_collects_autotest_files() {
        let temp = camino_tempfile::tempdir().unwrap();
        let root = temp.path();

        let autotest = root.join("powerflow/autotest");
        std::fs::create_dir_all(&autotest).unwrap();
        std::fs::write(autotest.join("test_b.glm"), "").unwrap();
        std::fs::write(autotest.join("test_a.glm"), "").unwrap();
        // Ignored: wrong prefix, wrong extension, directory with a matching
        // name (a prior run's workspace would look like this).
        std::fs::write(autotest.join("helper.glm"), "").unwrap();
        std::fs::write(autotest.join("test_notes.txt"), "").unwrap();
        std::fs::create_dir(autotest.join("test_c.glm")).unwrap();

        let nested = root.join("market/deeper/autotest");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("test_opt_n.glm"), "").unwrap();

        // Not inside an autotest directory.
        std::fs::write(root.join("powerflow/test_d.glm"), "").unwrap();

        let list = TestList::discover(root).unwrap();
        let names: Vec<_> = list.iter().map(TestCase::file_name).collect();
        assert_eq!(
            names,
            ["test_opt_n.glm", "test_a.glm", "test_b.glm"],
            "market sorts before powerflow; files sorted within each dir"
        );
        assert!(list.iter().all(|test| test.autotest_dir().is_absolute()));
    }

    #[test]
    fn discover_empty_tree() {
        let temp = camino_tempfile::tempdir().unwrap();
        let list = TestList::discover(temp.path()).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn discover_missing_root_is_an_error() {
        let temp = camino_tempfile::tempdir().unwrap();
        let result = TestList::discover(&temp.path().join("no-such-dir"));
        assert!(matches!(result, Err(TestListError::RootDir { .. })));
    }
}
