// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by validate-runner.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurred while discovering test model files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestListError {
    /// The scan root could not be read.
    #[error("failed to read scan root `{path}`")]
    RootDir {
        /// The scan root.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The scan root exists but is not a directory.
    #[error("scan root `{path}` is not a directory")]
    RootNotADirectory {
        /// The scan root.
        path: Utf8PathBuf,
    },

    /// An autotest directory could not be listed.
    #[error("failed to list autotest directory `{path}`")]
    ReadAutotestDir {
        /// The autotest directory.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while preparing a test workspace.
///
/// These never abort a run: the affected test is classified as an exception
/// and the runner moves on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkspaceSetupError {
    /// The workspace directory could not be created.
    #[error("failed to create test workspace `{path}`")]
    CreateDir {
        /// The workspace directory.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A stale success marker could not be removed.
    #[error("failed to remove stale success marker `{path}`")]
    RemoveMarker {
        /// The marker path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The model file could not be copied into the workspace.
    #[error("failed to copy model file `{from}` to `{to}`")]
    CopyModel {
        /// The discovered model file.
        from: Utf8PathBuf,
        /// The destination inside the workspace.
        to: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while writing a report event.
#[derive(Debug, Error)]
pub enum WriteEventError {
    /// An I/O error occurred while writing the event.
    #[error("error writing to output")]
    Io(#[source] io::Error),
}

/// An error that occurred while archiving failed test workspaces.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// The archive file could not be created.
    #[error("failed to create archive `{path}`")]
    Create {
        /// The archive path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A workspace directory could not be added to the archive.
    #[error("failed to add `{dir}` to archive `{path}`")]
    Append {
        /// The archive path.
        path: Utf8PathBuf,
        /// The workspace directory being archived.
        dir: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The archive could not be finished.
    #[error("failed to finish archive `{path}`")]
    Finish {
        /// The archive path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}
