// Copyright (c) The glm-validate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stopwatch for tracking how long solver runs take.
//!
//! Runs need both a start time and a duration: the start time is compared
//! against artifact modification times, while the duration is reported with
//! each verdict. For that we use a combination of a realtime clock
//! (`DateTime<Local>`) and a monotonic clock (`Instant`).

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

pub(crate) fn stopwatch() -> StopwatchStart {
    StopwatchStart::new()
}

/// The start state of a stopwatch.
#[derive(Clone, Debug)]
pub(crate) struct StopwatchStart {
    start_time: DateTime<Local>,
    instant: Instant,
}

impl StopwatchStart {
    fn new() -> Self {
        Self {
            // These two syscalls happen imperceptibly close to each other,
            // which is good enough for our purposes.
            start_time: Local::now(),
            instant: Instant::now(),
        }
    }

    pub(crate) fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchSnapshot {
            start_time: self.start_time,
            duration: self.instant.elapsed(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct StopwatchSnapshot {
    pub(crate) start_time: DateTime<Local>,
    pub(crate) duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwatch_measures_elapsed_time() {
        let start = stopwatch();
        std::thread::sleep(Duration::from_millis(20));
        let end = start.snapshot();
        assert!(
            end.duration >= Duration::from_millis(20),
            "elapsed duration {:?} is at least 20ms",
            end.duration
        );
        assert!(end.start_time <= Local::now());
    }
}
