//! Metrics capture for tests.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::fixture;

/// Local metrics recorder and the snapshotter reading it.
pub struct Counters {
    recorder: DebuggingRecorder,
    snapshotter: Snapshotter,
}

impl Counters {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        Self {
            recorder,
            snapshotter,
        }
    }

    /// Run `f` with this recorder installed on the current thread.
    pub fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.recorder, f)
    }

    /// Sum of every counter called `name`, across all label sets.
    #[must_use]
    pub fn total(&self, name: &str) -> u64 {
        self.snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == name)
            .map(|(.., value)| match value {
                DebugValue::Counter(count) => count,
                _ => 0,
            })
            .sum()
    }

    /// Value of the counter called `name` carrying label `label=value`.
    #[must_use]
    pub fn labelled(&self, name: &str, label: &str, value: &str) -> u64 {
        self.snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| {
                key.key().name() == name
                    && key
                        .key()
                        .labels()
                        .any(|l| l.key() == label && l.value() == value)
            })
            .map(|(.., value)| match value {
                DebugValue::Counter(count) => count,
                _ => 0,
            })
            .sum()
    }
}

impl Default for Counters {
    fn default() -> Self { Self::new() }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn counters() -> Counters { Counters::new() }
