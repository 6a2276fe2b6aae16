//! Scheduler configuration.

use std::time::Duration;

/// Minimum time a slice must still have left for another unit of work to
/// start.
pub const DEFAULT_SLACK: Duration = Duration::from_millis(1);

/// Default length of one frame slice (~60fps).
pub const DEFAULT_FRAME_BUDGET: Duration = Duration::from_nanos(16_666_667);

/// Builder-style configuration for a [`Root`](crate::Root).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fibra::SchedulerConfig;
///
/// let config = SchedulerConfig::new()
///     .slack(Duration::from_micros(500))
///     .frame_budget(Duration::from_millis(8));
/// assert_eq!(config.slack_duration(), Duration::from_micros(500));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    slack: Duration,
    frame_budget: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Configuration with default settings.
    ///
    /// Defaults:
    /// - `slack`: 1ms
    /// - `frame_budget`: ~16.7ms
    pub const fn new() -> Self {
        Self {
            slack: DEFAULT_SLACK,
            frame_budget: DEFAULT_FRAME_BUDGET,
        }
    }

    /// Set the slack threshold.
    ///
    /// The work loop starts another unit only while the slice reports more
    /// than this much time remaining.
    ///
    /// Default: 1ms
    pub const fn slack(mut self, duration: Duration) -> Self {
        self.slack = duration;
        self
    }

    /// Set the slice length used by [`FramePacer`](crate::FramePacer).
    ///
    /// Default: ~16.7ms (~60fps)
    pub const fn frame_budget(mut self, duration: Duration) -> Self {
        self.frame_budget = duration;
        self
    }

    /// Configured slack threshold.
    pub const fn slack_duration(&self) -> Duration {
        self.slack
    }

    /// Configured frame length.
    pub const fn frame_budget_duration(&self) -> Duration {
        self.frame_budget
    }
}
