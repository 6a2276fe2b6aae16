//! Time slices granted by the host.
//!
//! The work loop never decides on its own when to stop: it asks a
//! [`Deadline`] how much time is left before every unit of work and returns to
//! its caller once the remaining time drops to the configured slack. A
//! [`YieldPoint`] hands out those deadlines, one per slice, and is where a host
//! plugs in its own frame or idle-time scheduling.
//!
//! Two yield points ship with the crate:
//! - [`FramePacer`] grants one slice per frame, waiting for the next frame
//!   boundary between slices,
//! - [`Unbounded`] never runs out of time, which turns the loop into a
//!   synchronous run-to-completion pass.

use crate::config::SchedulerConfig;
use std::time::{Duration, Instant};

/// Remaining time of the current slice.
pub trait Deadline {
    /// Time left before the slice must end.
    fn time_remaining(&self) -> Duration;

    /// Whether the slice was granted because a timeout elapsed rather than
    /// because the host was idle.
    fn did_timeout(&self) -> bool {
        false
    }
}

impl<D: Deadline + ?Sized> Deadline for &D {
    fn time_remaining(&self) -> Duration {
        (**self).time_remaining()
    }

    fn did_timeout(&self) -> bool {
        (**self).did_timeout()
    }
}

/// Source of slices for [`Root::run`](crate::Root::run).
pub trait YieldPoint {
    /// Deadline type of the granted slices.
    type Deadline: Deadline;

    /// Wait until the host grants the next slice and return its deadline.
    fn request_slice(&mut self) -> Self::Deadline;
}

/// A deadline and yield point that never runs out of time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

impl YieldPoint for Unbounded {
    type Deadline = Unbounded;

    fn request_slice(&mut self) -> Unbounded {
        Unbounded
    }
}

/// Deadline ending at a fixed instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDeadline {
    ends_at: Instant,
    did_timeout: bool,
}

impl FrameDeadline {
    /// Slice of length `budget` starting now.
    pub fn starting_now(budget: Duration) -> Self {
        Self::until(Instant::now() + budget)
    }

    /// Slice ending at `ends_at`.
    pub fn until(ends_at: Instant) -> Self {
        Self {
            ends_at,
            did_timeout: false,
        }
    }

    /// Mark the slice as granted by timeout.
    pub fn timed_out(mut self) -> Self {
        self.did_timeout = true;
        self
    }
}

impl Deadline for FrameDeadline {
    fn time_remaining(&self) -> Duration {
        self.ends_at.saturating_duration_since(Instant::now())
    }

    fn did_timeout(&self) -> bool {
        self.did_timeout
    }
}

/// Yield point granting one slice per frame.
///
/// The first slice starts immediately. Every following request sleeps until
/// the next frame boundary, so the calling thread is free between slices.
#[derive(Clone, Debug)]
pub struct FramePacer {
    frame: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    /// Pacer with frames of length `frame`.
    pub fn new(frame: Duration) -> Self {
        Self {
            frame,
            last_frame: None,
        }
    }

    /// Pacer using the configured frame budget.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.frame_budget_duration())
    }
}

impl YieldPoint for FramePacer {
    type Deadline = FrameDeadline;

    fn request_slice(&mut self) -> FrameDeadline {
        let now = Instant::now();
        let start = match self.last_frame {
            Some(last) => {
                let boundary = last + self.frame;
                if boundary > now {
                    std::thread::sleep(boundary - now);
                    boundary
                } else {
                    now
                }
            }
            None => now,
        };
        self.last_frame = Some(start);
        FrameDeadline::until(start + self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_never_runs_out() {
        assert_eq!(Unbounded.time_remaining(), Duration::MAX);
        assert!(!Unbounded.did_timeout());
    }

    #[test]
    fn frame_deadline_counts_down_to_zero() {
        let deadline = FrameDeadline::starting_now(Duration::from_secs(60));
        assert!(deadline.time_remaining() > Duration::from_secs(59));

        let expired = FrameDeadline::until(Instant::now());
        assert_eq!(expired.time_remaining(), Duration::ZERO);
        assert!(expired.timed_out().did_timeout());
    }

    #[test]
    fn frame_pacer_spaces_slices_by_one_frame() {
        let frame = Duration::from_millis(5);
        let mut pacer = FramePacer::new(frame);
        let start = Instant::now();
        let first = pacer.request_slice();
        let _second = pacer.request_slice();
        assert!(start.elapsed() >= frame);
        assert!(first.time_remaining() <= frame);
    }
}
