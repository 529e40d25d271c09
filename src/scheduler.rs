//! Frame scheduler lifecycle.
//!
//! The host owns the actual display callback (requestAnimationFrame, a game
//! loop, a timer). Each callback hands its timestamp to
//! [`FrameScheduler::begin_frame`], which turns it into a capped time step or
//! refuses the frame when the scheduler is not running. A refused frame tells
//! the host not to request another one, so a stopped scheduler never revives
//! itself from a callback that was already in flight.

/// Largest step handed to the simulation, in seconds.
///
/// Longer gaps (tab in background, debugger pause) are treated as this long.
pub const MAX_FRAME_DT: f32 = 1.0 / 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    /// Timestamp of the previous accepted frame, in milliseconds.
    last_timestamp: Option<f64>,
    disposed: bool,
    frames: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Stopped,
            last_timestamp: None,
            disposed: false,
            frames: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Frames accepted since creation.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Enter `Running`. Returns true if the state changed.
    ///
    /// Has no effect once disposed.
    pub fn start(&mut self) -> bool {
        if self.disposed || self.state == SchedulerState::Running {
            return false;
        }
        log::debug!("frame scheduler started");
        self.state = SchedulerState::Running;
        self.last_timestamp = None;
        true
    }

    /// Enter `Stopped`. Idempotent; returns true if the state changed.
    pub fn stop(&mut self) -> bool {
        if self.state == SchedulerState::Stopped {
            return false;
        }
        log::debug!("frame scheduler stopped after {} frames", self.frames);
        self.state = SchedulerState::Stopped;
        self.last_timestamp = None;
        true
    }

    /// Stop permanently. Later `start` calls are ignored.
    pub fn dispose(&mut self) {
        self.stop();
        self.disposed = true;
    }

    /// Accept a display callback at `now_ms`.
    ///
    /// Returns the step in seconds, `0` for the first frame after a start and
    /// never more than [`MAX_FRAME_DT`]. Returns `None` when not running.
    pub fn begin_frame(&mut self, now_ms: f64) -> Option<f32> {
        if self.state != SchedulerState::Running {
            return None;
        }
        let dt = match self.last_timestamp {
            Some(last) if now_ms.is_finite() => ((now_ms - last) / 1000.0) as f32,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_timestamp = Some(now_ms);
        }
        self.frames += 1;
        Some(dt.clamp(0.0, MAX_FRAME_DT))
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_scheduler_refuses_frames() {
        let mut scheduler = FrameScheduler::new();
        assert_eq!(scheduler.begin_frame(16.0), None);
        assert_eq!(scheduler.frame_count(), 0);
    }

    #[test]
    fn test_dt_measured_and_capped() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.start());
        assert_eq!(scheduler.begin_frame(1000.0), Some(0.0));

        let dt = scheduler.begin_frame(1016.0).unwrap();
        assert!((dt - 0.016).abs() < 1e-6);

        // A five second pause is capped.
        assert_eq!(scheduler.begin_frame(6016.0), Some(MAX_FRAME_DT));

        // Clock going backwards never yields a negative step.
        assert_eq!(scheduler.begin_frame(6000.0), Some(0.0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut scheduler = FrameScheduler::new();
        scheduler.start();
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.begin_frame(10.0), None);
    }

    #[test]
    fn test_restart_resets_clock() {
        let mut scheduler = FrameScheduler::new();
        scheduler.start();
        scheduler.begin_frame(0.0);
        scheduler.stop();
        scheduler.start();
        assert_eq!(scheduler.begin_frame(10_000.0), Some(0.0));
    }

    #[test]
    fn test_dispose_prevents_restart() {
        let mut scheduler = FrameScheduler::new();
        scheduler.start();
        scheduler.dispose();
        assert!(scheduler.is_disposed());
        assert!(!scheduler.start());
        assert_eq!(scheduler.begin_frame(16.0), None);
    }
}
