use std::time::Duration;

/// How the next frame of a running session should be scheduled.
///
/// The pacing is re-decided on every single frame: a loop may return
/// `After` on one frame and `OnRefresh` on the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePacing {
    /// Run the next frame on the next display refresh. The default for
    /// continuous animation.
    OnRefresh,
    /// Run the next frame once the given delay has elapsed. Used by examples
    /// that intentionally throttle, e.g. to make many random draws visible.
    After(Duration),
}

/// Identifies one pending scheduled continuation.
///
/// Tokens are never reused; a fired callback whose token no longer matches
/// the pending one belongs to a superseded session and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleToken(pub u64);

/// The frame clock consumed by the driver.
///
/// At most one continuation is outstanding at a time; scheduling a new one
/// implicitly replaces the previous, and [`cancel`](FrameScheduler::cancel)
/// discards it explicitly. The shell maps this onto the windowing system's
/// redraw requests and wait deadlines.
pub trait FrameScheduler {
    fn schedule_after(&mut self, delay: Duration) -> ScheduleToken;
    fn schedule_on_refresh(&mut self) -> ScheduleToken;
    fn cancel(&mut self, token: ScheduleToken);
}
