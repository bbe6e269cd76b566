use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::{DatasetIndex, YearAggregate};
use crate::playback::PlaybackPhase;

/// Injected render target for everything that changes with the current year.
///
/// `render_year` hands over the year value alongside the aggregate because
/// the map layer filters raw records by year itself; the aggregate alone
/// covers the charts and labels. Implementations must tolerate repeated
/// calls with identical data.
pub trait RenderSink {
    fn render_year(&mut self, year: i32, aggregate: &YearAggregate);

    /// Push a programmatic index change to the scrub control so its
    /// displayed value stays in sync. Not called for user-originated
    /// changes, which the control already shows.
    fn sync_scrub(&mut self, index: usize);
}

/// Single source of truth for which year is displayed, and the sole driver
/// of time-based auto-advance.
///
/// The controller never reads the clock itself; callers pass `now` into the
/// time-sensitive operations, so the GUI drives it with `Instant::now()`
/// each frame and tests drive it with a virtual clock. The pending timer is
/// the `deadline` field: `Some` while exactly one tick is scheduled, `None`
/// while paused, so cancellation is a plain overwrite and can never leak a
/// second timer.
pub struct PlaybackController {
    index: DatasetIndex,
    current_index: usize,
    phase: PlaybackPhase,
    deadline: Option<Instant>,
    delay: Duration,
}

impl PlaybackController {
    pub fn new(index: DatasetIndex, delay: Duration) -> Self {
        Self {
            index,
            current_index: 0,
            phase: PlaybackPhase::Paused,
            deadline: None,
            delay,
        }
    }

    /// Begin playback: render index 0 synchronously, then schedule the
    /// first tick. With an empty dataset this is a no-op and the controller
    /// stays permanently inert.
    pub fn start(&mut self, now: Instant, sink: &mut dyn RenderSink) {
        if self.index.is_empty() {
            debug!("no years loaded, playback stays inert");
            return;
        }
        self.phase = PlaybackPhase::Playing;
        self.go_to(0, false, sink);
        self.deadline = Some(now + self.delay);
    }

    /// Poll the scheduled tick. Fires at most once per call: if the clock
    /// jumped several intervals the tick is simply late, never doubled.
    pub fn update(&mut self, now: Instant, sink: &mut dyn RenderSink) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }
        let Some(deadline) = self.deadline else { return };
        if now < deadline {
            return;
        }

        let next = (self.current_index + 1) % self.index.len();
        self.go_to(next, false, sink);
        // fixed-delay: reschedule after the render, relative to now
        self.deadline = Some(now + self.delay);
    }

    /// Toggle between Playing and Paused. Pausing cancels the pending tick;
    /// resuming schedules a fresh full delay rather than picking up a
    /// partially elapsed one.
    pub fn toggle_play_pause(&mut self, now: Instant) {
        if self.index.is_empty() {
            return;
        }
        match self.phase {
            PlaybackPhase::Playing => {
                self.phase = PlaybackPhase::Paused;
                self.deadline = None;
            }
            PlaybackPhase::Paused => {
                self.phase = PlaybackPhase::Playing;
                self.deadline = Some(now + self.delay);
            }
        }
    }

    /// User moved the scrub control. Always pauses first, so a tick that
    /// was in flight can never overwrite the user's choice, then shows the
    /// requested index.
    pub fn scrub(&mut self, index: usize, sink: &mut dyn RenderSink) {
        if self.index.is_empty() {
            return;
        }
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Paused;
            self.deadline = None;
        }
        self.go_to(index, true, sink);
    }

    /// Step one year forward. Stepping is a manual operation: it pauses,
    /// and clamps at the last year instead of wrapping.
    pub fn step_forward(&mut self, sink: &mut dyn RenderSink) {
        if self.index.is_empty() {
            return;
        }
        self.phase = PlaybackPhase::Paused;
        self.deadline = None;
        self.go_to(self.current_index.saturating_add(1), false, sink);
    }

    /// Step one year back; pauses and clamps at the first year.
    pub fn step_back(&mut self, sink: &mut dyn RenderSink) {
        if self.index.is_empty() {
            return;
        }
        self.phase = PlaybackPhase::Paused;
        self.deadline = None;
        self.go_to(self.current_index.saturating_sub(1), false, sink);
    }

    /// Clamp `index` into bounds, make it current, and notify the sink.
    /// Programmatic changes also push the new index to the scrub control.
    fn go_to(&mut self, index: usize, from_user: bool, sink: &mut dyn RenderSink) {
        let index = index.min(self.index.len() - 1);
        self.current_index = index;

        let year = self.index.years()[index];
        // every indexed year has an aggregate by construction
        let Some(aggregate) = self.index.aggregate(year) else {
            return;
        };
        sink.render_year(year, aggregate);

        if !from_user {
            sink.sync_scrub(index);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Year currently displayed, if any data is loaded.
    pub fn current_year(&self) -> Option<i32> {
        self.index.years().get(self.current_index).copied()
    }

    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CollisionRecord;
    use chrono::NaiveTime;

    /// Sink that records every callback it receives.
    #[derive(Default)]
    struct RecordingSink {
        renders: Vec<(i32, YearAggregate)>,
        scrub_syncs: Vec<usize>,
    }

    impl RenderSink for RecordingSink {
        fn render_year(&mut self, year: i32, aggregate: &YearAggregate) {
            self.renders.push((year, aggregate.clone()));
        }

        fn sync_scrub(&mut self, index: usize) {
            self.scrub_syncs.push(index);
        }
    }

    fn record(year: i32, hour: u32) -> CollisionRecord {
        CollisionRecord {
            year: Some(year),
            date: None,
            time: NaiveTime::from_hms_opt(hour, 0, 0),
            longitude: None,
            latitude: None,
        }
    }

    fn controller(years: &[i32]) -> PlaybackController {
        let records = years.iter().map(|&y| record(y, 8)).collect();
        PlaybackController::new(DatasetIndex::build(records), TICK_DELAY)
    }

    const TICK_DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn start_renders_index_zero_and_syncs_scrubber() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();

        ctrl.start(t0, &mut sink);

        assert!(ctrl.is_playing());
        assert_eq!(ctrl.current_index(), 0);
        assert_eq!(sink.renders.len(), 1);
        assert_eq!(sink.renders[0].0, 2018);
        assert_eq!(sink.scrub_syncs, vec![0]);
    }

    #[test]
    fn tick_advances_after_delay_but_not_before() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        ctrl.update(t0 + Duration::from_millis(999), &mut sink);
        assert_eq!(ctrl.current_index(), 0);
        assert_eq!(sink.renders.len(), 1);

        ctrl.update(t0 + Duration::from_millis(1000), &mut sink);
        assert_eq!(ctrl.current_index(), 1);
        assert_eq!(sink.renders.len(), 2);
        assert_eq!(sink.renders[1].0, 2019);
        assert_eq!(sink.scrub_syncs, vec![0, 1]);
    }

    #[test]
    fn auto_advance_wraps_from_last_year_to_first() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);
        ctrl.scrub(2, &mut sink);
        ctrl.toggle_play_pause(t0);
        assert!(ctrl.is_playing());

        ctrl.update(t0 + TICK_DELAY, &mut sink);

        assert_eq!(ctrl.current_index(), 0);
        assert_eq!(sink.renders.last().unwrap().0, 2018);
    }

    #[test]
    fn late_poll_fires_once_and_reschedules_from_now() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        // clock jumps five intervals; a single poll advances one year only
        let late = t0 + TICK_DELAY * 5;
        ctrl.update(late, &mut sink);
        assert_eq!(ctrl.current_index(), 1);

        // next tick is a full delay after the late poll, not t0 + 2*delay
        ctrl.update(late + Duration::from_millis(999), &mut sink);
        assert_eq!(ctrl.current_index(), 1);
        ctrl.update(late + TICK_DELAY, &mut sink);
        assert_eq!(ctrl.current_index(), 2);
    }

    #[test]
    fn pause_suppresses_renders_across_many_intervals() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        ctrl.toggle_play_pause(t0 + Duration::from_millis(10));
        assert!(!ctrl.is_playing());
        let renders_before = sink.renders.len();

        for i in 1..=5 {
            ctrl.update(t0 + TICK_DELAY * i, &mut sink);
        }
        assert_eq!(sink.renders.len(), renders_before);
        assert_eq!(ctrl.current_index(), 0);
    }

    #[test]
    fn resume_schedules_a_fresh_full_delay() {
        let mut ctrl = controller(&[2018, 2019]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        // pause just before the tick would have fired
        let pause_at = t0 + Duration::from_millis(900);
        ctrl.toggle_play_pause(pause_at);
        let resume_at = t0 + Duration::from_millis(5000);
        ctrl.toggle_play_pause(resume_at);

        // the stale deadline must not fire; only a full delay after resume
        ctrl.update(resume_at + Duration::from_millis(999), &mut sink);
        assert_eq!(ctrl.current_index(), 0);
        ctrl.update(resume_at + TICK_DELAY, &mut sink);
        assert_eq!(ctrl.current_index(), 1);
    }

    #[test]
    fn scrub_while_playing_pauses_and_renders_target() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        ctrl.scrub(1, &mut sink);

        assert!(!ctrl.is_playing());
        assert_eq!(ctrl.current_index(), 1);
        assert_eq!(sink.renders.last().unwrap().0, 2019);

        // the cancelled tick must not revert the index
        ctrl.update(t0 + TICK_DELAY * 2, &mut sink);
        assert_eq!(ctrl.current_index(), 1);
    }

    #[test]
    fn scrub_does_not_echo_back_to_the_control() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        ctrl.start(Instant::now(), &mut sink);
        let syncs_before = sink.scrub_syncs.len();

        ctrl.scrub(2, &mut sink);

        assert_eq!(sink.scrub_syncs.len(), syncs_before);
    }

    #[test]
    fn out_of_range_scrub_clamps() {
        let mut ctrl = controller(&[2018, 2019, 2020]);
        let mut sink = RecordingSink::default();
        ctrl.start(Instant::now(), &mut sink);

        ctrl.scrub(99, &mut sink);

        assert_eq!(ctrl.current_index(), 2);
        assert_eq!(sink.renders.last().unwrap().0, 2020);
    }

    #[test]
    fn repeated_scrub_to_same_index_renders_identical_content() {
        let mut ctrl = controller(&[2018, 2019]);
        let mut sink = RecordingSink::default();
        ctrl.start(Instant::now(), &mut sink);

        ctrl.scrub(1, &mut sink);
        ctrl.scrub(1, &mut sink);

        let n = sink.renders.len();
        assert_eq!(sink.renders[n - 1], sink.renders[n - 2]);
    }

    #[test]
    fn double_pause_is_a_safe_no_op() {
        let mut ctrl = controller(&[2018, 2019]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        ctrl.toggle_play_pause(t0);
        // scrub while already paused cancels nothing and must not panic
        ctrl.scrub(0, &mut sink);
        assert!(!ctrl.is_playing());
    }

    #[test]
    fn stepping_pauses_and_clamps_at_the_ends() {
        let mut ctrl = controller(&[2018, 2019]);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();
        ctrl.start(t0, &mut sink);

        ctrl.step_forward(&mut sink);
        assert!(!ctrl.is_playing());
        assert_eq!(ctrl.current_index(), 1);

        // clamped, no wrap on manual step
        ctrl.step_forward(&mut sink);
        assert_eq!(ctrl.current_index(), 1);

        ctrl.step_back(&mut sink);
        ctrl.step_back(&mut sink);
        assert_eq!(ctrl.current_index(), 0);
    }

    #[test]
    fn empty_dataset_is_permanently_inert() {
        let mut ctrl = PlaybackController::new(DatasetIndex::build(Vec::new()), TICK_DELAY);
        let mut sink = RecordingSink::default();
        let t0 = Instant::now();

        ctrl.start(t0, &mut sink);
        ctrl.update(t0 + TICK_DELAY * 3, &mut sink);
        ctrl.toggle_play_pause(t0);
        ctrl.scrub(0, &mut sink);
        ctrl.step_forward(&mut sink);

        assert!(!ctrl.is_playing());
        assert!(sink.renders.is_empty());
        assert!(sink.scrub_syncs.is_empty());
        assert_eq!(ctrl.current_year(), None);
    }
}
