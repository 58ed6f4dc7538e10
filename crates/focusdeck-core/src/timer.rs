use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::focus::{FocusState, Segment};
use crate::store::TaskStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

/// Raised when a segment runs out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerEvent {
    BreakStarted { long: bool, session: u32 },
    BreakFinished { session: u32 },
    SessionEnded,
}

impl TimerEvent {
    pub fn title(&self) -> &'static str {
        match self {
            TimerEvent::BreakStarted { .. } => "Time for a break!",
            TimerEvent::BreakFinished { .. } => "Break finished!",
            TimerEvent::SessionEnded => "Focus session ended",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TimerEvent::BreakStarted { long: true, .. } => "You've earned a long break.",
            TimerEvent::BreakStarted { long: false, .. } => "Take a short break.",
            TimerEvent::BreakFinished { .. } => "Time to get back to work.",
            TimerEvent::SessionEnded => "No task left to focus on.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing happened.
    Ignored,
    Counted { time_left: u32 },
    Expired(TimerEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    state: TimerState,
    time_left: u32,
}

impl FocusTimer {
    pub fn new(focus: &FocusState) -> Self {
        Self {
            state: TimerState::Idle,
            time_left: focus.target_seconds(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn start(&mut self) -> bool {
        match self.state {
            TimerState::Idle | TimerState::Paused | TimerState::Expired => {
                debug!(from = ?self.state, time_left = self.time_left, "timer started");
                self.state = TimerState::Running;
                true
            }
            TimerState::Running => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        debug!(time_left = self.time_left, "timer paused");
        self.state = TimerState::Paused;
        true
    }

    /// Re-derives the countdown from the current segment unless it is
    /// running.
    pub fn refresh(&mut self, focus: &FocusState) {
        if self.is_running() {
            return;
        }
        self.time_left = focus.target_seconds();
        if !focus.is_active {
            self.state = TimerState::Idle;
        }
    }

    #[instrument(level = "trace", skip(self, store), fields(time_left = self.time_left))]
    pub fn tick(&mut self, store: &mut TaskStore) -> Tick {
        if !self.is_running() {
            return Tick::Ignored;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return Tick::Counted {
                time_left: self.time_left,
            };
        }

        let event = self.expire(store);
        Tick::Expired(event)
    }

    fn expire(&mut self, store: &mut TaskStore) -> TimerEvent {
        let focus = store.focus();
        self.state = TimerState::Expired;

        if focus.is_break {
            let resumed = focus
                .current_task_id
                .is_some_and(|id| store.start_focus_mode(id));
            if !resumed {
                store.stop_focus_mode();
                self.state = TimerState::Idle;
                self.time_left = store.focus().target_seconds();
                info!("break ended without a task to resume");
                return TimerEvent::SessionEnded;
            }
            let focus = store.focus();
            self.time_left = focus.settings.work_duration.saturating_mul(60);
            info!(session = focus.current_session, "break finished");
            TimerEvent::BreakFinished {
                session: focus.current_session,
            }
        } else {
            let long = focus.settings.is_long_break_due(focus.current_session);
            store.start_break();
            let focus = store.focus();
            self.time_left = focus.target_seconds();
            info!(session = focus.current_session, long, "work segment finished");
            TimerEvent::BreakStarted {
                long,
                session: focus.current_session,
            }
        }
    }

    pub fn skip(&mut self, store: &mut TaskStore) {
        store.skip_task();
        self.after_advance(store);
    }

    pub fn complete(&mut self, store: &mut TaskStore) {
        store.complete_current_task();
        self.after_advance(store);
    }

    fn after_advance(&mut self, store: &TaskStore) {
        let focus = store.focus();
        self.time_left = focus.settings.work_duration.saturating_mul(60);
        if !focus.is_active {
            self.state = TimerState::Idle;
        }
    }

    pub fn display(&self) -> String {
        format_clock(self.time_left)
    }

    /// Fraction of the current segment already elapsed.
    pub fn progress(&self, focus: &FocusState) -> f64 {
        let total = focus.target_seconds();
        if total == 0 {
            return 1.0;
        }
        let elapsed = total.saturating_sub(self.time_left);
        (f64::from(elapsed) / f64::from(total)).clamp(0.0, 1.0)
    }

    pub fn segment(&self, focus: &FocusState) -> Segment {
        Segment::of(focus)
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::{FocusTimer, Tick, TimerEvent, TimerState, format_clock};
    use crate::focus::FocusSettingsPatch;
    use crate::store::TaskStore;
    use crate::task::TaskDraft;

    fn store_with_tasks(titles: &[&str]) -> TaskStore {
        let mut store = TaskStore::new();
        for title in titles {
            store.add_task(TaskDraft::new(*title));
        }
        store
    }

    fn run_for(timer: &mut FocusTimer, store: &mut TaskStore, ticks: u32) -> Option<TimerEvent> {
        let mut last = None;
        for _ in 0..ticks {
            if let Tick::Expired(event) = timer.tick(store) {
                last = Some(event);
            }
        }
        last
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn idle_and_paused_timers_do_not_count() {
        let mut store = store_with_tasks(&["a"]);
        let id = store.tasks()[0].id;
        store.start_focus_mode(id);
        let mut timer = FocusTimer::new(&store.focus());

        assert_eq!(timer.tick(&mut store), Tick::Ignored);
        assert!(timer.start());
        assert_eq!(timer.tick(&mut store), Tick::Counted { time_left: 1499 });
        assert!(timer.pause());
        assert_eq!(timer.tick(&mut store), Tick::Ignored);
        assert_eq!(timer.time_left(), 1499);
        assert_eq!(timer.state(), TimerState::Paused);
    }

    #[test]
    fn work_expiry_starts_a_short_break() {
        let mut store = store_with_tasks(&["a"]);
        let id = store.tasks()[0].id;
        store.start_focus_mode(id);
        let mut timer = FocusTimer::new(&store.focus());
        assert_eq!(timer.time_left(), 1500);
        timer.start();

        let event = run_for(&mut timer, &mut store, 1500);
        assert_eq!(event, Some(TimerEvent::BreakStarted { long: false, session: 1 }));
        assert!(store.focus().is_break);
        assert_eq!(timer.time_left(), 300);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(event.map(|e| e.message()), Some("Take a short break."));
    }

    #[test]
    fn break_expiry_resumes_work_on_same_task() {
        let mut store = store_with_tasks(&["a", "b"]);
        let id = store.tasks()[0].id;
        store.start_focus_mode(id);
        store.start_break();
        let mut timer = FocusTimer::new(&store.focus());
        assert_eq!(timer.time_left(), 300);
        timer.start();

        let event = run_for(&mut timer, &mut store, 300);
        assert_eq!(event, Some(TimerEvent::BreakFinished { session: 2 }));
        let focus = store.focus();
        assert!(!focus.is_break);
        assert_eq!(focus.current_task_id, Some(id));
        assert_eq!(timer.time_left(), 1500);
    }

    #[test]
    fn expired_timer_waits_for_start() {
        let mut store = store_with_tasks(&["a"]);
        store.set_focus_settings(FocusSettingsPatch {
            work_duration: Some(1),
            ..FocusSettingsPatch::default()
        });
        let id = store.tasks()[0].id;
        store.start_focus_mode(id);
        let mut timer = FocusTimer::new(&store.focus());
        timer.start();
        run_for(&mut timer, &mut store, 60);
        assert_eq!(timer.tick(&mut store), Tick::Ignored);
        assert!(timer.start());
        assert_eq!(timer.tick(&mut store), Tick::Counted { time_left: 299 });
    }

    #[test]
    fn skip_and_done_reset_to_work_duration() {
        let mut store = store_with_tasks(&["a", "b", "c"]);
        let ids: Vec<_> = store.tasks().iter().map(|t| t.id).collect();
        store.start_focus_mode(ids[0]);
        let mut timer = FocusTimer::new(&store.focus());
        timer.start();
        run_for(&mut timer, &mut store, 10);

        timer.skip(&mut store);
        assert_eq!(timer.time_left(), 1500);
        assert!(timer.is_running());
        assert_eq!(store.focus().current_task_id, Some(ids[1]));

        timer.complete(&mut store);
        assert_eq!(store.focus().current_task_id, Some(ids[2]));
        assert!(store.task(ids[1]).expect("b").completed);

        timer.complete(&mut store);
        assert!(!store.focus().is_active);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut store = store_with_tasks(&["a"]);
        store.set_focus_settings(FocusSettingsPatch {
            work_duration: Some(1),
            ..FocusSettingsPatch::default()
        });
        let id = store.tasks()[0].id;
        store.start_focus_mode(id);
        let mut timer = FocusTimer::new(&store.focus());
        assert_eq!(timer.progress(&store.focus()), 0.0);
        timer.start();
        run_for(&mut timer, &mut store, 15);
        assert!((timer.progress(&store.focus()) - 0.25).abs() < f64::EPSILON);

        store.set_focus_settings(FocusSettingsPatch {
            work_duration: Some(0),
            ..FocusSettingsPatch::default()
        });
        assert_eq!(timer.progress(&store.focus()), 1.0);
    }

    #[test]
    fn refresh_only_applies_when_not_running() {
        let mut store = store_with_tasks(&["a"]);
        let id = store.tasks()[0].id;
        store.start_focus_mode(id);
        let mut timer = FocusTimer::new(&store.focus());
        store.set_focus_settings(FocusSettingsPatch {
            work_duration: Some(50),
            ..FocusSettingsPatch::default()
        });
        timer.refresh(&store.focus());
        assert_eq!(timer.time_left(), 3000);

        timer.start();
        store.set_focus_settings(FocusSettingsPatch {
            work_duration: Some(10),
            ..FocusSettingsPatch::default()
        });
        timer.refresh(&store.focus());
        assert_eq!(timer.time_left(), 3000);
    }
}
