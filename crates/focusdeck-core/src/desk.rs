use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::focus::FocusSettingsPatch;
use crate::store::TaskStore;
use crate::timer::{FocusTimer, Tick};
use crate::views::{self, View};

/// Owns the store and the focus timer that operates on it.
#[derive(Debug)]
pub struct Desk {
    pub store: TaskStore,
    pub timer: FocusTimer,
    clock: Arc<dyn Clock>,
}

impl Default for Desk {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::default()))
    }
}

impl Desk {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let store = TaskStore::new();
        let timer = FocusTimer::new(&store.focus());
        Self {
            store,
            timer,
            clock,
        }
    }

    pub fn with_store(store: TaskStore, clock: Arc<dyn Clock>) -> Self {
        let timer = FocusTimer::new(&store.focus());
        Self {
            store,
            timer,
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Begins focusing on the first open task of `view`. Refuses when the
    /// view has nothing left to do.
    #[instrument(skip(self))]
    pub fn enter_focus(&mut self, view: &View) -> anyhow::Result<()> {
        let today = self.clock.today();
        let snapshot = self.store.snapshot();
        let candidates = views::focus_candidates(view, &snapshot.tasks, today);
        let Some(first) = candidates.first() else {
            return Err(anyhow!("no uncompleted tasks to focus on"));
        };

        let already_on_open_task = snapshot.focus.is_active
            && snapshot
                .current_task()
                .is_some_and(|t| !t.completed);
        if already_on_open_task {
            debug!("focus already active; keeping current task");
        } else {
            let id = first.id;
            self.store.start_focus_mode(id);
            info!(task = %id, candidates = candidates.len(), "entered focus mode");
        }
        self.timer.refresh(&self.store.focus());
        Ok(())
    }

    pub fn leave_focus(&mut self) {
        self.timer.pause();
        self.store.stop_focus_mode();
        self.timer.refresh(&self.store.focus());
    }

    pub fn start_timer(&mut self) -> bool {
        if !self.store.focus().is_active {
            debug!("no active focus session; timer stays idle");
            return false;
        }
        self.timer.start()
    }

    pub fn pause_timer(&mut self) -> bool {
        self.timer.pause()
    }

    pub fn tick(&mut self) -> Tick {
        self.timer.tick(&mut self.store)
    }

    pub fn skip(&mut self) {
        self.timer.skip(&mut self.store);
    }

    pub fn complete(&mut self) {
        self.timer.complete(&mut self.store);
    }

    pub fn set_focus_settings(&mut self, patch: FocusSettingsPatch) {
        self.store.set_focus_settings(patch);
        self.timer.refresh(&self.store.focus());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::Desk;
    use crate::clock::FixedClock;
    use crate::focus::FocusSettingsPatch;
    use crate::task::TaskDraft;
    use crate::timer::TimerState;
    use crate::views::View;

    fn desk_at_noon() -> Desk {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 16, 12, 0, 0)
            .single()
            .expect("valid now");
        Desk::new(Arc::new(FixedClock::at(now)))
    }

    #[test]
    fn refuses_to_focus_an_empty_view() {
        let mut desk = desk_at_noon();
        let a = desk.store.add_task(TaskDraft::new("a"));
        desk.store.toggle_task(a.id);
        assert!(desk.enter_focus(&View::All).is_err());
        assert!(!desk.store.focus().is_active);
    }

    #[test]
    fn today_view_focuses_on_first_task_due_today() {
        let mut desk = desk_at_noon();
        let now = desk.clock().now();
        desk.store.add_task(TaskDraft::new("later").due(now + Duration::days(2)));
        let today = desk.store.add_task(TaskDraft::new("today").due(now));

        desk.enter_focus(&View::Today).expect("has candidates");
        let focus = desk.store.focus();
        assert_eq!(focus.current_task_id, Some(today.id));
        assert_eq!(focus.current_session, 1);
        assert_eq!(desk.timer.time_left(), 1500);

        desk.enter_focus(&View::Today).expect("still has candidates");
        assert_eq!(desk.store.focus().current_session, 1);
    }

    #[test]
    fn today_view_uses_the_clock_zone() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 16, 12, 0, 0)
            .single()
            .expect("valid now");
        let late_utc = now + Duration::hours(11) + Duration::minutes(30);

        let mut utc_desk = Desk::new(Arc::new(FixedClock::at(now)));
        utc_desk.store.add_task(TaskDraft::new("late call").due(late_utc));
        assert!(utc_desk.enter_focus(&View::Today).is_ok());

        let mut tokyo_desk =
            Desk::new(Arc::new(FixedClock::at(now).in_zone(chrono_tz::Asia::Tokyo)));
        tokyo_desk.store.add_task(TaskDraft::new("late call").due(late_utc));
        assert!(tokyo_desk.enter_focus(&View::Today).is_err());
        assert!(!tokyo_desk.store.focus().is_active);
    }

    #[test]
    fn timer_needs_an_active_session() {
        let mut desk = desk_at_noon();
        desk.store.add_task(TaskDraft::new("a"));
        assert!(!desk.start_timer());
        desk.enter_focus(&View::Inbox).expect("has candidates");
        assert!(desk.start_timer());
        assert_eq!(desk.timer.state(), TimerState::Running);

        desk.leave_focus();
        assert_eq!(desk.timer.state(), TimerState::Idle);
        assert_eq!(desk.store.focus().current_session, 0);
    }

    #[test]
    fn settings_change_resets_idle_countdown() {
        let mut desk = desk_at_noon();
        desk.store.add_task(TaskDraft::new("a"));
        desk.enter_focus(&View::All).expect("has candidates");
        desk.set_focus_settings(FocusSettingsPatch {
            work_duration: Some(45),
            ..FocusSettingsPatch::default()
        });
        assert_eq!(desk.timer.time_left(), 45 * 60);
    }
}
