use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::focus::{FocusSettingsPatch, FocusState};
use crate::task::{Project, ProjectColor, ProjectPatch, Task, TaskDraft, TaskPatch};

/// One published state of the store. Subscribers only ever see whole
/// snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub focus: FocusState,
}

impl StoreSnapshot {
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.focus.current_task_id.and_then(|id| self.task(id))
    }

    fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn renumber(&mut self) {
        for (idx, task) in self.tasks.iter_mut().enumerate() {
            task.order = idx;
        }
    }

    fn known_project(&self, project_id: Option<Uuid>) -> Option<Uuid> {
        let id = project_id?;
        if self.project(id).is_some() {
            Some(id)
        } else {
            warn!(project = %id, "unknown project; filing task in inbox");
            None
        }
    }

    /// Moves focus to the next uncompleted task after the current one, or
    /// stops the session when there is none. A current task that is no
    /// longer open (completed or gone) restarts the search from the top.
    fn advance_focus(&mut self) {
        let Some(current) = self.focus.current_task_id else {
            return;
        };
        let start = self
            .tasks
            .iter()
            .position(|t| t.id == current && !t.completed)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let next = self.tasks[start..]
            .iter()
            .find(|t| !t.completed)
            .map(|t| t.id);

        match next {
            Some(id) => {
                debug!(from = %current, to = %id, "advancing focus");
                self.focus.current_task_id = Some(id);
                self.focus.is_break = false;
            }
            None => {
                info!(session = self.focus.current_session, "no task left to focus on; stopping");
                self.focus.reset();
            }
        }
    }

    fn reconcile_focus(&mut self) {
        let Some(current) = self.focus.current_task_id else {
            return;
        };
        let still_open = self.task(current).is_some_and(|t| !t.completed);
        if !still_open {
            self.advance_focus();
        }
    }
}

#[derive(Debug)]
pub struct TaskStore {
    tx: watch::Sender<Arc<StoreSnapshot>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(StoreSnapshot::default()));
        Self { tx }
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.tx.subscribe()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.snapshot().tasks.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.snapshot().projects.clone()
    }

    pub fn focus(&self) -> FocusState {
        self.snapshot().focus.clone()
    }

    pub fn task(&self, id: Uuid) -> Option<Task> {
        self.snapshot().task(id).cloned()
    }

    pub fn project(&self, id: Uuid) -> Option<Project> {
        self.snapshot().project(id).cloned()
    }

    pub fn current_task(&self) -> Option<Task> {
        self.snapshot().current_task().cloned()
    }

    fn draft(&self) -> StoreSnapshot {
        (*self.snapshot()).clone()
    }

    fn commit(&mut self, mut next: StoreSnapshot) {
        next.revision += 1;
        debug!(
            revision = next.revision,
            tasks = next.tasks.len(),
            projects = next.projects.len(),
            "publishing snapshot"
        );
        self.tx.send_replace(Arc::new(next));
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn add_task(&mut self, draft: TaskDraft) -> Task {
        let mut next = self.draft();
        let mut draft = draft;
        draft.project_id = next.known_project(draft.project_id);

        let task = Task::from_draft(draft, next.tasks.len());
        next.tasks.push(task.clone());
        next.renumber();
        self.commit(next);

        info!(id = %task.id, order = task.order, "task added");
        task
    }

    #[instrument(skip(self, patch))]
    pub fn edit_task(&mut self, id: Uuid, patch: TaskPatch) -> Option<Task> {
        let mut next = self.draft();
        let mut patch = patch;
        if let Some(project_id) = patch.project_id {
            patch.project_id = Some(next.known_project(project_id));
        }

        let Some(task) = next.task_mut(id) else {
            debug!("edit target not found; ignoring");
            return None;
        };
        task.apply_patch(patch);
        let updated = task.clone();

        next.reconcile_focus();
        self.commit(next);
        Some(updated)
    }

    #[instrument(skip(self))]
    pub fn toggle_task(&mut self, id: Uuid) -> Option<Task> {
        let mut next = self.draft();
        let Some(task) = next.task_mut(id) else {
            debug!("toggle target not found; ignoring");
            return None;
        };
        task.completed = !task.completed;
        let updated = task.clone();

        next.reconcile_focus();
        self.commit(next);
        debug!(completed = updated.completed, "task toggled");
        Some(updated)
    }

    #[instrument(skip(self))]
    pub fn delete_task(&mut self, id: Uuid) -> Option<Task> {
        let mut next = self.draft();
        let idx = match next.tasks.iter().position(|t| t.id == id) {
            Some(idx) => idx,
            None => {
                debug!("delete target not found; ignoring");
                return None;
            }
        };

        if next.focus.current_task_id == Some(id) {
            next.advance_focus();
        }
        let removed = next.tasks.remove(idx);
        next.renumber();
        next.reconcile_focus();
        self.commit(next);

        info!(remaining = self.snapshot().tasks.len(), "task deleted");
        Some(removed)
    }

    /// Indices address the full task sequence, not a filtered view.
    #[instrument(skip(self))]
    pub fn reorder_tasks(&mut self, from: usize, to: usize) -> bool {
        let mut next = self.draft();
        let len = next.tasks.len();
        if from >= len {
            debug!(len, "reorder source out of range; ignoring");
            return false;
        }
        let to = to.min(len - 1);

        let moved = next.tasks.remove(from);
        next.tasks.insert(to, moved);
        next.renumber();
        self.commit(next);
        true
    }

    #[instrument(skip(self))]
    pub fn add_project(&mut self, name: String, color: ProjectColor) -> Project {
        let mut next = self.draft();
        let project = Project::new(name, color);
        next.projects.push(project.clone());
        self.commit(next);

        info!(id = %project.id, "project added");
        project
    }

    #[instrument(skip(self, patch))]
    pub fn edit_project(&mut self, id: Uuid, patch: ProjectPatch) -> Option<Project> {
        let mut next = self.draft();
        let Some(project) = next.projects.iter_mut().find(|p| p.id == id) else {
            debug!("project not found; ignoring");
            return None;
        };
        project.apply_patch(patch);
        let updated = project.clone();
        self.commit(next);
        Some(updated)
    }

    /// Removes the project and every task filed under it; survivors are
    /// renumbered like after a plain delete.
    #[instrument(skip(self))]
    pub fn delete_project(&mut self, id: Uuid) -> Option<Project> {
        let mut next = self.draft();
        let idx = next.projects.iter().position(|p| p.id == id)?;
        let removed = next.projects.remove(idx);

        let before = next.tasks.len();
        if next
            .current_task()
            .is_some_and(|t| t.project_id == Some(id))
        {
            next.advance_focus();
        }
        next.tasks.retain(|t| t.project_id != Some(id));
        next.renumber();
        next.reconcile_focus();

        info!(
            cascaded = before - next.tasks.len(),
            remaining = next.tasks.len(),
            "project deleted"
        );
        self.commit(next);
        Some(removed)
    }

    #[instrument(skip(self))]
    pub fn start_focus_mode(&mut self, task_id: Uuid) -> bool {
        let mut next = self.draft();
        match next.task(task_id) {
            Some(task) if !task.completed => {}
            Some(_) => {
                debug!("task already completed; not focusing");
                return false;
            }
            None => {
                debug!("focus target not found; ignoring");
                return false;
            }
        }

        next.focus.is_active = true;
        next.focus.current_task_id = Some(task_id);
        next.focus.current_session += 1;
        next.focus.is_break = false;
        info!(session = next.focus.current_session, "work segment started");
        self.commit(next);
        true
    }

    #[instrument(skip(self))]
    pub fn stop_focus_mode(&mut self) {
        let mut next = self.draft();
        next.focus.reset();
        self.commit(next);
        info!("focus mode stopped");
    }

    #[instrument(skip(self))]
    pub fn skip_task(&mut self) {
        let mut next = self.draft();
        if next.focus.current_task_id.is_none() {
            debug!("no current task to skip");
            return;
        }
        next.advance_focus();
        self.commit(next);
    }

    #[instrument(skip(self))]
    pub fn complete_current_task(&mut self) {
        let mut next = self.draft();
        let Some(current) = next.focus.current_task_id else {
            debug!("no current task to complete");
            return;
        };
        if let Some(task) = next.task_mut(current) {
            task.completed = !task.completed;
        }
        next.advance_focus();
        self.commit(next);
        info!(task = %current, "current task completed");
    }

    #[instrument(skip(self))]
    pub fn start_break(&mut self) {
        let mut next = self.draft();
        next.focus.is_break = true;
        info!(
            session = next.focus.current_session,
            long = next.focus.settings.is_long_break_due(next.focus.current_session),
            "break started"
        );
        self.commit(next);
    }

    #[instrument(skip(self))]
    pub fn set_focus_settings(&mut self, patch: FocusSettingsPatch) {
        let mut next = self.draft();
        next.focus.settings.merge(patch);
        self.commit(next);
    }
}
