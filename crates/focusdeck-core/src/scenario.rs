use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::datetime::parse_date_expr;
use crate::desk::Desk;
use crate::focus::FocusSettingsPatch;
use crate::task::{Priority, ProjectColor, ProjectPatch, TaskDraft, TaskPatch};
use crate::timer::Tick;
use crate::views::View;

/// A scripted session. Tasks are referred to by title and projects by name;
/// a task's project may also be given as a raw id.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddProject {
        name: String,
        color: ProjectColor,
    },
    EditProject {
        project: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        color: Option<ProjectColor>,
    },
    DeleteProject {
        project: String,
    },
    AddTask {
        title: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        project: Option<String>,
        #[serde(default)]
        due: Option<String>,
        #[serde(default)]
        priority: Priority,
    },
    /// `null` clears a nullable field; leaving it out keeps it.
    EditTask {
        task: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, deserialize_with = "nullable")]
        description: Option<Option<String>>,
        #[serde(default, deserialize_with = "nullable")]
        project: Option<Option<String>>,
        #[serde(default, deserialize_with = "nullable")]
        due: Option<Option<String>>,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        completed: Option<bool>,
    },
    ToggleTask {
        task: String,
    },
    DeleteTask {
        task: String,
    },
    Reorder {
        from: usize,
        to: usize,
    },
    EnterFocus {
        #[serde(default = "default_view")]
        view: ScenarioView,
    },
    StartFocus {
        task: String,
    },
    StopFocus,
    Skip,
    Complete,
    StartBreak,
    Settings {
        #[serde(default)]
        work: Option<u32>,
        #[serde(default, rename = "break")]
        short_break: Option<u32>,
        #[serde(default)]
        long_break: Option<u32>,
        #[serde(default)]
        sessions_until_long_break: Option<u32>,
    },
    StartTimer,
    PauseTimer,
    Tick {
        #[serde(default = "default_ticks")]
        count: u32,
    },
}

/// View selection by project name rather than id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioView {
    Today,
    Inbox,
    All,
    Project(String),
    Search(String),
}

/// Present-but-null becomes `Some(None)`; absence stays `None` via `default`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_view() -> ScenarioView {
    ScenarioView::All
}

fn default_ticks() -> u32 {
    1
}

impl Scenario {
    #[instrument]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = serde_json::from_str(raw)?;
        Ok(scenario)
    }

    #[instrument(skip(self, desk), fields(name = %self.name, steps = self.steps.len()))]
    pub fn apply(&self, desk: &mut Desk) -> anyhow::Result<()> {
        for (idx, step) in self.steps.iter().enumerate() {
            debug!(step = idx + 1, ?step, "applying step");
            apply_step(desk, step).with_context(|| format!("step {} failed", idx + 1))?;
        }
        info!(revision = desk.store.snapshot().revision, "scenario applied");
        Ok(())
    }
}

fn task_id(desk: &Desk, title: &str) -> anyhow::Result<Uuid> {
    desk.store
        .snapshot()
        .tasks
        .iter()
        .find(|t| t.title == title)
        .map(|t| t.id)
        .ok_or_else(|| anyhow!("no task titled {title:?}"))
}

fn project_id(desk: &Desk, name: &str) -> anyhow::Result<Uuid> {
    desk.store
        .snapshot()
        .projects
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.id)
        .ok_or_else(|| anyhow!("no project named {name:?}"))
}

/// Project for a task: a known name, else a raw id handed to the store as is.
fn task_project(desk: &Desk, reference: &str) -> anyhow::Result<Uuid> {
    project_id(desk, reference).or_else(|err| Uuid::parse_str(reference.trim()).map_err(|_| err))
}

fn resolve_view(desk: &Desk, view: &ScenarioView) -> anyhow::Result<View> {
    Ok(match view {
        ScenarioView::Today => View::Today,
        ScenarioView::Inbox => View::Inbox,
        ScenarioView::All => View::All,
        ScenarioView::Project(name) => View::Project(project_id(desk, name)?),
        ScenarioView::Search(query) => View::Search(query.clone()),
    })
}

fn apply_step(desk: &mut Desk, step: &Step) -> anyhow::Result<()> {
    let now = desk.clock().now();
    let tz = desk.clock().timezone();
    match step {
        Step::AddProject { name, color } => {
            desk.store.add_project(name.clone(), *color);
        }
        Step::EditProject {
            project,
            name,
            color,
        } => {
            let id = project_id(desk, project)?;
            desk.store.edit_project(
                id,
                ProjectPatch {
                    name: name.clone(),
                    color: *color,
                },
            );
        }
        Step::DeleteProject { project } => {
            let id = project_id(desk, project)?;
            desk.store.delete_project(id);
        }
        Step::AddTask {
            title,
            description,
            project,
            due,
            priority,
        } => {
            let draft = TaskDraft {
                title: title.clone(),
                description: description.clone(),
                project_id: project.as_deref().map(|p| task_project(desk, p)).transpose()?,
                due_date: due.as_deref().map(|d| parse_date_expr(d, now, tz)).transpose()?,
                priority: *priority,
            };
            draft.validate()?;
            desk.store.add_task(draft);
        }
        Step::EditTask {
            task,
            title,
            description,
            project,
            due,
            priority,
            completed,
        } => {
            let id = task_id(desk, task)?;
            let project_id = match project {
                Some(Some(reference)) => Some(Some(task_project(desk, reference)?)),
                Some(None) => Some(None),
                None => None,
            };
            let due_date = match due {
                Some(Some(expr)) => Some(Some(parse_date_expr(expr, now, tz)?)),
                Some(None) => Some(None),
                None => None,
            };
            let patch = TaskPatch {
                title: title.clone(),
                description: description.clone(),
                project_id,
                due_date,
                priority: *priority,
                completed: *completed,
            };
            desk.store.edit_task(id, patch);
            desk.timer.refresh(&desk.store.focus());
        }
        Step::ToggleTask { task } => {
            let id = task_id(desk, task)?;
            desk.store.toggle_task(id);
        }
        Step::DeleteTask { task } => {
            let id = task_id(desk, task)?;
            desk.store.delete_task(id);
        }
        Step::Reorder { from, to } => {
            desk.store.reorder_tasks(*from, *to);
        }
        Step::EnterFocus { view } => {
            let view = resolve_view(desk, view)?;
            desk.enter_focus(&view)?;
        }
        Step::StartFocus { task } => {
            let id = task_id(desk, task)?;
            desk.store.start_focus_mode(id);
            desk.timer.refresh(&desk.store.focus());
        }
        Step::StopFocus => desk.leave_focus(),
        Step::Skip => desk.skip(),
        Step::Complete => desk.complete(),
        Step::StartBreak => {
            desk.store.start_break();
            desk.timer.refresh(&desk.store.focus());
        }
        Step::Settings {
            work,
            short_break,
            long_break,
            sessions_until_long_break,
        } => {
            desk.set_focus_settings(FocusSettingsPatch {
                work_duration: *work,
                break_duration: *short_break,
                long_break_duration: *long_break,
                sessions_until_long_break: *sessions_until_long_break,
            });
        }
        Step::StartTimer => {
            desk.start_timer();
        }
        Step::PauseTimer => {
            desk.pause_timer();
        }
        Step::Tick { count } => {
            for _ in 0..*count {
                if let Tick::Expired(event) = desk.tick() {
                    info!(title = event.title(), message = event.message(), "segment expired");
                }
            }
        }
    }
    Ok(())
}
