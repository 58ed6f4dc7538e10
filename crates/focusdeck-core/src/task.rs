use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Urgent = 1,
    High = 2,
    Normal = 3,
    #[default]
    Low = 4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgente",
            Priority::High => "Alta prioridade",
            Priority::Normal => "Normal",
            Priority::Low => "Baixa prioridade",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Urgent),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Normal),
            4 => Ok(Priority::Low),
            other => Err(anyhow!("priority must be between 1 and 4, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.rank()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.rank())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Indigo,
    Violet,
    Pink,
}

impl ProjectColor {
    pub const ALL: [ProjectColor; 8] = [
        ProjectColor::Red,
        ProjectColor::Orange,
        ProjectColor::Yellow,
        ProjectColor::Green,
        ProjectColor::Blue,
        ProjectColor::Indigo,
        ProjectColor::Violet,
        ProjectColor::Pink,
    ];

    pub fn value(self) -> &'static str {
        match self {
            ProjectColor::Red => "red",
            ProjectColor::Orange => "orange",
            ProjectColor::Yellow => "yellow",
            ProjectColor::Green => "green",
            ProjectColor::Blue => "blue",
            ProjectColor::Indigo => "indigo",
            ProjectColor::Violet => "violet",
            ProjectColor::Pink => "pink",
        }
    }

    /// Name shown in the palette picker.
    pub fn display_name(self) -> &'static str {
        match self {
            ProjectColor::Red => "Vermelho",
            ProjectColor::Orange => "Laranja",
            ProjectColor::Yellow => "Amarelo",
            ProjectColor::Green => "Verde",
            ProjectColor::Blue => "Azul",
            ProjectColor::Indigo => "Índigo",
            ProjectColor::Violet => "Violeta",
            ProjectColor::Pink => "Rosa",
        }
    }
}

impl FromStr for ProjectColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProjectColor::ALL
            .into_iter()
            .find(|color| color.value() == wanted)
            .ok_or_else(|| anyhow!("unknown project color: {s}"))
    }
}

impl fmt::Display for ProjectColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    pub priority: Priority,

    pub completed: bool,

    pub order: usize,
}

impl Task {
    pub fn from_draft(draft: TaskDraft, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            project_id: draft.project_id,
            due_date: draft.due_date,
            priority: draft.priority,
            completed: false,
            order,
        }
    }

    pub fn is_inbox(&self) -> bool {
        self.project_id.is_none()
    }

    pub fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Fields a caller supplies when creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn in_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Input check done by entry surfaces before calling the store, which
    /// itself accepts any title.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.title.trim().is_empty() {
            return Err(anyhow!("task title cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub project_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub color: ProjectColor,
}

impl Project {
    pub fn new(name: String, color: ProjectColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            color,
        }
    }

    pub fn apply_patch(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub color: Option<ProjectColor>,
}
