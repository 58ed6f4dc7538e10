use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;
use uuid::Uuid;

use crate::datetime::ProjectDay;
use crate::task::Task;

/// The lists a user can look at.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(
  tag = "view",
  content = "arg",
  rename_all = "lowercase"
)]
pub enum View {
  Today,
  Inbox,
  Project(Uuid),
  Search(String),
  All
}

pub fn inbox(
  tasks: &[Task]
) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| t.is_inbox())
    .collect()
}

/// Tasks whose due date falls on `today` in its zone.
pub fn due_today(
  tasks: &[Task],
  today: ProjectDay
) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| {
      t.due_date
        .is_some_and(|due| today.contains(due))
    })
    .collect()
}

pub fn in_project(
  tasks: &[Task],
  project_id: Uuid
) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| {
      t.project_id == Some(project_id)
    })
    .collect()
}

/// Case-insensitive match on title or description.
pub fn search<'a>(
  tasks: &'a [Task],
  query: &str
) -> Vec<&'a Task> {
  let q = query.to_lowercase();
  tasks
    .iter()
    .filter(|t| {
      t.title.to_lowercase().contains(&q)
        || t
          .description
          .as_deref()
          .is_some_and(|d| {
            d.to_lowercase().contains(&q)
          })
    })
    .collect()
}

pub fn uncompleted(
  tasks: &[Task]
) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| !t.completed)
    .collect()
}

pub fn select<'a>(
  view: &View,
  tasks: &'a [Task],
  today: ProjectDay
) -> Vec<&'a Task> {
  let out = match view {
    | View::Today => {
      due_today(tasks, today)
    }
    | View::Inbox => inbox(tasks),
    | View::Project(id) => {
      in_project(tasks, *id)
    }
    | View::Search(query) => {
      search(tasks, query)
    }
    | View::All => tasks.iter().collect()
  };
  trace!(?view, count = out.len(), "selected view");
  out
}

/// Tasks that focus mode may pick from while `view` is shown.
pub fn focus_candidates<'a>(
  view: &View,
  tasks: &'a [Task],
  today: ProjectDay
) -> Vec<&'a Task> {
  select(view, tasks, today)
    .into_iter()
    .filter(|t| !t.completed)
    .collect()
}

/// Maps a position in a filtered list back to the full task sequence.
pub fn to_global_index(
  view_tasks: &[&Task],
  all: &[Task],
  view_index: usize
) -> Option<usize> {
  let id = view_tasks.get(view_index)?.id;
  all.iter().position(|t| t.id == id)
}

/// Translates a drag report on a filtered list into a move on the full
/// sequence. The task lands where the destination neighbour sits.
pub fn translate_move(
  view_tasks: &[&Task],
  all: &[Task],
  from: usize,
  to: usize
) -> Option<(usize, usize)> {
  let global_from = to_global_index(
    view_tasks, all, from
  )?;
  let last = view_tasks.len().checked_sub(1)?;
  let global_to = to_global_index(
    view_tasks,
    all,
    to.min(last)
  )?;
  Some((global_from, global_to))
}

pub fn count_label(n: usize) -> String {
  if n == 1 {
    "1 tarefa".to_string()
  } else {
    format!("{n} tarefas")
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone,
    Utc
  };

  use super::{
    View,
    count_label,
    due_today,
    focus_candidates,
    select,
    translate_move
  };
  use crate::datetime::{
    ProjectDay,
    parse_timezone
  };
  use crate::store::TaskStore;
  use crate::task::{
    ProjectColor,
    TaskDraft
  };

  #[test]
  fn views_partition_by_project_and_due_date() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 12, 0, 0
      )
      .single()
      .expect("valid now");
    let mut store = TaskStore::new();
    let work = store.add_project(
      "Work".to_string(),
      ProjectColor::Blue
    );
    store.add_task(
      TaskDraft::new("inbox today")
        .due(now)
    );
    store.add_task(
      TaskDraft::new("work later")
        .in_project(work.id)
        .due(now + Duration::days(3))
    );
    store.add_task(
      TaskDraft::new("Plain")
        .with_description("buy MILK")
    );
    let tasks = store.tasks();
    let today =
      ProjectDay::of(now, chrono_tz::UTC);

    let titles = |view: View| {
      select(&view, &tasks, today)
        .into_iter()
        .map(|t| t.title.clone())
        .collect::<Vec<_>>()
    };

    assert_eq!(
      titles(View::Today),
      vec!["inbox today"]
    );
    assert_eq!(
      titles(View::Inbox),
      vec!["inbox today", "Plain"]
    );
    assert_eq!(
      titles(View::Project(work.id)),
      vec!["work later"]
    );
    assert_eq!(
      titles(View::Search(
        "milk".to_string()
      )),
      vec!["Plain"]
    );
    assert_eq!(titles(View::All).len(), 3);
  }

  #[test]
  fn focus_candidates_skip_completed() {
    let now = Utc::now();
    let mut store = TaskStore::new();
    let a =
      store.add_task(TaskDraft::new("a"));
    store.add_task(TaskDraft::new("b"));
    store.toggle_task(a.id);
    let tasks = store.tasks();

    let picked = focus_candidates(
      &View::Inbox,
      &tasks,
      ProjectDay::of(now, chrono_tz::UTC)
    );
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].title, "b");
  }

  #[test]
  fn drag_on_filtered_list_maps_to_global_positions() {
    let now = Utc::now();
    let mut store = TaskStore::new();
    let work = store.add_project(
      "Work".to_string(),
      ProjectColor::Red
    );
    store.add_task(TaskDraft::new("i0"));
    store.add_task(
      TaskDraft::new("w1")
        .in_project(work.id)
    );
    store.add_task(TaskDraft::new("i2"));
    store.add_task(
      TaskDraft::new("w3")
        .in_project(work.id)
    );
    let tasks = store.tasks();
    let view = select(
      &View::Project(work.id),
      &tasks,
      ProjectDay::of(now, chrono_tz::UTC)
    );

    let (from, to) =
      translate_move(&view, &tasks, 1, 0)
        .expect("in range");
    assert_eq!((from, to), (3, 1));

    assert!(store.reorder_tasks(from, to));
    let titles: Vec<_> = store
      .tasks()
      .into_iter()
      .map(|t| t.title)
      .collect();
    assert_eq!(
      titles,
      vec!["i0", "w3", "w1", "i2"]
    );
  }

  #[test]
  fn today_depends_on_the_zone_passed_in() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 12, 0, 0
      )
      .single()
      .expect("valid now");
    let late = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 23, 30, 0
      )
      .single()
      .expect("valid due");
    let mut store = TaskStore::new();
    store.add_task(
      TaskDraft::new("late call").due(late)
    );
    let tasks = store.tasks();

    let utc =
      ProjectDay::of(now, chrono_tz::UTC);
    assert_eq!(due_today(&tasks, utc).len(), 1);

    let tokyo = parse_timezone("Asia/Tokyo")
      .expect("known zone");
    let in_tokyo = ProjectDay::of(now, tokyo);
    assert!(due_today(&tasks, in_tokyo).is_empty());
  }

  #[test]
  fn empty_view_has_nothing_to_translate() {
    assert!(
      translate_move(&[], &[], 0, 0)
        .is_none()
    );
  }

  #[test]
  fn count_label_pluralizes() {
    assert_eq!(count_label(1), "1 tarefa");
    assert_eq!(count_label(0), "0 tarefas");
    assert_eq!(count_label(3), "3 tarefas");
  }
}
