use std::collections::BTreeSet;

use focusdeck_core::store::TaskStore;
use focusdeck_core::task::{Priority, ProjectColor, TaskDraft};

fn assert_dense(store: &TaskStore) {
    for (idx, task) in store.tasks().iter().enumerate() {
        assert_eq!(task.order, idx, "order of {:?}", task.title);
    }
}

#[test]
fn order_stays_dense_through_mixed_mutations() {
    let mut store = TaskStore::new();
    let errands = store.add_project("Errands".to_string(), ProjectColor::Orange);
    let mut ids = Vec::new();
    for n in 0..8 {
        let mut draft = TaskDraft::new(format!("task {n}"));
        if n % 3 == 0 {
            draft = draft.in_project(errands.id);
        }
        ids.push(store.add_task(draft).id);
        assert_dense(&store);
    }

    store.delete_task(ids[4]);
    assert_dense(&store);
    assert_eq!(store.tasks().len(), 7);

    store.reorder_tasks(6, 1);
    assert_dense(&store);
    store.reorder_tasks(0, 5);
    assert_dense(&store);

    let before: BTreeSet<_> = store
        .tasks()
        .iter()
        .filter(|t| t.project_id != Some(errands.id))
        .map(|t| t.id)
        .collect();
    store.delete_project(errands.id);
    assert_dense(&store);
    let after: BTreeSet<_> = store.tasks().iter().map(|t| t.id).collect();
    assert_eq!(before, after);
}

#[test]
fn added_task_round_trips_its_fields() {
    let mut store = TaskStore::new();
    let created = store.add_task(TaskDraft::new("X").with_priority(Priority::High));
    let stored = store.task(created.id).expect("stored");
    assert_eq!(stored, created);
    assert!(!stored.completed);
    assert_eq!(stored.priority, Priority::High);
    assert!(!stored.id.to_string().is_empty());
}

#[test]
fn snapshot_serializes_for_export() {
    let mut store = TaskStore::new();
    let home = store.add_project("Home".to_string(), ProjectColor::Violet);
    store.add_task(TaskDraft::new("laundry").in_project(home.id));

    let json = serde_json::to_value(store.snapshot().as_ref()).expect("serialize");
    assert_eq!(json["projects"][0]["color"], "violet");
    assert_eq!(json["tasks"][0]["priority"], 4);
    assert_eq!(json["tasks"][0]["order"], 0);
    assert_eq!(json["focus"]["settings"]["work_duration"], 25);
}

#[test]
fn completing_the_focused_task_matches_skip_on_the_rest() {
    let mut by_complete = TaskStore::new();
    let mut by_skip = TaskStore::new();
    for store in [&mut by_complete, &mut by_skip] {
        for title in ["a", "b", "c"] {
            store.add_task(TaskDraft::new(title));
        }
        let first = store.tasks()[0].id;
        store.start_focus_mode(first);
    }

    by_complete.complete_current_task();
    by_skip.skip_task();

    let current = |s: &TaskStore| s.current_task().map(|t| t.title);
    assert_eq!(current(&by_complete), current(&by_skip));
    assert_eq!(current(&by_complete).as_deref(), Some("b"));
    assert!(by_complete.tasks()[0].completed);
    assert!(!by_skip.tasks()[0].completed);
}

fn focused_on(store: &TaskStore) -> Option<String> {
    store.current_task().map(|t| t.title)
}

#[test]
fn completing_after_a_skip_goes_back_to_the_skipped_task() {
    let mut store = TaskStore::new();
    for title in ["a", "b", "c"] {
        store.add_task(TaskDraft::new(title));
    }
    let first = store.tasks()[0].id;
    store.start_focus_mode(first);

    store.skip_task();
    assert_eq!(focused_on(&store).as_deref(), Some("b"));

    store.complete_current_task();
    assert_eq!(focused_on(&store).as_deref(), Some("a"));
    assert!(store.tasks()[1].completed);

    store.complete_current_task();
    assert_eq!(focused_on(&store).as_deref(), Some("c"));
}

#[test]
fn completing_with_only_finished_tasks_before_moves_forward_then_stops() {
    let mut store = TaskStore::new();
    for title in ["a", "b", "c"] {
        store.add_task(TaskDraft::new(title));
    }
    let ids: Vec<_> = store.tasks().iter().map(|t| t.id).collect();
    store.toggle_task(ids[0]);
    store.start_focus_mode(ids[1]);

    store.complete_current_task();
    assert_eq!(focused_on(&store).as_deref(), Some("c"));

    store.complete_current_task();
    let focus = store.focus();
    assert!(!focus.is_active);
    assert_eq!(focus.current_task_id, None);
    assert_eq!(focus.current_session, 0);
    assert!(store.tasks().iter().all(|t| t.completed));
}
