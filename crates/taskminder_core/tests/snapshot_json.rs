use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use taskminder_core::{
    FixedClock, JsonSnapshotRepository, NewTask, PlannerService, PlannerSettings, ReminderType,
    RepoError, RestoreReport, SnapshotRepository, TaskStatus, DEFAULT_PRIORITY_NAME,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
}

fn day(offset: i64) -> NaiveDate {
    today() + Duration::days(offset)
}

fn planner() -> PlannerService<FixedClock> {
    PlannerService::with_clock(FixedClock::new(today()), PlannerSettings::default())
}

fn write_json(dir: &Path, file: &str, value: Value) {
    fs::write(dir.join(file), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn read_json(dir: &Path, file: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join(file)).unwrap()).unwrap()
}

#[test]
fn missing_files_load_as_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonSnapshotRepository::new(dir.path().join("never-created"));
    let mut planner = planner();

    let report = planner.load_snapshot(&repo).unwrap();
    assert_eq!(report, RestoreReport::default());
    assert!(planner.categories().is_empty());
    assert!(planner.tasks().is_empty());
    assert_eq!(planner.priorities().len(), 1);
}

#[test]
fn save_writes_documented_wire_format() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonSnapshotRepository::new(dir.path());
    let mut planner = planner();
    let work = planner.add_category("Work").unwrap();
    let high = planner.add_priority("High").unwrap();
    let task = planner
        .create_task(NewTask {
            title: "Report".to_string(),
            description: "Quarterly numbers".to_string(),
            category: work,
            priority: Some(high),
            deadline: day(10),
        })
        .unwrap();
    planner
        .add_reminder(task, ReminderType::OneDayBefore, None)
        .unwrap();
    planner
        .add_reminder(task, ReminderType::CustomDate, Some(day(2)))
        .unwrap();

    planner.save_snapshot(&repo).unwrap();

    assert_eq!(
        read_json(dir.path(), "categories.json"),
        json!({ "categories": [{ "name": "Work" }] })
    );
    assert_eq!(
        read_json(dir.path(), "priorities.json"),
        json!({ "priorities": [{ "name": DEFAULT_PRIORITY_NAME }, { "name": "High" }] })
    );
    assert_eq!(
        read_json(dir.path(), "tasks.json"),
        json!({
            "tasks": [{
                "id": task.to_string(),
                "title": "Report",
                "description": "Quarterly numbers",
                "category": "Work",
                "priority": "High",
                "deadline": "2026-02-20",
                "status": "OPEN",
                "reminders": [
                    { "type": "ONE_DAY_BEFORE", "date": "2026-02-19" },
                    { "type": "CUSTOM_DATE", "date": "2026-02-12" }
                ]
            }]
        })
    );
    assert!(!dir.path().join("tasks.json.tmp").exists());
}

#[test]
fn saved_snapshot_restores_into_fresh_planner() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonSnapshotRepository::new(dir.path());
    let mut original = planner();
    let work = original.add_category("Work").unwrap();
    original.add_category("Home").unwrap();
    original.add_priority("High").unwrap();
    let task = original
        .create_task(NewTask {
            title: "Report".to_string(),
            description: "Quarterly numbers".to_string(),
            category: work,
            priority: None,
            deadline: day(10),
        })
        .unwrap();
    original
        .add_reminder(task, ReminderType::OneWeekBefore, None)
        .unwrap();
    original.save_snapshot(&repo).unwrap();

    let mut restored = planner();
    let report = restored.load_snapshot(&repo).unwrap();

    assert_eq!(report.categories, 2);
    assert_eq!(report.priorities, 1);
    assert_eq!(report.tasks, 1);
    assert_eq!(report.reminders, 1);
    assert_eq!(report.skipped_priorities, 0);

    let names: Vec<&str> = restored
        .categories()
        .all()
        .iter()
        .map(|category| category.name())
        .collect();
    assert_eq!(names, vec!["Work", "Home"]);

    let loaded = restored.task(task).expect("task id should survive a roundtrip");
    assert_eq!(loaded.title(), "Report");
    assert_eq!(loaded.priority(), Some(restored.priorities().default_id()));
    assert_eq!(
        restored.categories().get(loaded.category()).unwrap().name(),
        "Work"
    );
    assert_eq!(loaded.reminders().len(), 1);
    assert_eq!(loaded.reminders()[0].date(), day(3));
    assert_eq!(restored.reminders().len(), 1);
}

#[test]
fn restore_applies_resolution_and_discard_rules() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "categories.json",
        json!({ "categories": [{ "name": "Work" }, { "name": "work" }, { "name": "  " }] }),
    );
    write_json(
        dir.path(),
        "priorities.json",
        json!({ "priorities": [{ "name": "Default" }, { "name": "High" }, { "name": "high" }] }),
    );
    write_json(
        dir.path(),
        "tasks.json",
        json!({
            "tasks": [
                {
                    "id": "not-a-uuid",
                    "title": "Report",
                    "description": "numbers",
                    "category": "Work",
                    "priority": "Urgent",
                    "deadline": "2026-02-20",
                    "status": "IN_PROGRESS",
                    "reminders": [
                        { "type": "ONE_DAY_BEFORE", "date": "2026-02-15" },
                        { "type": "CUSTOM_DATE", "date": "2026-02-01" },
                        { "type": "CUSTOM_DATE", "date": "2026-02-25" }
                    ]
                },
                {
                    "id": "8c5b0f0e-5a55-4a43-9b39-1f3f7f2a0c11",
                    "title": "Orphan",
                    "description": "no category",
                    "category": "Gone",
                    "priority": "High",
                    "deadline": "2026-03-01",
                    "status": "OPEN"
                },
                {
                    "id": "5f0a3a52-3f7e-4bd6-8d0b-6a1c8b7e2d90",
                    "title": "Old",
                    "description": "overdue",
                    "category": "Work",
                    "priority": "High",
                    "deadline": "2026-02-01",
                    "status": "OPEN"
                },
                {
                    "id": "0b3d6f61-8a9c-4f0e-b1b2-2b9b8d6a4e77",
                    "title": "Finished",
                    "description": "done",
                    "category": "Work",
                    "priority": "High",
                    "deadline": "2026-03-01",
                    "status": "COMPLETED",
                    "reminders": [{ "type": "CUSTOM_DATE", "date": "2026-02-20" }]
                }
            ]
        }),
    );

    let repo = JsonSnapshotRepository::new(dir.path());
    let mut planner = planner();
    let report = planner.load_snapshot(&repo).unwrap();

    assert_eq!(
        report,
        RestoreReport {
            categories: 1,
            priorities: 1,
            tasks: 3,
            reminders: 1,
            skipped_categories: 2,
            skipped_priorities: 1,
            skipped_tasks: 1,
            defaulted_priorities: 1,
            regenerated_ids: 1,
            discarded_reminders: 1,
            skipped_reminders: 2,
            delayed: 1,
        }
    );

    let report_task = &planner.tasks().all()[0];
    assert_eq!(report_task.title(), "Report");
    assert_eq!(report_task.status(), TaskStatus::InProgress);
    assert_eq!(
        report_task.priority(),
        Some(planner.priorities().default_id())
    );
    assert_eq!(report_task.reminders().len(), 1);
    assert_eq!(report_task.reminders()[0].kind(), ReminderType::OneDayBefore);
    assert_eq!(report_task.reminders()[0].date(), day(9));

    let old = planner
        .tasks()
        .get("5f0a3a52-3f7e-4bd6-8d0b-6a1c8b7e2d90".parse().unwrap())
        .unwrap();
    assert_eq!(old.status(), TaskStatus::Delayed);

    let finished = &planner.tasks().all()[2];
    assert_eq!(finished.status(), TaskStatus::Completed);
    assert!(finished.reminders().is_empty());
}

#[test]
fn malformed_file_fails_and_keeps_current_state() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tasks.json"), "{ not json").unwrap();
    let repo = JsonSnapshotRepository::new(dir.path());

    let mut planner = planner();
    planner.add_category("Existing").unwrap();

    let err = planner.load_snapshot(&repo).unwrap_err();
    assert!(matches!(err, RepoError::Json { .. }));
    assert_eq!(planner.categories().len(), 1);
}

#[test]
fn saving_again_replaces_previous_documents() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonSnapshotRepository::new(dir.path());
    let mut planner = planner();
    let id = planner.add_category("Work").unwrap();
    planner.save_snapshot(&repo).unwrap();

    planner.remove_category(id).unwrap();
    planner.save_snapshot(&repo).unwrap();

    assert!(repo.load_categories().unwrap().is_empty());
    assert_eq!(repo.load_priorities().unwrap().len(), 1);
}

#[test]
fn failed_save_keeps_previous_snapshot_restorable() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonSnapshotRepository::new(dir.path());
    let mut current = planner();
    let work = current.add_category("Work").unwrap();
    let task = current
        .create_task(NewTask {
            title: "Report".to_string(),
            description: "Quarterly numbers".to_string(),
            category: work,
            priority: None,
            deadline: day(10),
        })
        .unwrap();
    current.save_snapshot(&repo).unwrap();

    current.rename_category(work, "Office").unwrap();
    // A directory in the temp file's place makes staging tasks.json fail.
    fs::create_dir(dir.path().join("tasks.json.tmp")).unwrap();
    let err = current.save_snapshot(&repo).unwrap_err();
    assert!(matches!(err, RepoError::Io { .. }));

    assert!(!dir.path().join("categories.json.tmp").exists());
    let mut restored = planner();
    let report = restored.load_snapshot(&repo).unwrap();
    assert_eq!(report.tasks, 1);
    assert_eq!(report.skipped_tasks, 0);
    assert_eq!(restored.categories().all()[0].name(), "Work");
    assert!(restored.task(task).is_some());
}
