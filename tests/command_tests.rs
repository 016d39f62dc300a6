use chrono::NaiveDate;
use habitust::commands::*;
use habitust::models::{Frequency, MilestoneKind, TaskInput};
use habitust::storage::{resolve_task, JsonStore, Storage};
use tempfile::TempDir;

fn with_test_db<F>(f: F)
where
    F: FnOnce(JsonStore),
{
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path().join("habits.json"));
    f(store);
}

fn date(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

#[test]
fn test_add_and_list() {
    with_test_db(|mut store| {
        let input = build_input("Stretch".into(), Some("Morning routine".into()), Some("7:30".into()), Frequency::Daily, None, None).unwrap();
        cmd_add(&mut store, input, true);

        let tasks = store.all_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Stretch");
        assert_eq!(tasks[0].description, Some("Morning routine".into()));
        assert_eq!(tasks[0].time.to_string(), "07:30");
        assert!(tasks[0].is_active);
    });
}

#[test]
fn test_build_input_maps_day_and_month() {
    let monthly = build_input("Rent".into(), None, None, Frequency::Monthly, Some(1), Some(5)).unwrap();
    assert_eq!(monthly.day_of_month, Some(1));
    assert_eq!(monthly.month_of_year, None);

    let yearly = build_input("Anniversary".into(), None, None, Frequency::Yearly, Some(6), Some(6)).unwrap();
    assert_eq!(yearly.day_of_year, Some(6));
    assert_eq!(yearly.month_of_year, Some(6));
    assert_eq!(yearly.day_of_month, None);

    assert!(build_input("Rent".into(), None, None, Frequency::Monthly, None, None).is_err());
    assert!(build_input("Card".into(), None, None, Frequency::Yearly, Some(6), None).is_err());
    assert!(build_input("Late".into(), None, Some("25:00".into()), Frequency::Daily, None, None).is_err());
}

#[test]
fn test_done_records_completion() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Read")).unwrap();
        let prefix = short_id(&task.id);

        cmd_done(&mut store, &prefix, Some("2024-05-01".into()), true);
        cmd_done(&mut store, &prefix, Some("2024-05-02".into()), true);
        // same day again is a no-op
        cmd_done(&mut store, &prefix, Some("2024-05-02".into()), true);

        let completions = store.completions_for_task(task.id).unwrap();
        assert_eq!(completions.len(), 2);
        let summary = habitust::summary::daily_summary(&store, date("2024-05-02")).unwrap();
        assert_eq!(summary.tasks[0].streak, 2);
    });
}

#[test]
fn test_done_awards_milestone() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Meditate")).unwrap();
        let id = task.id.to_string();
        for day in 1..=7 {
            cmd_done(&mut store, &id, Some(format!("2024-03-{:02}", day)), true);
        }
        let achievements = store.achievements_for_task(task.id).unwrap();
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0].kind, MilestoneKind::SevenDay);
        assert_eq!(achievements[0].streak_count, 7);
    });
}

#[test]
fn test_done_rejects_bad_date() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Read")).unwrap();
        cmd_done(&mut store, &task.id.to_string(), Some("2024-5-1".into()), true);
        cmd_done(&mut store, &task.id.to_string(), Some("2023-02-29".into()), true);
        assert!(store.completions().unwrap().is_empty());
    });
}

#[test]
fn test_undo_completion() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Read")).unwrap();
        let id = task.id.to_string();
        cmd_done(&mut store, &id, Some("2024-05-01".into()), true);
        cmd_done(&mut store, &id, Some("2024-05-02".into()), true);

        cmd_undo(&mut store, &id, Some("2024-05-01".into()), true);

        let completions = store.completions_for_task(task.id).unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].date, date("2024-05-02"));
    });
}

#[test]
fn test_edit_switches_frequency() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::monthly("Backup", 15)).unwrap();
        let edit = TaskEdit {
            title: Some("Backup photos".into()),
            frequency: Some(Frequency::Yearly),
            day: Some(31),
            month: Some(12),
            ..TaskEdit::default()
        };
        cmd_edit(&mut store, &task.id.to_string(), edit, true);

        let updated = store.task(task.id).unwrap().unwrap();
        assert_eq!(updated.title, "Backup photos");
        assert_eq!(updated.frequency, Frequency::Yearly);
        assert_eq!(updated.day_of_month, None);
        assert_eq!(updated.month_of_year, Some(12));
        assert_eq!(updated.day_of_year, Some(31));
        assert_eq!(updated.created_at, task.created_at);
    });
}

#[test]
fn test_edit_keeps_task_when_invalid() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Walk")).unwrap();
        let edit = TaskEdit {
            frequency: Some(Frequency::Monthly),
            ..TaskEdit::default()
        };
        cmd_edit(&mut store, &task.id.to_string(), edit, true);
        assert_eq!(store.task(task.id).unwrap().unwrap(), task);
    });
}

#[test]
fn test_pause_and_resume() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Journal")).unwrap();
        let id = task.id.to_string();

        cmd_set_active(&mut store, &id, false, true);
        assert!(store.tasks().unwrap().is_empty());
        let summary = habitust::summary::daily_summary(&store, date("2024-01-01")).unwrap();
        assert_eq!(summary.total_tasks, 0);

        cmd_set_active(&mut store, &id, true, true);
        assert_eq!(store.tasks().unwrap().len(), 1);
    });
}

#[test]
fn test_remove_cascades() {
    with_test_db(|mut store| {
        let task = store.create_task(TaskInput::daily("Run")).unwrap();
        let id = task.id.to_string();
        for day in 1..=7 {
            cmd_done(&mut store, &id, Some(format!("2024-03-{:02}", day)), true);
        }
        cmd_remove(&mut store, &id, true);

        assert!(store.all_tasks().unwrap().is_empty());
        assert!(store.completions().unwrap().is_empty());
        assert!(store.achievements().unwrap().is_empty());
    });
}

#[test]
fn test_resolve_requires_unique_prefix() {
    with_test_db(|mut store| {
        let a = store.create_task(TaskInput::daily("A")).unwrap();
        store.create_task(TaskInput::daily("B")).unwrap();

        assert_eq!(resolve_task(&store, &a.id.to_string()).unwrap().id, a.id);
        assert!(resolve_task(&store, "").is_err());
        assert!(resolve_task(&store, "zzzz").is_err());
    });
}

#[test]
fn test_parse_date_is_strict() {
    assert_eq!(parse_date("2024-02-29").unwrap().to_string(), "2024-02-29");
    assert!(parse_date("2024-2-29").is_err());
    assert!(parse_date("2023-02-29").is_err());
    assert!(parse_date("29/02/2024").is_err());
}
