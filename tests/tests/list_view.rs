use chrono::NaiveDate;
use docket::{NoticeLevel, QueryKey};
use std::sync::{Arc, Mutex};

mod common;
use common::{id, quiet, record, setup, Script};

#[tokio::test]
async fn render_is_idempotent() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    assert!(view.is_loading());
    server.seed(record("evt_1", "Annual Gala", "Fundraiser")).await;
    view.load().await?;
    assert!(!view.is_loading());

    let before = reconciler.entry(&QueryKey::all_events());
    let first = view.render();
    let second = view.render();
    assert_eq!(first, second);
    assert_eq!(view.rows(), view.rows());
    assert_eq!(first, "TBA | Annual Gala\n    Fundraiser\n");
    // rendering doesn't touch the cache
    assert!(Arc::ptr_eq(&before, &reconciler.entry(&QueryKey::all_events())));
    Ok(())
}

#[tokio::test]
async fn view_follows_the_cycle() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, _reconciler, view) = setup(quiet());
    view.load().await?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _guard = {
        let seen = seen.clone();
        view.on_change(move |rows| seen.lock().unwrap().push(rows.into_iter().map(|r| (r.title, r.date_label, r.pending)).collect::<Vec<_>>()))
    };

    let notice = view.submit_create("Annual Gala", "Fundraiser", NaiveDate::from_ymd_opt(2025, 6, 1)).await;
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Event created successfully");

    server.push_script(Script::Reject("Calendar is locked".into()));
    let notice = view.submit_create("Partner retreat", "Offsite", None).await;
    assert!(notice.is_error());
    assert_eq!(notice.message, "Calendar is locked");

    let gala = ("Annual Gala".to_string(), "June 1, 2025".to_string(), false);
    let retreat = ("Partner retreat".to_string(), "TBA".to_string(), true);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            vec![(gala.0.clone(), gala.1.clone(), true)],
            vec![gala.clone()],
            vec![gala.clone(), retreat],
            vec![gala],
        ]
    );
    Ok(())
}

#[tokio::test]
async fn notices_carry_field_errors() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, _reconciler, view) = setup(quiet());
    server.seed(record("evt_5", "Annual Gala", "Fundraiser")).await;
    view.load().await?;

    let notice = view.submit_edit(id("evt_5"), "", "", None).await;
    assert!(notice.is_error());
    assert_eq!(notice.field("title"), ["Title is required".to_string()]);
    assert_eq!(notice.field("body"), ["Body is required".to_string()]);

    // the server's own limits come back the same way
    let notice = view.submit_edit(id("evt_5"), "x".repeat(500), "Fundraiser", None).await;
    assert_eq!(notice.message, "Invalid event data");
    assert_eq!(notice.field("title"), ["Title must be at most 200 characters".to_string()]);
    assert_eq!(view.rows()[0].title, "Annual Gala");

    let notice = view.submit_delete(id("evt_5")).await;
    assert_eq!(notice.message, "Event deleted successfully");
    assert_eq!(view.render(), "No events yet.\n");
    Ok(())
}
