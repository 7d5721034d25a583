use chrono::NaiveDate;
use docket::{CreateEvent, CyclePhase, EditEvent, FailureKind, FieldErrors, MutationIntent, MutationKind, MutationOutcome, QueryKey, RecordKey};
use std::sync::Arc;

mod common;
use common::{id, quiet, record, serialized, setup, Script};

#[tokio::test]
async fn successful_create_scenario() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_1", "Partner retreat", "Offsite")).await;
    view.load().await?;

    let gate = server.hold_mutations();
    let input = CreateEvent::new("Annual Gala", "Fundraiser", NaiveDate::from_ymd_opt(2025, 6, 1));
    let submitted = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.create(&key, input).await })
    };

    // the speculative row shows up before the server has answered
    let pending = reconciler.subscribe(&key).wait_for(|entry| entry.len() == 2).await;
    let speculative = &pending.records[1];
    assert_eq!(speculative.title, "Annual Gala");
    assert!(speculative.speculative);
    assert!(matches!(speculative.key, RecordKey::Temporary(_)));
    assert_eq!(*reconciler.phase(&key).get(), CyclePhase::Pending);

    gate.add_permits(1);
    let outcome = submitted.await?;
    assert!(outcome.is_committed());
    assert_eq!(outcome.message(), "Event created successfully");

    let entry = reconciler.entry(&key);
    assert_eq!(entry.titles(), vec!["Partner retreat", "Annual Gala"]);
    let gala = &entry.records[1];
    assert!(!gala.speculative);
    assert_eq!(gala.server_id(), outcome.record().map(|r| &r.id));
    assert!(!entry.has_speculative());
    assert_eq!(*reconciler.phase(&key).get(), CyclePhase::Idle);
    Ok(())
}

#[tokio::test]
async fn commit_replaces_with_server_record() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_7", "Board meeting", "Quarterly")).await;
    view.load().await?;

    // the server trims what the client sent; the cache ends up with the server's version
    let outcome = reconciler.edit(&key, EditEvent::new(id("evt_7"), "  Board meeting (moved)  ", "Quarterly", None)).await;
    let committed = outcome.record().cloned().expect("edit should commit");
    assert_eq!(committed.title, "Board meeting (moved)");

    let entry = reconciler.entry(&key);
    assert_eq!(entry.len(), 1);
    assert_eq!(entry.records[0].to_record(), Some(committed.clone()));
    assert!(committed.updated_at > record("evt_7", "", "").updated_at);
    Ok(())
}

#[tokio::test]
async fn failed_cycle_restores_exact_snapshot() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_1", "Annual Gala", "Fundraiser")).await;
    server.seed(record("evt_2", "Partner retreat", "Offsite")).await;
    view.load().await?;
    let before = serialized(&reconciler, &key);

    server.push_script(Script::Reject("Database is read-only".into()));
    let outcome = reconciler.create(&key, CreateEvent::new("Pro bono clinic", "Walk-ins", None)).await;
    assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Rejected));
    assert_eq!(outcome.message(), "Database is read-only");
    assert_eq!(serialized(&reconciler, &key), before);

    server.push_script(Script::Invalid(FieldErrors::new().with("title", "Title already taken")));
    let outcome = reconciler.edit(&key, EditEvent::new(id("evt_2"), "Annual Gala", "Offsite", None)).await;
    assert_eq!(outcome.errors().map(|e| e.get("title").to_vec()), Some(vec!["Title already taken".to_string()]));
    assert_eq!(serialized(&reconciler, &key), before);

    server.push_script(Script::Disconnect);
    let outcome = reconciler.delete(&key, id("evt_1")).await;
    assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Transport));
    assert_eq!(outcome.message(), reconciler.config().generic_failure_message);
    assert_eq!(serialized(&reconciler, &key), before);
    Ok(())
}

#[tokio::test]
async fn empty_title_never_reaches_the_server() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_1", "Annual Gala", "Fundraiser")).await;
    view.load().await?;
    let before = serialized(&reconciler, &key);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _guard = reconciler.subscribe(&key).subscribe(tx);

    let outcome = reconciler.create(&key, CreateEvent::new("   ", "Fundraiser", None)).await;
    let MutationOutcome::Failed { kind: MutationKind::Create, failure } = outcome else { panic!("expected a failure") };
    assert_eq!(failure.kind, FailureKind::Validation);
    assert_eq!(failure.errors.as_ref().map(|e| e.get("title").to_vec()), Some(vec!["Title is required".to_string()]));

    let outcome = reconciler.edit(&key, EditEvent::new(id("evt_1"), "Annual Gala", "", None)).await;
    assert!(outcome.errors().is_some_and(|e| e.contains("body") && !e.contains("title")));

    assert_eq!(server.mutations(), 0);
    assert!(rx.try_recv().is_err(), "the cache must not change");
    assert_eq!(serialized(&reconciler, &key), before);
    Ok(())
}

#[tokio::test]
async fn failed_delete_scenario() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_123", "Annual Gala", "Fundraiser")).await;
    view.load().await?;
    assert!(reconciler.entry(&key).by_id(&id("evt_123")).is_some());

    // someone else removed it since we loaded the list
    server.forget(&id("evt_123")).await;

    let gate = server.hold_mutations();
    let submitted = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.delete(&key, id("evt_123")).await })
    };
    let pending = reconciler.subscribe(&key).wait_for(|entry| entry.is_empty()).await;
    assert!(pending.by_id(&id("evt_123")).is_none());

    gate.add_permits(1);
    let outcome = submitted.await?;
    assert_eq!(outcome.message(), "Event not found");
    assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::NotFound));
    assert!(reconciler.entry(&key).by_id(&id("evt_123")).is_some());
    Ok(())
}

#[tokio::test]
async fn phase_signal_walks_the_state_machine() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    view.load().await?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Arc<CyclePhase>>();
    let _guard = reconciler.phase(&key).subscribe(tx);

    reconciler.submit(&key, MutationIntent::create(CreateEvent::new("Annual Gala", "Fundraiser", None))).await;
    server.push_script(Script::Reject("No".into()));
    reconciler.submit(&key, MutationIntent::create(CreateEvent::new("Second", "Event", None))).await;

    let mut phases = Vec::new();
    while let Ok(phase) = rx.try_recv() {
        phases.push(*phase);
    }
    use CyclePhase::*;
    assert_eq!(phases, vec![Pending, ResolvedSuccess, Idle, Pending, ResolvedFailure, Idle]);
    Ok(())
}

#[tokio::test]
async fn commit_schedules_a_refetch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(docket::ReconcilerConfig::default());
    let key = QueryKey::all_events();
    view.load().await?;
    assert_eq!(server.lists(), 1);

    reconciler.create(&key, CreateEvent::new("Annual Gala", "Fundraiser", None)).await;
    server.lists_reached(2).await;
    let entry = reconciler.subscribe(&key).wait_for(|entry| entry.status == docket::EntryStatus::Fresh).await;
    assert_eq!(entry.titles(), vec!["Annual Gala"]);
    Ok(())
}
