use docket::{CreateEvent, CyclePhase, EditEvent, EntryStatus, QueryKey, ReconcilerConfig};

mod common;
use common::{id, quiet, record, setup};

#[tokio::test]
async fn edit_then_delete_same_record_runs_in_order() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_8", "Annual Gala", "Fundraiser")).await;
    server.seed(record("evt_9", "Board meeting", "Quarterly")).await;
    view.load().await?;

    let gate = server.hold_mutations();
    let edit = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.edit(&key, EditEvent::new(id("evt_9"), "Board meeting (moved)", "Quarterly", None)).await })
    };
    reconciler.subscribe(&key).wait_for(|entry| entry.by_id(&id("evt_9")).is_some_and(|r| r.speculative)).await;

    let delete = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.delete(&key, id("evt_9")).await })
    };
    tokio::task::yield_now().await;

    // the delete waits its turn: the edit's speculative row is still there
    let entry = reconciler.entry(&key);
    assert_eq!(entry.by_id(&id("evt_9")).map(|r| r.title.as_str()), Some("Board meeting (moved)"));
    assert_eq!(server.mutations(), 1);

    gate.add_permits(2);
    let edited = edit.await?;
    let deleted = delete.await?;
    assert!(edited.is_committed());
    assert!(deleted.is_committed());

    let entry = reconciler.entry(&key);
    assert_eq!(entry.titles(), vec!["Annual Gala"]);
    assert!(entry.by_id(&id("evt_9")).is_none());
    assert!(!entry.has_speculative());
    assert_eq!(server.records().await.len(), 1);
    assert_eq!(*reconciler.phase(&key).get(), CyclePhase::Idle);
    Ok(())
}

#[tokio::test]
async fn creates_commit_in_submission_order() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    view.load().await?;

    let gate = server.hold_mutations();
    let mut handles = Vec::new();
    for title in ["First", "Second", "Third"] {
        let reconciler = reconciler.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move { reconciler.create(&key, CreateEvent::new(title, "body", None)).await }));
        // let each submission queue up before the next
        tokio::task::yield_now().await;
    }
    gate.add_permits(3);
    for handle in handles {
        assert!(handle.await?.is_committed());
    }

    let entry = reconciler.entry(&key);
    assert_eq!(entry.titles(), vec!["First", "Second", "Third"]);
    assert!(!entry.has_speculative());
    let server_titles: Vec<String> = server.records().await.into_iter().map(|r| r.title).collect();
    assert_eq!(server_titles, vec!["First", "Second", "Third"]);
    Ok(())
}

#[tokio::test]
async fn mutation_discards_an_in_flight_fetch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, _view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_1", "Partner retreat", "Offsite")).await;

    let list_gate = server.hold_lists();
    let fetch = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.refetch(&key).await })
    };
    server.lists_reached(1).await;

    let outcome = reconciler.create(&key, CreateEvent::new("Annual Gala", "Fundraiser", None)).await;
    assert!(outcome.is_committed());

    // the list the fetch is carrying predates the create; it must not land
    list_gate.add_permits(1);
    assert!(!fetch.await??);
    let entry = reconciler.entry(&key);
    assert_eq!(entry.titles(), vec!["Annual Gala"]);
    assert_eq!(entry.status, EntryStatus::Unloaded);

    // a fetch started afterwards goes through
    list_gate.add_permits(1);
    assert!(reconciler.refetch(&key).await?);
    assert_eq!(reconciler.entry(&key).titles(), vec!["Partner retreat", "Annual Gala"]);
    Ok(())
}

#[tokio::test]
async fn mutation_aborts_background_refetch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(ReconcilerConfig::default());
    let key = QueryKey::all_events();
    view.load().await?;

    // the first commit's background refetch gets stuck at the server
    let list_gate = server.hold_lists();
    reconciler.create(&key, CreateEvent::new("Annual Gala", "Fundraiser", None)).await;
    server.lists_reached(2).await;

    let gate = server.hold_mutations();
    let second = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.create(&key, CreateEvent::new("Partner retreat", "Offsite", None)).await })
    };
    let pending = reconciler.subscribe(&key).wait_for(|entry| entry.len() == 2).await;
    assert!(pending.records[1].speculative);

    // releasing the stuck list must not clobber the speculative row
    list_gate.add_permits(1);
    tokio::task::yield_now().await;
    assert_eq!(reconciler.entry(&key).titles(), vec!["Annual Gala", "Partner retreat"]);
    assert!(reconciler.entry(&key).has_speculative());

    gate.add_permits(1);
    list_gate.add_permits(10);
    assert!(second.await?.is_committed());
    let settled = reconciler.subscribe(&key).wait_for(|entry| entry.status == EntryStatus::Fresh).await;
    assert_eq!(settled.titles(), vec!["Annual Gala", "Partner retreat"]);
    Ok(())
}

#[tokio::test]
async fn fetch_during_pending_cycle_is_dropped() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(quiet());
    let key = QueryKey::all_events();
    server.seed(record("evt_1", "Partner retreat", "Offsite")).await;
    view.load().await?;

    let gate = server.hold_mutations();
    let submitted = {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.create(&key, CreateEvent::new("Annual Gala", "Fundraiser", None)).await })
    };
    reconciler.subscribe(&key).wait_for(|entry| entry.has_speculative()).await;

    // the server list doesn't have the gala yet; writing it would wipe the speculative row
    assert!(!reconciler.refetch(&key).await?);
    view.load().await?;
    let entry = reconciler.entry(&key);
    assert_eq!(entry.titles(), vec!["Partner retreat", "Annual Gala"]);
    assert!(entry.has_speculative());
    assert_eq!(*reconciler.phase(&key).get(), CyclePhase::Pending);

    gate.add_permits(1);
    assert!(submitted.await?.is_committed());
    assert!(reconciler.refetch(&key).await?);
    assert_eq!(reconciler.entry(&key).titles(), vec!["Partner retreat", "Annual Gala"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queued_cycle_survives_previous_refetch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (server, reconciler, view) = setup(ReconcilerConfig::default());
    let key = QueryKey::all_events();
    view.load().await?;

    let list_gate = server.hold_lists();
    let gate = server.hold_mutations();
    let spawn_create = |title: &'static str| {
        let reconciler = reconciler.clone();
        let key = key.clone();
        tokio::spawn(async move { reconciler.create(&key, CreateEvent::new(title, "body", None)).await })
    };
    let first = spawn_create("Annual Gala");
    reconciler.subscribe(&key).wait_for(|entry| entry.has_speculative()).await;
    let second = spawn_create("Partner retreat");
    tokio::task::yield_now().await;

    // the first commit schedules a refetch; the second cycle begins right behind it
    gate.add_permits(1);
    assert!(first.await?.is_committed());
    reconciler.subscribe(&key).wait_for(|entry| entry.len() == 2 && entry.records[1].speculative).await;

    list_gate.add_permits(10);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let entry = reconciler.entry(&key);
    assert_eq!(entry.titles(), vec!["Annual Gala", "Partner retreat"]);
    assert!(entry.records[1].speculative);

    gate.add_permits(1);
    assert!(second.await?.is_committed());
    let settled = reconciler.subscribe(&key).wait_for(|entry| entry.status == EntryStatus::Fresh).await;
    assert_eq!(settled.titles(), vec!["Annual Gala", "Partner retreat"]);
    assert!(!settled.has_speculative());
    Ok(())
}
