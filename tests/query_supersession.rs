//! Only the latest request for the visible state may change what is shown.

use serde_json::{json, Value};
use std::time::Instant;
use tablesync::app::{handle_event, Action, TableController, TableEvent};
use tablesync::domain::Page;
use tablesync::query::{FetchOutcome, FetchRequest, QueryStatus};
use tablesync::sync::MemoryHistory;
use tablesync::Config;

fn fetch_of(actions: Vec<Action>) -> FetchRequest {
    match actions.into_iter().next() {
        Some(Action::Fetch(request)) => request,
        other => panic!("expected a fetch, got {other:?}"),
    }
}

fn page(label: &str) -> Page<Value> {
    Page {
        items: vec![json!({ "label": label })],
        total_count: 50,
        last_page: 5,
    }
}

fn completed(request: &FetchRequest, label: &str) -> TableEvent<Value> {
    TableEvent::FetchCompleted(FetchOutcome {
        request_id: request.id,
        result: Ok(page(label)),
    })
}

#[test]
fn late_result_for_previous_page_is_not_shown() {
    let config = Config::default();
    let history = MemoryHistory::parse("https://app.test/users").unwrap();
    let mut table: TableController<_, Value> =
        TableController::mount(&config, history, config.initial_state());
    let now = Instant::now();

    let first = fetch_of(table.start(now));
    let (_, actions) = handle_event(&mut table, TableEvent::NextPage, now).unwrap();
    let second = fetch_of(actions);
    assert_ne!(first.id, second.id);

    // The first page resolves after the user moved on. It is cached but the
    // table keeps waiting for page two.
    let (render, _) = handle_event(&mut table, completed(&first, "one"), now).unwrap();
    assert!(!render);
    let result = table.result();
    assert_eq!(result.status, QueryStatus::Loading);
    assert!(result.is_fetching);

    let (render, _) = handle_event(&mut table, completed(&second, "two"), now).unwrap();
    assert!(render);
    let result = table.result();
    assert_eq!(result.status, QueryStatus::Success);
    assert_eq!(result.data.unwrap().items, vec![json!({ "label": "two" })]);

    // Going back is served from cache without a new request.
    let (render, actions) = handle_event(&mut table, TableEvent::PreviousPage, now).unwrap();
    assert!(render);
    assert!(actions.is_empty());
    assert_eq!(table.result().data.unwrap().items, vec![json!({ "label": "one" })]);
}

#[test]
fn refetch_supersedes_in_flight_request() {
    let config = Config::default();
    let history = MemoryHistory::parse("https://app.test/users").unwrap();
    let mut table: TableController<_, Value> =
        TableController::mount(&config, history, config.initial_state());
    let now = Instant::now();

    let original = fetch_of(table.start(now));
    let (_, actions) = handle_event(&mut table, TableEvent::Refetch, now).unwrap();
    let retry = fetch_of(actions);
    assert_eq!(original.key, retry.key);

    let (render, _) = handle_event(&mut table, completed(&original, "stale"), now).unwrap();
    assert!(!render);
    assert!(table.result().data.is_none());

    let (render, _) = handle_event(&mut table, completed(&retry, "fresh"), now).unwrap();
    assert!(render);
    assert_eq!(table.result().data.unwrap().items, vec![json!({ "label": "fresh" })]);
}

#[test]
fn previous_page_stays_visible_while_loading() {
    let config = Config::default();
    let history = MemoryHistory::parse("https://app.test/users").unwrap();
    let mut table: TableController<_, Value> =
        TableController::mount(&config, history, config.initial_state());
    let now = Instant::now();

    let first = fetch_of(table.start(now));
    handle_event(&mut table, completed(&first, "one"), now).unwrap();
    handle_event(&mut table, TableEvent::NextPage, now).unwrap();

    let result = table.result();
    assert!(result.is_fetching);
    assert!(result.is_stale);
    assert_eq!(result.data.unwrap().items, vec![json!({ "label": "one" })]);
}
