//! Integration tests for lazily loaded subtrees: request, coalescing,
//! completion, cancellation on removal and failure with retry.

use std::io;

use rstest::{fixture, rstest};

use treestate::application::{
    ApplicationError, EngineOptions, ExpandOutcome, LoadRequest, LoadResolution, TreeEngine,
    TreeEventKind,
};
use treestate::domain::{DomainError, NodeSpec};
use treestate::util::testing;

/// root -> [docs (lazy), notes]
#[fixture]
fn engine() -> TreeEngine {
    testing::init_test_setup();
    let mut engine = TreeEngine::new(
        vec![NodeSpec::new("root", "Root").with_children(vec![
            NodeSpec::new("docs", "Documents").lazy(),
            NodeSpec::new("notes", "Notes"),
        ])],
        EngineOptions::default(),
    )
    .unwrap();
    engine.expand("root").unwrap();
    engine.drain_events();
    engine
}

fn fetched() -> Vec<NodeSpec> {
    vec![
        NodeSpec::new("report", "report.pdf"),
        NodeSpec::new("letter", "letter.txt"),
    ]
}

fn request(engine: &mut TreeEngine, id: &str) -> LoadRequest {
    match engine.expand(id).unwrap() {
        ExpandOutcome::LoadRequested(request) => request,
        other => panic!("expected a load request, got {other:?}"),
    }
}

#[rstest]
fn given_unloaded_lazy_node_when_listing_then_expandable_not_leaf(engine: TreeEngine) {
    let rows = engine.visible_rows();
    let docs = rows.iter().find(|r| r.id == "docs").unwrap();
    assert!(!docs.is_leaf);
    assert!(!docs.is_expanded);
    assert!(!docs.is_loading);
}

#[rstest]
fn given_lazy_node_when_expanded_then_request_and_loading_row(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");

    assert_eq!(request.node_id, "docs");
    assert!(engine.is_loading("docs"));
    let rows = engine.visible_rows();
    let docs = rows.iter().find(|r| r.id == "docs").unwrap();
    assert!(docs.is_loading);
    assert_eq!(docs.icon.as_deref(), Some("…"));
    assert_eq!(rows.len(), 3, "no children yet");
}

#[rstest]
fn given_pending_load_when_expanded_again_then_coalesced(mut engine: TreeEngine) {
    request(&mut engine, "docs");

    assert_eq!(engine.expand("docs").unwrap(), ExpandOutcome::Loading);
    assert_eq!(engine.toggle_expand("docs").unwrap(), ExpandOutcome::Collapsed);
    assert_eq!(engine.toggle_expand("docs").unwrap(), ExpandOutcome::Loading);
    assert!(engine.expanded_ids().contains(&"docs".to_string()));
}

#[rstest]
fn given_pending_load_when_completed_then_children_visible(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");

    let resolution = engine.complete_load(request.ticket, fetched()).unwrap();

    assert_eq!(
        resolution,
        LoadResolution::Loaded {
            node_id: "docs".into(),
            children: 2
        }
    );
    assert!(!engine.is_loading("docs"));
    assert!(!engine.node("docs").unwrap().lazy);
    let flat: Vec<(String, usize)> = engine
        .visible_rows()
        .into_iter()
        .map(|r| (r.id, r.depth))
        .collect();
    assert_eq!(
        flat,
        vec![
            ("root".to_string(), 0),
            ("docs".to_string(), 1),
            ("report".to_string(), 2),
            ("letter".to_string(), 2),
            ("notes".to_string(), 1),
        ]
    );
    let kinds: Vec<_> = engine.drain_events().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![TreeEventKind::NodeExpand, TreeEventKind::NodeLoad]);
}

#[rstest]
fn given_resolved_ticket_when_delivered_again_then_discarded(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");
    engine.complete_load(request.ticket, fetched()).unwrap();

    let again = engine
        .complete_load(request.ticket, vec![NodeSpec::new("x", "X")])
        .unwrap();

    assert_eq!(again, LoadResolution::Discarded);
    assert!(engine.node("x").is_err());
}

#[rstest]
fn given_loaded_node_when_expanded_again_then_no_new_request(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");
    engine.complete_load(request.ticket, fetched()).unwrap();
    engine.collapse("docs").unwrap();

    assert_eq!(engine.expand("docs").unwrap(), ExpandOutcome::Expanded);
}

#[rstest]
fn given_pending_load_when_node_removed_then_resolution_discarded(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");
    engine.remove_node("docs").unwrap();
    let before = engine.len();

    let resolution = engine.complete_load(request.ticket, fetched()).unwrap();

    assert_eq!(resolution, LoadResolution::Discarded);
    assert_eq!(engine.len(), before);
    assert!(engine.node("report").is_err());
    assert!(!engine.is_loading("docs"));
}

#[rstest]
fn given_pending_load_when_failed_then_still_lazy_and_retryable(mut engine: TreeEngine) {
    let first = request(&mut engine, "docs");

    assert_eq!(engine.fail_load(first.ticket), Some("docs".to_string()));

    assert!(engine.node("docs").unwrap().lazy);
    assert!(!engine.is_loading("docs"));
    assert!(!engine.expanded_ids().contains(&"docs".to_string()));
    let retry = request(&mut engine, "docs");
    assert_ne!(retry.ticket, first.ticket);
    assert_eq!(engine.fail_load(first.ticket), None, "old ticket is stale");
}

#[rstest]
fn given_failing_loader_when_load_with_then_load_failed_and_collapsed(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");
    let loader = |_: &str| -> io::Result<Vec<NodeSpec>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "backend down"))
    };

    let err = engine.load_with(&request, &loader).unwrap_err();

    assert!(matches!(err, ApplicationError::LoadFailed { ref node_id, .. } if node_id == "docs"));
    assert!(!engine.is_loading("docs"));
    assert!(!engine.expanded_ids().contains(&"docs".to_string()));
    let kinds: Vec<_> = engine.drain_events().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![TreeEventKind::NodeExpand, TreeEventKind::NodeLoadFailed]);
}

#[rstest]
fn given_working_loader_when_load_with_then_loaded(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");
    let loader = |id: &str| -> io::Result<Vec<NodeSpec>> {
        Ok(vec![NodeSpec::new(format!("{id}-child"), "Child")])
    };

    let resolution = engine.load_with(&request, &loader).unwrap();

    assert!(matches!(resolution, LoadResolution::Loaded { children: 1, .. }));
    assert_eq!(engine.path_to_root("docs-child").unwrap(), vec!["docs", "root"]);
}

#[rstest]
fn given_colliding_ids_when_completed_then_duplicate_and_still_pending(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");

    let err = engine
        .complete_load(request.ticket, vec![NodeSpec::new("notes", "clash")])
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(DomainError::DuplicateId(ref id)) if id == "notes"));
    assert!(engine.is_loading("docs"));
    assert!(engine.node("docs").unwrap().lazy);
}

#[rstest]
fn given_checked_lazy_node_when_loaded_then_children_inherit(mut engine: TreeEngine) {
    engine.set_checked("docs", true).unwrap();
    let request = request(&mut engine, "docs");

    engine.complete_load(request.ticket, fetched()).unwrap();

    assert_eq!(engine.checked_ids(), vec!["docs", "letter", "report"]);
    assert!(engine.is_indeterminate("root").unwrap());
}

#[rstest]
fn given_empty_fetch_when_completed_then_node_becomes_leaf(mut engine: TreeEngine) {
    let request = request(&mut engine, "docs");

    engine.complete_load(request.ticket, Vec::new()).unwrap();

    let rows = engine.visible_rows();
    let docs = rows.iter().find(|r| r.id == "docs").unwrap();
    assert!(docs.is_leaf);
    assert!(!docs.is_expanded);
    assert_eq!(engine.expand("docs").unwrap(), ExpandOutcome::Unchanged);
}

#[rstest]
fn given_expand_all_when_lazy_unloaded_then_left_alone(mut engine: TreeEngine) {
    engine.collapse_all();
    let expanded = engine.expand_all();

    assert_eq!(expanded, vec!["root"]);
    assert!(!engine.is_loading("docs"));
}
