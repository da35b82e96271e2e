// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Dual-document controller integration tests
//!
//! Exercises the full edit → detect → schedule → compile → publish pipeline
//! against mock collaborators, with paused tokio time driving the debounce.

mod common;

use std::time::Duration;

use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent, TextDocumentSaveReason};

use templated_sql_lsp_lsp::document::{DocumentError, SyncState};
use templated_sql_lsp_semantic::AnalyzerDiagnostic;

use common::{Published, harness, incremental, uri, wait_until};

const TEMPLATED: &str = "select id\nfrom {{ ref('orders') }}";
const EXPANDED: &str = "select id\nfrom `db`.`orders`";

#[tokio::test(start_paused = true)]
async fn scenario_plain_edit_takes_fast_path() {
    let h = harness();
    let orders = uri("orders");

    let controller = h.session.open_document(orders.clone(), "select 1", 1).await;
    controller
        .did_change(2, &[incremental((0, 8), (0, 8), ", 2")])
        .await
        .unwrap();

    assert_eq!(controller.raw_text().await, "select 1, 2");
    assert_eq!(controller.compiled_text().await, "select 1, 2");
    assert_eq!(controller.sync_state().await, SyncState::DirtyFastPatch);

    // The compiler was never invoked
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.compiler.compile_count(), 0);
    assert_eq!(
        h.publisher.last_preview(&orders),
        Some("select 1, 2".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn scenario_template_edit_recompiles_once() {
    let h = harness();
    let orders = uri("orders");
    h.compiler.succeed_with("orders", EXPANDED);

    let controller = h.session.open_document(orders.clone(), TEMPLATED, 1).await;
    wait_until(|| h.compiler.compile_count() == 1).await;
    wait_until(|| !controller.is_compiling()).await;

    // Edit inside the reference's braces
    controller
        .did_change(2, &[incremental((1, 13), (1, 19), "users")])
        .await
        .unwrap();

    wait_until(|| h.compiler.compile_count() == 2).await;
    wait_until(|| !controller.is_compiling()).await;

    assert_eq!(controller.compiled_text().await, EXPANDED);
    assert_eq!(controller.sync_state().await, SyncState::Clean);
}

#[tokio::test(start_paused = true)]
async fn scenario_edit_burst_coalesces_into_one_compile() {
    let h = harness();
    let orders = uri("orders");
    h.compiler.succeed_with("orders", EXPANDED);

    let controller = h.session.open_document(orders.clone(), TEMPLATED, 1).await;

    // A burst of template edits inside the quiet window
    controller
        .did_change(2, &[incremental((1, 8), (1, 8), "x")])
        .await
        .unwrap();
    controller
        .did_change(3, &[incremental((1, 9), (1, 9), "y")])
        .await
        .unwrap();
    controller
        .did_change(4, &[incremental((1, 10), (1, 10), "z")])
        .await
        .unwrap();

    wait_until(|| h.compiler.compile_count() > 0).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(h.compiler.compile_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn scenario_compile_error_sets_located_diagnostic() {
    let h = harness();
    let orders = uri("orders");
    h.compiler
        .fail_with("orders", "Undefined macro 'reff' at line 2, column 6");

    let controller = h.session.open_document(orders.clone(), TEMPLATED, 1).await;
    wait_until(|| h.compiler.compile_count() == 1).await;

    loop {
        if controller.has_unresolved_compile_error().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let diagnostics = controller.raw_diagnostics().await;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range.start.line, 1);
    assert_eq!(controller.sync_state().await, SyncState::CompileError);
}

#[tokio::test(start_paused = true)]
async fn scenario_unrelated_success_clears_other_documents_error() {
    let h = harness();
    let orders = uri("orders");
    let customers = uri("customers");
    h.compiler
        .fail_with("orders", "Compilation Error in macro shared_macro, line 1");
    h.compiler.succeed_with("customers", "select 1");

    // Document A fails to compile
    let a = h.session.open_document(orders.clone(), TEMPLATED, 1).await;
    wait_until(|| h.compiler.compile_count() == 1).await;
    loop {
        if a.has_unresolved_compile_error().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Document B compiles fine; its success fires the error-fixed signal
    let b = h
        .session
        .open_document(customers.clone(), "select {{ ref('x') }}", 1)
        .await;
    wait_until(|| h.compiler.compile_count() == 2).await;

    loop {
        if !a.has_unresolved_compile_error().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // A received no edits, yet its diagnostics are gone
    assert!(a.raw_diagnostics().await.is_empty());
    assert_eq!(a.sync_state().await, SyncState::Clean);
    assert_eq!(
        h.publisher.last_raw_diagnostics(&orders),
        Some(Vec::new())
    );
    assert!(!b.has_unresolved_compile_error().await);
}

#[tokio::test(start_paused = true)]
async fn fast_path_patching_is_idempotent_with_recompile() {
    let h = harness();
    let orders = uri("orders");

    let controller = h.session.open_document(orders.clone(), "select 1", 1).await;
    controller
        .did_change(2, &[incremental((0, 8), (0, 8), ", 2")])
        .await
        .unwrap();
    controller
        .did_change(3, &[incremental((0, 11), (0, 11), " from t")])
        .await
        .unwrap();

    let patched = controller.compiled_text().await;
    assert_eq!(patched, "select 1, 2 from t");

    // A full recompile of the same final raw text must not change anything
    h.compiler.succeed_with("orders", patched.clone());
    controller.will_save(TextDocumentSaveReason::MANUAL).await;
    controller.did_save().await;

    wait_until(|| h.compiler.compile_count() == 1).await;
    wait_until(|| !controller.is_compiling()).await;

    assert_eq!(controller.compiled_text().await, patched);
    assert_eq!(controller.sync_state().await, SyncState::Clean);
}

#[tokio::test(start_paused = true)]
async fn first_manual_save_forces_compile_and_refresh() {
    let h = harness();
    let orders = uri("orders");
    h.compiler.succeed_with("orders", "select 1");

    // Plain document: opening does not compile
    let controller = h.session.open_document(orders.clone(), "select 1", 1).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.compiler.compile_count(), 0);

    controller.will_save(TextDocumentSaveReason::MANUAL).await;
    controller.did_save().await;
    wait_until(|| h.compiler.compile_count() == 1).await;
    assert_eq!(h.compiler.refresh_count(), 1);

    // A second save is a republish, not another compile
    wait_until(|| !controller.is_compiling()).await;
    controller.will_save(TextDocumentSaveReason::MANUAL).await;
    controller.did_save().await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.compiler.compile_count(), 1);
    assert_eq!(h.compiler.refresh_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn idle_delay_save_does_not_force_compile() {
    let h = harness();
    let orders = uri("orders");

    let controller = h.session.open_document(orders.clone(), "select 1", 1).await;
    controller
        .will_save(TextDocumentSaveReason::AFTER_DELAY)
        .await;
    controller.did_save().await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.compiler.compile_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn full_replacement_on_fast_path_is_rejected() {
    let h = harness();
    let orders = uri("orders");

    let controller = h.session.open_document(orders.clone(), "select 1", 1).await;
    let full = TextDocumentContentChangeEvent {
        range: None,
        range_length: None,
        text: "select 2".to_string(),
    };

    let result = controller.did_change(2, &[full]).await;
    assert!(matches!(
        result,
        Err(DocumentError::UnexpectedFullReplacement)
    ));

    // Nothing changed and nothing compiled
    assert_eq!(controller.raw_text().await, "select 1");
    assert_eq!(controller.compiled_text().await, "select 1");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.compiler.compile_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn non_monotonic_version_is_rejected() {
    let h = harness();
    let orders = uri("orders");

    let controller = h.session.open_document(orders.clone(), "select 1", 3).await;
    let result = controller
        .did_change(3, &[incremental((0, 0), (0, 0), "x")])
        .await;

    assert!(matches!(
        result,
        Err(DocumentError::NonMonotonicVersion { .. })
    ));
    assert_eq!(controller.raw_text().await, "select 1");
}

#[tokio::test(start_paused = true)]
async fn edit_during_compile_schedules_fresh_compile() {
    let h = harness();
    let orders = uri("orders");
    h.compiler.succeed_with("orders", EXPANDED);
    h.compiler.set_delay(Duration::from_millis(200));

    let controller = h.session.open_document(orders.clone(), TEMPLATED, 1).await;
    wait_until(|| controller.is_compiling()).await;

    // A plain-SQL edit during compilation still marks the document dirty
    controller
        .did_change(2, &[incremental((0, 9), (0, 9), ", total")])
        .await
        .unwrap();

    // The in-flight result is applied, then a fresh compile runs
    wait_until(|| h.compiler.compile_count() == 2).await;
    wait_until(|| !controller.is_compiling()).await;

    assert_eq!(controller.raw_text().await, "select id, total\nfrom {{ ref('orders') }}");
    assert_eq!(controller.compiled_text().await, EXPANDED);
}

#[tokio::test(start_paused = true)]
async fn analyzer_findings_publish_in_both_coordinate_spaces() {
    let h = harness();
    let orders = uri("orders");
    h.compiler.succeed_with("orders", EXPANDED);

    // Finding on "id" in the compiled text's equal first line
    h.analyzer.report(vec![AnalyzerDiagnostic::warning(
        Range::new(Position::new(0, 7), Position::new(0, 9)),
        "Column 'id' is unused",
    )]);

    let controller = h.session.open_document(orders.clone(), TEMPLATED, 1).await;
    wait_until(|| h.compiler.compile_count() == 1).await;
    loop {
        if !controller.raw_diagnostics().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let raw = controller.raw_diagnostics().await;
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].range.start, Position::new(0, 7));
    assert_eq!(raw[0].range.end, Position::new(0, 9));
}

#[tokio::test(start_paused = true)]
async fn preview_updates_before_diagnostics() {
    let h = harness();
    let orders = uri("orders");
    h.compiler.succeed_with("orders", EXPANDED);

    let controller = h.session.open_document(orders.clone(), TEMPLATED, 1).await;
    wait_until(|| h.compiler.compile_count() == 1).await;
    wait_until(|| !controller.is_compiling()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let events = h.publisher.events();
    let preview_index = events
        .iter()
        .position(|e| matches!(e, Published::Preview { text, .. } if text == EXPANDED))
        .expect("compiled preview was published");
    let preview_diagnostics_index = events
        .iter()
        .enumerate()
        .position(|(i, e)| i > preview_index && matches!(e, Published::PreviewDiagnostics { .. }))
        .expect("preview diagnostics follow the preview");
    let raw_diagnostics_index = events
        .iter()
        .enumerate()
        .position(|(i, e)| {
            i > preview_diagnostics_index && matches!(e, Published::RawDiagnostics { .. })
        })
        .expect("raw diagnostics follow the preview diagnostics");

    assert!(preview_index < preview_diagnostics_index);
    assert!(preview_diagnostics_index < raw_diagnostics_index);
}

#[tokio::test(start_paused = true)]
async fn close_removes_document_and_clears_diagnostics() {
    let h = harness();
    let orders = uri("orders");

    h.session.open_document(orders.clone(), "select 1", 1).await;
    assert_eq!(h.session.document_count().await, 1);

    assert!(h.session.close_document(&orders).await);
    assert_eq!(h.session.document_count().await, 0);
    assert!(!h.session.close_document(&orders).await);
    assert_eq!(h.publisher.last_raw_diagnostics(&orders), Some(Vec::new()));
}

#[tokio::test(start_paused = true)]
async fn all_compilations_finished_fires_after_concurrent_compiles() {
    let h = harness();
    h.compiler.succeed_with("orders", "select 1");
    h.compiler.succeed_with("customers", "select 2");
    h.compiler.set_delay(Duration::from_millis(100));

    h.session
        .open_document(uri("orders"), TEMPLATED, 1)
        .await;
    h.session
        .open_document(uri("customers"), "select {{ ref('c') }}", 1)
        .await;

    wait_until(|| h.compiler.compile_count() == 2).await;
    wait_until(|| {
        h.publisher
            .events()
            .iter()
            .any(|e| matches!(e, Published::AllFinished))
    })
    .await;
    assert_eq!(h.session.jobs().active(), 0);
}
