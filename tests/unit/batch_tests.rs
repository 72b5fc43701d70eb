/*!
 * Tests for batch planning
 */

use std::collections::HashSet;

use doctwin::document::{ContextCollector, Document};
use doctwin::translation::batch::{
    Batch, BatchPlanner, BatchStats, DispatchOrder, TranslationTask, order_for_dispatch,
};

use crate::common;

fn tasks_for(document: &Document) -> Vec<TranslationTask> {
    ContextCollector::collect(document)
        .units
        .into_iter()
        .enumerate()
        .map(|(i, unit)| TranslationTask::new(i, unit, "en"))
        .collect()
}

fn sequence_groups(batches: &[Batch]) -> Vec<Vec<usize>> {
    batches.iter().map(Batch::sequence_indexes).collect()
}

/// Test that every task ends up in exactly one batch
#[test]
fn test_plan_withManyTasks_shouldPartitionExactly() {
    let texts: Vec<String> = (0..23).map(|i| "x".repeat(1 + i % 7)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let document = common::document_with_paragraphs(&refs);

    let batches = BatchPlanner::new(4, 12).plan(tasks_for(&document));

    let mut seen = HashSet::new();
    for batch in &batches {
        assert!(!batch.is_empty());
        assert!(batch.len() <= 4);
        assert!(batch.char_count() <= 12);
        for index in batch.sequence_indexes() {
            assert!(seen.insert(index), "index {} planned twice", index);
        }
    }
    assert_eq!(seen.len(), 23);
}

/// Test that an oversized paragraph gets a batch of its own
#[test]
fn test_plan_withOversizedParagraph_shouldIsolateIt() {
    let long = "y".repeat(50);
    let document = common::document_with_paragraphs(&["a", "b", long.as_str(), "c"]);

    let batches = BatchPlanner::new(10, 10).plan(tasks_for(&document));

    assert_eq!(sequence_groups(&batches), vec![vec![0, 1], vec![2], vec![3]]);
}

/// Test that tasks inside a batch keep document order
#[test]
fn test_plan_withGrouping_shouldSeparateLocations() {
    let document = common::mixed_document();

    let batches = BatchPlanner::new(50, 10_000).plan(tasks_for(&document));

    assert_eq!(
        sequence_groups(&batches),
        vec![vec![0, 1, 2, 3, 4, 5], vec![6], vec![7]]
    );
}

/// Test that disabling grouping mixes locations
#[test]
fn test_plan_withoutGrouping_shouldPackAcrossLocations() {
    let document = common::mixed_document();

    let batches = BatchPlanner::new(50, 10_000)
        .with_grouping(false)
        .plan(tasks_for(&document));

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].sequence_indexes(), (0..8).collect::<Vec<_>>());
}

/// Test that zero limits are clamped instead of looping
#[test]
fn test_planner_new_withZeroLimits_shouldClampToOne() {
    let planner = BatchPlanner::new(0, 0);

    assert_eq!(planner.max_batch_size(), 1);
    assert_eq!(planner.max_chars_per_batch(), 1);
    assert_eq!(planner.plan_indices::<()>(&[3, 3], None), vec![vec![0], vec![1]]);
}

/// Test that an empty input plans no batches
#[test]
fn test_plan_withNoTasks_shouldReturnNoBatches() {
    let batches = BatchPlanner::default().plan(Vec::new());
    assert!(batches.is_empty());
    assert_eq!(BatchStats::from_batches(&batches), BatchStats::default());
}

/// Test largest-first dispatch reorders whole batches only
#[test]
fn test_order_for_dispatch_withLargestFirst_shouldSortByChars() {
    let document = common::document_with_paragraphs(&["kort", "een veel langere alinea", "mid tekst"]);
    let mut batches = BatchPlanner::new(1, 1000).plan(tasks_for(&document));

    order_for_dispatch(&mut batches, DispatchOrder::LargestFirst);

    assert_eq!(sequence_groups(&batches), vec![vec![1], vec![2], vec![0]]);
}

/// Test document dispatch keeps planning order
#[test]
fn test_order_for_dispatch_withDocumentOrder_shouldKeepPlan() {
    let document = common::document_with_paragraphs(&["kort", "een veel langere alinea"]);
    let mut batches = BatchPlanner::new(1, 1000).plan(tasks_for(&document));

    order_for_dispatch(&mut batches, DispatchOrder::Document);

    assert_eq!(sequence_groups(&batches), vec![vec![0], vec![1]]);
}

/// Test plan statistics
#[test]
fn test_batch_stats_withPlan_shouldSummarize() {
    let document = common::document_with_paragraphs(&["aaaa", "bbbb", "cccc"]);
    let batches = BatchPlanner::new(2, 1000).plan(tasks_for(&document));

    let stats = BatchStats::from_batches(&batches);

    assert_eq!(stats.batch_count, 2);
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.total_chars, 12);
    assert_eq!(stats.min_batch_size, 1);
    assert_eq!(stats.max_batch_size, 2);
    assert_eq!(stats.max_batch_chars, 8);
    assert!((stats.average_batch_size - 1.5).abs() < f64::EPSILON);
}

/// Test the single-write rule of task results
#[test]
fn test_task_set_result_withSecondWrite_shouldKeepFirst() {
    let document = common::document_with_paragraphs(&["tekst"]);
    let mut task = tasks_for(&document).remove(0);

    assert!(task.result().is_none());
    assert!(task.set_result("text".to_string()));
    assert!(!task.set_result("other".to_string()));
    assert_eq!(task.result(), Some("text"));
    assert_eq!(task.text(), "tekst");
}

/// Test dispatch order deserializes from config names
#[test]
fn test_dispatch_order_withSnakeCaseName_shouldDeserialize() {
    let order: DispatchOrder = serde_json::from_str("\"largest_first\"").unwrap();
    assert_eq!(order, DispatchOrder::LargestFirst);
    let order: DispatchOrder = serde_json::from_str("\"document\"").unwrap();
    assert_eq!(order, DispatchOrder::Document);
}
