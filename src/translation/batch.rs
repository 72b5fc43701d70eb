/*!
 * Batch planning for translation requests.
 *
 * Tasks are partitioned by target language and (optionally) document location,
 * partitions keep the order in which their first task appears, and each
 * partition is packed greedily in sequence order:
 * - a batch is closed when adding the next task would exceed either the item
 *   limit or the character budget
 * - a task longer than the character budget on its own becomes a singleton batch
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

use crate::document::TranslatableUnit;

/// One paragraph to translate in one run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationTask {
    /// Position among non-blank units, in document order
    pub sequence_index: usize,
    pub unit: TranslatableUnit,
    pub target_language: String,
    result: Option<String>,
}

impl TranslationTask {
    pub fn new(sequence_index: usize, unit: TranslatableUnit, target_language: impl Into<String>) -> Self {
        Self {
            sequence_index,
            unit,
            target_language: target_language.into(),
            result: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.unit.text
    }

    pub fn char_count(&self) -> usize {
        self.unit.char_count()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Record the translation. A task is written at most once; later writes are refused.
    pub fn set_result(&mut self, translation: String) -> bool {
        if self.result.is_some() {
            log::warn!("Task {} already has a result, ignoring second write", self.sequence_index);
            return false;
        }
        self.result = Some(translation);
        true
    }

    /// Grouping key used by the planner
    fn group_key(&self, group_by_location: bool) -> String {
        if group_by_location {
            format!("{}|{}", self.target_language, self.unit.location)
        } else {
            format!("{}|ungrouped", self.target_language)
        }
    }
}

/// A non-empty group of tasks sent in one translation call
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Position in planning order
    pub id: usize,
    pub tasks: Vec<TranslationTask>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.tasks.iter().map(TranslationTask::char_count).sum()
    }

    /// Target language shared by every task of the batch
    pub fn target_language(&self) -> &str {
        self.tasks.first().map(|t| t.target_language.as_str()).unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.text().to_string()).collect()
    }

    /// Sequence indexes of the tasks, in batch order
    pub fn sequence_indexes(&self) -> Vec<usize> {
        self.tasks.iter().map(|t| t.sequence_index).collect()
    }
}

/// Order in which planned batches are submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOrder {
    /// Planning order
    Document,
    /// Largest character count first, so long requests start early
    #[default]
    LargestFirst,
}

/// Reorder whole batches for submission; tasks inside a batch keep their order
pub fn order_for_dispatch(batches: &mut [Batch], order: DispatchOrder) {
    if order == DispatchOrder::LargestFirst {
        batches.sort_by_key(|b| std::cmp::Reverse(b.char_count()));
    }
}

/// Greedy size and character bounded batch planner
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    max_batch_size: usize,
    max_chars_per_batch: usize,
    group_by_location: bool,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self::new(50, 50_000)
    }
}

impl BatchPlanner {
    pub fn new(max_batch_size: usize, max_chars_per_batch: usize) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            max_chars_per_batch: max_chars_per_batch.max(1),
            group_by_location: true,
        }
    }

    /// Keep body, header and footer paragraphs in separate batches
    pub fn with_grouping(mut self, group_by_location: bool) -> Self {
        self.group_by_location = group_by_location;
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn max_chars_per_batch(&self) -> usize {
        self.max_chars_per_batch
    }

    /// Plan batches over tasks, moving each task into exactly one batch
    pub fn plan(&self, tasks: Vec<TranslationTask>) -> Vec<Batch> {
        let lengths: Vec<usize> = tasks.iter().map(TranslationTask::char_count).collect();
        let keys: Vec<String> = tasks.iter().map(|t| t.group_key(self.group_by_location)).collect();
        let groups = self.plan_indices(&lengths, Some(&keys));

        let mut slots: Vec<Option<TranslationTask>> = tasks.into_iter().map(Some).collect();
        groups
            .into_iter()
            .enumerate()
            .map(|(id, indexes)| Batch {
                id,
                tasks: indexes.into_iter().filter_map(|i| slots[i].take()).collect(),
            })
            .collect()
    }

    /// Index-level planning over item lengths and optional grouping keys.
    ///
    /// Returns lists of item indexes; every index appears exactly once.
    pub fn plan_indices<K: Eq + Hash + Clone>(&self, lengths: &[usize], keys: Option<&[K]>) -> Vec<Vec<usize>> {
        let partitions: Vec<Vec<usize>> = match keys {
            Some(keys) => {
                let mut order: Vec<Vec<usize>> = Vec::new();
                let mut positions: HashMap<K, usize> = HashMap::new();
                for (index, key) in keys.iter().enumerate().take(lengths.len()) {
                    let position = *positions.entry(key.clone()).or_insert_with(|| {
                        order.push(Vec::new());
                        order.len() - 1
                    });
                    order[position].push(index);
                }
                order
            }
            None => vec![(0..lengths.len()).collect()],
        };

        let mut batches = Vec::new();
        for partition in partitions {
            self.pack(&partition, lengths, &mut batches);
        }
        batches
    }

    fn pack(&self, partition: &[usize], lengths: &[usize], batches: &mut Vec<Vec<usize>>) {
        let mut current: Vec<usize> = Vec::new();
        let mut current_chars = 0usize;

        for &index in partition {
            let length = lengths[index];
            if !current.is_empty()
                && (current.len() >= self.max_batch_size || current_chars + length > self.max_chars_per_batch)
            {
                batches.push(std::mem::take(&mut current));
                current_chars = 0;
            }

            if length > self.max_chars_per_batch {
                batches.push(vec![index]);
                continue;
            }

            current.push(index);
            current_chars += length;
        }

        if !current.is_empty() {
            batches.push(current);
        }
    }

    /// Number of batches `plan` would produce for these lengths, ungrouped
    pub fn estimate_batch_count(&self, lengths: &[usize]) -> usize {
        self.plan_indices::<()>(lengths, None).len()
    }
}

/// Summary of a batch plan, for logging
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub batch_count: usize,
    pub total_items: usize,
    pub total_chars: usize,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub average_batch_size: f64,
    pub max_batch_chars: usize,
}

impl BatchStats {
    pub fn from_batches(batches: &[Batch]) -> Self {
        if batches.is_empty() {
            return Self::default();
        }
        let total_items: usize = batches.iter().map(Batch::len).sum();
        Self {
            batch_count: batches.len(),
            total_items,
            total_chars: batches.iter().map(Batch::char_count).sum(),
            min_batch_size: batches.iter().map(Batch::len).min().unwrap_or(0),
            max_batch_size: batches.iter().map(Batch::len).max().unwrap_or(0),
            average_batch_size: total_items as f64 / batches.len() as f64,
            max_batch_chars: batches.iter().map(Batch::char_count).max().unwrap_or(0),
        }
    }
}
