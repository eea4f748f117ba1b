// Process-wide puzzle inventory: catalog and pending answers behind one lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::answers::AnswerQueue;
use crate::catalog::{Catalog, DataSource, MoveCount, PuzzleRecord, StockEntry};
use crate::error::DataSourceError;
use crate::metrics;

struct InventoryState {
    catalog: Catalog,
    answers: AnswerQueue,
}

/// Owns the puzzle catalog and the answer queue.
///
/// Both structures share a single mutex so that serving a puzzle (pop and
/// enqueue its answer) and resetting (swap catalog and clear answers) are
/// each observed as one step by concurrent callers.
pub struct InventoryService {
    source: Box<dyn DataSource>,
    state: Mutex<InventoryState>,
}

impl InventoryService {
    /// Load the initial catalog. Failure here means the bot cannot serve.
    pub fn new(source: impl DataSource + 'static) -> Result<Self, DataSourceError> {
        let catalog = source.load()?;
        tracing::info!(
            "Loaded {} puzzles across {} move counts",
            catalog.total_remaining(),
            catalog.stock_report().len()
        );
        let state = InventoryState {
            catalog,
            answers: AnswerQueue::new(),
        };
        record_gauges(&state);
        Ok(Self {
            source: Box::new(source),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop a random puzzle for `moves` and queue its answer.
    pub fn serve(&self, moves: MoveCount) -> Option<PuzzleRecord> {
        let mut state = self.lock();
        let record = state.catalog.pop_random(moves)?;
        state.answers.append(record.answer.clone());
        record_gauges(&state);
        Some(record)
    }

    pub fn stock_report(&self) -> Vec<StockEntry> {
        self.lock().catalog.stock_report()
    }

    /// Take all pending answers in the order their puzzles were served.
    pub fn drain_answers(&self) -> Vec<String> {
        let mut state = self.lock();
        let answers = state.answers.drain();
        record_gauges(&state);
        answers
    }

    pub fn pending_answers(&self) -> usize {
        self.lock().answers.len()
    }

    /// Reload the catalog from the data source and clear pending answers.
    ///
    /// The new catalog is built before the lock is taken. On failure the
    /// current catalog and queue are left untouched.
    pub fn reset(&self) -> Result<(), DataSourceError> {
        let catalog = self.source.load()?;
        let mut state = self.lock();
        state.catalog = catalog;
        state.answers.clear();
        record_gauges(&state);
        Ok(())
    }
}

fn record_gauges(state: &InventoryState) {
    metrics::PENDING_ANSWERS.set(state.answers.len() as i64);
    metrics::REMAINING_PUZZLES.set(state.catalog.total_remaining() as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn moves(n: u32) -> MoveCount {
        MoveCount::new(n).unwrap()
    }

    fn record(image: &str, answer: &str) -> PuzzleRecord {
        PuzzleRecord {
            question_image: image.into(),
            answer: answer.into(),
        }
    }

    fn single_puzzle_source() -> impl DataSource {
        || -> Result<Catalog, DataSourceError> {
            Ok(Catalog::from_iter([(moves(7), vec![record("a.png", "mate in 7")])]))
        }
    }

    #[test]
    fn test_serve_queues_answer() {
        let inventory = InventoryService::new(single_puzzle_source()).unwrap();

        let served = inventory.serve(moves(7)).unwrap();
        assert_eq!(served.question_image, "a.png");
        assert_eq!(inventory.pending_answers(), 1);

        assert!(inventory.serve(moves(7)).is_none());
        assert_eq!(inventory.pending_answers(), 1);

        assert_eq!(inventory.drain_answers(), vec!["mate in 7"]);
        assert_eq!(inventory.pending_answers(), 0);
    }

    #[test]
    fn test_reset_restores_stock_and_clears_answers() {
        let inventory = InventoryService::new(single_puzzle_source()).unwrap();
        inventory.serve(moves(7)).unwrap();

        inventory.reset().unwrap();
        assert_eq!(inventory.pending_answers(), 0);
        assert_eq!(
            inventory.stock_report(),
            vec![StockEntry { moves: moves(7), remaining: 1 }]
        );
    }

    #[test]
    fn test_failed_reset_keeps_previous_state() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let source = move || -> Result<Catalog, DataSourceError> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Catalog::from_iter([(
                    moves(9),
                    vec![record("a.png", "a"), record("b.png", "b")],
                )]))
            } else {
                Err(DataSourceError::InvalidKey("broken".into()))
            }
        };
        let inventory = InventoryService::new(source).unwrap();
        inventory.serve(moves(9)).unwrap();

        assert!(inventory.reset().is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(inventory.pending_answers(), 1);
        assert_eq!(
            inventory.stock_report(),
            vec![StockEntry { moves: moves(9), remaining: 1 }]
        );
    }

    #[test]
    fn test_initial_load_failure_is_returned() {
        let source =
            || -> Result<Catalog, DataSourceError> { Err(DataSourceError::DuplicateKey(7)) };
        assert!(InventoryService::new(source).is_err());
    }

    #[test]
    fn test_concurrent_serves_never_duplicate() {
        let records: Vec<_> = (0..200)
            .map(|i| record(&format!("{i}.png"), &format!("{i}")))
            .collect();
        let source = move || -> Result<Catalog, DataSourceError> {
            Ok(Catalog::from_iter([(moves(11), records.clone())]))
        };
        let inventory = Arc::new(InventoryService::new(source).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let inventory = inventory.clone();
                std::thread::spawn(move || {
                    let mut served = Vec::new();
                    while let Some(r) = inventory.serve(moves(11)) {
                        served.push(r.question_image);
                    }
                    served
                })
            })
            .collect();

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(all.len(), 200);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 200);
        assert_eq!(inventory.pending_answers(), 200);
    }
}
