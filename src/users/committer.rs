use tracing::{error, info, warn};

use crate::error::SeedError;
use crate::store::UserTx;
use crate::users::repo_types::NewUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Empty,
    Accumulating,
    Submitted,
    Committed,
    RolledBack,
    Closed,
}

/// Rows reserved up front; larger batches grow the buffer as they fill.
const PREALLOCATE_MAX: usize = 1_000;

/// Buffers generated rows and writes them in one all-or-nothing transaction.
#[derive(Debug)]
pub struct BatchCommitter {
    records: Vec<NewUser>,
    state: BatchState,
}

impl BatchCommitter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity.min(PREALLOCATE_MAX)),
            state: BatchState::Empty,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, user: NewUser) -> Result<(), SeedError> {
        match self.state {
            BatchState::Empty | BatchState::Accumulating => {
                self.records.push(user);
                self.state = BatchState::Accumulating;
                Ok(())
            }
            other => Err(SeedError::Unexpected(format!(
                "cannot add records to a batch in state {other:?}"
            ))),
        }
    }

    /// Inserts every buffered row through `tx` and commits. Any failure
    /// rolls the whole transaction back; nothing is retried.
    pub async fn submit(&mut self, mut tx: Box<dyn UserTx>) -> Result<u64, SeedError> {
        if !matches!(self.state, BatchState::Empty | BatchState::Accumulating) {
            discard(tx).await;
            return Err(SeedError::Unexpected(format!(
                "batch already submitted (state {:?})",
                self.state
            )));
        }
        self.state = BatchState::Submitted;
        info!(records = self.records.len(), "submitting batch");

        let inserted = match tx.insert_batch(&self.records).await {
            Ok(n) => n,
            Err(e) => {
                let err = SeedError::from(e);
                error!(category = err.category(), error = %err, "batch insert failed; rolling back");
                discard(tx).await;
                self.state = BatchState::RolledBack;
                return Err(err);
            }
        };

        match tx.commit().await {
            Ok(()) => {
                self.state = BatchState::Committed;
                info!(inserted, "batch committed");
                Ok(inserted)
            }
            Err(e) => {
                // A failed COMMIT leaves nothing behind in PostgreSQL.
                let err = SeedError::from(e);
                error!(category = err.category(), error = %err, "commit failed; batch rolled back");
                self.state = BatchState::RolledBack;
                Err(err)
            }
        }
    }

    /// Drops buffered rows. Reached on every exit path.
    pub fn close(&mut self) {
        self.records.clear();
        self.state = BatchState::Closed;
    }
}

/// Rolls back `tx`, logging if even that fails.
pub async fn discard(tx: Box<dyn UserTx>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed; transaction is dropped instead");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::UserStore;
    use crate::users::services::tests::stored_user;

    #[tokio::test]
    async fn commits_all_buffered_rows() {
        let store = MemoryStore::default();
        let mut batch = BatchCommitter::with_capacity(2);
        assert_eq!(batch.state(), BatchState::Empty);

        batch.push(stored_user("a@x.com", "a")).expect("push");
        batch.push(stored_user("b@x.com", "b")).expect("push");
        assert_eq!(batch.state(), BatchState::Accumulating);
        assert_eq!(store.count(), 0);

        let tx = store.begin().await.expect("begin");
        let inserted = batch.submit(tx).await.expect("submit");
        assert_eq!(inserted, 2);
        assert_eq!(batch.state(), BatchState::Committed);
        assert_eq!(store.count(), 2);

        batch.close();
        assert_eq!(batch.state(), BatchState::Closed);
        assert_eq!(batch.len(), 0);
    }

    #[tokio::test]
    async fn duplicate_last_record_rolls_back_everything() {
        let store = MemoryStore::with_rows(vec![stored_user("old@x.com", "old")]);
        let before = store.count();

        let mut batch = BatchCommitter::with_capacity(3);
        batch.push(stored_user("a@x.com", "a")).expect("push");
        batch.push(stored_user("b@x.com", "b")).expect("push");
        // Stands in for a writer that claimed the address after the index load.
        batch.push(stored_user("old@x.com", "c")).expect("push");

        let tx = store.begin().await.expect("begin");
        let err = batch.submit(tx).await.unwrap_err();

        assert!(matches!(err, SeedError::UniqueViolation { .. }));
        assert_eq!(batch.state(), BatchState::RolledBack);
        assert_eq!(store.count() - before, 0);
    }

    #[tokio::test]
    async fn push_after_submit_is_refused() {
        let store = MemoryStore::default();
        let mut batch = BatchCommitter::with_capacity(1);
        batch.push(stored_user("a@x.com", "a")).expect("push");
        batch.submit(store.begin().await.expect("begin")).await.expect("submit");

        let err = batch.push(stored_user("b@x.com", "b")).unwrap_err();
        assert_eq!(err.category(), "unexpected");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn huge_requested_count_does_not_reserve_everything() {
        let mut batch = BatchCommitter::with_capacity(usize::MAX / 8);
        assert!(batch.is_empty());
        assert_eq!(batch.state(), BatchState::Empty);

        batch.push(stored_user("a@x.com", "a")).expect("push");
        assert!(!batch.is_empty());
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_commits_nothing() {
        let store = MemoryStore::default();
        let mut batch = BatchCommitter::with_capacity(0);
        let inserted = batch.submit(store.begin().await.expect("begin")).await.expect("submit");
        assert_eq!(inserted, 0);
        assert_eq!(batch.state(), BatchState::Committed);
    }
}
