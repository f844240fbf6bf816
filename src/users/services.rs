use time::OffsetDateTime;
use tracing::{debug, error, info};

use crate::error::SeedError;
use crate::store::UserStore;
use crate::users::committer::{discard, BatchCommitter};
use crate::users::generator::{CandidateSource, RecordGenerator};
use crate::users::index::DuplicateIndex;
use crate::users::password::SecretHasher;
use crate::users::repo_types::NewUser;

/// Outcome of a committed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub existing: usize,
    pub inserted: u64,
}

/// Creation timestamps that never step backwards within a batch.
struct BatchClock {
    last: OffsetDateTime,
}

impl BatchClock {
    fn new() -> Self {
        Self {
            last: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn tick(&mut self) -> OffsetDateTime {
        self.last = self.last.max(OffsetDateTime::now_utc());
        self.last
    }
}

/// Generates `count` users and writes them in one transaction.
///
/// The schema must already exist. Either every generated row is committed or
/// none is; the table is left as it was on any error.
pub async fn seed_users<S: CandidateSource>(
    store: &dyn UserStore,
    hasher: &SecretHasher,
    source: S,
    count: usize,
) -> Result<SeedReport, SeedError> {
    let mut tx = store.begin().await?;

    info!("fetching existing emails and usernames");
    let mut index = match DuplicateIndex::load(tx.as_mut()).await {
        Ok(index) => index,
        Err(e) => {
            discard(tx).await;
            return Err(e.into());
        }
    };
    let existing = index.email_count();
    info!(
        emails = existing,
        usernames = index.username_count(),
        "loaded existing keys"
    );

    let mut generator = RecordGenerator::new(source);
    let mut batch = BatchCommitter::with_capacity(count);

    let outcome = match fill_batch(&mut generator, &mut index, hasher, &mut batch, count) {
        Ok(()) => batch.submit(tx).await,
        Err(e) => {
            error!(category = e.category(), error = %e, "generation aborted; rolling back");
            discard(tx).await;
            Err(e)
        }
    };
    debug!(state = ?batch.state(), buffered = batch.len(), "closing batch");
    batch.close();

    let inserted = outcome?;
    Ok(SeedReport { existing, inserted })
}

fn fill_batch<S: CandidateSource>(
    generator: &mut RecordGenerator<S>,
    index: &mut DuplicateIndex,
    hasher: &SecretHasher,
    batch: &mut BatchCommitter,
    count: usize,
) -> Result<(), SeedError> {
    let mut clock = BatchClock::new();
    for n in 1..=count {
        let candidate = generator.generate(index)?;
        let hash = hasher.hash(&candidate.password)?;
        let user = NewUser::from_candidate(candidate, hash, clock.tick());
        debug!(n, username = %user.username, "user generated");
        batch.push(user)?;
    }
    Ok(())
}
