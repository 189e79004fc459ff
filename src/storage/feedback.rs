use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Fixed key of the singleton aggregate record
pub const FEEDBACK_AGGREGATE_ID: u32 = 1;

/// Cumulative user feedback on classification accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAggregate {
    pub id: u32,
    pub positive_count: u64,
    pub negative_count: u64,
}

impl FeedbackAggregate {
    fn empty() -> Self {
        Self {
            id: FEEDBACK_AGGREGATE_ID,
            positive_count: 0,
            negative_count: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive_count.saturating_add(self.negative_count)
    }

    /// Share of positive votes; `None` while no votes were cast
    pub fn accuracy_ratio(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.positive_count as f64 / total as f64),
        }
    }
}

/// A single user vote on a classification result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackVote {
    Positive,
    Negative,
}

impl FeedbackVote {
    /// Parse the wire value (`yes` / `no`), exact match only
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Self::Positive),
            "no" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Global feedback accumulator.
///
/// Every increment runs under one lock: the new aggregate is written to disk
/// first and only then committed in memory, so a failed write leaves the
/// counters untouched.
pub struct FeedbackStore {
    path: Option<PathBuf>,
    aggregate: Mutex<Option<FeedbackAggregate>>,
}

impl FeedbackStore {
    /// Store without a backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            aggregate: Mutex::new(None),
        }
    }

    /// Open a file-backed store, loading the aggregate if the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let aggregate = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let aggregate: FeedbackAggregate = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt feedback file {}", path.display()))?;
                info!(
                    positive = aggregate.positive_count,
                    negative = aggregate.negative_count,
                    "Loaded feedback aggregate"
                );
                Some(aggregate)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read feedback file {}", path.display()));
            }
        };

        Ok(Self {
            path: Some(path),
            aggregate: Mutex::new(aggregate),
        })
    }

    pub async fn increment_positive(&self) -> Result<FeedbackAggregate> {
        self.record(FeedbackVote::Positive).await
    }

    pub async fn increment_negative(&self) -> Result<FeedbackAggregate> {
        self.record(FeedbackVote::Negative).await
    }

    /// Add one vote to the aggregate, creating it on first use
    pub async fn record(&self, vote: FeedbackVote) -> Result<FeedbackAggregate> {
        let mut guard = self.aggregate.lock().await;

        let mut next = (*guard).unwrap_or_else(FeedbackAggregate::empty);
        match vote {
            FeedbackVote::Positive => next.positive_count = next.positive_count.saturating_add(1),
            FeedbackVote::Negative => next.negative_count = next.negative_count.saturating_add(1),
        }

        self.persist(&next).await?;
        *guard = Some(next);

        debug!(
            positive = next.positive_count,
            negative = next.negative_count,
            "Feedback aggregate updated"
        );

        Ok(next)
    }

    pub async fn get_aggregate(&self) -> Option<FeedbackAggregate> {
        *self.aggregate.lock().await
    }

    async fn persist(&self, aggregate: &FeedbackAggregate) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let bytes = serde_json::to_vec_pretty(aggregate)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn vote_parsing_is_exact() {
        assert_eq!(FeedbackVote::parse("yes"), Some(FeedbackVote::Positive));
        assert_eq!(FeedbackVote::parse("no"), Some(FeedbackVote::Negative));
        assert_eq!(FeedbackVote::parse("Yes"), None);
        assert_eq!(FeedbackVote::parse("maybe"), None);
        assert_eq!(FeedbackVote::parse(""), None);
    }

    #[test]
    fn ratio_is_undefined_without_votes() {
        assert_eq!(FeedbackAggregate::empty().accuracy_ratio(), None);

        let aggregate = FeedbackAggregate {
            id: FEEDBACK_AGGREGATE_ID,
            positive_count: 4,
            negative_count: 6,
        };
        assert_eq!(aggregate.accuracy_ratio(), Some(0.4));
    }

    #[tokio::test]
    async fn aggregate_is_created_lazily() {
        let store = FeedbackStore::in_memory();
        assert!(store.get_aggregate().await.is_none());

        let aggregate = store.increment_negative().await.unwrap();
        assert_eq!(aggregate.id, FEEDBACK_AGGREGATE_ID);
        assert_eq!(aggregate.positive_count, 0);
        assert_eq!(aggregate.negative_count, 1);
        assert_eq!(store.get_aggregate().await, Some(aggregate));
    }

    #[tokio::test]
    async fn counts_track_every_vote() {
        let store = FeedbackStore::in_memory();
        for vote in ["no", "yes", "no", "yes", "no", "no", "yes", "no", "yes", "no"] {
            store.record(FeedbackVote::parse(vote).unwrap()).await.unwrap();
        }

        let aggregate = store.get_aggregate().await.unwrap();
        assert_eq!(aggregate.positive_count, 4);
        assert_eq!(aggregate.negative_count, 6);
    }

    #[tokio::test]
    async fn concurrent_increments_all_apply() {
        let store = Arc::new(FeedbackStore::in_memory());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    if i % 4 == 0 {
                        store.increment_negative().await
                    } else {
                        store.increment_positive().await
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let aggregate = store.get_aggregate().await.unwrap();
        assert_eq!(aggregate.positive_count, 48);
        assert_eq!(aggregate.negative_count, 16);
    }

    #[tokio::test]
    async fn aggregate_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("feedback.json");

        let store = FeedbackStore::open(&path).await.unwrap();
        assert!(store.get_aggregate().await.is_none());
        store.increment_positive().await.unwrap();
        store.increment_positive().await.unwrap();
        store.increment_negative().await.unwrap();
        drop(store);

        let reopened = FeedbackStore::open(&path).await.unwrap();
        let aggregate = reopened.get_aggregate().await.unwrap();
        assert_eq!(aggregate.positive_count, 2);
        assert_eq!(aggregate.negative_count, 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, b"not json").unwrap();

        assert!(FeedbackStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn failed_write_leaves_aggregate_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the final rename fail
        let path = dir.path().join("feedback.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let store = FeedbackStore {
            path: Some(path),
            aggregate: Mutex::new(None),
        };

        assert!(store.increment_positive().await.is_err());
        assert!(store.get_aggregate().await.is_none());
    }
}
