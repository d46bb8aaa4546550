//! Index Synchronizer
//!
//! Mirrors committed writes of searchable records into the [`SearchIndex`].
//! The work is split in two so nothing reaches the index unless the database
//! commit succeeded:
//!
//! - [`IndexSynchronizer::before_commit`] projects the tracked [`ChangeSet`]
//!   into [`PendingIndexChanges`] without touching the index.
//! - [`IndexSynchronizer::after_commit`] applies those pending changes.

use std::sync::Arc;

use crate::domain::entities::Post;
use crate::domain::search::{ChangeSet, SearchDocument, SearchHits, SearchIndex, Searchable};
use crate::infrastructure::metrics;

/// Index work captured before a commit, applied after it.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use = "pending index changes do nothing unless passed to after_commit"]
pub struct PendingIndexChanges {
    upserts: Vec<SearchDocument>,
    removals: Vec<(&'static str, i64)>,
}

impl PendingIndexChanges {
    pub fn upserts(&self) -> &[SearchDocument] {
        &self.upserts
    }

    pub fn removals(&self) -> &[(&'static str, i64)] {
        &self.removals
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty()
    }
}

/// Applies committed searchable changes to the index.
pub struct IndexSynchronizer {
    index: Arc<dyn SearchIndex>,
}

impl IndexSynchronizer {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<dyn SearchIndex> {
        &self.index
    }

    /// Project tracked records into index work. Non-searchable records are
    /// skipped. Added records come first, then updated, then deleted.
    pub fn before_commit(changes: ChangeSet) -> PendingIndexChanges {
        let ChangeSet {
            added,
            updated,
            deleted,
        } = changes;

        let upserts = added
            .iter()
            .chain(updated.iter())
            .filter_map(|record| record.search_document())
            .collect();
        let removals = deleted
            .iter()
            .filter_map(|record| record.search_key())
            .collect();

        PendingIndexChanges { upserts, removals }
    }

    /// Apply pending changes. Failures are logged and counted; the commit
    /// already happened, so nothing is propagated or retried.
    pub fn after_commit(&self, pending: PendingIndexChanges) {
        if pending.is_empty() {
            return;
        }

        for doc in &pending.upserts {
            let result = self.index.add_or_update(doc.collection, doc.id, &doc.fields);
            metrics::record_index_operation("upsert", result.is_ok());
            if let Err(e) = result {
                metrics::record_index_sync_failure();
                tracing::error!(
                    collection = doc.collection,
                    id = doc.id,
                    error = %e,
                    "Failed to update search index after commit"
                );
            }
        }

        for &(collection, id) in &pending.removals {
            let result = self.index.remove(collection, id);
            metrics::record_index_operation("remove", result.is_ok());
            if let Err(e) = result {
                metrics::record_index_sync_failure();
                tracing::error!(
                    collection,
                    id,
                    error = %e,
                    "Failed to remove from search index after commit"
                );
            }
        }

        tracing::debug!(
            upserts = pending.upserts.len(),
            removals = pending.removals.len(),
            "Search index synchronized"
        );
    }

    /// Run a search. Malformed expressions already come back as no hits.
    pub fn query(
        &self,
        collection: &str,
        expression: &str,
        page: usize,
        page_size: usize,
    ) -> SearchHits {
        let hits = self.index.query(collection, expression, page, page_size);
        metrics::record_index_operation("query", true);
        hits
    }

    /// Upsert every given post. Returns how many were indexed.
    pub fn reindex(&self, posts: &[Post]) -> usize {
        let mut indexed = 0;
        for post in posts {
            let doc = post.to_search_document();
            let result = self.index.add_or_update(doc.collection, doc.id, &doc.fields);
            metrics::record_index_operation("upsert", result.is_ok());
            match result {
                Ok(()) => indexed += 1,
                Err(e) => {
                    tracing::error!(id = post.id, error = %e, "Failed to reindex post");
                }
            }
        }
        tracing::info!(indexed, total = posts.len(), "Reindexed posts");
        indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Message, Notification, User};
    use crate::domain::search::{IndexError, MockSearchIndex, TrackedRecord};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn post(id: i64, body: &str) -> Post {
        Post {
            id,
            body: body.into(),
            ..Post::default()
        }
    }

    #[test]
    fn test_before_commit_projects_only_searchable_records() {
        let changes = ChangeSet {
            added: vec![
                TrackedRecord::from(post(1, "first")),
                TrackedRecord::from(User::default()),
                TrackedRecord::from(Message {
                    id: 9,
                    sender_id: 1,
                    recipient_id: 2,
                    body: "hi".into(),
                    created_at: chrono::Utc::now(),
                }),
            ],
            updated: vec![TrackedRecord::from(post(2, "second"))],
            deleted: vec![
                TrackedRecord::from(post(3, "gone")),
                TrackedRecord::from(Notification::new(4, 1, "unread_message_count", 0.into())),
            ],
        };

        let pending = IndexSynchronizer::before_commit(changes);

        let ids: Vec<i64> = pending.upserts().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(pending.removals(), &[("posts", 3)]);
    }

    #[test]
    fn test_before_commit_of_empty_change_set() {
        let pending = IndexSynchronizer::before_commit(ChangeSet::default());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_after_commit_applies_upserts_then_removals() {
        let mut index = MockSearchIndex::new();
        let mut seq = Sequence::new();
        index
            .expect_add_or_update()
            .withf(|_, id, _| *id == 1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        index
            .expect_remove()
            .withf(|collection, id| collection == "posts" && *id == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let changes = ChangeSet {
            added: vec![TrackedRecord::from(post(1, "new"))],
            updated: vec![],
            deleted: vec![TrackedRecord::from(post(2, "old"))],
        };
        let synchronizer = IndexSynchronizer::new(Arc::new(index));
        synchronizer.after_commit(IndexSynchronizer::before_commit(changes));
    }

    #[test]
    fn test_after_commit_continues_past_failures() {
        let mut index = MockSearchIndex::new();
        index
            .expect_add_or_update()
            .times(2)
            .returning(|_, id, _| {
                if id == 1 {
                    Err(IndexError::Write("locked".into()))
                } else {
                    Ok(())
                }
            });
        index
            .expect_remove()
            .times(1)
            .returning(|_, _| Err(IndexError::Storage("gone".into())));

        let changes = ChangeSet {
            added: vec![
                TrackedRecord::from(post(1, "a")),
                TrackedRecord::from(post(2, "b")),
            ],
            updated: vec![],
            deleted: vec![TrackedRecord::from(post(3, "c"))],
        };
        let synchronizer = IndexSynchronizer::new(Arc::new(index));
        synchronizer.after_commit(IndexSynchronizer::before_commit(changes));
    }

    #[test]
    fn test_reindex_counts_successes() {
        let mut index = MockSearchIndex::new();
        index
            .expect_add_or_update()
            .times(3)
            .returning(|_, id, _| {
                if id == 2 {
                    Err(IndexError::Write("bad".into()))
                } else {
                    Ok(())
                }
            });

        let synchronizer = IndexSynchronizer::new(Arc::new(index));
        let posts = vec![post(1, "a"), post(2, "b"), post(3, "c")];
        assert_eq!(synchronizer.reindex(&posts), 2);
    }

    #[test]
    fn test_query_is_counted() {
        let mut index = MockSearchIndex::new();
        index
            .expect_query()
            .times(1)
            .returning(|_, _, _, _| SearchHits { ids: vec![4], total: 1 });

        let hits = IndexSynchronizer::new(Arc::new(index)).query("posts", "words", 1, 10);

        assert_eq!(hits.ids, vec![4]);
        assert!(metrics::gather_metrics().contains("operation=\"query\""));
    }
}
