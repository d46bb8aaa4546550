//! Full-text search infrastructure.
//!
//! - [`TantivySearchIndex`]: the [`SearchIndex`](crate::domain::search::SearchIndex)
//!   implementation
//! - [`IndexSynchronizer`]: keeps it in step with committed writes

mod synchronizer;
mod tantivy_index;

pub use synchronizer::{IndexSynchronizer, PendingIndexChanges};
pub use tantivy_index::{TantivySearchIndex, MIN_WRITER_MEMORY_BYTES};

use std::sync::Arc;

use crate::config::SearchSettings;
use crate::domain::search::{IndexError, SearchIndex};

/// Build the index described by the search settings: on disk when a path is
/// configured, in memory otherwise.
pub fn build_search_index(settings: &SearchSettings) -> Result<Arc<dyn SearchIndex>, IndexError> {
    let index = match settings.index_path.as_deref() {
        Some(path) if !path.trim().is_empty() => {
            TantivySearchIndex::open(path, settings.writer_memory_bytes)?
        }
        _ => {
            tracing::info!("Using in-memory search index");
            TantivySearchIndex::new_in_ram(settings.writer_memory_bytes)?
        }
    };
    Ok(Arc::new(index))
}
