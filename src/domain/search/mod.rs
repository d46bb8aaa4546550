//! # Search Contracts
//!
//! Which records are searchable, how writes are tracked inside a unit of
//! work, and the interface of the external full-text index.
//!
//! The set of record kinds is closed ([`TrackedRecord`]); a kind is
//! searchable when it implements [`Searchable`] and its variant projects a
//! [`SearchDocument`]. Today only posts are searchable, indexed by body.

use crate::domain::entities::{Message, Notification, Post, User};

/// A record kind mirrored into the full-text index.
pub trait Searchable {
    /// Index collection name
    const COLLECTION: &'static str;

    /// Indexed field names
    const FIELDS: &'static [&'static str];

    fn search_id(&self) -> i64;

    fn field_value(&self, field: &str) -> Option<&str>;

    /// Denormalized projection of the indexed fields.
    fn to_search_document(&self) -> SearchDocument {
        SearchDocument {
            collection: Self::COLLECTION,
            id: self.search_id(),
            fields: Self::FIELDS
                .iter()
                .filter_map(|&name| self.field_value(name).map(|v| (name, v.to_string())))
                .collect(),
        }
    }
}

/// A searchable collection and its indexed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchableCollection {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

/// Every searchable collection. The index schema is built from this list.
pub const SEARCHABLE_COLLECTIONS: &[SearchableCollection] = &[SearchableCollection {
    name: Post::COLLECTION,
    fields: Post::FIELDS,
}];

/// Look up a searchable collection by name.
pub fn searchable_collection(name: &str) -> Option<&'static SearchableCollection> {
    SEARCHABLE_COLLECTIONS.iter().find(|c| c.name == name)
}

/// Index entry for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    pub collection: &'static str,
    pub id: i64,
    pub fields: Vec<(&'static str, String)>,
}

/// A record written inside a unit of work.
#[derive(Debug, Clone)]
pub enum TrackedRecord {
    User(User),
    Post(Post),
    Message(Message),
    Notification(Notification),
}

impl TrackedRecord {
    /// Index projection, for searchable kinds only.
    pub fn search_document(&self) -> Option<SearchDocument> {
        match self {
            TrackedRecord::Post(post) => Some(post.to_search_document()),
            TrackedRecord::User(_) | TrackedRecord::Message(_) | TrackedRecord::Notification(_) => {
                None
            }
        }
    }

    /// `(collection, id)` of the index entry, for searchable kinds only.
    pub fn search_key(&self) -> Option<(&'static str, i64)> {
        match self {
            TrackedRecord::Post(post) => Some((Post::COLLECTION, post.search_id())),
            TrackedRecord::User(_) | TrackedRecord::Message(_) | TrackedRecord::Notification(_) => {
                None
            }
        }
    }
}

impl From<User> for TrackedRecord {
    fn from(user: User) -> Self {
        TrackedRecord::User(user)
    }
}

impl From<Post> for TrackedRecord {
    fn from(post: Post) -> Self {
        TrackedRecord::Post(post)
    }
}

impl From<Message> for TrackedRecord {
    fn from(message: Message) -> Self {
        TrackedRecord::Message(message)
    }
}

impl From<Notification> for TrackedRecord {
    fn from(notification: Notification) -> Self {
        TrackedRecord::Notification(notification)
    }
}

/// Records created, modified and deleted in one transaction.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub added: Vec<TrackedRecord>,
    pub updated: Vec<TrackedRecord>,
    pub deleted: Vec<TrackedRecord>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Ordered ids from an index query plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    pub ids: Vec<i64>,
    pub total: u64,
}

impl SearchHits {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Index write failed: {0}")]
    Write(String),

    #[error("Index query failed: {0}")]
    Query(String),

    #[error("Index storage error: {0}")]
    Storage(String),
}

/// External full-text index.
///
/// Upserts and removals are idempotent. Queries never fail: a malformed
/// expression or an unknown collection yields no hits.
#[cfg_attr(test, mockall::automock)]
pub trait SearchIndex: Send + Sync {
    fn add_or_update(
        &self,
        collection: &str,
        id: i64,
        fields: &[(&'static str, String)],
    ) -> Result<(), IndexError>;

    fn remove(&self, collection: &str, id: i64) -> Result<(), IndexError>;

    /// Page `page` (1-based) of matches in relevance order.
    fn query(&self, collection: &str, expression: &str, page: usize, page_size: usize)
        -> SearchHits;
}
