use async_trait::async_trait;

use crate::{
    errors::StoreError,
    models::{User, WatchlistEntry},
};

/// Document store holding watchlist entries and (read-only) users.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_all_watchlist_entries(&self) -> Result<Vec<WatchlistEntry>, StoreError>;

    async fn list_watchlist_by_user(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError>;

    async fn find_watchlist_entry(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Option<WatchlistEntry>, StoreError>;

    /// Inserts the entry, or overwrites company and bounds of the existing
    /// one for the same `(user_id, symbol)`; `added_at` keeps its first
    /// value. Returns what is stored afterwards.
    async fn upsert_watchlist_entry(&self, entry: WatchlistEntry) -> Result<WatchlistEntry, StoreError>;

    /// Returns whether an entry was removed.
    async fn delete_watchlist_entry(&self, user_id: &str, symbol: &str) -> Result<bool, StoreError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Users that have an email address on file.
    async fn list_users_for_news(&self) -> Result<Vec<User>, StoreError>;
}
