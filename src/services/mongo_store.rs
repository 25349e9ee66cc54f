use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection, Cursor, Database,
};
use serde::de::DeserializeOwned;

use crate::{
    errors::StoreError,
    models::{User, WatchlistEntry},
};

use super::store::Store;

pub const WATCHLISTS: &str = "watchlists";
pub const USERS: &str = "users";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn watchlists(&self) -> Collection<WatchlistEntry> {
        self.db.collection::<WatchlistEntry>(WATCHLISTS)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>(USERS)
    }

    async fn find_entries(
        &self,
        filter: Document,
        opts: Option<FindOptions>,
    ) -> Result<Vec<WatchlistEntry>, StoreError> {
        let cursor = self
            .db
            .collection::<Document>(WATCHLISTS)
            .find(filter, opts)
            .await?;

        collect_decoded(WATCHLISTS, cursor).await
    }
}

/// Decodes one raw document, or logs and returns `None` when it does not
/// fit `T`. A malformed document never fails the listing it belongs to.
pub fn decode_or_skip<T: DeserializeOwned>(collection: &str, raw: Document) -> Option<T> {
    let id = raw.get("_id").cloned();

    match bson::from_document::<T>(raw) {
        Ok(item) => Some(item),
        Err(e) => {
            tracing::warn!(collection, id = ?id, error = %e, "skipping malformed document");
            None
        }
    }
}

// only driver / cursor errors are returned
async fn collect_decoded<T: DeserializeOwned>(
    collection: &str,
    mut cursor: Cursor<Document>,
) -> Result<Vec<T>, StoreError> {
    let mut items = Vec::new();
    while let Some(res) = cursor.next().await {
        if let Some(item) = decode_or_skip(collection, res?) {
            items.push(item);
        }
    }

    Ok(items)
}

#[async_trait]
impl Store for MongoStore {
    async fn list_all_watchlist_entries(&self) -> Result<Vec<WatchlistEntry>, StoreError> {
        self.find_entries(doc! {}, None).await
    }

    async fn list_watchlist_by_user(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        let find_opts = FindOptions::builder().sort(doc! { "added_at": -1 }).build();
        self.find_entries(doc! { "user_id": user_id }, Some(find_opts)).await
    }

    async fn find_watchlist_entry(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        Ok(self
            .watchlists()
            .find_one(doc! { "user_id": user_id, "symbol": symbol }, None)
            .await?)
    }

    async fn upsert_watchlist_entry(&self, entry: WatchlistEntry) -> Result<WatchlistEntry, StoreError> {
        let opts = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let update = doc! {
            "$set": {
                "user_id": entry.user_id.as_str(),
                "symbol": entry.symbol.as_str(),
                "company": entry.company.as_str(),
                "min_value": entry.min_value,
                "max_value": entry.max_value,
            },
            "$setOnInsert": {
                "added_at": bson::DateTime::from_chrono(entry.added_at),
            }
        };

        let stored = self
            .watchlists()
            .find_one_and_update(
                doc! { "user_id": entry.user_id.as_str(), "symbol": entry.symbol.as_str() },
                update,
                opts,
            )
            .await?;

        stored.ok_or_else(|| StoreError::Unavailable("upsert returned no document".to_string()))
    }

    async fn delete_watchlist_entry(&self, user_id: &str, symbol: &str) -> Result<bool, StoreError> {
        let res = self
            .watchlists()
            .delete_one(doc! { "user_id": user_id, "symbol": symbol }, None)
            .await?;

        Ok(res.deleted_count > 0)
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        // a reference that is not an ObjectId cannot point at a user
        let Ok(oid) = ObjectId::parse_str(user_id) else {
            return Ok(None);
        };

        Ok(self.users().find_one(doc! { "_id": oid }, None).await?)
    }

    async fn list_users_for_news(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self
            .db
            .collection::<Document>(USERS)
            .find(doc! { "email": { "$exists": true, "$ne": null } }, None)
            .await?;

        collect_decoded(USERS, cursor).await
    }
}
