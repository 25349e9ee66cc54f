use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};

use crate::errors::StoreError;

pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    // watchlists: unique per (user_id, symbol)
    {
        let col = db.collection::<mongodb::bson::Document>("watchlists");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "symbol": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // users: unique email. The auth side may own this index already, so a
    // conflict here is only logged.
    {
        let col = db.collection::<mongodb::bson::Document>("users");
        let model = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();

        if let Err(e) = col.create_index(model, None).await {
            tracing::warn!(error = %e, "could not create users.email index");
        }
    }

    Ok(())
}
