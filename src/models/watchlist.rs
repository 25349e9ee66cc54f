use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};

/// One tracked symbol for one user, unique per `(user_id, symbol)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,
    pub symbol: String,

    #[serde(default)]
    pub company: String,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub min_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bound")]
    pub max_value: Option<f64>,

    // documents written without a timestamp read as the epoch
    #[serde(default, with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        company: impl Into<String>,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            symbol: symbol.into(),
            company: company.into(),
            min_value,
            max_value,
            added_at: Utc::now(),
        }
    }

    /// Lower bound, ignoring non-finite values.
    pub fn min_bound(&self) -> Option<f64> {
        self.min_value.filter(|v| v.is_finite())
    }

    /// Upper bound, ignoring non-finite values.
    pub fn max_bound(&self) -> Option<f64> {
        self.max_value.filter(|v| v.is_finite())
    }

    pub fn has_bounds(&self) -> bool {
        self.min_bound().is_some() || self.max_bound().is_some()
    }
}

/// Input of the "add to watchlist" action, before validation. Bounds may
/// arrive as numbers or as form strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlistEntry {
    pub symbol: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_bound")]
    pub min_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bound")]
    pub max_value: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBound {
    Number(f64),
    Text(String),
}

// Bounds written by older clients may be strings; anything unparsable is
// treated as "not set".
fn lenient_bound<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawBound>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawBound::Number(n)) => Some(n),
        Some(RawBound::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}
