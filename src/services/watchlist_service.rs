use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{NewWatchlistEntry, WatchlistEntry};

use super::store::Store;

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,14}$").expect("symbol pattern"));

/// Outcome of an interactive watchlist action. Failures are reported here,
/// never raised.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn check_bound(label: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(format!("{label} must be a positive number.")),
        _ => Ok(()),
    }
}

/// Validates the add-action input and turns it into an entry for `user_id`.
pub fn validate_new_entry(user_id: &str, input: &NewWatchlistEntry) -> Result<WatchlistEntry, String> {
    let symbol = normalize_symbol(&input.symbol);
    if !SYMBOL_RE.is_match(&symbol) {
        return Err("Please enter a valid symbol.".to_string());
    }

    check_bound("Minimum price", input.min_value)?;
    check_bound("Maximum price", input.max_value)?;

    if let (Some(min), Some(max)) = (input.min_value, input.max_value) {
        if min > max {
            return Err("Minimum price cannot be above the maximum price.".to_string());
        }
    }

    Ok(WatchlistEntry::new(
        user_id,
        symbol,
        input.company.trim(),
        input.min_value,
        input.max_value,
    ))
}

/// Adds the symbol to the user's watchlist, or updates the bounds when it is
/// already there.
pub async fn add_to_watchlist(
    store: &dyn Store,
    user_id: &str,
    input: &NewWatchlistEntry,
) -> ActionResult<WatchlistEntry> {
    let entry = match validate_new_entry(user_id, input) {
        Ok(e) => e,
        Err(msg) => return ActionResult::fail(msg),
    };

    match store.upsert_watchlist_entry(entry).await {
        Ok(stored) => ActionResult::ok(stored),
        Err(e) => {
            tracing::error!(user_id, symbol = %input.symbol, error = %e, "add watchlist failed");
            ActionResult::fail("Add watchlist failed")
        }
    }
}

pub async fn remove_from_watchlist(store: &dyn Store, user_id: &str, symbol: &str) -> ActionResult<bool> {
    let sym = normalize_symbol(symbol);

    match store.delete_watchlist_entry(user_id, &sym).await {
        Ok(true) => ActionResult::ok(true),
        Ok(false) => ActionResult::fail(format!("{sym} is not in your watchlist")),
        Err(e) => {
            tracing::error!(user_id, symbol = %sym, error = %e, "remove watchlist failed");
            ActionResult::fail("Remove watchlist failed")
        }
    }
}

/// Lookup failures read as "not in watchlist".
pub async fn is_in_watchlist(store: &dyn Store, user_id: &str, symbol: &str) -> bool {
    match store.find_watchlist_entry(user_id, &normalize_symbol(symbol)).await {
        Ok(found) => found.is_some(),
        Err(e) => {
            tracing::warn!(user_id, symbol, error = %e, "watchlist lookup failed");
            false
        }
    }
}

pub async fn list_watchlist(store: &dyn Store, user_id: &str) -> ActionResult<Vec<WatchlistEntry>> {
    match store.list_watchlist_by_user(user_id).await {
        Ok(items) => ActionResult::ok(items),
        Err(e) => {
            tracing::error!(user_id, error = %e, "fetching watchlist failed");
            ActionResult::fail("Fetching watchlist failed")
        }
    }
}
