//! Scheduled watchlist range check.
//!
//! One run loads every watchlist entry, fetches a live quote per entry,
//! classifies threshold crossings and emails the owners. Each entry is its
//! own failure boundary: an error while evaluating one entry is logged and
//! the run moves on. Only failing to load the watchlist aborts the run.
//!
//! Nothing records that an alert went out, so an entry that stays past its
//! threshold is alerted again on every run.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::Serialize;

use crate::{
    errors::PipelineError,
    models::{AlertCandidate, AlertKind, WatchlistEntry},
    render::{Notification, format_alert_timestamp, format_price},
};

use super::{
    gateway::QuoteGateway,
    mailer::{Mailer, Outgoing},
    store::Store,
};

/// Classifies `price` against the entry's bounds.
///
/// Min is checked first: when both bounds are met (only possible when
/// `min >= max`) the entry yields a single Min crossing. Returns the kind
/// and the bound that was crossed.
pub fn classify_crossing(entry: &WatchlistEntry, price: f64) -> Option<(AlertKind, f64)> {
    if let Some(min) = entry.min_bound() {
        if price <= min {
            return Some((AlertKind::Min, min));
        }
    }

    if let Some(max) = entry.max_bound() {
        if price >= max {
            return Some((AlertKind::Max, max));
        }
    }

    None
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRunReport {
    pub entries: usize,
    pub skipped: usize,
    pub failed_entries: usize,
    pub min_alerts: usize,
    pub max_alerts: usize,
    pub sent: usize,
    pub failed_sends: usize,
    pub timed_out: bool,
}

impl AlertRunReport {
    pub fn message(&self) -> String {
        if self.entries == 0 {
            return "No watchlist entries to check.".to_string();
        }
        format!("Sent {} watchlist alert emails.", self.sent)
    }
}

pub struct AlertPipeline {
    store: Arc<dyn Store>,
    gateway: Arc<dyn QuoteGateway>,
    mailer: Mailer,
    dispatch_deadline: Option<Duration>,
}

impl AlertPipeline {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn QuoteGateway>, mailer: Mailer) -> Self {
        Self {
            store,
            gateway,
            mailer,
            dispatch_deadline: None,
        }
    }

    pub fn with_dispatch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.dispatch_deadline = deadline;
        self
    }

    pub async fn run(&self) -> Result<AlertRunReport, PipelineError> {
        let entries = self
            .store
            .list_all_watchlist_entries()
            .await
            .map_err(PipelineError::WatchlistUnavailable)?;

        let mut report = AlertRunReport {
            entries: entries.len(),
            ..Default::default()
        };

        if entries.is_empty() {
            tracing::info!("watchlist range check: no entries, nothing to do");
            return Ok(report);
        }

        let mut min_bucket: Vec<AlertCandidate> = Vec::new();
        let mut max_bucket: Vec<AlertCandidate> = Vec::new();

        for entry in &entries {
            match self.evaluate_entry(entry).await {
                Ok(Some(candidate)) => match candidate.kind {
                    AlertKind::Min => min_bucket.push(candidate),
                    AlertKind::Max => max_bucket.push(candidate),
                },
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    report.failed_entries += 1;
                    tracing::warn!(
                        symbol = %entry.symbol,
                        user_id = %entry.user_id,
                        error = %e,
                        "error processing watchlist entry"
                    );
                }
            }
        }

        report.min_alerts = min_bucket.len();
        report.max_alerts = max_bucket.len();

        let batch: Vec<Outgoing> = min_bucket
            .into_iter()
            .chain(max_bucket)
            .map(|c| Outgoing {
                to: c.email.clone(),
                notification: Notification::PriceAlert(c),
            })
            .collect();

        if !batch.is_empty() {
            let summary = self.mailer.send_all(batch, self.dispatch_deadline).await;
            report.sent = summary.sent;
            report.failed_sends = summary.failed;
            report.timed_out = summary.timed_out;
        }

        tracing::info!(
            entries = report.entries,
            min_alerts = report.min_alerts,
            max_alerts = report.max_alerts,
            sent = report.sent,
            failed_sends = report.failed_sends,
            failed_entries = report.failed_entries,
            "watchlist range check finished"
        );

        Ok(report)
    }

    /// `Ok(None)` covers every silent skip: no bounds, no quote, no crossing,
    /// or an owner without an email address.
    pub async fn evaluate_entry(&self, entry: &WatchlistEntry) -> Result<Option<AlertCandidate>, PipelineError> {
        if !entry.has_bounds() {
            return Ok(None);
        }

        let Some(quote) = self.gateway.get_quote(&entry.symbol).await? else {
            tracing::debug!(symbol = %entry.symbol, "no quote available");
            return Ok(None);
        };

        let current = quote.current_price;
        let Some((kind, target)) = classify_crossing(entry, current) else {
            return Ok(None);
        };

        let user = self.store.find_user_by_id(&entry.user_id).await?;
        let Some(email) = user.as_ref().and_then(|u| u.contact_email()) else {
            tracing::debug!(user_id = %entry.user_id, symbol = %entry.symbol, "owner has no email; skipping");
            return Ok(None);
        };

        let company_name = match self.gateway.get_company_name(&entry.symbol).await {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(symbol = %entry.symbol, error = %e, "company name lookup failed");
                String::new()
            }
        };

        Ok(Some(AlertCandidate {
            kind,
            email: email.to_string(),
            symbol: entry.symbol.clone(),
            company_name,
            current_price: format_price(current),
            target_price: format_price(target),
            timestamp: format_alert_timestamp(&Local::now()),
        }))
    }
}
