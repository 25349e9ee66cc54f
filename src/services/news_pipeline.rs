use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::{
    errors::PipelineError,
    models::{Article, User},
    render::{Notification, format_digest_date},
};

use super::{
    gateway::{MAX_NEWS_ARTICLES, QuoteGateway},
    mailer::{Mailer, Outgoing},
    store::Store,
    text_gen::{FALLBACK_NEWS_SUMMARY, NEWS_SUMMARY_PROMPT, TextGenerator},
};

#[derive(Debug, Clone)]
struct Recipient {
    user_id: String,
    email: String,
}

impl Recipient {
    // digest recipients need both an email and a name on file
    fn from_user(user: &User) -> Option<Self> {
        let email = user.contact_email()?;
        user.name.as_deref().filter(|n| !n.trim().is_empty())?;

        Some(Self {
            user_id: user.id.to_hex(),
            email: email.to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestRunReport {
    pub users: usize,
    pub digests: usize,
    pub news_failures: usize,
    pub summary_failures: usize,
    pub sent: usize,
    pub failed_sends: usize,
    pub timed_out: bool,
}

impl DigestRunReport {
    pub fn message(&self) -> String {
        if self.users == 0 {
            return "No users found for news email.".to_string();
        }
        format!("Sent {} daily news summary emails.", self.sent)
    }
}

/// Daily per-user news digest.
pub struct NewsDigestPipeline {
    store: Arc<dyn Store>,
    gateway: Arc<dyn QuoteGateway>,
    text_gen: Arc<dyn TextGenerator>,
    mailer: Mailer,
    dispatch_deadline: Option<Duration>,
}

impl NewsDigestPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn QuoteGateway>,
        text_gen: Arc<dyn TextGenerator>,
        mailer: Mailer,
    ) -> Self {
        Self {
            store,
            gateway,
            text_gen,
            mailer,
            dispatch_deadline: None,
        }
    }

    pub fn with_dispatch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.dispatch_deadline = deadline;
        self
    }

    pub async fn run(&self) -> Result<DigestRunReport, PipelineError> {
        let users = self
            .store
            .list_users_for_news()
            .await
            .map_err(PipelineError::UsersUnavailable)?;

        let recipients: Vec<Recipient> = users.iter().filter_map(Recipient::from_user).collect();

        let mut report = DigestRunReport {
            users: recipients.len(),
            ..Default::default()
        };

        if recipients.is_empty() {
            tracing::info!("news digest: no users to send to");
            return Ok(report);
        }

        let date = format_digest_date(&Utc::now());
        let mut batch: Vec<Outgoing> = Vec::new();

        for recipient in &recipients {
            let articles = match self.articles_for(&recipient.user_id).await {
                Ok(a) => a,
                Err(e) => {
                    report.news_failures += 1;
                    tracing::warn!(email = %recipient.email, error = %e, "error preparing user news");
                    Vec::new()
                }
            };

            let Some(news_content) = self.summarize(&recipient.email, &articles).await else {
                report.summary_failures += 1;
                continue;
            };

            batch.push(Outgoing {
                to: recipient.email.clone(),
                notification: Notification::NewsDigest {
                    date: date.clone(),
                    news_content,
                },
            });
        }

        report.digests = batch.len();

        if !batch.is_empty() {
            let summary = self.mailer.send_all(batch, self.dispatch_deadline).await;
            report.sent = summary.sent;
            report.failed_sends = summary.failed;
            report.timed_out = summary.timed_out;
        }

        tracing::info!(
            users = report.users,
            digests = report.digests,
            sent = report.sent,
            failed_sends = report.failed_sends,
            summary_failures = report.summary_failures,
            "news digest finished"
        );

        Ok(report)
    }

    /// News for the user's watchlist symbols, falling back to general market
    /// news when that comes back empty. Capped at six articles.
    pub async fn articles_for(&self, user_id: &str) -> Result<Vec<Article>, PipelineError> {
        let symbols: Vec<String> = self
            .store
            .list_watchlist_by_user(user_id)
            .await?
            .into_iter()
            .map(|e| e.symbol)
            .collect();

        let mut articles = Vec::new();
        if !symbols.is_empty() {
            articles = self.gateway.get_news(Some(symbols.as_slice())).await?;
            articles.truncate(MAX_NEWS_ARTICLES);
        }

        if articles.is_empty() {
            articles = self.gateway.get_news(None).await?;
            articles.truncate(MAX_NEWS_ARTICLES);
        }

        Ok(articles)
    }

    /// `None` when generation failed; the user then gets no digest this run.
    async fn summarize(&self, email: &str, articles: &[Article]) -> Option<String> {
        let news_data = match serde_json::to_string_pretty(articles) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "failed to encode articles for summary");
                return None;
            }
        };

        let prompt = NEWS_SUMMARY_PROMPT.replace("{{newsData}}", &news_data);

        match self.text_gen.generate(&prompt).await {
            Ok(Some(text)) => Some(text),
            Ok(None) => Some(FALLBACK_NEWS_SUMMARY.to_string()),
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "failed to summarize news");
                None
            }
        }
    }
}
