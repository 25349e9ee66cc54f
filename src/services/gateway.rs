use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    errors::GatewayError,
    models::{Article, Quote},
};

/// Most articles a single news lookup (and a single digest) carries.
pub const MAX_NEWS_ARTICLES: usize = 6;

/// Market data lookups used by the jobs.
///
/// "No data" is `Ok(None)` (or an empty list); `Err` is reserved for
/// transport failures and bad responses.
#[async_trait]
pub trait QuoteGateway: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>, GatewayError>;

    async fn get_company_name(&self, symbol: &str) -> Result<Option<String>, GatewayError>;

    /// Company news for `symbols`, or general market news when `symbols` is
    /// `None` or empty.
    async fn get_news(&self, symbols: Option<&[String]>) -> Result<Vec<Article>, GatewayError>;
}

/// Article as the news API returns it; any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub datetime: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub related: Option<String>,
}

fn present(s: &Option<String>) -> bool {
    s.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

pub fn is_valid_article(a: &RawArticle) -> bool {
    present(&a.headline) && present(&a.summary) && present(&a.url) && a.datetime.unwrap_or(0) != 0
}

fn truncate_summary(summary: &str, max_chars: usize) -> String {
    let cut: String = summary.trim().chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Cleans a valid raw article for display. Company news keeps a longer
/// summary and is tagged with the symbol it was fetched for.
pub fn format_article(raw: &RawArticle, company_symbol: Option<&str>, index: usize) -> Article {
    let is_company = company_symbol.is_some();
    let summary_len = if is_company { 200 } else { 150 };

    let source = raw
        .source
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| if is_company { "Company News" } else { "Market News" }.to_string());

    let category = match company_symbol {
        Some(_) => "company".to_string(),
        None => raw
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "general".to_string()),
    };

    let related = match company_symbol {
        Some(sym) => sym.to_string(),
        None => raw.related.clone().unwrap_or_default(),
    };

    Article {
        id: raw.id.unwrap_or(0) + index as i64,
        headline: raw.headline.as_deref().unwrap_or_default().trim().to_string(),
        summary: truncate_summary(raw.summary.as_deref().unwrap_or_default(), summary_len),
        source,
        url: raw.url.clone().unwrap_or_default(),
        datetime: raw.datetime.unwrap_or(0),
        image: raw.image.clone().unwrap_or_default(),
        category,
        related,
    }
}

/// Trimmed, upper-cased, de-duplicated symbols in their original order.
pub fn clean_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Picks articles round-robin across symbols so one noisy ticker cannot
/// crowd out the others, then orders the result newest first.
pub fn interleave_company_news(per_symbol: Vec<(String, Vec<RawArticle>)>, max: usize) -> Vec<Article> {
    let mut queues: Vec<(String, std::collections::VecDeque<RawArticle>)> = per_symbol
        .into_iter()
        .map(|(sym, list)| (sym, list.into_iter().filter(is_valid_article).collect()))
        .collect();

    let mut collected = Vec::new();

    'rounds: for round in 0..max {
        for (sym, queue) in queues.iter_mut() {
            let Some(article) = queue.pop_front() else {
                continue;
            };
            collected.push(format_article(&article, Some(sym.as_str()), round));
            if collected.len() >= max {
                break 'rounds;
            }
        }
    }

    collected.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    collected.truncate(max);
    collected
}

/// General market news: drops exact duplicates (same id, url and headline)
/// and invalid articles, keeps at most `max`.
pub fn select_general_news(raw: Vec<RawArticle>, max: usize) -> Vec<Article> {
    let mut seen = HashSet::new();

    raw.into_iter()
        .filter(|a| {
            let key = format!(
                "{}-{}-{}",
                a.id.unwrap_or(0),
                a.url.as_deref().unwrap_or_default(),
                a.headline.as_deref().unwrap_or_default()
            );
            seen.insert(key)
        })
        .filter(is_valid_article)
        .take(max)
        .enumerate()
        .map(|(idx, a)| format_article(&a, None, idx))
        .collect()
}
