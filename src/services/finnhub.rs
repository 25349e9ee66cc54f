use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures_util::future::join_all;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    errors::GatewayError,
    models::{Article, Quote},
};

use super::gateway::{
    MAX_NEWS_ARTICLES, QuoteGateway, RawArticle, clean_symbols, interleave_company_news,
    select_general_news,
};

const COMPANY_NEWS_DAYS: i64 = 5;

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        if !self.has_key() {
            return Err(GatewayError::MissingApiKey);
        }

        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        Ok(res.json::<T>().await?)
    }

    pub async fn quote(&self, symbol: &str) -> Result<QuoteResponse, GatewayError> {
        self.get_json("/quote", &[("symbol", symbol)]).await
    }

    pub async fn profile(&self, symbol: &str) -> Result<ProfileResponse, GatewayError> {
        self.get_json("/stock/profile2", &[("symbol", symbol)]).await
    }

    pub async fn company_news(&self, symbol: &str) -> Result<Vec<RawArticle>, GatewayError> {
        let to = Utc::now();
        let from = to - Duration::days(COMPANY_NEWS_DAYS);
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        self.get_json(
            "/company-news",
            &[("symbol", symbol), ("from", from.as_str()), ("to", to.as_str())],
        )
        .await
    }

    pub async fn general_news(&self) -> Result<Vec<RawArticle>, GatewayError> {
        self.get_json("/news", &[("category", "general")]).await
    }
}

#[async_trait]
impl QuoteGateway for FinnhubClient {
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>, GatewayError> {
        let q = self.quote(symbol).await?;

        // unknown symbols come back as an all-zero quote
        Ok(q.c.filter(|c| c.is_finite() && *c > 0.0).map(|c| Quote {
            symbol: symbol.to_string(),
            current_price: c,
        }))
    }

    async fn get_company_name(&self, symbol: &str) -> Result<Option<String>, GatewayError> {
        let profile = self.profile(symbol).await?;
        Ok(profile.name.filter(|n| !n.trim().is_empty()))
    }

    async fn get_news(&self, symbols: Option<&[String]>) -> Result<Vec<Article>, GatewayError> {
        let symbols = symbols.map(clean_symbols).unwrap_or_default();

        if !symbols.is_empty() {
            let fetched = join_all(symbols.iter().map(|sym| async move {
                match self.company_news(sym).await {
                    Ok(list) => (sym.clone(), list),
                    Err(e) => {
                        tracing::warn!(symbol = %sym, error = %e, "company news fetch failed");
                        (sym.clone(), Vec::new())
                    }
                }
            }))
            .await;

            let collected = interleave_company_news(fetched, MAX_NEWS_ARTICLES);
            if !collected.is_empty() {
                return Ok(collected);
            }
        }

        let general = self.general_news().await?;
        Ok(select_general_news(general, MAX_NEWS_ARTICLES))
    }
}

// `c` is the current price; null or missing reads as no data
#[derive(Debug, Default, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub c: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub name: Option<String>,
}
