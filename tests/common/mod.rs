#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use stockwatch::{
    config,
    errors::{GatewayError, MailError, StoreError, TextGenError},
    models::{Article, Quote, User, WatchlistEntry},
    render::{RenderedEmail, Renderer},
    services::{
        gateway::QuoteGateway,
        jobs::JobTrigger,
        mailer::{MailTransport, Mailer},
        store::Store,
        text_gen::TextGenerator,
    },
    AppState,
};

// In-memory Store keyed by (user_id, symbol), like the unique index.
#[derive(Default)]
pub struct MemoryStore {
    pub entries: Mutex<Vec<WatchlistEntry>>,
    pub users: Mutex<Vec<User>>,
    pub fail_listing: bool,
    pub fail_users_for: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }

    pub fn with_entry(self, entry: WatchlistEntry) -> Self {
        self.entries.lock().unwrap().push(entry);
        self
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_all_watchlist_entries(&self) -> Result<Vec<WatchlistEntry>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Unavailable("connection lost".into()));
        }
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn list_watchlist_by_user(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_watchlist_entry(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == user_id && e.symbol == symbol)
            .cloned())
    }

    async fn upsert_watchlist_entry(&self, mut entry: WatchlistEntry) -> Result<WatchlistEntry, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|e| e.user_id == entry.user_id && e.symbol == entry.symbol)
        {
            Some(existing) => {
                entry.id = existing.id;
                entry.added_at = existing.added_at;
                *existing = entry.clone();
            }
            None => {
                entry.id = Some(ObjectId::new());
                entries.push(entry.clone());
            }
        }
        Ok(entry)
    }

    async fn delete_watchlist_entry(&self, user_id: &str, symbol: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.symbol == symbol));
        Ok(entries.len() < before)
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        if self.fail_users_for.contains(user_id) {
            return Err(StoreError::Unavailable("user lookup failed".into()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id.to_hex() == user_id)
            .cloned())
    }

    async fn list_users_for_news(&self) -> Result<Vec<User>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Unavailable("connection lost".into()));
        }
        Ok(self.users.lock().unwrap().clone())
    }
}

pub fn user(email: Option<&str>, name: Option<&str>) -> User {
    User {
        id: ObjectId::new(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        country: None,
    }
}

pub fn entry(user: &User, symbol: &str, min: Option<f64>, max: Option<f64>) -> WatchlistEntry {
    WatchlistEntry::new(user.id.to_hex(), symbol, format!("{symbol} Inc."), min, max)
}

// Quote gateway with canned answers per symbol.
#[derive(Clone)]
pub enum QuoteBehavior {
    Price(f64),
    NoData,
    Fail,
}

#[derive(Default)]
pub struct FakeGateway {
    pub quotes: HashMap<String, QuoteBehavior>,
    pub names: HashMap<String, String>,
    pub company_news: HashMap<String, Vec<Article>>,
    pub general_news: Vec<Article>,
    pub fail_news_for: HashSet<String>,
    pub quote_calls: AtomicUsize,
    pub name_calls: AtomicUsize,
    pub news_calls: Mutex<Vec<Option<Vec<String>>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quote(mut self, symbol: &str, behavior: QuoteBehavior) -> Self {
        self.quotes.insert(symbol.to_string(), behavior);
        self
    }

    pub fn name(mut self, symbol: &str, name: &str) -> Self {
        self.names.insert(symbol.to_string(), name.to_string());
        self
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
            + self.name_calls.load(Ordering::SeqCst)
            + self.news_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QuoteGateway for FakeGateway {
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>, GatewayError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        match self.quotes.get(symbol) {
            Some(QuoteBehavior::Price(p)) => Ok(Some(Quote {
                symbol: symbol.to_string(),
                current_price: *p,
            })),
            Some(QuoteBehavior::Fail) => Err(GatewayError::Status {
                status: 502,
                body: "upstream exploded".into(),
            }),
            Some(QuoteBehavior::NoData) | None => Ok(None),
        }
    }

    async fn get_company_name(&self, symbol: &str) -> Result<Option<String>, GatewayError> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.get(symbol).cloned())
    }

    async fn get_news(&self, symbols: Option<&[String]>) -> Result<Vec<Article>, GatewayError> {
        self.news_calls
            .lock()
            .unwrap()
            .push(symbols.map(|s| s.to_vec()));

        match symbols {
            Some(list) if !list.is_empty() => {
                if list.iter().any(|s| self.fail_news_for.contains(s)) {
                    return Err(GatewayError::Status {
                        status: 500,
                        body: "news down".into(),
                    });
                }
                Ok(list
                    .iter()
                    .flat_map(|s| self.company_news.get(s).cloned().unwrap_or_default())
                    .collect())
            }
            _ => Ok(self.general_news.clone()),
        }
    }
}

pub fn article(id: i64, headline: &str) -> Article {
    Article {
        id,
        headline: headline.to_string(),
        summary: format!("{headline} summary..."),
        source: "Test Wire".to_string(),
        url: format!("https://news.example.com/{id}"),
        datetime: 1_700_000_000 + id,
        image: String::new(),
        category: "company".to_string(),
        related: String::new(),
    }
}

// Records every delivery instead of talking to SMTP.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(String, RenderedEmail)>>,
    pub fail_for: HashSet<String>,
    pub delay_for: HashMap<String, Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, to: &str) -> Self {
        self.fail_for.insert(to.to_string());
        self
    }

    pub fn delayed_for(mut self, to: &str, delay: Duration) -> Self {
        self.delay_for.insert(to.to_string(), delay);
        self
    }

    pub fn sent(&self) -> Vec<(String, RenderedEmail)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        let mut r: Vec<String> = self.sent().into_iter().map(|(to, _)| to).collect();
        r.sort();
        r
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, to: &str, email: &RenderedEmail) -> Result<(), MailError> {
        if let Some(delay) = self.delay_for.get(to) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_for.contains(to) {
            return Err(MailError::Transport(format!("mailbox {to} unavailable")));
        }
        self.sent.lock().unwrap().push((to.to_string(), email.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn mailer(transport: Arc<RecordingTransport>) -> Mailer {
    Mailer::new(Renderer::new().expect("templates"), transport)
}

pub enum TextBehavior {
    Reply(String),
    Empty,
    Fail,
}

pub struct FakeTextGen {
    pub behavior: TextBehavior,
    pub fail_when_contains: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeTextGen {
    pub fn replying(text: &str) -> Self {
        Self {
            behavior: TextBehavior::Reply(text.to_string()),
            fail_when_contains: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with(behavior: TextBehavior) -> Self {
        Self {
            behavior,
            fail_when_contains: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_when(mut self, needle: &str) -> Self {
        self.fail_when_contains = Some(needle.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeTextGen {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, TextGenError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(needle) = &self.fail_when_contains {
            if prompt.contains(needle.as_str()) {
                return Err(TextGenError::Status {
                    status: 429,
                    body: "quota".into(),
                });
            }
        }

        match &self.behavior {
            TextBehavior::Reply(t) => Ok(Some(t.clone())),
            TextBehavior::Empty => Ok(None),
            TextBehavior::Fail => Err(TextGenError::MissingApiKey),
        }
    }
}

pub fn test_state(store: Arc<MemoryStore>) -> (AppState, tokio::sync::mpsc::Receiver<stockwatch::services::jobs::JobEvent>) {
    let settings = config::load();
    let (jobs, rx) = JobTrigger::channel(16);

    (
        AppState {
            settings,
            store,
            jobs,
        },
        rx,
    )
}
