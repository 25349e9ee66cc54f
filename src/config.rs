use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,

    pub finnhub_api_key: String,
    pub finnhub_base_url: String,

    pub gemini_api_key: String,
    pub gemini_model: String,

    pub mail: MailSettings,
    pub jobs: JobSettings,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: SmtpTls,
    pub from_address: String,
}

impl MailSettings {
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && !self.from_address.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Seconds between two watchlist range evaluations.
    pub alert_interval_secs: u64,
    /// Hour of the day (UTC) the news digest goes out.
    pub news_digest_hour_utc: u32,
    /// Upper bound on the dispatch group-await. `None` waits for every send.
    pub dispatch_timeout_secs: Option<u64>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            alert_interval_secs: 30 * 60,
            news_digest_hour_utc: 12,
            dispatch_timeout_secs: None,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB")
        .unwrap_or_else(|_| "stockwatch".to_string());

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = parsed::<u16>("PORT").unwrap_or(3000);

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());
    let jwt_cookie_name = env::var("JWT_COOKIE_NAME").unwrap_or_else(|_| "auth".to_string());

    let finnhub_api_key = env::var("FINNHUB_API_KEY").unwrap_or_default();
    let finnhub_base_url = env::var("FINNHUB_BASE_URL")
        .unwrap_or_else(|_| "https://finnhub.io/api/v1".to_string());

    let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
    let gemini_model = env::var("GEMINI_MODEL")
        .unwrap_or_else(|_| "gemini-2.5-flash-lite".to_string());

    let smtp_tls = match env::var("SMTP_TLS").unwrap_or_default().to_lowercase().as_str() {
        "tls" => SmtpTls::Tls,
        "none" => SmtpTls::None,
        _ => SmtpTls::StartTls,
    };

    let mail = MailSettings {
        smtp_host: non_empty("SMTP_HOST"),
        smtp_port: parsed::<u16>("SMTP_PORT").unwrap_or(587),
        smtp_username: non_empty("SMTP_USERNAME"),
        smtp_password: non_empty("SMTP_PASSWORD"),
        smtp_tls,
        from_address: env::var("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "stockwatch@example.com".to_string()),
    };

    let defaults = JobSettings::default();
    let jobs = JobSettings {
        alert_interval_secs: parsed::<u64>("ALERT_INTERVAL_SECS")
            .filter(|s| *s > 0)
            .unwrap_or(defaults.alert_interval_secs),
        news_digest_hour_utc: parsed::<u32>("NEWS_DIGEST_HOUR_UTC")
            .filter(|h| *h < 24)
            .unwrap_or(defaults.news_digest_hour_utc),
        dispatch_timeout_secs: parsed::<u64>("DISPATCH_TIMEOUT_SECS").filter(|s| *s > 0),
    };

    Settings {
        mongodb_uri,
        mongodb_db,
        host,
        port,
        jwt_secret,
        jwt_cookie_name,
        finnhub_api_key,
        finnhub_base_url,
        gemini_api_key,
        gemini_model,
        mail,
        jobs,
    }
}
