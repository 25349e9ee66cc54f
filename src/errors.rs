use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("FINNHUB_API_KEY is missing")]
    MissingApiKey,

    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market data request failed: {status} {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("failed to send message: {0}")]
    Transport(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Error)]
pub enum TextGenError {
    #[error("GEMINI_API_KEY is missing")]
    MissingApiKey,

    #[error("text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation request failed: {status} {body}")]
    Status { status: u16, body: String },
}

/// Failures raised by the scheduled pipelines.
///
/// `WatchlistUnavailable` and `UsersUnavailable` abort a run. The remaining
/// variants are scoped to a single entry or user and are logged by the
/// pipeline that hit them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load watchlist entries: {0}")]
    WatchlistUnavailable(#[source] StoreError),

    #[error("failed to load users: {0}")]
    UsersUnavailable(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Mail(#[from] MailError),
}
