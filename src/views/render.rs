use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    errors::RenderError,
    models::{AlertCandidate, AlertKind},
    templates::{self, Hbs},
};

pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Welcome,
    NewsDigest,
    MinThreshold,
    MaxThreshold,
}

impl TemplateKind {
    pub fn id(self) -> &'static str {
        match self {
            TemplateKind::Welcome => "welcome",
            TemplateKind::NewsDigest => "news_digest",
            TemplateKind::MinThreshold => "min_threshold",
            TemplateKind::MaxThreshold => "max_threshold",
        }
    }

    pub fn sender_name(self) -> &'static str {
        match self {
            TemplateKind::Welcome => "Stock Watch",
            _ => "Stock Watch News",
        }
    }
}

impl From<AlertKind> for TemplateKind {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Min => TemplateKind::MinThreshold,
            AlertKind::Max => TemplateKind::MaxThreshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub sender_name: &'static str,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// A message ready to be rendered, with its typed fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Welcome { name: String, intro: String },
    NewsDigest { date: String, news_content: String },
    PriceAlert(AlertCandidate),
}

impl Notification {
    pub fn kind(&self) -> TemplateKind {
        match self {
            Notification::Welcome { .. } => TemplateKind::Welcome,
            Notification::NewsDigest { .. } => TemplateKind::NewsDigest,
            Notification::PriceAlert(c) => c.kind.into(),
        }
    }

    pub fn fields(&self) -> Fields {
        let pairs: Vec<(&str, &str)> = match self {
            Notification::Welcome { name, intro } => vec![("name", name.as_str()), ("intro", intro.as_str())],
            Notification::NewsDigest { date, news_content } => {
                vec![("date", date.as_str()), ("newsContent", news_content.as_str())]
            }
            Notification::PriceAlert(c) => vec![
                ("symbol", c.symbol.as_str()),
                ("company", c.company_name.as_str()),
                ("currentPrice", c.current_price.as_str()),
                ("targetPrice", c.target_price.as_str()),
                ("timestamp", c.timestamp.as_str()),
            ],
        };

        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

/// Fills the email templates. Field values are escaped here before they go
/// into the html part; subject and text parts are plain text and take the
/// raw values. Callers always hand over raw values.
#[derive(Clone)]
pub struct Renderer {
    hbs: Hbs,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Self {
            hbs: templates::build_handlebars()?,
        })
    }

    pub fn render(&self, kind: TemplateKind, fields: &Fields) -> Result<RenderedEmail, RenderError> {
        let escaped: Fields = fields
            .iter()
            .map(|(k, v)| (k.clone(), escape_html(v)))
            .collect();

        let part = |suffix: &str, values: &Fields| self.hbs.render(&format!("{}/{}", kind.id(), suffix), values);

        Ok(RenderedEmail {
            sender_name: kind.sender_name(),
            subject: part("subject", fields)?.trim().to_string(),
            html_body: part("html", &escaped)?,
            text_body: part("text", fields)?,
        })
    }

    pub fn render_notification(&self, notification: &Notification) -> Result<RenderedEmail, RenderError> {
        self.render(notification.kind(), &notification.fields())
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `MM/DD/YYYY hh:mm AM/PM`, e.g. `03/07/2025 01:05 PM`.
pub fn format_alert_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%m/%d/%Y %I:%M %p").to_string()
}

/// `Weekday, Month D, YYYY` in UTC, e.g. `Friday, March 7, 2025`.
pub fn format_digest_date(at: &DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y").to_string()
}

/// Shortest decimal form of a price: `95`, `100.5`.
pub fn format_price(value: f64) -> String {
    value.to_string()
}
