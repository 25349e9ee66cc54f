use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::errors::PipelineError;

use super::{
    alert_pipeline::{AlertPipeline, AlertRunReport},
    news_pipeline::{DigestRunReport, NewsDigestPipeline},
    welcome::{SignUpEvent, WelcomeMailer},
};

#[derive(Debug, Clone)]
pub enum JobEvent {
    WatchlistRange,
    DailyNews,
    UserCreated(SignUpEvent),
}

impl JobEvent {
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::WatchlistRange => "watchlist-range",
            JobEvent::DailyNews => "daily-news-summary",
            JobEvent::UserCreated(_) => "sign-up-email",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    WatchlistRange(AlertRunReport),
    DailyNews(DigestRunReport),
    WelcomeSent,
}

/// Handle used to raise job events by hand (HTTP, sign-up flow).
#[derive(Clone)]
pub struct JobTrigger {
    tx: mpsc::Sender<JobEvent>,
}

impl JobTrigger {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<JobEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Returns false when the listener is gone.
    pub async fn fire(&self, event: JobEvent) -> bool {
        let name = event.name();
        match self.tx.send(event).await {
            Ok(()) => {
                tracing::debug!(job = name, "job event queued");
                true
            }
            Err(_) => {
                tracing::error!(job = name, "job listener is not running");
                false
            }
        }
    }
}

/// The one place job events are executed. Schedules and manual events both
/// end up here.
pub struct JobRunner {
    alerts: AlertPipeline,
    news: NewsDigestPipeline,
    welcome: WelcomeMailer,
}

impl JobRunner {
    pub fn new(alerts: AlertPipeline, news: NewsDigestPipeline, welcome: WelcomeMailer) -> Self {
        Self { alerts, news, welcome }
    }

    pub async fn handle(&self, event: &JobEvent) -> Result<JobOutcome, PipelineError> {
        match event {
            JobEvent::WatchlistRange => self.alerts.run().await.map(JobOutcome::WatchlistRange),
            JobEvent::DailyNews => self.news.run().await.map(JobOutcome::DailyNews),
            JobEvent::UserCreated(signup) => {
                self.welcome.send(signup).await.map(|_| JobOutcome::WelcomeSent)
            }
        }
    }

    pub async fn run_logged(&self, event: &JobEvent) -> Option<JobOutcome> {
        let job = event.name();
        tracing::info!(job, "job started");

        match self.handle(event).await {
            Ok(outcome) => {
                let message = match &outcome {
                    JobOutcome::WatchlistRange(r) => r.message(),
                    JobOutcome::DailyNews(r) => r.message(),
                    JobOutcome::WelcomeSent => "Welcome email sent successfully".to_string(),
                };
                tracing::info!(job, %message, "job finished");
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(job, error = %e, "job failed");
                None
            }
        }
    }
}

/// Runs every event received on `rx`, each in its own task.
pub fn spawn_event_listener(runner: Arc<JobRunner>, mut rx: mpsc::Receiver<JobEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let runner = runner.clone();
            tokio::spawn(async move {
                runner.run_logged(&event).await;
            });
        }
        tracing::info!("job event listener stopped");
    })
}

/// Raises `WatchlistRange` every `period`, starting one period from now.
pub fn spawn_watchlist_range_schedule(runner: Arc<JobRunner>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            runner.run_logged(&JobEvent::WatchlistRange).await;
        }
    })
}

/// Raises `DailyNews` once a day at `hour_utc`:00 UTC.
pub fn spawn_daily_news_schedule(runner: Arc<JobRunner>, hour_utc: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            time::sleep(delay_until_next(Utc::now(), hour_utc)).await;
            runner.run_logged(&JobEvent::DailyNews).await;
        }
    })
}

/// Time left until the next `hour_utc`:00 strictly after `now`.
pub fn delay_until_next(now: DateTime<Utc>, hour_utc: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour_utc % 24, 0, 0).unwrap_or_default();

    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now {
        today
    } else {
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(at).and_utc())
            .unwrap_or(today)
    };

    (next - now).to_std().unwrap_or_default()
}
