use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mongodb::Client;
use tracing_subscriber::EnvFilter;

use stockwatch::{
    config,
    render::Renderer,
    routes,
    services::{
        alert_pipeline::AlertPipeline,
        db_init,
        finnhub::FinnhubClient,
        jobs::{self, JobRunner, JobTrigger},
        mailer::{DisabledMailTransport, MailTransport, Mailer, SmtpMailTransport},
        mongo_store::MongoStore,
        news_pipeline::NewsDigestPipeline,
        text_gen::GeminiClient,
        welcome::WelcomeMailer,
    },
    AppState,
};

fn mail_transport(settings: &config::MailSettings) -> Arc<dyn MailTransport> {
    if !settings.is_configured() {
        tracing::info!("SMTP is not configured (set SMTP_HOST and MAIL_FROM_ADDRESS); emails will not be sent");
        return Arc::new(DisabledMailTransport);
    }

    match SmtpMailTransport::new(settings) {
        Ok(t) => {
            tracing::info!(host = ?settings.smtp_host, "email delivery enabled");
            Arc::new(t)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to initialize SMTP transport; emails will not be sent");
            Arc::new(DisabledMailTransport)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();

    // Mongo connection
    let client = Client::with_uri_str(&settings.mongodb_uri).await?;
    let db = client.database(&settings.mongodb_db);
    db_init::ensure_indexes(&db).await?;

    let store = Arc::new(MongoStore::new(db));
    let gateway = Arc::new(FinnhubClient::new(
        settings.finnhub_api_key.clone(),
        settings.finnhub_base_url.clone(),
    ));
    let text_gen = Arc::new(GeminiClient::new(
        settings.gemini_api_key.clone(),
        settings.gemini_model.clone(),
    ));
    let mailer = Mailer::new(Renderer::new()?, mail_transport(&settings.mail));

    let deadline = settings.jobs.dispatch_timeout_secs.map(Duration::from_secs);

    let runner = Arc::new(JobRunner::new(
        AlertPipeline::new(store.clone(), gateway.clone(), mailer.clone()).with_dispatch_deadline(deadline),
        NewsDigestPipeline::new(store.clone(), gateway.clone(), text_gen.clone(), mailer.clone())
            .with_dispatch_deadline(deadline),
        WelcomeMailer::new(text_gen, mailer),
    ));

    let (trigger, events_rx) = JobTrigger::channel(64);
    jobs::spawn_event_listener(runner.clone(), events_rx);
    jobs::spawn_watchlist_range_schedule(
        runner.clone(),
        Duration::from_secs(settings.jobs.alert_interval_secs),
    );
    jobs::spawn_daily_news_schedule(runner, settings.jobs.news_digest_hour_utc);

    tracing::info!(
        alert_interval_secs = settings.jobs.alert_interval_secs,
        news_digest_hour_utc = settings.jobs.news_digest_hour_utc,
        "job schedules started"
    );

    let state = AppState {
        settings: settings.clone(),
        store,
        jobs: trigger,
    };

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
