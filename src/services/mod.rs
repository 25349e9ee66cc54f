pub mod store;
pub mod mongo_store;
pub mod db_init;
pub mod gateway;
pub mod finnhub;
pub mod text_gen;
pub mod mailer;

pub mod alert_pipeline;
pub mod news_pipeline;
pub mod welcome;
pub mod jobs;
pub mod watchlist_service;
