pub mod home_controller;
pub mod watchlist_controller;
pub mod jobs_controller;
