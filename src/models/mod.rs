pub mod user;
pub mod watchlist;
pub mod market;
pub mod alert;

pub use user::{CurrentUser, User};
pub use watchlist::{NewWatchlistEntry, WatchlistEntry};
pub use market::{Article, Quote};
pub use alert::{AlertCandidate, AlertKind};
