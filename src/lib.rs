pub mod browser;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod ledger;
pub mod money;
pub mod notify;
pub mod scrape;
