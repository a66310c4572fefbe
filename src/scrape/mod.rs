//! Per-site login and balance extraction.
//!
//! One `SiteSpec` per institution parameterizes the shared flows in
//! `flows`; `PortalScraper` runs them against a `RemotePage`. Failures stay
//! typed here so the orchestrator can record them per column without ever
//! letting one site abort the rest of the run.

mod flows;
mod orchestrator;
pub mod sites;

pub use flows::{BalanceSource, LoginFlow, SiteSpec};
pub use orchestrator::{ScrapeOrchestrator, SiteFailure};

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::browser::{Locator, PageError, RemotePage, Waiter};
use crate::credentials::{CredentialError, Credentials};
use crate::money::{pennies_from_text, Cents, FormatError};

const DEFAULT_WAIT: Duration = Duration::from_secs(10);

/// Why a single site's scrape failed.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("element {locator} did not appear within {timeout:?}")]
    ElementTimeout { locator: Locator, timeout: Duration },

    #[error("site presented security question {question:?} with no stored answer")]
    UnknownChallengeQuestion { question: String },

    #[error("expected a new tab, none opened within {timeout:?}")]
    NoNewTab { timeout: Duration },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("page interaction failed: {0}")]
    Page(PageError),
}

impl From<PageError> for ScrapeError {
    fn from(err: PageError) -> Self {
        ScrapeError::Page(err)
    }
}

/// Balance in cents for one site, or the reason it could not be read.
pub type BalanceResult = Result<Cents, ScrapeError>;

/// One site's login plus balance extraction, the unit of failure isolation.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    fn site_id(&self) -> &str;

    /// Log in and read the account balance.
    async fn get_account_balance(&self, page: &dyn RemotePage) -> BalanceResult;
}

/// Data-driven scraper: shared flow logic driven by a `SiteSpec`.
pub struct PortalScraper {
    spec: SiteSpec,
    credentials: Credentials,
    timeout: Duration,
    poll: Option<Duration>,
}

impl PortalScraper {
    pub fn new(spec: SiteSpec, credentials: Credentials) -> Self {
        Self {
            spec,
            credentials,
            timeout: DEFAULT_WAIT,
            poll: None,
        }
    }

    /// Bound on every wait against the remote page.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = Some(poll);
        self
    }

    fn waiter<'a>(&self, page: &'a dyn RemotePage) -> Waiter<'a> {
        let waiter = Waiter::new(page, self.timeout);
        match self.poll {
            Some(poll) => waiter.with_poll_interval(poll),
            None => waiter,
        }
    }
}

#[async_trait]
impl SiteScraper for PortalScraper {
    fn site_id(&self) -> &str {
        &self.spec.site_id
    }

    async fn get_account_balance(&self, page: &dyn RemotePage) -> BalanceResult {
        debug!(site = %self.spec.site_id, url = %self.spec.login_url, "logging in");
        self.spec
            .login
            .run(page, &self.waiter(page), &self.credentials, &self.spec.login_url)
            .await?;

        // Login success is only observable through the balance element
        // appearing afterward; rejected credentials and a slow page are
        // indistinguishable at this layer.
        let text = self.spec.balance.read(page, &self.waiter(page)).await?;
        debug!(site = %self.spec.site_id, text = %text, "read balance text");
        Ok(pennies_from_text(&text)?)
    }
}
