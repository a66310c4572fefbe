//! Drives every configured site through one shared browser session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::browser::RemotePage;
use crate::clock::{Clock, SystemClock};
use crate::credentials::CredentialProvider;
use crate::ledger::{CsvLedger, LedgerEntry, LedgerRow};
use crate::notify::Notifier;

use super::{BalanceResult, PortalScraper, ScrapeError, SiteScraper, SiteSpec};

/// What went wrong for one site during a run.
#[derive(Debug)]
pub struct SiteFailure {
    pub site_id: String,
    pub error: ScrapeError,
}

/// Sequentially scrapes a fixed, ordered site list into one ledger row.
pub struct ScrapeOrchestrator {
    sites: Vec<SiteSpec>,
    timeout: Duration,
    poll: Option<Duration>,
    clock: Arc<dyn Clock>,
    /// When set, the first per-site failure propagates instead of becoming
    /// an `N/A` sentinel.
    debug: bool,
}

impl ScrapeOrchestrator {
    pub fn new(sites: Vec<SiteSpec>) -> Self {
        Self {
            sites,
            timeout: Duration::from_secs(10),
            poll: None,
            clock: Arc::new(SystemClock),
            debug: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = Some(poll);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Scrape every configured site in order and append one row to the
    /// ledger. A failing site never aborts the sites after it: its column
    /// gets the sentinel and the run continues. The row always has exactly
    /// one entry per configured site. Failures are reported through the
    /// notifier after the ledger write, best-effort.
    pub async fn run(
        &self,
        page: &dyn RemotePage,
        credentials: &dyn CredentialProvider,
        ledger: &CsvLedger,
        notifier: Option<&dyn Notifier>,
    ) -> Result<LedgerRow> {
        let mut entries = Vec::with_capacity(self.sites.len());
        let mut failures: Vec<SiteFailure> = Vec::new();

        for spec in &self.sites {
            let site_id = spec.site_id.clone();
            info!(site = %site_id, "gathering balance");

            match self.scrape_site(page, credentials, spec).await {
                Ok(cents) => entries.push((site_id, LedgerEntry::Balance(cents))),
                Err(err) if self.debug => return Err(err.into()),
                Err(err) => {
                    warn!(site = %site_id, error = %err, "scrape failed, recording N/A");
                    entries.push((site_id.clone(), LedgerEntry::Unavailable));
                    failures.push(SiteFailure { site_id, error: err });
                }
            }
        }

        let row = LedgerRow {
            timestamp: self.clock.now(),
            entries,
        };
        ledger.append(&row)?;

        // The ledger write is already done; a broken notifier changes nothing.
        if let Some(notifier) = notifier {
            if !failures.is_empty() {
                if let Err(err) = notifier.notify(&failure_report(&failures)).await {
                    warn!(error = %err, "failure notification could not be sent");
                }
            }
        }

        Ok(row)
    }

    async fn scrape_site(
        &self,
        page: &dyn RemotePage,
        credentials: &dyn CredentialProvider,
        spec: &SiteSpec,
    ) -> BalanceResult {
        let site_credentials = credentials.get_credentials(&spec.site_id).await?;
        let mut scraper =
            PortalScraper::new(spec.clone(), site_credentials).with_timeout(self.timeout);
        if let Some(poll) = self.poll {
            scraper = scraper.with_poll_interval(poll);
        }
        scraper.get_account_balance(page).await
    }
}

fn failure_report(failures: &[SiteFailure]) -> String {
    let mut message = String::from("Balance scrape failures:\n");
    for failure in failures {
        message.push_str(&format!("{}: {}\n", failure.site_id, failure.error));
    }
    message
}
