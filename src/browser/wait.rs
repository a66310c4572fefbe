//! Bounded condition waits.
//!
//! Poll-until-deadline is the only suspension primitive the scraping flows
//! use. Page rendering is asynchronous and element presence does not imply
//! the value inside has loaded, so each flow states the condition it needs
//! and how long it is willing to wait; nothing depends on a fixed sleep.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::{ElementRef, Locator, PageError, RemotePage, TabHandle};

const DEFAULT_POLL: Duration = Duration::from_millis(250);

/// Bounded-wait executor for one page.
pub struct Waiter<'a> {
    page: &'a dyn RemotePage,
    timeout: Duration,
    poll: Duration,
}

impl<'a> Waiter<'a> {
    pub fn new(page: &'a dyn RemotePage, timeout: Duration) -> Self {
        Self {
            page,
            timeout,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait until at least one element matches, visible or not.
    pub async fn until_present(&self, locator: &Locator) -> Result<ElementRef, PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(element) = self.page.find_all(locator).await?.into_iter().next() {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(format!("element {locator}")));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Wait for the currently displayed match. Sites keep hidden duplicates
    /// of the same id in the DOM; only the visible one counts.
    pub async fn until_displayed(&self, locator: &Locator) -> Result<ElementRef, PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(element) = self.first_displayed(locator).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(format!("displayed element {locator}")));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Wait until any of the locators has a displayed match; yields the index
    /// of whichever resolved first along with the element.
    pub async fn until_any_displayed(
        &self,
        locators: &[&Locator],
    ) -> Result<(usize, ElementRef), PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            for (index, locator) in locators.iter().enumerate() {
                if let Some(element) = self.first_displayed(locator).await? {
                    return Ok((index, element));
                }
            }
            if Instant::now() >= deadline {
                let names: Vec<String> = locators.iter().map(|l| l.to_string()).collect();
                return Err(self.timed_out(format!("any of [{}]", names.join(", "))));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Wait until the element is present and its text is non-empty.
    /// Presence alone does not mean the value has rendered.
    pub async fn until_text_loaded(&self, locator: &Locator) -> Result<ElementRef, PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(element) = self.page.find_all(locator).await?.into_iter().next() {
                match self.page.read_text(&element).await {
                    Ok(text) if !text.trim().is_empty() => return Ok(element),
                    Ok(_) => {}
                    // The node can be replaced between the find and the read.
                    Err(PageError::StaleElement) => {}
                    Err(err) => return Err(err),
                }
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(format!("text in element {locator}")));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Wait until a tab not in `before` is open; yields the new handle.
    pub async fn until_new_tab(
        &self,
        before: &HashSet<TabHandle>,
    ) -> Result<TabHandle, PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let current = self.page.list_tabs().await?;
            if let Some(new_tab) = current.difference(before).next() {
                return Ok(new_tab.clone());
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out("a new browser tab".to_string()));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    async fn first_displayed(&self, locator: &Locator) -> Result<Option<ElementRef>, PageError> {
        for element in self.page.find_all(locator).await? {
            if self.page.is_displayed(&element).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn timed_out(&self, what: String) -> PageError {
        PageError::Timeout {
            what,
            timeout: self.timeout,
        }
    }
}
