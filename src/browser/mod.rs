//! Remote page abstraction over a controlled browser session.
//!
//! The scraping flows speak this interface; `chrome` implements it with
//! chromiumoxide and tests substitute a scripted fake. One session is
//! created per run and shared by every site in turn, so scrapers may assume
//! nothing about the current page beyond it being navigable.

pub mod chrome;
pub mod wait;

pub use wait::Waiter;

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Site-specific descriptor for finding a page element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Name(String),
    Css(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// CSS selector text for this locator.
    pub fn selector(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{id}"),
            Locator::Name(name) => format!("[name=\"{name}\"]"),
            Locator::Css(css) => css.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={id}"),
            Locator::Name(name) => write!(f, "name={name}"),
            Locator::Css(css) => write!(f, "css={css}"),
        }
    }
}

/// Handle to an element found on the current page. Valid only for the page
/// state it was found in; navigation and tab switches invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub u64);

/// Identity of an open browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabHandle(pub String);

#[derive(Debug, Error)]
pub enum PageError {
    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("element reference is no longer attached to the page")]
    StaleElement,

    #[error("browser driver error: {0}")]
    Driver(anyhow::Error),
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        PageError::Driver(err)
    }
}

/// One controlled browser session.
#[async_trait]
pub trait RemotePage: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Every element currently matching the locator, hidden ones included.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, PageError>;

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, PageError>;

    async fn type_into(&self, element: &ElementRef, text: &str) -> Result<(), PageError>;

    /// End-of-input submit: the equivalent of pressing Enter in a field.
    async fn press_enter(&self, element: &ElementRef) -> Result<(), PageError>;

    async fn click(&self, element: &ElementRef) -> Result<(), PageError>;

    async fn read_text(&self, element: &ElementRef) -> Result<String, PageError>;

    async fn list_tabs(&self) -> Result<HashSet<TabHandle>, PageError>;

    async fn switch_tab(&self, tab: &TabHandle) -> Result<(), PageError>;
}
