//! chromiumoxide-backed browser session.
//!
//! Failure to launch or keep the session alive is the one error class that
//! aborts a whole run; every site needs the shared session.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{ElementRef, Locator, PageError, RemotePage, TabHandle};

/// Visibility check run against a candidate element. Mirrors "would a user
/// see this": not display:none, not visibility:hidden, non-zero box.
const IS_DISPLAYED_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden') {
        return false;
    }
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

/// A running Chrome plus its CDP event pump.
pub struct ChromeSession {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch Chrome with the window parked off-screen.
    ///
    /// Headless mode makes several institutions treat the browser as a new
    /// device and re-challenge on every run, so the window is real but
    /// positioned where nobody will see it.
    pub async fn launch(profile_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(profile_dir)
            .with_context(|| format!("Failed to create profile dir: {}", profile_dir.display()))?;

        let chrome_path = find_chrome()
            .context("Chrome/Chromium not found. Install Chrome or Chromium to scrape.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .with_head()
            .window_size(1920, 1080)
            .user_data_dir(profile_dir)
            .arg("--window-position=-32000,-32000")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(|e| anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        Ok(Self {
            browser: Arc::new(browser),
            handler_task,
        })
    }

    /// Open the single page every scraper in the run will share.
    pub async fn open_page(&self) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open a page")?;

        Ok(ChromePage {
            browser: Arc::clone(&self.browser),
            current: Mutex::new(page),
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// `RemotePage` over a chromiumoxide `Page`, with tab switching through the
/// owning browser. Element handles are invalidated on navigation and tab
/// switches; using one afterward reports `StaleElement`.
pub struct ChromePage {
    browser: Arc<Browser>,
    current: Mutex<Page>,
    elements: Mutex<HashMap<u64, Element>>,
    next_id: AtomicU64,
}

impl ChromePage {
    async fn invalidate_elements(&self) {
        self.elements.lock().await.clear();
    }
}

fn driver_err(err: CdpError) -> PageError {
    PageError::Driver(anyhow::Error::new(err))
}

#[async_trait]
impl RemotePage for ChromePage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        {
            let current = self.current.lock().await;
            current.goto(url).await.map_err(driver_err)?;
            current.wait_for_navigation().await.map_err(driver_err)?;
        }
        self.invalidate_elements().await;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, PageError> {
        let found = {
            let current = self.current.lock().await;
            match current.find_elements(locator.selector()).await {
                Ok(elements) => elements,
                Err(CdpError::NotFound) => Vec::new(),
                Err(err) => return Err(driver_err(err)),
            }
        };

        let mut elements = self.elements.lock().await;
        let mut refs = Vec::with_capacity(found.len());
        for element in found {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            elements.insert(id, element);
            refs.push(ElementRef(id));
        }
        Ok(refs)
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, PageError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&element.0).ok_or(PageError::StaleElement)?;
        let returns = element
            .call_js_fn(IS_DISPLAYED_JS, false)
            .await
            .map_err(driver_err)?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    async fn type_into(&self, element: &ElementRef, text: &str) -> Result<(), PageError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&element.0).ok_or(PageError::StaleElement)?;
        element.click().await.map_err(driver_err)?;
        element.type_str(text).await.map_err(driver_err)?;
        Ok(())
    }

    async fn press_enter(&self, element: &ElementRef) -> Result<(), PageError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&element.0).ok_or(PageError::StaleElement)?;
        element.press_key("Enter").await.map_err(driver_err)?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), PageError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&element.0).ok_or(PageError::StaleElement)?;
        element.click().await.map_err(driver_err)?;
        Ok(())
    }

    async fn read_text(&self, element: &ElementRef) -> Result<String, PageError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&element.0).ok_or(PageError::StaleElement)?;
        let text = element.inner_text().await.map_err(driver_err)?;
        Ok(text.unwrap_or_default())
    }

    async fn list_tabs(&self) -> Result<HashSet<TabHandle>, PageError> {
        let pages = self.browser.pages().await.map_err(driver_err)?;
        Ok(pages
            .iter()
            .map(|page| TabHandle(page.target_id().as_ref().to_string()))
            .collect())
    }

    async fn switch_tab(&self, tab: &TabHandle) -> Result<(), PageError> {
        let pages = self.browser.pages().await.map_err(driver_err)?;
        for page in pages {
            if page.target_id().as_ref() == tab.0 {
                page.bring_to_front().await.map_err(driver_err)?;
                *self.current.lock().await = page;
                self.invalidate_elements().await;
                return Ok(());
            }
        }
        Err(PageError::Driver(anyhow!(
            "no open tab with handle {}",
            tab.0
        )))
    }
}

/// Find a Chrome/Chromium executable on this machine.
fn find_chrome() -> Option<String> {
    for name in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];
    candidates
        .iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(|candidate| candidate.to_string())
}
