//! Login and extraction strategies shared across sites.
//!
//! Institutions differ in which flow they use and which selectors drive it,
//! not in the flows themselves, so each variant here is a strategy
//! parameterized by a `SiteSpec` rather than a per-site implementation.

use secrecy::ExposeSecret;

use crate::browser::{Locator, PageError, RemotePage, Waiter};
use crate::credentials::Credentials;

use super::ScrapeError;

/// Everything the shared flows need to drive one institution's portal.
#[derive(Debug, Clone)]
pub struct SiteSpec {
    pub site_id: String,
    pub login_url: String,
    pub login: LoginFlow,
    pub balance: BalanceSource,
}

/// How a site authenticates.
#[derive(Debug, Clone)]
pub enum LoginFlow {
    /// Username and password on a single page, submitted by pressing Enter
    /// in the password field.
    Simple {
        username: Locator,
        password: Locator,
        /// Optional interstitial (holiday notices and the like) dismissed
        /// when present; its absence is not a failure.
        dismiss: Option<Locator>,
    },

    /// Username first, then possibly a security question, then password.
    /// After submitting the username the site either challenges or goes
    /// straight to the password prompt; both outcomes share one bounded wait.
    Challenge {
        username: Locator,
        next: Locator,
        challenge_input: Locator,
        challenge_question: Locator,
        password: Locator,
        submit: Locator,
    },
}

impl LoginFlow {
    pub(super) async fn run(
        &self,
        page: &dyn RemotePage,
        waiter: &Waiter<'_>,
        credentials: &Credentials,
        login_url: &str,
    ) -> Result<(), ScrapeError> {
        page.navigate(login_url).await?;

        match self {
            LoginFlow::Simple {
                username,
                password,
                dismiss,
            } => {
                let username_field = waiter
                    .until_present(username)
                    .await
                    .map_err(|err| element_timeout(username, err))?;
                page.type_into(&username_field, &credentials.username).await?;

                let password_field = waiter
                    .until_present(password)
                    .await
                    .map_err(|err| element_timeout(password, err))?;
                page.type_into(&password_field, credentials.password.expose_secret())
                    .await?;
                page.press_enter(&password_field).await?;

                if let Some(dismiss) = dismiss {
                    match waiter.until_displayed(dismiss).await {
                        Ok(button) => page.click(&button).await?,
                        Err(PageError::Timeout { .. }) => {}
                        Err(err) => return Err(ScrapeError::Page(err)),
                    }
                }

                Ok(())
            }

            LoginFlow::Challenge {
                username,
                next,
                challenge_input,
                challenge_question,
                password,
                submit,
            } => {
                let username_field = waiter
                    .until_displayed(username)
                    .await
                    .map_err(|err| element_timeout(username, err))?;
                page.type_into(&username_field, &credentials.username).await?;
                click_displayed(page, waiter, next).await?;

                // Either a security question or the password prompt is next.
                let (which, field) = waiter
                    .until_any_displayed(&[challenge_input, password])
                    .await
                    .map_err(|err| element_timeout(password, err))?;

                if which == 0 {
                    let question_label = waiter
                        .until_present(challenge_question)
                        .await
                        .map_err(|err| element_timeout(challenge_question, err))?;
                    let question = page.read_text(&question_label).await?;
                    let answer = credentials.answer_for(&question).ok_or(
                        ScrapeError::UnknownChallengeQuestion { question },
                    )?;
                    page.type_into(&field, answer).await?;
                    click_displayed(page, waiter, next).await?;
                }

                let password_field = waiter
                    .until_displayed(password)
                    .await
                    .map_err(|err| element_timeout(password, err))?;
                page.type_into(&password_field, credentials.password.expose_secret())
                    .await?;
                click_displayed(page, waiter, submit).await?;

                Ok(())
            }
        }
    }
}

/// Where the balance text lives once authenticated.
#[derive(Debug, Clone)]
pub enum BalanceSource {
    /// A single element on the post-login page.
    Element(Locator),

    /// The balance renders in a tab the portal opens after clicking through;
    /// the new tab is identified by set difference over the open handles.
    NewTab {
        pre_clicks: Vec<Locator>,
        trigger: Locator,
        balance: Locator,
    },
}

impl BalanceSource {
    pub(super) async fn read(
        &self,
        page: &dyn RemotePage,
        waiter: &Waiter<'_>,
    ) -> Result<String, ScrapeError> {
        match self {
            BalanceSource::Element(locator) => {
                let element = waiter
                    .until_present(locator)
                    .await
                    .map_err(|err| element_timeout(locator, err))?;
                Ok(page.read_text(&element).await?)
            }

            BalanceSource::NewTab {
                pre_clicks,
                trigger,
                balance,
            } => {
                for step in pre_clicks {
                    click_displayed(page, waiter, step).await?;
                }

                let before = page.list_tabs().await?;
                click_displayed(page, waiter, trigger).await?;

                let new_tab = waiter.until_new_tab(&before).await.map_err(|err| match err {
                    PageError::Timeout { timeout, .. } => ScrapeError::NoNewTab { timeout },
                    other => ScrapeError::Page(other),
                })?;
                page.switch_tab(&new_tab).await?;

                // The element can exist before the value has rendered.
                let element = waiter
                    .until_text_loaded(balance)
                    .await
                    .map_err(|err| element_timeout(balance, err))?;
                Ok(page.read_text(&element).await?)
            }
        }
    }
}

/// Click the currently displayed element for a locator, skipping hidden
/// duplicates of the same id elsewhere in the DOM.
async fn click_displayed(
    page: &dyn RemotePage,
    waiter: &Waiter<'_>,
    locator: &Locator,
) -> Result<(), ScrapeError> {
    let button = waiter
        .until_displayed(locator)
        .await
        .map_err(|err| element_timeout(locator, err))?;
    page.click(&button).await?;
    Ok(())
}

fn element_timeout(locator: &Locator, err: PageError) -> ScrapeError {
    match err {
        PageError::Timeout { timeout, .. } => ScrapeError::ElementTimeout {
            locator: locator.clone(),
            timeout,
        },
        other => ScrapeError::Page(other),
    }
}
