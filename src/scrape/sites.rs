//! Institution parameterizations.
//!
//! Selectors here are pinned to what each portal currently renders. They
//! rot when a site redesigns; fixing them is a data update in this file,
//! never a flow change.

use crate::browser::Locator;

use super::{BalanceSource, LoginFlow, SiteSpec};

pub fn us_bank() -> SiteSpec {
    SiteSpec {
        site_id: "usbank".to_string(),
        login_url: "https://onlinebanking.usbank.com/Auth/Login".to_string(),
        login: LoginFlow::Challenge {
            username: Locator::name("personalId"),
            next: Locator::id("btnContinue"),
            challenge_input: Locator::name("txtAlphaNum"),
            challenge_question: Locator::css(
                "#dvLoginWidgetDir > form:nth-of-type(2) > div:nth-of-type(3) > div \
                 > div:nth-of-type(1) > div > div:nth-of-type(1) > label",
            ),
            password: Locator::name("password"),
            submit: Locator::id("btnLogin"),
        },
        balance: BalanceSource::Element(Locator::id("DepositSpanHeaderTotal")),
    }
}

pub fn vanguard() -> SiteSpec {
    SiteSpec {
        site_id: "vanguard".to_string(),
        login_url: "https://investor.vanguard.com/my-account/log-on".to_string(),
        login: LoginFlow::Simple {
            username: Locator::name("USER"),
            password: Locator::name("PASSWORD"),
            // Holiday warnings sometimes cover the summary page.
            dismiss: Some(Locator::css("#continueInput")),
        },
        balance: BalanceSource::Element(Locator::css(
            "#main-content > div:nth-of-type(1) > div:nth-of-type(2) > div:nth-of-type(2) \
             > div > div:nth-of-type(2) > div:nth-of-type(1) > div:nth-of-type(1) \
             > div:nth-of-type(1) > span",
        )),
    }
}

pub fn ally() -> SiteSpec {
    SiteSpec {
        site_id: "ally".to_string(),
        login_url: "https://secure.ally.com/".to_string(),
        login: LoginFlow::Simple {
            username: Locator::id("login-username"),
            password: Locator::id("login-password"),
            dismiss: None,
        },
        balance: BalanceSource::Element(Locator::css("#ember2248 > tfoot > td:nth-of-type(1)")),
    }
}

pub fn fidelity() -> SiteSpec {
    SiteSpec {
        site_id: "fidelity".to_string(),
        login_url: "https://oltx.fidelity.com/ftgw/fbc/ofsummary/defaultPage".to_string(),
        login: LoginFlow::Simple {
            username: Locator::id("userId-input"),
            password: Locator::id("password"),
            dismiss: None,
        },
        balance: BalanceSource::Element(Locator::css(
            "body > div.fidgrid.fidgrid--shadow.fidgrid--nogutter > div.full-page--container \
             > div.fidgrid--row.port-summary-container > div.port-summary-content.clearfix \
             > div:nth-child(2) > div.fidgrid--content > div \
             > div.account-selector-wrapper.port-nav.account-selector--reveal \
             > div.account-selector.account-selector--normal-mode.clearfix \
             > div.account-selector--main-wrapper > div.account-selector--accounts-wrapper \
             > div.account-selector--tab.account-selector--tab-all.js-portfolio.account-selector--target-tab.js-selected \
             > span.account-selector--tab-row.account-selector--all-accounts-balance.js-portfolio-balance",
        )),
    }
}

pub fn premera() -> SiteSpec {
    SiteSpec {
        site_id: "premera".to_string(),
        login_url: "https://www.premera.com/portals/member/account/logon".to_string(),
        login: LoginFlow::Simple {
            username: Locator::id("LoginId"),
            password: Locator::id("Password"),
            dismiss: None,
        },
        // The funding-account manager opens in its own tab.
        balance: BalanceSource::NewTab {
            pre_clicks: vec![Locator::css("#toggle1 > li:nth-child(5) > a")],
            trigger: Locator::css("#content-main > p:nth-child(4) > a"),
            balance: Locator::id("totalValue"),
        },
    }
}

/// Every institution this build knows how to scrape.
pub fn all_sites() -> Vec<SiteSpec> {
    vec![us_bank(), vanguard(), ally(), fidelity(), premera()]
}

/// The default ledger column order.
pub fn default_sites() -> Vec<SiteSpec> {
    vec![us_bank(), vanguard(), ally(), fidelity()]
}

/// Look up a built-in site by id.
pub fn by_id(site_id: &str) -> Option<SiteSpec> {
    all_sites().into_iter().find(|site| site.site_id == site_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_column_order_is_stable() {
        let ids: Vec<String> = default_sites().into_iter().map(|s| s.site_id).collect();
        assert_eq!(ids, ["usbank", "vanguard", "ally", "fidelity"]);
    }

    #[test]
    fn test_every_site_is_reachable_by_id() {
        for site in all_sites() {
            assert!(by_id(&site.site_id).is_some(), "missing {}", site.site_id);
        }
        assert!(by_id("nonesuch").is_none());
    }
}
