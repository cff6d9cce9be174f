//! Page objects for the XYZ Bank views
//!
//! Each page wraps a [`PageDriver`], which layers bounded waits over the
//! primitive session operations. Every wait polls until the explicit-wait
//! limit and then fails with [`E2eError::Timeout`].

pub mod customer;
pub mod login;
pub mod manager;

use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::session::{poll_until, BrowserSession};

pub use customer::{AccountSummary, CustomerPage, Transaction, TransactionKind};
pub use login::LoginPage;
pub use manager::{CustomerRow, ManagerPage};

/// Waiting wrapper around a browser session
#[derive(Clone, Copy)]
pub struct PageDriver<'a> {
    session: &'a dyn BrowserSession,
    wait: Duration,
}

impl<'a> PageDriver<'a> {
    pub fn new(session: &'a dyn BrowserSession, wait: Duration) -> Self {
        Self { session, wait }
    }

    pub async fn wait_visible(&self, selector: &str) -> E2eResult<()> {
        poll_until(self.wait, &format!("{} to be visible", selector), || async {
            Ok::<_, E2eError>(self.session.is_visible(selector).await?.then_some(()))
        })
        .await
    }

    /// Wait until the element's text contains `needle`, returning the text
    pub async fn wait_for_text(&self, selector: &str, needle: &str) -> E2eResult<String> {
        let what = format!("{} to contain '{}'", selector, needle);
        poll_until(self.wait, &what, || async {
            if !self.session.is_visible(selector).await? {
                return Ok(None);
            }
            let text = self.session.text(selector).await?;
            Ok::<_, E2eError>(text.contains(needle).then_some(text))
        })
        .await
    }

    /// Wait until the element shows any text, returning it
    pub async fn wait_for_any_text(&self, selector: &str) -> E2eResult<String> {
        poll_until(self.wait, &format!("{} to show text", selector), || async {
            if !self.session.is_visible(selector).await? {
                return Ok(None);
            }
            let text = self.session.text(selector).await?;
            Ok::<_, E2eError>((!text.is_empty()).then_some(text))
        })
        .await
    }

    /// Wait until at least `min` elements match
    pub async fn wait_for_count(&self, selector: &str, min: usize) -> E2eResult<usize> {
        poll_until(self.wait, &format!("{} x{}", selector, min), || async {
            let n = self.session.count(selector).await?;
            Ok::<_, E2eError>((n >= min).then_some(n))
        })
        .await
    }

    pub async fn wait_for_alert(&self) -> E2eResult<String> {
        poll_until(self.wait, "alert", || self.session.take_alert()).await
    }

    pub async fn click(&self, selector: &str) -> E2eResult<()> {
        self.wait_visible(selector).await?;
        self.session.click(selector).await
    }

    pub async fn type_into(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.wait_visible(selector).await?;
        self.session.fill(selector, text).await
    }

    pub async fn select(&self, selector: &str, option_text: &str) -> E2eResult<()> {
        self.wait_visible(selector).await?;
        self.session.select_by_text(selector, option_text).await
    }

    pub async fn text(&self, selector: &str) -> E2eResult<String> {
        self.wait_visible(selector).await?;
        self.session.text(selector).await
    }

    pub async fn texts(&self, selector: &str) -> E2eResult<Vec<String>> {
        self.session.texts(selector).await
    }

    pub async fn count(&self, selector: &str) -> E2eResult<usize> {
        self.session.count(selector).await
    }
}

/// All page objects bound to one session
pub struct Pages<'a> {
    pub login: LoginPage<'a>,
    pub manager: ManagerPage<'a>,
    pub customer: CustomerPage<'a>,
}

impl<'a> Pages<'a> {
    pub fn new(session: &'a dyn BrowserSession, wait: Duration) -> Self {
        let driver = PageDriver::new(session, wait);
        Self {
            login: LoginPage::new(driver),
            manager: ManagerPage::new(driver),
            customer: CustomerPage::new(driver),
        }
    }
}
