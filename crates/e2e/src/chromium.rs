//! Chromium sessions over the DevTools protocol

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use xyzbank_common::Settings;

use crate::error::{E2eError, E2eResult};
use crate::session::{poll_until, BrowserSession, SessionFactory};

/// Replaces `window.alert` so alerts queue up instead of blocking the page
const ALERT_HOOK: &str = r#"
window.__xyzbankAlerts = [];
window.alert = function (message) { window.__xyzbankAlerts.push(String(message)); };
"#;

/// Window size used for headless sessions
const HEADLESS_WINDOW: (u32, u32) = (1366, 768);

/// Launches one Chromium per session from suite settings
pub struct ChromiumFactory {
    settings: Arc<Settings>,
}

impl ChromiumFactory {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Browser launch options derived from settings
    fn browser_config(&self) -> E2eResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder().request_timeout(self.settings.page_load_timeout);

        if self.settings.headless {
            builder = builder
                .no_sandbox()
                .window_size(HEADLESS_WINDOW.0, HEADLESS_WINDOW.1);
        } else {
            builder = builder.with_head();
            if self.settings.maximize_window {
                builder = builder.arg("--start-maximized");
            }
        }

        builder.build().map_err(E2eError::Setup)
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn create(&self) -> E2eResult<Box<dyn BrowserSession>> {
        let config = self.browser_config()?;
        info!(
            "Launching Chromium (headless: {}, page load timeout: {:?})",
            self.settings.headless, self.settings.page_load_timeout
        );

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| E2eError::Setup(format!("Failed to launch Chromium: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools handler error: {}", e);
                }
            }
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(E2eError::Setup(format!("Failed to open page: {}", e)));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(Some(browser)),
            page,
            handler: handler_task,
            implicit_wait: self.settings.implicit_wait,
            page_load_timeout: self.settings.page_load_timeout,
        }))
    }
}

async fn open_page(browser: &Browser) -> E2eResult<Page> {
    let page = browser.new_page("about:blank").await?;
    page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(ALERT_HOOK))
        .await?;
    Ok(page)
}

/// A live Chromium process with a single page
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    implicit_wait: Duration,
    page_load_timeout: Duration,
}

impl ChromiumSession {
    /// Find an element, polling up to the implicit wait
    async fn find(&self, selector: &str) -> E2eResult<Element> {
        poll_until(self.implicit_wait, selector, || async {
            Ok(self.page.find_element(selector).await.ok())
        })
        .await
        .map_err(|_| E2eError::ElementNotFound(selector.to_string()))
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> E2eResult<T> {
        Ok(self.page.evaluate(script).await?.into_value()?)
    }
}

/// Quote a value as a JavaScript string literal
fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        tokio::time::timeout(self.page_load_timeout, self.page.goto(url))
            .await
            .map_err(|_| E2eError::Timeout(format!("page load of {}", url)))??;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        self.eval(format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }})()"#,
            sel = js_str(selector)
        ))
        .await
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        self.find(selector).await?.click().await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> E2eResult<()> {
        let element = self.find(selector).await?;
        element
            .call_js_fn(
                "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
                false,
            )
            .await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn select_by_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        let script = format!(
            r#"(() => {{
                const select = document.querySelector({sel});
                if (!select) return false;
                const option = Array.from(select.options).find(o => o.text.trim() === {text});
                if (!option) return false;
                select.value = option.value;
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_str(selector),
            text = js_str(text)
        );

        let what = format!("option '{}' in {}", text, selector);
        poll_until(self.implicit_wait, &what, || async {
            let chosen: bool = self.eval(script.clone()).await?;
            Ok::<_, E2eError>(chosen.then_some(()))
        })
        .await
        .map_err(|e| match e {
            E2eError::Timeout(_) => E2eError::ElementNotFound(what.clone()),
            other => other,
        })
    }

    async fn text(&self, selector: &str) -> E2eResult<String> {
        let text = self.find(selector).await?.inner_text().await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn texts(&self, selector: &str) -> E2eResult<Vec<String>> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({})).map(el => el.innerText.trim())",
            js_str(selector)
        ))
        .await
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_str(selector)
        ))
        .await
    }

    async fn take_alert(&self) -> E2eResult<Option<String>> {
        // JSON-encoded so an empty queue comes back as "null" rather than no value
        let raw: String = self
            .eval("JSON.stringify((window.__xyzbankAlerts || []).shift() ?? null)".to_string())
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(&mut self) -> E2eResult<()> {
        let browser = self.browser.get_mut().take();
        if let Some(mut browser) = browser {
            let closed = browser.close().await;
            let _ = browser.wait().await;
            self.handler.abort();
            closed?;
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
