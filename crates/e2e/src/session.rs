//! Browser session seam
//!
//! [`BrowserSession`] is the set of primitive operations page objects are
//! built from. [`SessionFactory`] creates one session per test and
//! [`SessionHandle`] owns it until teardown.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Interval between polls of a bounded wait
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Primitive operations against one live browser session
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> E2eResult<()>;

    /// Whether an element matching `selector` is rendered and visible.
    /// Never waits.
    async fn is_visible(&self, selector: &str) -> E2eResult<bool>;

    /// Click the first element matching `selector`
    async fn click(&self, selector: &str) -> E2eResult<()>;

    /// Clear an input and type `text` into it
    async fn fill(&self, selector: &str, text: &str) -> E2eResult<()>;

    /// Choose the `<option>` whose visible text equals `text`
    async fn select_by_text(&self, selector: &str, text: &str) -> E2eResult<()>;

    /// Visible text of the first element matching `selector`
    async fn text(&self, selector: &str) -> E2eResult<String>;

    /// Visible text of every element matching `selector`, in document order
    async fn texts(&self, selector: &str) -> E2eResult<Vec<String>>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> E2eResult<usize>;

    /// Oldest unread `alert()` message, if any
    async fn take_alert(&self) -> E2eResult<Option<String>>;

    /// PNG screenshot of the current viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    /// Shut the browser down
    async fn close(&mut self) -> E2eResult<()>;
}

/// Creates configured browser sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> E2eResult<Box<dyn BrowserSession>>;
}

/// Exclusive owner of one browser session
#[derive(Default)]
pub struct SessionHandle {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionHandle {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Whether a session is still held
    pub fn is_live(&self) -> bool {
        self.session.is_some()
    }

    /// The live session, if any
    pub fn get(&self) -> Option<&dyn BrowserSession> {
        self.session.as_deref()
    }

    /// Close and release the session.
    ///
    /// Calling this on an empty or already destroyed handle is a no-op.
    /// A failing close is logged; the session is released either way.
    pub async fn destroy(&mut self) {
        let Some(mut session) = self.session.take() else {
            debug!("Session already destroyed");
            return;
        };

        match session.close().await {
            Ok(()) => info!("Browser session closed"),
            Err(e) => warn!("Browser session did not close cleanly: {}", e),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("Browser session dropped without teardown");
        }
    }
}

/// Poll `check` every [`POLL_INTERVAL`] until it yields a value or `limit`
/// elapses. A check error ends the wait immediately.
pub async fn poll_until<T, F, Fut>(limit: Duration, what: &str, mut check: F) -> E2eResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        if start.elapsed() >= limit {
            return Err(E2eError::Timeout(format!(
                "{} ({} ms)",
                what,
                limit.as_millis()
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_poll_until_returns_first_value() {
        let calls = AtomicUsize::new(0);
        let value = poll_until(Duration::from_secs(2), "third call", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n >= 2 { Some(n) } else { None }) }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_poll_until_times_out() {
        let err = poll_until::<(), _, _>(Duration::from_millis(150), "never", || async { Ok(None) })
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::Timeout(ref what) if what.starts_with("never")));
    }

    struct CountingSession {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserSession for CountingSession {
        async fn goto(&self, _url: &str) -> E2eResult<()> {
            Ok(())
        }
        async fn is_visible(&self, _selector: &str) -> E2eResult<bool> {
            Ok(true)
        }
        async fn click(&self, _selector: &str) -> E2eResult<()> {
            Ok(())
        }
        async fn fill(&self, _selector: &str, _text: &str) -> E2eResult<()> {
            Ok(())
        }
        async fn select_by_text(&self, _selector: &str, _text: &str) -> E2eResult<()> {
            Ok(())
        }
        async fn text(&self, _selector: &str) -> E2eResult<String> {
            Ok(String::new())
        }
        async fn texts(&self, _selector: &str) -> E2eResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn count(&self, _selector: &str) -> E2eResult<usize> {
            Ok(0)
        }
        async fn take_alert(&self) -> E2eResult<Option<String>> {
            Ok(None)
        }
        async fn screenshot(&self) -> E2eResult<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn close(&mut self) -> E2eResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Err(E2eError::Setup("already gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut handle = SessionHandle::new(Box::new(CountingSession {
            closes: closes.clone(),
        }));

        handle.destroy().await;
        handle.destroy().await;

        assert!(!handle.is_live());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_destroy_on_empty_handle_is_noop() {
        let mut handle = SessionHandle::default();
        handle.destroy().await;
        assert!(handle.get().is_none());
    }
}
