//! Reachability check run once before the suite

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Delay between attempts
const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `url` until it answers with a success status or `limit` elapses
pub async fn wait_for_app(url: &str, limit: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < limit {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Application reachable at {} ({} attempt(s))", url, attempts);
                return Ok(());
            }
            Ok(resp) => {
                warn!("Preflight returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} to answer...", url);
                }
                if !e.is_connect() {
                    warn!("Preflight error: {}", e);
                }
            }
        }

        sleep(RETRY_INTERVAL).await;
    }

    Err(E2eError::Preflight {
        url: url.to_string(),
        attempts,
    })
}
