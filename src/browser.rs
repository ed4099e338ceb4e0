//! Browser automation executor.
//!
//! Every tool call that touches a page launches its own headless Chrome
//! instance through the DevTools protocol and tears it down before
//! returning; nothing browser-related survives a call. Within one batched
//! lookup a single browser is shared and a fresh page is opened and closed
//! per component, sequentially, so resource usage stays bounded at one
//! browser and one live page.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{Error, Result};

/// Selector of the props table on a component documentation page.
pub const PROPS_TABLE_SELECTOR: &str = "table.docblock-argstable";

/// How long to wait for the props table to render. Expiry usually means the
/// component has no props, or the docs page structure changed.
pub const SELECTOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed settle delay before evaluating a custom tool handler. Arbitrary
/// pages expose no known selector to wait on.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running headless browser plus the task driving its CDP event stream.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a headless browser.
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(1280, 720)
            .build()
            .map_err(Error::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::LaunchFailed(e.to_string()))?;

        // The handler task pumps CDP messages; the browser is unusable
        // without it.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Close the browser, reaping the child process.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("error closing browser: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }

    /// Visit a component documentation page and extract the props table's
    /// inner markup. The page is closed on every exit path.
    pub async fn extract_props_table(&self, url: &Url) -> Result<String> {
        let page = self.browser.new_page("about:blank").await?;
        let result = props_table_on(&page, url).await;
        close_page(page).await;
        result
    }

    /// Navigate to `url` and evaluate `script` in the page context,
    /// returning its JSON value. The page is closed on every exit path.
    pub async fn evaluate_on_page(&self, url: &Url, script: &str) -> Result<Value> {
        let page = self.browser.new_page("about:blank").await?;
        let result = evaluate_on(&page, url, script).await;
        close_page(page).await;
        result
    }

    /// Extract props tables for a batch of components against this one
    /// browser, one page at a time.
    ///
    /// Each target is either a resolved doc URL or the error its resolution
    /// produced; every failure (resolution, navigation, selector timeout) is
    /// recorded under its component name and never aborts the rest of the
    /// batch.
    pub async fn extract_props_batch(
        &self,
        targets: Vec<(String, Result<Url>)>,
    ) -> Vec<(String, Result<String>)> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for (name, target) in targets {
            let outcome = match target {
                Ok(url) => self.extract_props_table(&url).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &outcome {
                tracing::debug!(component = %name, "batch lookup failed: {e}");
            }
            outcomes.push((name, outcome));
        }
        outcomes
    }
}

/// Launch a browser for a single props-table extraction and tear it down on
/// every exit path.
pub async fn fetch_props_table(url: &Url) -> Result<String> {
    let session = BrowserSession::launch().await?;
    let result = session.extract_props_table(url).await;
    session.close().await;
    result
}

/// Launch one browser for a whole batch of props-table extractions; the
/// browser is closed exactly once, after the full batch.
pub async fn fetch_props_tables(
    targets: Vec<(String, Result<Url>)>,
) -> Result<Vec<(String, Result<String>)>> {
    let session = BrowserSession::launch().await?;
    let outcomes = session.extract_props_batch(targets).await;
    session.close().await;
    Ok(outcomes)
}

/// Launch a browser, run a custom tool's handler against its configured
/// page, and tear the browser down on every exit path.
pub async fn run_page_script(url: &Url, script: &str) -> Result<Value> {
    let session = BrowserSession::launch().await?;
    let result = session.evaluate_on_page(url, script).await;
    session.close().await;
    result
}

async fn props_table_on(page: &Page, url: &Url) -> Result<String> {
    navigate(page, url).await?;
    let table = wait_for_selector(page, PROPS_TABLE_SELECTOR, SELECTOR_TIMEOUT).await?;
    Ok(table.inner_html().await?.unwrap_or_default())
}

async fn evaluate_on(page: &Page, url: &Url, script: &str) -> Result<Value> {
    navigate(page, url).await?;
    tokio::time::sleep(SETTLE_DELAY).await;
    let evaluation = page
        .evaluate(script)
        .await
        .map_err(|e| Error::HandlerExecutionFailed(e.to_string()))?;
    // Scripts that return undefined have no JSON value.
    Ok(evaluation.into_value::<Value>().unwrap_or(Value::Null))
}

async fn navigate(page: &Page, url: &Url) -> Result<()> {
    page.goto(url.as_str())
        .await
        .map_err(|e| Error::NavigationFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    // Let the document finish loading; rendering is covered by the selector
    // poll or the settle delay.
    page.wait_for_navigation().await.ok();
    Ok(())
}

async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> Result<Element> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::ExtractionTimeout {
                selector: selector.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn close_page(page: Page) {
    if let Err(e) = page.close().await {
        tracing::debug!("error closing page: {e}");
    }
}

/// Render a custom tool's script result as text: sequences newline-joined,
/// objects pretty-printed, scalars stringified.
pub fn format_script_result(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => scalar_text(other),
    }
}

/// Stringify a scalar without JSON quoting.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_results_join_with_newlines() {
        let value = json!(["IconA", "IconB", "IconC"]);
        assert_eq!(format_script_result(&value), "IconA\nIconB\nIconC");
    }

    #[test]
    fn mixed_array_items_are_stringified() {
        let value = json!(["a", 1, true]);
        assert_eq!(format_script_result(&value), "a\n1\ntrue");
    }

    #[test]
    fn object_results_are_pretty_printed() {
        let value = json!({ "count": 2 });
        let text = format_script_result(&value);
        assert!(text.starts_with('{'));
        assert!(text.contains("\"count\": 2"));
    }

    #[test]
    fn scalar_results_are_stringified_unquoted() {
        assert_eq!(format_script_result(&json!("hello")), "hello");
        assert_eq!(format_script_result(&json!(42)), "42");
        assert_eq!(format_script_result(&json!(null)), "null");
    }
}
