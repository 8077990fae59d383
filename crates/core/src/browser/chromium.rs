//! Chromium implementation driven through chromiumoxide.

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig, Page};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::error::{BrowserError, BrowserStage};
use super::traits::{BrowserInstance, BrowserLauncher, BrowserPage};

/// Fetches the URL from inside the page and hands the body back as base64.
/// Chunked conversion keeps `String.fromCharCode` under the argument limit.
const FETCH_SCRIPT: &str = r#"
(async () => {
    try {
        const res = await fetch(__URL__);
        if (!res.ok) {
            return { status: res.status, error: `HTTP ${res.status} ${res.statusText}` };
        }
        const bytes = new Uint8Array(await res.arrayBuffer());
        let binary = '';
        const chunk = 0x8000;
        for (let i = 0; i < bytes.length; i += chunk) {
            binary += String.fromCharCode.apply(null, bytes.subarray(i, i + chunk));
        }
        return { status: res.status, data: btoa(binary) };
    } catch (e) {
        return { status: 0, error: String(e) };
    }
})()
"#;

#[derive(Debug, Deserialize)]
struct InPageFetch {
    status: u16,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn fetch_script(url: &str) -> String {
    // JSON string literal is a valid JS string literal.
    let literal = Value::String(url.to_string()).to_string();
    FETCH_SCRIPT.replace("__URL__", &literal)
}

fn decode_fetch_result(url: &str, result: InPageFetch) -> Result<Vec<u8>, BrowserError> {
    if let Some(error) = result.error {
        return Err(BrowserError::Evaluation {
            url: url.to_string(),
            reason: error,
        });
    }

    let data = result.data.ok_or_else(|| BrowserError::Evaluation {
        url: url.to_string(),
        reason: format!("HTTP {} without body", result.status),
    })?;

    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| BrowserError::Evaluation {
            url: url.to_string(),
            reason: format!("invalid base64 body: {}", e),
        })
}

/// Launches Chromium/Chrome processes over the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    args: Vec<String>,
}

impl ChromiumLauncher {
    pub fn new(headless: bool, args: Vec<String>) -> Self {
        Self { headless, args }
    }
}

impl Default for ChromiumLauncher {
    fn default() -> Self {
        Self::new(true, Vec::new())
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn launch(&self, executable: &Path) -> Result<Box<dyn BrowserInstance>, BrowserError> {
        info!(executable = %executable.display(), headless = self.headless, "Launching browser");

        let launch_error = |reason: String| BrowserError::Launch {
            path: executable.to_path_buf(),
            reason,
        };

        // with_head means NOT headless
        let mut builder = CdpBrowserConfig::builder().chrome_executable(executable);
        if !self.headless {
            builder = builder.with_head();
        }
        for arg in &self.args {
            builder = builder.arg(arg);
        }
        let config = builder.build().map_err(launch_error)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| launch_error(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(ChromiumInstance {
            browser,
            handler_task,
            closed: false,
        }))
    }
}

struct ChromiumInstance {
    browser: Browser,
    handler_task: JoinHandle<()>,
    closed: bool,
}

#[async_trait]
impl BrowserInstance for ChromiumInstance {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError> {
        if self.closed {
            return Err(BrowserError::protocol(
                BrowserStage::OpenPage,
                "browser already closed",
            ));
        }

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::protocol(BrowserStage::OpenPage, e))?;

        Ok(Box::new(ChromiumPage { page: Some(page) }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::protocol(BrowserStage::Close, e));
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler_task.abort();
        debug!("Browser closed");
        result
    }
}

struct ChromiumPage {
    page: Option<Page>,
}

impl ChromiumPage {
    fn page(&self, stage: BrowserStage) -> Result<&Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::protocol(stage, "page already closed"))
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn set_extra_headers(&self, headers: &[(String, String)]) -> Result<(), BrowserError> {
        let page = self.page(BrowserStage::SetHeaders)?;
        let map: Map<String, Value> = headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        page.execute(SetExtraHttpHeadersParams::new(Headers::new(Value::Object(
            map,
        ))))
        .await
        .map_err(|e| BrowserError::protocol(BrowserStage::SetHeaders, e))?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let page = self.page(BrowserStage::Navigate)?;
        page.goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, BrowserError> {
        let page = self.page(BrowserStage::Fetch)?;
        let evaluation_error = |reason: String| BrowserError::Evaluation {
            url: url.to_string(),
            reason,
        };

        let result: InPageFetch = page
            .evaluate(fetch_script(url))
            .await
            .map_err(|e| evaluation_error(e.to_string()))?
            .into_value()
            .map_err(|e| evaluation_error(e.to_string()))?;

        let bytes = decode_fetch_result(url, result)?;
        debug!(url, bytes = bytes.len(), "In-page fetch complete");
        Ok(bytes)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if let Some(page) = self.page.take() {
            page.close()
                .await
                .map_err(|e| BrowserError::protocol(BrowserStage::Close, e))?;
        }
        Ok(())
    }
}
