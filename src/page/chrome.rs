//! Chrome-backed page handle using chromiumoxide.
//!
//! Everything the pipeline needs from the live page goes through small
//! evaluated scripts: a visibility probe for the gate, the wrapper opacity
//! read for the tracker, the container outer-HTML snapshot for the
//! harvester, badge upserts, and the next-page click for the crawl.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::time::Instant;

use crate::app::{FrauditorError, Result};
use crate::config::PageConfig;
use crate::page::badge::{self, BadgeState};
use crate::page::PageDriver;

pub struct ReviewPage {
    // Keeps the browser process alive for the lifetime of the handle.
    _browser: Browser,
    page: Page,
    config: PageConfig,
}

impl ReviewPage {
    /// Launch a browser and open the product page.
    pub async fn open(url: &str, config: PageConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(|e| {
            FrauditorError::Browser(format!("Failed to build browser config: {}", e))
        })?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            FrauditorError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Drive the CDP connection
        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Handle browser events
            }
        });

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| FrauditorError::Browser(format!("Failed to open page: {}", e)))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| FrauditorError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        page.wait_for_navigation()
            .await
            .map_err(|e| FrauditorError::Browser(format!("Navigation failed: {}", e)))?;

        Ok(Self {
            _browser: browser,
            page,
            config,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| FrauditorError::Browser(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| FrauditorError::Browser(format!("Failed to parse result: {:?}", e)))
    }
}

#[async_trait]
impl PageDriver for ReviewPage {
    /// The gate fires once; afterwards only pagination events drive
    /// re-harvests.
    async fn wait_until_visible(&self) -> Result<()> {
        let deadline = Instant::now() + self.config.visibility_timeout();
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const viewport = window.innerHeight || document.documentElement.clientHeight;
                return rect.width > 0 && rect.height > 0 && rect.bottom > 0 && rect.top < viewport;
            }})()
            "#,
            selector = js_string(&self.config.container_selector),
        );

        loop {
            if self.eval::<bool>(script.clone()).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FrauditorError::Page(format!(
                    "Review container {} never became visible",
                    self.config.container_selector
                )));
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// A missing wrapper reads as steady so the tracker never sees a
    /// phantom transition.
    async fn wrapper_opacity(&self) -> Result<f64> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return 1.0;
                const value = parseFloat(window.getComputedStyle(el).opacity);
                return Number.isFinite(value) ? value : 1.0;
            }})()
            "#,
            selector = js_string(&self.config.wrapper_selector),
        );
        self.eval(script).await
    }

    async fn container_html(&self) -> Result<String> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                return el ? el.outerHTML : "";
            }})()
            "#,
            selector = js_string(&self.config.container_selector),
        );
        let html: String = self.eval(script).await?;
        if html.is_empty() {
            return Err(FrauditorError::Page(format!(
                "Review container {} not found",
                self.config.container_selector
            )));
        }
        Ok(html)
    }

    /// Used to suppress re-submission on visibility triggers that are not
    /// real pagination events.
    async fn all_items_badged(&self, item_class: Option<&str>) -> Result<bool> {
        let script = badge::all_badged_script(&self.config.container_selector, item_class);
        self.eval(script).await
    }

    async fn render_badge(
        &self,
        item_class: Option<&str>,
        index: u32,
        state: &BadgeState,
    ) -> Result<()> {
        let script =
            badge::render_script(&self.config.container_selector, item_class, index, state);
        let applied: bool = self.eval(script).await?;
        if !applied {
            // The item disappeared under us, most likely mid-pagination.
            // The next cycle will re-badge the new page.
            tracing::debug!("Badge b{} had no target item", index);
        }
        Ok(())
    }

    /// Returns false when the control is absent (single page of reviews,
    /// or end of the list).
    async fn click_next(&self) -> Result<bool> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.click();
                return true;
            }})()
            "#,
            selector = js_string(&self.config.next_selector),
        );
        self.eval(script).await
    }
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
