//! Chrome driver over the DevTools protocol
//!
//! Frames are entered by navigating the tab to the iframe's `src`, which keeps
//! every lookup on one document. The editor page works the same either way.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, SetInterceptFileChooserDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::editor::{DriverResult, EditorDriver, Key, Modifiers};
use crate::error::BrowserError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    /// URLs to return to, innermost frame last
    frames: Vec<String>,
    _handler: JoinHandle<()>,
}

impl ChromeDriver {
    /// Start Chrome with the configured profile and open a blank tab
    pub async fn launch(config: &BrowserConfig) -> DriverResult<Self> {
        let mut builder = LaunchConfig::builder()
            .window_size(config.window_width, config.window_height)
            .arg("--disable-dev-shm-usage")
            .arg("--lang=ko-KR");
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(crate::config::expand_path(path));
        }
        if let Some(dir) = config.user_data_dir_path() {
            builder = builder.user_data_dir(dir);
        }
        let launch_config = builder.build().map_err(BrowserError::Launch)?;

        info!(
            "Launching Chrome ({})",
            if config.headless { "headless" } else { "headed" }
        );
        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("CDP handler event loop ended");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(format!("Failed to open a tab: {}", e)))?;

        // Keep the native file chooser closed; uploads go through the input element
        page.execute(SetInterceptFileChooserDialogParams::new(true))
            .await
            .map_err(protocol)?;

        Ok(Self {
            browser,
            page,
            frames: Vec::new(),
            _handler: handler,
        })
    }

    /// Load `url` in the tab without touching the frame stack
    async fn goto(&self, url: &str) -> DriverResult<()> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn find_first(&self, selectors: &[&str]) -> DriverResult<(Element, String)> {
        for selector in selectors {
            if let Ok(element) = self.page.find_element(*selector).await {
                return Ok((element, selector.to_string()));
            }
        }
        Err(BrowserError::ElementNotFound(selectors.join(", ")))
    }

    async fn dispatch_key(
        &self,
        kind: DispatchKeyEventType,
        key: Key,
        modifiers: Modifiers,
    ) -> DriverResult<()> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.key())
            .code(key.code())
            .windows_virtual_key_code(key.virtual_key_code())
            .native_virtual_key_code(key.virtual_key_code())
            .modifiers(modifiers.mask());
        if kind == DispatchKeyEventType::KeyDown && modifiers.is_empty() {
            if let Some(text) = key.text() {
                builder = builder.text(text);
            }
        }
        let params = builder.build().map_err(BrowserError::Protocol)?;
        self.page.execute(params).await.map_err(protocol)?;
        Ok(())
    }
}

fn protocol(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

#[async_trait]
impl EditorDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.frames.clear();
        self.goto(url).await
    }

    async fn wait_for(&mut self, selectors: &[&str], timeout: Duration) -> DriverResult<String> {
        let start = Instant::now();
        loop {
            for selector in selectors {
                if self.page.find_element(*selector).await.is_ok() {
                    debug!("Found '{}' after {:?}", selector, start.elapsed());
                    return Ok(selector.to_string());
                }
            }
            if start.elapsed() >= timeout {
                return Err(BrowserError::Timeout {
                    what: selectors.join(", "),
                    secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click_first(&mut self, selectors: &[&str]) -> DriverResult<String> {
        let (element, selector) = self.find_first(selectors).await?;
        element
            .scroll_into_view()
            .await
            .map_err(protocol)?
            .click()
            .await
            .map_err(protocol)?;
        debug!("Clicked '{}'", selector);
        Ok(selector)
    }

    async fn type_text(&mut self, text: &str) -> DriverResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn press_key(&mut self, key: Key, modifiers: Modifiers) -> DriverResult<()> {
        self.dispatch_key(DispatchKeyEventType::KeyDown, key, modifiers)
            .await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key, modifiers)
            .await
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn upload_file(&mut self, selectors: &[&str], path: &Path) -> DriverResult<()> {
        let absolute = std::fs::canonicalize(path)
            .map_err(|e| BrowserError::Upload(format!("{}: {}", path.display(), e)))?;
        let (element, selector) = self.find_first(selectors).await?;
        let params = SetFileInputFilesParams::builder()
            .file(absolute.to_string_lossy().into_owned())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(BrowserError::Upload)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| BrowserError::Upload(e.to_string()))?;
        debug!("Attached {} to '{}'", absolute.display(), selector);
        Ok(())
    }

    async fn enter_frame(&mut self, name: &str) -> DriverResult<()> {
        let name_json = serde_json::to_string(name).map_err(|e| BrowserError::Script(e.to_string()))?;
        let script = format!(
            "(() => {{ const n = {name_json}; \
             const f = document.querySelector(`iframe[name=\"${{n}}\"]`) || document.getElementById(n); \
             return f && f.src ? f.src : null; }})()"
        );
        let src = match self.run_script(&script).await? {
            serde_json::Value::String(src) if !src.is_empty() => src,
            _ => return Err(BrowserError::ElementNotFound(format!("iframe '{}'", name))),
        };

        let current = self.current_url().await?;
        self.goto(&src).await?;
        self.frames.push(current);
        debug!("Entered frame '{}'", name);
        Ok(())
    }

    async fn leave_frame(&mut self) -> DriverResult<()> {
        match self.frames.pop() {
            Some(url) => self.goto(&url).await,
            None => {
                warn!("leave_frame called outside of any frame");
                Ok(())
            }
        }
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(protocol)?
            .unwrap_or_default())
    }

    async fn screenshot(&mut self, path: &Path) -> DriverResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(protocol)?;
        }
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
                path,
            )
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        info!("Closing browser");
        self.browser.close().await.map_err(protocol)?;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser did not exit cleanly: {}", e);
        }
        Ok(())
    }
}
