//! Recording driver for tests
//!
//! Every selector is considered present unless marked missing. Actions are
//! appended to a shared log so a test can keep a handle after the driver has
//! been moved into the code under test.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::editor::{DriverResult, EditorDriver, Key, Modifiers};
use crate::error::BrowserError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Click(String),
    Type(String),
    Key(Key, Modifiers),
    Script(String),
    Upload { selector: String, path: PathBuf },
    EnterFrame(String),
    LeaveFrame,
    Screenshot(PathBuf),
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    missing: HashSet<String>,
    fail_uploads: bool,
    /// Clicking the key selector moves the page to the value URL
    redirects: HashMap<String, String>,
    stop_after: Option<(usize, CancelToken)>,
    url: String,
    frames: Vec<String>,
    pub actions: Arc<Mutex<Vec<Action>>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `selector` as absent from the page
    pub fn with_missing(mut self, selector: &str) -> Self {
        self.missing.insert(selector.to_string());
        self
    }

    /// Treat every selector of a chain as absent
    pub fn with_missing_chain(mut self, chain: &[&str]) -> Self {
        self.missing.extend(chain.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// After `selector` is clicked, `current_url` reports `url`
    pub fn with_redirect(mut self, selector: &str, url: &str) -> Self {
        self.redirects.insert(selector.to_string(), url.to_string());
        self
    }

    /// Request a stop on `token` once `count` actions have been recorded
    pub fn with_stop_after(mut self, count: usize, token: CancelToken) -> Self {
        self.stop_after = Some((count, token));
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// All typed text, in order
    pub fn typed(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Type(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Click(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    /// How many frames are currently entered
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    fn record(&self, action: Action) {
        let count = match self.actions.lock() {
            Ok(mut actions) => {
                actions.push(action);
                actions.len()
            }
            Err(_) => return,
        };
        if let Some((limit, token)) = &self.stop_after {
            if count >= *limit {
                token.stop();
            }
        }
    }

    fn first_present(&self, selectors: &[&str]) -> Option<String> {
        selectors
            .iter()
            .find(|s| !self.missing.contains(**s))
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl EditorDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.frames.clear();
        self.url = url.to_string();
        self.record(Action::Navigate(url.to_string()));
        Ok(())
    }

    async fn wait_for(&mut self, selectors: &[&str], timeout: Duration) -> DriverResult<String> {
        self.first_present(selectors).ok_or_else(|| BrowserError::Timeout {
            what: selectors.join(", "),
            secs: timeout.as_secs(),
        })
    }

    async fn click_first(&mut self, selectors: &[&str]) -> DriverResult<String> {
        let selector = self
            .first_present(selectors)
            .ok_or_else(|| BrowserError::ElementNotFound(selectors.join(", ")))?;
        if let Some(url) = self.redirects.get(&selector) {
            self.url = url.clone();
        }
        self.record(Action::Click(selector.clone()));
        Ok(selector)
    }

    async fn type_text(&mut self, text: &str) -> DriverResult<()> {
        self.record(Action::Type(text.to_string()));
        Ok(())
    }

    async fn press_key(&mut self, key: Key, modifiers: Modifiers) -> DriverResult<()> {
        self.record(Action::Key(key, modifiers));
        Ok(())
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        self.record(Action::Script(script.to_string()));
        Ok(serde_json::Value::Null)
    }

    async fn upload_file(&mut self, selectors: &[&str], path: &Path) -> DriverResult<()> {
        if self.fail_uploads {
            return Err(BrowserError::Upload("simulated upload failure".to_string()));
        }
        let selector = self
            .first_present(selectors)
            .ok_or_else(|| BrowserError::ElementNotFound(selectors.join(", ")))?;
        self.record(Action::Upload {
            selector,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    async fn enter_frame(&mut self, name: &str) -> DriverResult<()> {
        if self.missing.contains(name) {
            return Err(BrowserError::ElementNotFound(format!("iframe '{}'", name)));
        }
        self.frames.push(self.url.clone());
        self.record(Action::EnterFrame(name.to_string()));
        Ok(())
    }

    async fn leave_frame(&mut self) -> DriverResult<()> {
        if let Some(url) = self.frames.pop() {
            self.url = url;
        }
        self.record(Action::LeaveFrame);
        Ok(())
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.url.clone())
    }

    async fn screenshot(&mut self, path: &Path) -> DriverResult<()> {
        self.record(Action::Screenshot(path.to_path_buf()));
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.record(Action::Close);
        Ok(())
    }
}
