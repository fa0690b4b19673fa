//! Browser primitives the poster is written against
//!
//! Every element lookup takes a fallback chain: selectors are tried in order
//! and the first one present wins. Drivers own their browser session; there
//! is no global handle.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

pub mod chrome;
pub mod mock;
pub mod selectors;

pub use chrome::ChromeDriver;
pub use mock::{Action, MockDriver};

pub type DriverResult<T> = std::result::Result<T, BrowserError>;

/// Keys the poster needs beyond plain text input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Backspace,
    Home,
    End,
    /// The letter `a`, used with ctrl for select-all
    A,
}

impl Key {
    /// DOM `KeyboardEvent.key`
    pub fn key(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Backspace => "Backspace",
            Key::Home => "Home",
            Key::End => "End",
            Key::A => "a",
        }
    }

    /// DOM `KeyboardEvent.code`
    pub fn code(self) -> &'static str {
        match self {
            Key::A => "KeyA",
            other => other.key(),
        }
    }

    pub fn virtual_key_code(self) -> i64 {
        match self {
            Key::Enter => 13,
            Key::Backspace => 8,
            Key::Home => 36,
            Key::End => 35,
            Key::A => 65,
        }
    }

    /// Text the key inserts when pressed without modifiers
    pub fn text(self) -> Option<&'static str> {
        match self {
            Key::Enter => Some("\r"),
            Key::A => Some("a"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
    };

    /// DevTools modifier bit mask (Alt=1, Ctrl=2, Meta=4, Shift=8)
    pub fn mask(self) -> i64 {
        let mut mask = 0;
        if self.ctrl {
            mask |= 2;
        }
        if self.shift {
            mask |= 8;
        }
        mask
    }

    pub fn is_empty(self) -> bool {
        !self.ctrl && !self.shift
    }
}

/// Primitive editor actions against one browser session
#[async_trait]
pub trait EditorDriver: Send {
    /// Load `url` in the top document, leaving any entered frame
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Wait until one of `selectors` is present; returns the one that matched
    async fn wait_for(&mut self, selectors: &[&str], timeout: Duration) -> DriverResult<String>;

    /// Click the first present element of the chain; returns the selector used
    async fn click_first(&mut self, selectors: &[&str]) -> DriverResult<String>;

    /// Insert text at the current caret position
    async fn type_text(&mut self, text: &str) -> DriverResult<()>;

    async fn press_key(&mut self, key: Key, modifiers: Modifiers) -> DriverResult<()>;

    /// Select everything in the focused element
    async fn select_all_in_focus(&mut self) -> DriverResult<()> {
        self.press_key(Key::A, Modifiers::CTRL).await
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<serde_json::Value>;

    /// Attach `path` to the first present file input of the chain
    async fn upload_file(&mut self, selectors: &[&str], path: &Path) -> DriverResult<()>;

    /// Switch into the named iframe
    async fn enter_frame(&mut self, name: &str) -> DriverResult<()>;

    /// Return to the document that was active before `enter_frame`
    async fn leave_frame(&mut self) -> DriverResult<()>;

    async fn current_url(&mut self) -> DriverResult<String>;

    async fn screenshot(&mut self, path: &Path) -> DriverResult<()>;

    /// Close the browser; drivers without a real browser do nothing
    async fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }
}
