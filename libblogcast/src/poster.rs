//! Publishing an article through the blog editor
//!
//! `BlogPoster` turns an [`Article`] into a fixed sequence of editor actions.
//! Steps the post cannot do without (title, publish, confirm) fail the run;
//! cosmetic steps (popups, heading format, thumbnail, related links, tags)
//! log a warning and continue.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::editor::{selectors, DriverResult, EditorDriver, Key, Modifiers};
use crate::error::{BlogcastError, BrowserError, PostingError, Result};
use crate::types::{Article, PostMedia, RelatedPost, Section};

const URL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Everything that goes into one post
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub article: Article,
    pub media: PostMedia,
    pub related: Vec<RelatedPost>,
    pub tags: Vec<String>,
}

impl PostDraft {
    pub fn new(article: Article) -> Self {
        Self {
            article,
            media: PostMedia::default(),
            related: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PosterSettings {
    pub write_url: String,
    pub element_timeout: Duration,
    /// Pause between editor steps so the page can keep up
    pub step_delay: Duration,
    pub related_heading: String,
    /// Where to save a screenshot when a step fails
    pub screenshot_dir: Option<PathBuf>,
}

impl PosterSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            write_url: config.browser.write_url()?,
            element_timeout: config.browser.element_timeout()?,
            step_delay: config.browser.step_delay()?,
            related_heading: config.posting.related_heading.clone(),
            screenshot_dir: Some(config.files.results_dir_path()),
        })
    }
}

pub struct BlogPoster {
    settings: PosterSettings,
}

fn step(name: &'static str) -> impl FnOnce(BrowserError) -> BlogcastError {
    move |source| PostingError::Step { step: name, source }.into()
}

impl BlogPoster {
    pub fn new(settings: PosterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PosterSettings {
        &self.settings
    }

    /// Type, publish and return the URL of the published post.
    ///
    /// # Errors
    ///
    /// `BlogcastError::Stopped` when `cancel` is stopped between steps;
    /// `PostingError` when a required step fails or the publish is never
    /// confirmed. The browser is left where it failed.
    pub async fn publish(
        &self,
        driver: &mut dyn EditorDriver,
        draft: &PostDraft,
        cancel: &CancelToken,
    ) -> Result<String> {
        if draft.article.title().trim().is_empty() {
            return Err(PostingError::EmptyArticle.into());
        }

        let result = self.run_steps(driver, draft, cancel).await;
        if let Err(e) = &result {
            if !matches!(e, BlogcastError::Stopped) {
                self.capture_failure(driver).await;
            }
        }
        result
    }

    async fn run_steps(
        &self,
        driver: &mut dyn EditorDriver,
        draft: &PostDraft,
        cancel: &CancelToken,
    ) -> Result<String> {
        info!("Opening editor: {}", self.settings.write_url);
        cancel.checkpoint().await?;
        driver
            .navigate(&self.settings.write_url)
            .await
            .map_err(step("open write page"))?;

        self.pause(cancel).await?;
        match driver.enter_frame(selectors::EDITOR_FRAME).await {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound(_)) => {
                debug!("No editor frame, staying in the top document");
            }
            Err(e) => return Err(step("enter editor frame")(e)),
        }
        driver
            .wait_for(selectors::EDITOR_READY, self.settings.element_timeout)
            .await
            .map_err(step("wait for editor"))?;

        self.pause(cancel).await?;
        self.dismiss_popups(driver).await;

        self.pause(cancel).await?;
        driver
            .click_first(selectors::TITLE)
            .await
            .map_err(step("type title"))?;
        // A restored or leftover title would otherwise be prefixed to ours
        driver
            .select_all_in_focus()
            .await
            .map_err(step("clear title"))?;
        driver
            .press_key(Key::Backspace, Modifiers::NONE)
            .await
            .map_err(step("clear title"))?;
        driver
            .type_text(draft.article.title().trim())
            .await
            .map_err(step("type title"))?;

        self.pause(cancel).await?;
        driver
            .click_first(selectors::BODY)
            .await
            .map_err(step("focus body"))?;

        match &draft.article {
            Article::Structured(parsed) => {
                if !parsed.intro.is_empty() {
                    type_block(driver, &parsed.intro)
                        .await
                        .map_err(step("type intro"))?;
                    paragraph_break(driver).await.map_err(step("type intro"))?;
                }
                for (index, section) in parsed.sections.iter().enumerate() {
                    self.pause(cancel).await?;
                    debug!("Typing section {}", index + 1);
                    self.type_section(driver, section).await?;
                }
            }
            Article::Plain { body, .. } => {
                type_block(driver, body).await.map_err(step("type body"))?;
                paragraph_break(driver).await.map_err(step("type body"))?;
            }
        }

        if let Some(thumbnail) = &draft.media.thumbnail {
            self.pause(cancel).await?;
            if let Err(e) = self.insert_image(driver, thumbnail).await {
                warn!("Thumbnail insertion failed, posting without it: {}", e);
            }
        }

        if !draft.related.is_empty() {
            self.pause(cancel).await?;
            if let Err(e) = self.type_related(driver, &draft.related).await {
                warn!("Could not add related post links: {}", e);
            }
        }

        self.pause(cancel).await?;
        driver
            .click_first(selectors::PUBLISH_BUTTON)
            .await
            .map_err(step("open publish layer"))?;

        if !draft.tags.is_empty() {
            self.pause(cancel).await?;
            if let Err(e) = self.add_tags(driver, &draft.tags).await {
                warn!("Could not add tags: {}", e);
            }
        }

        self.pause(cancel).await?;
        driver
            .click_first(selectors::CONFIRM_PUBLISH)
            .await
            .map_err(step("confirm publish"))?;

        let url = self.wait_for_post_url(driver, cancel).await?;
        info!("Published: {}", url);
        Ok(url)
    }

    async fn pause(&self, cancel: &CancelToken) -> Result<()> {
        cancel.sleep(self.settings.step_delay).await
    }

    async fn dismiss_popups(&self, driver: &mut dyn EditorDriver) {
        for (what, chain) in [
            ("restore-draft dialog", selectors::RESTORE_DRAFT_CANCEL),
            ("help panel", selectors::HELP_PANEL_CLOSE),
        ] {
            match driver.click_first(chain).await {
                Ok(_) => debug!("Dismissed {}", what),
                Err(_) => debug!("No {} to dismiss", what),
            }
        }
    }

    async fn type_section(&self, driver: &mut dyn EditorDriver, section: &Section) -> Result<()> {
        let subtitle = section.subtitle.trim();
        if !subtitle.is_empty() {
            driver
                .type_text(subtitle)
                .await
                .map_err(step("type subtitle"))?;
            if let Err(e) = apply_format(driver, selectors::HEADING_FORMAT_OPTION).await {
                warn!("Heading format not applied to '{}': {}", subtitle, e);
            }
            driver
                .press_key(Key::Enter, Modifiers::NONE)
                .await
                .map_err(step("type subtitle"))?;
            if let Err(e) = apply_format(driver, selectors::BODY_FORMAT_OPTION).await {
                debug!("Body format not restored: {}", e);
            }
        }
        if !section.body.is_empty() {
            type_block(driver, &section.body)
                .await
                .map_err(step("type section body"))?;
        }
        paragraph_break(driver)
            .await
            .map_err(step("type section body"))
    }

    async fn insert_image(
        &self,
        driver: &mut dyn EditorDriver,
        path: &std::path::Path,
    ) -> DriverResult<()> {
        driver.click_first(selectors::IMAGE_BUTTON).await?;
        driver
            .upload_file(selectors::IMAGE_FILE_INPUT, path)
            .await?;
        driver
            .wait_for(selectors::UPLOADED_IMAGE, self.settings.element_timeout)
            .await?;
        debug!("Inserted image {}", path.display());
        Ok(())
    }

    async fn type_related(
        &self,
        driver: &mut dyn EditorDriver,
        related: &[RelatedPost],
    ) -> DriverResult<()> {
        driver.type_text(&self.settings.related_heading).await?;
        driver.press_key(Key::Enter, Modifiers::NONE).await?;
        for post in related {
            driver.type_text(&post.title).await?;
            driver.press_key(Key::Enter, Modifiers::NONE).await?;
            driver.type_text(&post.url).await?;
            driver.press_key(Key::Enter, Modifiers::NONE).await?;
        }
        Ok(())
    }

    async fn add_tags(&self, driver: &mut dyn EditorDriver, tags: &[String]) -> DriverResult<()> {
        driver
            .wait_for(selectors::TAG_INPUT, self.settings.element_timeout)
            .await?;
        for tag in tags {
            driver.click_first(selectors::TAG_INPUT).await?;
            driver.type_text(tag).await?;
            driver.press_key(Key::Enter, Modifiers::NONE).await?;
        }
        Ok(())
    }

    async fn wait_for_post_url(
        &self,
        driver: &mut dyn EditorDriver,
        cancel: &CancelToken,
    ) -> Result<String> {
        let start = Instant::now();
        loop {
            let url = driver
                .current_url()
                .await
                .map_err(step("read post url"))?;
            if !selectors::is_write_page(&url) {
                return Ok(url);
            }
            if start.elapsed() >= self.settings.element_timeout {
                return Err(PostingError::NotConfirmed(format!(
                    "still on the write page after {}s ({})",
                    self.settings.element_timeout.as_secs(),
                    url
                ))
                .into());
            }
            cancel.sleep(URL_POLL_INTERVAL).await?;
        }
    }

    async fn capture_failure(&self, driver: &mut dyn EditorDriver) {
        let Some(dir) = &self.settings.screenshot_dir else {
            return;
        };
        let path = dir.join(format!(
            "failure_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        match driver.screenshot(&path).await {
            Ok(()) => info!("Saved failure screenshot to {}", path.display()),
            Err(e) => warn!("Could not save failure screenshot: {}", e),
        }
    }
}

/// Type multi-line text as separate editor paragraphs
async fn type_block(driver: &mut dyn EditorDriver, text: &str) -> DriverResult<()> {
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            driver.press_key(Key::Enter, Modifiers::NONE).await?;
        }
        driver.type_text(line.trim_end()).await?;
    }
    Ok(())
}

async fn paragraph_break(driver: &mut dyn EditorDriver) -> DriverResult<()> {
    driver.press_key(Key::Enter, Modifiers::NONE).await?;
    driver.press_key(Key::Enter, Modifiers::NONE).await
}

/// Select the current line and apply a paragraph style from the format dropdown
async fn apply_format(driver: &mut dyn EditorDriver, option: &[&str]) -> DriverResult<()> {
    driver.press_key(Key::Home, Modifiers::SHIFT).await?;
    let result = async {
        driver.click_first(selectors::TEXT_FORMAT_BUTTON).await?;
        driver.click_first(option).await
    }
    .await;
    // Collapse the selection so the next keystroke does not replace the line
    driver.press_key(Key::End, Modifiers::NONE).await?;
    result.map(|_| ())
}
