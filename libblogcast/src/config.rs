//! Configuration management for Blogcast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub posting: PostingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Locations of the line-oriented input and output files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub keywords: String,
    pub used_keywords: String,
    pub prompt1: String,
    pub prompt2: String,
    pub latest_posts: String,
    pub results_dir: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            keywords: "keywords.txt".to_string(),
            used_keywords: "used_keywords.txt".to_string(),
            prompt1: "prompt1.txt".to_string(),
            prompt2: "prompt2.txt".to_string(),
            latest_posts: "latest_posts.txt".to_string(),
            results_dir: "results".to_string(),
        }
    }
}

impl FilesConfig {
    pub fn keywords_path(&self) -> PathBuf {
        expand_path(&self.keywords)
    }

    pub fn used_keywords_path(&self) -> PathBuf {
        expand_path(&self.used_keywords)
    }

    pub fn prompt_paths(&self) -> (PathBuf, PathBuf) {
        (expand_path(&self.prompt1), expand_path(&self.prompt2))
    }

    pub fn latest_posts_path(&self) -> PathBuf {
        expand_path(&self.latest_posts)
    }

    pub fn results_dir_path(&self) -> PathBuf {
        expand_path(&self.results_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Only "gemini" is supported
    pub provider: String,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout: "120s".to_string(),
            temperature: Some(0.8),
            max_output_tokens: None,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration("generator.timeout", &self.timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    /// Profile directory; reusing it keeps the blog login session
    pub user_data_dir: Option<String>,
    pub blog_id: String,
    /// Overrides the write page derived from `blog_id`
    pub write_url: Option<String>,
    pub element_timeout: String,
    pub step_delay: String,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            user_data_dir: Some("~/.local/share/blogcast/chrome-profile".to_string()),
            blog_id: String::new(),
            write_url: None,
            element_timeout: "15s".to_string(),
            step_delay: "500ms".to_string(),
            window_width: 1280,
            window_height: 900,
        }
    }
}

impl BrowserConfig {
    pub fn write_url(&self) -> Result<String> {
        if let Some(url) = &self.write_url {
            return Ok(url.clone());
        }
        if self.blog_id.trim().is_empty() {
            return Err(ConfigError::MissingField("browser.blog_id".to_string()).into());
        }
        Ok(format!(
            "https://blog.naver.com/{}?Redirect=Write",
            self.blog_id.trim()
        ))
    }

    pub fn element_timeout(&self) -> Result<Duration> {
        parse_duration("browser.element_timeout", &self.element_timeout)
    }

    pub fn step_delay(&self) -> Result<Duration> {
        parse_duration("browser.step_delay", &self.step_delay)
    }

    pub fn user_data_dir_path(&self) -> Option<PathBuf> {
        self.user_data_dir.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    pub thumbnail: bool,
    /// Optional background image for the thumbnail
    pub thumbnail_background: Option<String>,
    pub related_links: usize,
    pub related_heading: String,
    /// How many entries `latest_posts.txt` keeps
    pub latest_posts_limit: usize,
    pub tags: Vec<String>,
    pub keyword_tag: bool,
    /// Delay between consecutive posts in one run
    pub interval: String,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            thumbnail: true,
            thumbnail_background: None,
            related_links: 3,
            related_heading: "함께 보면 좋은 글".to_string(),
            latest_posts_limit: 20,
            tags: Vec::new(),
            keyword_tag: true,
            interval: "60s".to_string(),
        }
    }
}

impl PostingConfig {
    pub fn interval(&self) -> Result<Duration> {
        parse_duration("posting.interval", &self.interval)
    }

    /// Tags for one post: configured tags plus the keyword, without duplicates
    pub fn tags_for(&self, keyword: &str) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let candidates = self
            .tags
            .iter()
            .map(String::as_str)
            .chain(self.keyword_tag.then_some(keyword));
        for tag in candidates {
            let tag = tag.trim().trim_start_matches('#').replace(' ', "");
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub file_attempts: u32,
    pub file_backoff: String,
    pub generation_attempts: u32,
    pub generation_backoff: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            file_attempts: 3,
            file_backoff: "1s".to_string(),
            generation_attempts: 3,
            generation_backoff: "2s".to_string(),
        }
    }
}

impl RetryConfig {
    /// Fixed-delay policy for shared-file contention
    pub fn file_policy(&self) -> Result<RetryPolicy> {
        let delay = parse_duration("retry.file_backoff", &self.file_backoff)?;
        Ok(RetryPolicy::fixed(self.file_attempts, delay))
    }

    /// Exponential policy for the generation API
    pub fn generation_policy(&self) -> Result<RetryPolicy> {
        let base = parse_duration("retry.generation_backoff", &self.generation_backoff)?;
        Ok(RetryPolicy::exponential(
            self.generation_attempts,
            base,
            Duration::from_secs(60),
        ))
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let files = [
            ("files.keywords", &self.files.keywords),
            ("files.used_keywords", &self.files.used_keywords),
            ("files.prompt1", &self.files.prompt1),
            ("files.prompt2", &self.files.prompt2),
            ("files.latest_posts", &self.files.latest_posts),
            ("files.results_dir", &self.files.results_dir),
            ("generator.model", &self.generator.model),
        ];
        for (field, value) in files {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field.to_string()).into());
            }
        }

        if self.retry.file_attempts == 0 || self.retry.generation_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry".to_string(),
                reason: "attempt counts must be at least 1".to_string(),
            }
            .into());
        }

        self.generator.timeout()?;
        self.browser.element_timeout()?;
        self.browser.step_delay()?;
        self.posting.interval()?;
        self.retry.file_policy()?;
        self.retry.generation_policy()?;
        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("BLOGCAST_CONFIG") {
        return Ok(expand_path(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("blogcast").join("config.toml"))
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(path).into_owned());
    PathBuf::from(expanded)
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a duration ({})", value, e),
        }
        .into()
    })
}
